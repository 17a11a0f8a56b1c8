//! Mouse report layout.
//!
//! A standard PS/2 mouse report is 3 bytes: a status byte, then raw X and
//! raw Y motion as two's-complement values.

use bitflags::bitflags;

/// Bytes in one mouse report.
pub const PACKET_LEN: usize = 3;

bitflags! {
    /// Status byte (byte 0) of a mouse report.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PacketFlags: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const MIDDLE = 1 << 2;
        /// Always set in a well-formed status byte.
        const MARKER = 1 << 3;
        const X_SIGN = 1 << 4;
        const Y_SIGN = 1 << 5;
        const X_OVERFLOW = 1 << 6;
        const Y_OVERFLOW = 1 << 7;
    }
}

impl PacketFlags {
    /// Motion exceeded the encodable range on either axis.
    pub fn overflowed(self) -> bool {
        self.intersects(Self::X_OVERFLOW | Self::Y_OVERFLOW)
    }
}
