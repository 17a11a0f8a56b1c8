//! Port-level access to the i8042 controller.
//!
//! The controller exposes two byte-wide ports: 0x64 reads the status
//! register and takes controller commands, 0x60 carries data in both
//! directions. [`PortIo`] is the seam the rest of the driver sits on;
//! [`PioPort`] is the real-hardware implementation.

use x86_64::instructions::port::Port;

/// Status register (read) / command register (write).
pub const STATUS_COMMAND_PORT: u16 = 0x64;
/// Data port (read: output buffer, write: input buffer).
pub const DATA_PORT: u16 = 0x60;

/// Status bit: output buffer full, a byte is waiting to be read.
pub const STATUS_OUTPUT_FULL: u8 = 1 << 0;
/// Status bit: input buffer full, the controller is not ready for a write.
pub const STATUS_INPUT_FULL: u8 = 1 << 1;

/// Configuration byte bit: interrupt (IRQ12) enable for the auxiliary port.
pub const CONFIG_AUX_IRQ: u8 = 1 << 1;

/// Byte the mouse returns after accepting a command.
pub const ACK: u8 = 0xFA;

/// Command bytes written to the command port (0x64).
pub mod cmd {
    /// Read the controller configuration byte.
    pub const READ_CONFIG: u8 = 0x20;
    /// Write the controller configuration byte.
    ///
    /// Numerically the same as the data-port address; classic drivers
    /// sometimes reuse the port constant here by accident.
    pub const WRITE_CONFIG: u8 = 0x60;
    /// Enable the second PS/2 port (the auxiliary device).
    pub const ENABLE_AUX: u8 = 0xA8;
    /// Route the next data-port write to the auxiliary device.
    pub const AUX_GATEWAY: u8 = 0xD4;
}

/// Command bytes sent to the mouse itself, through the gateway.
pub mod mouse_cmd {
    /// Restore default settings.
    pub const SET_DEFAULTS: u8 = 0xF6;
    /// Enable data reporting (start streaming packets).
    pub const ENABLE_REPORTING: u8 = 0xF4;
}

/// Byte-granular access to the controller's two ports.
pub trait PortIo {
    fn read_status(&mut self) -> u8;
    fn read_data(&mut self) -> u8;
    fn write_command(&mut self, cmd: u8);
    fn write_data(&mut self, data: u8);
}

/// Raw port I/O at the fixed i8042 addresses.
pub struct PioPort {
    status: Port<u8>,
    data: Port<u8>,
}

impl PioPort {
    pub const fn new() -> Self {
        Self {
            status: Port::new(STATUS_COMMAND_PORT),
            data: Port::new(DATA_PORT),
        }
    }
}

impl Default for PioPort {
    fn default() -> Self {
        Self::new()
    }
}

impl PortIo for PioPort {
    fn read_status(&mut self) -> u8 {
        unsafe { self.status.read() }
    }

    fn read_data(&mut self) -> u8 {
        unsafe { self.data.read() }
    }

    fn write_command(&mut self, cmd: u8) {
        unsafe { self.status.write(cmd) }
    }

    fn write_data(&mut self, data: u8) {
        unsafe { self.data.write(data) }
    }
}
