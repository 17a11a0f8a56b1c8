//! PS/2 auxiliary-device (mouse) driver for x86 kernels.
//!
//! Talks to the i8042 keyboard/mouse controller: enables the auxiliary
//! port, negotiates settings over the command/acknowledge protocol, and
//! assembles the interrupt-driven 3-byte packet stream into movement and
//! click events for a cursor or UI layer.
//!
//! The driver core is generic over [`port::PortIo`], so everything above
//! the raw port reads runs unchanged against a scripted backend in tests.
//! Kernels that just want IRQ12 wired to plain callbacks can use the
//! [`global`] module:
//!
//! ```ignore
//! // During boot, before enabling interrupts:
//! i8042_mouse::global::init(callbacks, AckPolicy::default(), &mut *PICS.lock())?;
//!
//! // In the IRQ12 handler (the kernel still sends EOI afterwards):
//! i8042_mouse::global::handle_interrupt();
//! ```

#![cfg_attr(not(test), no_std)]

pub mod error;
pub mod global;
pub mod irq;
pub mod mouse;
pub mod packet;
pub mod port;

pub use error::MouseError;
pub use mouse::{AckPolicy, Mouse, MouseHandler};
