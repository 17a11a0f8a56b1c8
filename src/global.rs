//! Process-wide driver instance, for kernels that point the IRQ12 vector
//! at a free function and drive the cursor through plain callbacks.

use spin::Mutex;

use crate::error::MouseError;
use crate::irq::IrqLine;
use crate::mouse::{AckPolicy, Mouse, MouseHandler};
use crate::port::PioPort;

/// Event sinks for the global instance.
#[derive(Clone, Copy)]
pub struct Callbacks {
    pub on_movement: fn(dx: i8, dy: i8),
    pub on_left_click: fn(),
    pub on_right_click: fn(),
}

impl MouseHandler for Callbacks {
    fn on_movement(&mut self, dx: i8, dy: i8) {
        (self.on_movement)(dx, dy);
    }

    fn on_left_click(&mut self) {
        (self.on_left_click)();
    }

    fn on_right_click(&mut self) {
        (self.on_right_click)();
    }
}

static MOUSE: Mutex<Option<(Mouse<PioPort>, Callbacks)>> = Mutex::new(None);

/// Run the hardware handshake and install the global instance.
///
/// Call with interrupts still masked: `handle_interrupt` mutates the same
/// state and the driver has no protection against racing its own setup.
pub fn init(
    callbacks: Callbacks,
    ack_policy: AckPolicy,
    irq: &mut impl IrqLine,
) -> Result<(), MouseError> {
    let mut mouse = Mouse::with_ack_policy(PioPort::new(), ack_policy);
    mouse.init(irq)?;
    *MOUSE.lock() = Some((mouse, callbacks));
    Ok(())
}

/// IRQ12 service routine. The kernel still signals end-of-interrupt to its
/// interrupt controller afterwards.
pub fn handle_interrupt() {
    if let Some((mouse, callbacks)) = MOUSE.lock().as_mut() {
        mouse.handle_interrupt(callbacks);
    }
}
