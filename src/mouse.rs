//! Driver core: wait/poll, the command/acknowledge protocol, the
//! initialization sequencer, and the interrupt-driven packet assembler.

use log::warn;

use crate::error::MouseError;
use crate::irq::{IrqLine, MOUSE_IRQ};
use crate::packet::{PacketFlags, PACKET_LEN};
use crate::port::{self, cmd, mouse_cmd, PortIo};

/// Iterations a single wait on the status register may burn.
const POLL_BUDGET: u32 = 100_000;

/// How long [`Mouse::send_command`] waits for the 0xFA acknowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckPolicy {
    /// Give up after this many data-port reads and report
    /// [`MouseError::AckTimeout`].
    Bounded(u32),
    /// Spin until the acknowledge arrives, like the classic drivers. A
    /// device that never answers hangs the caller.
    Blocking,
}

impl Default for AckPolicy {
    fn default() -> Self {
        AckPolicy::Bounded(POLL_BUDGET)
    }
}

/// Receives decoded events from the interrupt path.
pub trait MouseHandler {
    /// Relative motion, straight from the report's two's-complement bytes.
    fn on_movement(&mut self, dx: i8, dy: i8);
    /// Left button went from pressed to released.
    fn on_left_click(&mut self);
    /// Right button went from pressed to released.
    fn on_right_click(&mut self);
}

/// PS/2 mouse driver state.
///
/// Owned by whoever services IRQ12. Every mutation happens inside
/// [`Mouse::handle_interrupt`], so no locking is needed as long as
/// [`Mouse::init`] finishes before the interrupt line is unmasked.
pub struct Mouse<P: PortIo> {
    port: P,
    ack_policy: AckPolicy,
    packet: [u8; PACKET_LEN],
    bytes_received: usize,
    left_pressed: bool,
    right_pressed: bool,
}

impl<P: PortIo> Mouse<P> {
    pub const fn new(port: P) -> Self {
        Self::with_ack_policy(port, AckPolicy::Bounded(POLL_BUDGET))
    }

    pub const fn with_ack_policy(port: P, ack_policy: AckPolicy) -> Self {
        Self {
            port,
            ack_policy,
            packet: [0; PACKET_LEN],
            bytes_received: 0,
            left_pressed: false,
            right_pressed: false,
        }
    }

    /// Poll until the controller will accept a byte. Best effort: on
    /// budget exhaustion this logs one line and returns, leaving the
    /// caller to write into a possibly busy controller.
    fn wait_write(&mut self) {
        for _ in 0..POLL_BUDGET {
            if self.port.read_status() & port::STATUS_INPUT_FULL == 0 {
                return;
            }
        }
        warn!("i8042-mouse: poll budget exhausted waiting to write");
    }

    /// Poll until a byte is waiting in the output buffer. Same best-effort
    /// contract as [`Mouse::wait_write`].
    fn wait_read(&mut self) {
        for _ in 0..POLL_BUDGET {
            if self.port.read_status() & port::STATUS_OUTPUT_FULL != 0 {
                return;
            }
        }
        warn!("i8042-mouse: poll budget exhausted waiting to read");
    }

    /// Send one command byte to the mouse through the controller's
    /// auxiliary gateway, then drain the data port until the acknowledge
    /// byte shows up.
    pub fn send_command(&mut self, command: u8) -> Result<(), MouseError> {
        self.wait_write();
        self.port.write_command(cmd::AUX_GATEWAY);
        self.wait_write();
        self.port.write_data(command);
        self.wait_read();
        match self.ack_policy {
            AckPolicy::Blocking => {
                while self.port.read_data() != port::ACK {}
                Ok(())
            }
            AckPolicy::Bounded(tries) => {
                for _ in 0..tries {
                    if self.port.read_data() == port::ACK {
                        return Ok(());
                    }
                }
                Err(MouseError::AckTimeout(command))
            }
        }
    }

    /// Bring the auxiliary port up and start data reporting.
    ///
    /// Order matters: the auxiliary port is enabled and its interrupt bit
    /// set in the configuration byte before the mouse itself is told to
    /// report, and the interrupt line is registered last.
    pub fn init(&mut self, irq: &mut impl IrqLine) -> Result<(), MouseError> {
        self.wait_write();
        self.port.write_command(cmd::ENABLE_AUX);

        self.wait_write();
        self.port.write_command(cmd::READ_CONFIG);
        self.wait_read();
        let config = self.port.read_data() | port::CONFIG_AUX_IRQ;

        self.wait_write();
        self.port.write_command(cmd::WRITE_CONFIG);
        self.wait_write();
        self.port.write_data(config);

        self.send_command(mouse_cmd::SET_DEFAULTS)?;
        self.send_command(mouse_cmd::ENABLE_REPORTING)?;

        irq.enable(MOUSE_IRQ);
        Ok(())
    }

    /// IRQ12 entry point: consume one byte from the data port, and on the
    /// third byte of a report decode and dispatch it.
    ///
    /// An interrupt with the output buffer empty is a spurious wake and
    /// consumes nothing.
    pub fn handle_interrupt(&mut self, handler: &mut impl MouseHandler) {
        self.wait_read();
        if self.port.read_status() & port::STATUS_OUTPUT_FULL == 0 {
            return;
        }
        self.wait_read();
        self.packet[self.bytes_received] = self.port.read_data();
        self.bytes_received += 1;
        if self.bytes_received == PACKET_LEN {
            self.bytes_received = 0;
            self.dispatch(handler);
        }
    }

    fn dispatch(&mut self, handler: &mut impl MouseHandler) {
        let flags = PacketFlags::from_bits_retain(self.packet[0]);
        if flags.overflowed() {
            // Motion out of range: drop the whole report, buttons included.
            return;
        }
        if flags.contains(PacketFlags::LEFT) {
            self.left_pressed = true;
        } else if self.left_pressed {
            self.left_pressed = false;
            handler.on_left_click();
            // Click fires on release and ends the cycle; the right button
            // and the motion bytes of this report are not processed.
            return;
        }
        if flags.contains(PacketFlags::RIGHT) {
            self.right_pressed = true;
        } else if self.right_pressed {
            self.right_pressed = false;
            handler.on_right_click();
            return;
        }
        // Motion comes from the raw bytes' own sign; the X/Y sign bits in
        // the status byte are not consulted.
        handler.on_movement(self.packet[1] as i8, self.packet[2] as i8);
    }

    /// Left-button state as of the last fully processed report.
    pub fn left_pressed(&self) -> bool {
        self.left_pressed
    }

    /// Right-button state as of the last fully processed report.
    pub fn right_pressed(&self) -> bool {
        self.right_pressed
    }

    #[cfg(test)]
    pub(crate) fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    #[cfg(test)]
    pub(crate) fn bytes_received(&self) -> usize {
        self.bytes_received
    }
}

#[cfg(test)]
mod tests {
    use super::{AckPolicy, Mouse, MouseHandler};
    use crate::error::MouseError;
    use crate::irq::IrqLine;
    use crate::port::mock::{MockPort, PortSel};

    #[derive(Default)]
    struct Events {
        moves: Vec<(i8, i8)>,
        left_clicks: usize,
        right_clicks: usize,
    }

    impl MouseHandler for Events {
        fn on_movement(&mut self, dx: i8, dy: i8) {
            self.moves.push((dx, dy));
        }

        fn on_left_click(&mut self) {
            self.left_clicks += 1;
        }

        fn on_right_click(&mut self) {
            self.right_clicks += 1;
        }
    }

    #[derive(Default)]
    struct FakeIrq {
        enabled: Vec<u8>,
    }

    impl IrqLine for FakeIrq {
        fn enable(&mut self, line: u8) {
            self.enabled.push(line);
        }
    }

    /// One interrupt per queued byte, like the hardware delivers them.
    fn deliver(mouse: &mut Mouse<MockPort>, events: &mut Events, bytes: &[u8]) {
        for &byte in bytes {
            mouse.port_mut().incoming.push_back(byte);
            mouse.handle_interrupt(events);
        }
    }

    #[test]
    fn movement_fires_once_per_three_bytes() {
        let mut mouse = Mouse::new(MockPort::default());
        let mut events = Events::default();

        deliver(&mut mouse, &mut events, &[0x08, 0x0A]);
        assert!(events.moves.is_empty());
        assert_eq!(mouse.bytes_received(), 2);

        deliver(&mut mouse, &mut events, &[0xF6]);
        assert_eq!(events.moves, vec![(10, -10)]);
        assert_eq!(events.left_clicks, 0);
        assert_eq!(events.right_clicks, 0);
        assert_eq!(mouse.bytes_received(), 0);
    }

    #[test]
    fn spurious_interrupt_consumes_nothing() {
        let mut mouse = Mouse::new(MockPort::default());
        let mut events = Events::default();

        mouse.handle_interrupt(&mut events);
        assert!(events.moves.is_empty());
        assert_eq!(mouse.bytes_received(), 0);
    }

    #[test]
    fn left_click_fires_on_release_without_motion() {
        let mut mouse = Mouse::new(MockPort::default());
        let mut events = Events::default();

        // Press: no click, motion still dispatched.
        deliver(&mut mouse, &mut events, &[0x09, 0x00, 0x00]);
        assert_eq!(events.left_clicks, 0);
        assert!(mouse.left_pressed());
        let moves_after_press = events.moves.len();

        // Release: exactly one click, no motion for that report.
        deliver(&mut mouse, &mut events, &[0x08, 0x00, 0x00]);
        assert_eq!(events.left_clicks, 1);
        assert!(!mouse.left_pressed());
        assert_eq!(events.moves.len(), moves_after_press);
    }

    #[test]
    fn right_click_fires_on_release() {
        let mut mouse = Mouse::new(MockPort::default());
        let mut events = Events::default();

        deliver(&mut mouse, &mut events, &[0x0A, 0x00, 0x00]);
        assert!(mouse.right_pressed());
        assert_eq!(events.right_clicks, 0);

        deliver(&mut mouse, &mut events, &[0x08, 0x00, 0x00]);
        assert_eq!(events.right_clicks, 1);
        assert!(!mouse.right_pressed());
    }

    #[test]
    fn overflow_discards_whole_packet() {
        let mut mouse = Mouse::new(MockPort::default());
        let mut events = Events::default();

        deliver(&mut mouse, &mut events, &[0xC0, 0x05, 0x05]);
        assert!(events.moves.is_empty());
        assert_eq!(events.left_clicks, 0);
        assert_eq!(mouse.bytes_received(), 0);

        // Buffer reset: the next report decodes normally.
        deliver(&mut mouse, &mut events, &[0x08, 0x0A, 0xF6]);
        assert_eq!(events.moves, vec![(10, -10)]);
    }

    #[test]
    fn overflow_skips_button_tracking() {
        let mut mouse = Mouse::new(MockPort::default());
        let mut events = Events::default();

        // Left bit set, but the report overflows: state must not latch.
        deliver(&mut mouse, &mut events, &[0xC1, 0x00, 0x00]);
        assert!(!mouse.left_pressed());

        // So this release-looking report produces no click.
        deliver(&mut mouse, &mut events, &[0x08, 0x00, 0x00]);
        assert_eq!(events.left_clicks, 0);
    }

    #[test]
    fn identical_packets_dispatch_independent_events() {
        let mut mouse = Mouse::new(MockPort::default());
        let mut events = Events::default();

        for _ in 0..5 {
            deliver(&mut mouse, &mut events, &[0x08, 0x05, 0xFB]);
        }
        assert_eq!(events.moves, vec![(5, -5); 5]);
    }

    #[test]
    fn simultaneous_release_short_circuits_right_button() {
        let mut mouse = Mouse::new(MockPort::default());
        let mut events = Events::default();

        // Both buttons down.
        deliver(&mut mouse, &mut events, &[0x0B, 0x00, 0x00]);
        assert!(mouse.left_pressed());
        assert!(mouse.right_pressed());

        // Both released in one report: only the left click fires this
        // cycle, the right release is noticed a report later.
        deliver(&mut mouse, &mut events, &[0x08, 0x00, 0x00]);
        assert_eq!(events.left_clicks, 1);
        assert_eq!(events.right_clicks, 0);
        assert!(mouse.right_pressed());

        deliver(&mut mouse, &mut events, &[0x08, 0x00, 0x00]);
        assert_eq!(events.right_clicks, 1);
    }

    #[test]
    fn send_command_routes_through_gateway() {
        let mut mouse = Mouse::new(MockPort::with_incoming(&[0xFA]));

        mouse.send_command(0xF4).unwrap();
        assert_eq!(
            mouse.port_mut().written(),
            &[(PortSel::Command, 0xD4), (PortSel::Data, 0xF4)]
        );
    }

    #[test]
    fn send_command_skips_junk_before_acknowledge() {
        let mut mouse = Mouse::new(MockPort::with_incoming(&[0x12, 0x34, 0xFA]));
        assert!(mouse.send_command(0xF6).is_ok());
    }

    #[test]
    fn bounded_ack_policy_reports_timeout() {
        let mut mouse =
            Mouse::with_ack_policy(MockPort::default(), AckPolicy::Bounded(16));
        assert_eq!(
            mouse.send_command(0xF4),
            Err(MouseError::AckTimeout(0xF4))
        );
    }

    #[test]
    fn init_runs_handshake_in_order_and_registers_irq() {
        // Config byte read, then one acknowledge per mouse command.
        let mut mouse = Mouse::new(MockPort::with_incoming(&[0x04, 0xFA, 0xFA]));
        let mut irq = FakeIrq::default();

        mouse.init(&mut irq).unwrap();

        assert_eq!(
            mouse.port_mut().written(),
            &[
                (PortSel::Command, 0xA8), // enable aux port
                (PortSel::Command, 0x20), // read config
                (PortSel::Command, 0x60), // write config
                (PortSel::Data, 0x06),    // config byte with IRQ12 bit set
                (PortSel::Command, 0xD4),
                (PortSel::Data, 0xF6), // set defaults
                (PortSel::Command, 0xD4),
                (PortSel::Data, 0xF4), // enable reporting
            ]
        );
        assert_eq!(irq.enabled, vec![12]);
    }

    #[test]
    fn init_propagates_ack_timeout() {
        // Config byte arrives but the mouse never acknowledges 0xF6.
        let mut mouse =
            Mouse::with_ack_policy(MockPort::with_incoming(&[0x04]), AckPolicy::Bounded(8));
        let mut irq = FakeIrq::default();

        assert_eq!(
            mouse.init(&mut irq),
            Err(MouseError::AckTimeout(0xF6))
        );
        assert!(irq.enabled.is_empty());
    }
}
