//! Interrupt-controller seam.
//!
//! The initialization sequencer only needs one capability from the
//! platform interrupt controller: unmask a single 0-based line. On legacy
//! 8259 hardware that means clearing a mask bit, plus the cascade bit for
//! lines on the slave chip.

use pic8259::ChainedPics;

/// IRQ line the auxiliary device reports on.
pub const MOUSE_IRQ: u8 = 12;

/// Slave-chip lines reach the CPU through this master line.
const CASCADE_IRQ: u8 = 2;

/// Unmask a single interrupt line.
pub trait IrqLine {
    fn enable(&mut self, line: u8);
}

impl IrqLine for ChainedPics {
    fn enable(&mut self, line: u8) {
        unsafe {
            let [mut primary, mut secondary] = self.read_masks();
            if line < 8 {
                primary &= !(1 << line);
            } else {
                secondary &= !(1 << (line - 8));
                primary &= !(1 << CASCADE_IRQ);
            }
            self.write_masks(primary, secondary);
        }
    }
}
