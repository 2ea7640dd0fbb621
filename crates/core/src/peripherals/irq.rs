//! Interrupt output logic.
//!
//! The controller has a single level-triggered interrupt output. It is
//! asserted while any pending source (IP) is also enabled (IE). The last
//! level handed to the host is cached so the line is only notified when the
//! computed level actually changes.

use crate::bus::IrqLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqLogic {
    /// Level last driven onto the output (lines start deasserted)
    level: bool,
}

impl IrqLogic {
    pub fn new() -> Self {
        IrqLogic { level: false }
    }

    /// Current level of the interrupt output.
    pub fn level(&self) -> bool {
        self.level
    }

    /// Recompute the output from IP and IE and notify `line` if it changed.
    /// Returns true if a notification was sent.
    pub fn recompute<L: IrqLine>(&mut self, ip: u32, ie: u32, line: &mut L) -> bool {
        let asserted = ip & ie != 0;
        if asserted == self.level {
            return false;
        }
        self.level = asserted;
        log::trace!("irq -> {} (ip={:#x} ie={:#x})", asserted as u8, ip, ie);
        line.set_level(asserted);
        true
    }
}

impl Default for IrqLogic {
    fn default() -> Self {
        Self::new()
    }
}
