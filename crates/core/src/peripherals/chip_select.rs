//! Chip-select driver.
//!
//! Each line idles at its CSDEF bit (1 = idle high, the usual active-low
//! select). The line addressed by CSID is driven to the opposite level
//! unless CSMODE is OFF, in which case every line rests at idle. CSID values
//! past the last line select nothing.

use crate::bus::ChipSelect;
use crate::regs::CSMODE_OFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipSelectDriver {
    /// Last level driven per line; `None` until first driven
    levels: Vec<Option<bool>>,
}

impl ChipSelectDriver {
    pub fn new(num_cs: usize) -> Self {
        ChipSelectDriver { levels: vec![None; num_cs] }
    }

    pub fn num_cs(&self) -> usize {
        self.levels.len()
    }

    /// Last level driven on `line`.
    pub fn level(&self, line: usize) -> Option<bool> {
        self.levels.get(line).copied().flatten()
    }

    /// Level line `line` should have for the given configuration.
    pub fn line_level(line: usize, csid: u32, csdef: u32, csmode: u32) -> bool {
        let idle = line < 32 && csdef & (1 << line) != 0;
        let selected = csmode != CSMODE_OFF && csid as usize == line;
        if selected { !idle } else { idle }
    }

    /// Drive every line from CSID/CSDEF/CSMODE, notifying only lines whose
    /// level changed.
    pub fn recompute<C: ChipSelect>(&mut self, csid: u32, csdef: u32, csmode: u32, cs: &mut C) {
        for (line, last) in self.levels.iter_mut().enumerate() {
            let high = Self::line_level(line, csid, csdef, csmode);
            if *last != Some(high) {
                *last = Some(high);
                log::trace!("cs{} -> {}", line, high as u8);
                cs.set_level(line, high);
            }
        }
    }
}
