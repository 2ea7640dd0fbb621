//! Collaborators the controller drives.
//!
//! The controller never owns a real bus or wires. The host hands it three
//! handles at construction time:
//!
//! - [`SpiBus`] — exchanges one byte, full duplex, with whatever sits on the bus
//! - [`IrqLine`] — receives the level of the controller's interrupt output
//! - [`ChipSelect`] — receives the level of each numbered chip-select output
//!
//! Closures of the matching shape implement each trait, so a host can wire
//! the controller with `|mosi| flash.transfer(mosi)` and the like.
//! Collaborators must not call back into the controller.

/// Full-duplex byte exchange with the downstream bus.
pub trait SpiBus {
    /// Shift `mosi` out and return the byte shifted in.
    fn transfer(&mut self, mosi: u8) -> u8;
}

/// The controller's interrupt output.
pub trait IrqLine {
    /// Called only when the line level actually changes.
    fn set_level(&mut self, asserted: bool);
}

/// The controller's chip-select outputs.
pub trait ChipSelect {
    /// Drive select line `line` to `high`.
    fn set_level(&mut self, line: usize, high: bool);
}

impl<F: FnMut(u8) -> u8> SpiBus for F {
    fn transfer(&mut self, mosi: u8) -> u8 {
        self(mosi)
    }
}

impl<F: FnMut(bool)> IrqLine for F {
    fn set_level(&mut self, asserted: bool) {
        self(asserted)
    }
}

impl<F: FnMut(usize, bool)> ChipSelect for F {
    fn set_level(&mut self, line: usize, high: bool) {
        self(line, high)
    }
}

/// Nothing attached: the bus reads back 0 and line changes go nowhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disconnected;

impl SpiBus for Disconnected {
    fn transfer(&mut self, _mosi: u8) -> u8 {
        0
    }
}

impl IrqLine for Disconnected {
    fn set_level(&mut self, _asserted: bool) {}
}

impl ChipSelect for Disconnected {
    fn set_level(&mut self, _line: usize, _high: bool) {}
}

/// MISO tied to MOSI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Loopback;

impl SpiBus for Loopback {
    fn transfer(&mut self, mosi: u8) -> u8 {
        mosi
    }
}

/// Records every level driven onto a line, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelLog {
    pub events: Vec<(usize, bool)>,
}

impl LevelLog {
    pub fn new() -> Self {
        LevelLog { events: Vec::new() }
    }

    /// Last level driven on `line`, if any.
    pub fn level(&self, line: usize) -> Option<bool> {
        self.events.iter().rev().find(|(l, _)| *l == line).map(|(_, v)| *v)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl IrqLine for LevelLog {
    fn set_level(&mut self, asserted: bool) {
        self.events.push((0, asserted));
    }
}

impl ChipSelect for LevelLog {
    fn set_level(&mut self, line: usize, high: bool) {
        self.events.push((line, high));
    }
}
