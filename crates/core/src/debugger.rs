//! Debugging facilities.
//!
//! - **Register Viewer**: named dump of the whole register bank
//! - **Watchpoints**: trigger on register reads/writes at given offsets
//!
//! Watchpoints are checked in [`SpiController::read`] and
//! [`SpiController::write`] on every access.
//!
//! [`SpiController::read`]: crate::SpiController::read
//! [`SpiController::write`]: crate::SpiController::write

use crate::regs::{register_name, REG_COUNT};

/// Watchpoint trigger type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    Write,
    Read,
    ReadWrite,
}

/// A register watchpoint.
#[derive(Debug, Clone)]
pub struct Watchpoint {
    /// Byte offset of the watched register
    pub offset: u64,
    pub kind: WatchKind,
    /// Only trigger when the accessed value equals this
    pub value_match: Option<u32>,
    pub hits: u64,
    pub enabled: bool,
}

/// Watchpoint trigger event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchHit {
    /// Watchpoint index
    pub index: usize,
    pub offset: u64,
    /// Register value before the access
    pub old_val: u32,
    /// Value written, or value returned for reads
    pub new_val: u32,
    /// Access kind that triggered
    pub access: WatchKind,
}

/// Debugger state.
#[derive(Debug, Clone, Default)]
pub struct Debugger {
    pub watchpoints: Vec<Watchpoint>,
    /// First hit since the last [`Debugger::take_hit`]
    pub watch_hit: Option<WatchHit>,
}

impl Debugger {
    pub fn new() -> Self {
        Debugger { watchpoints: Vec::new(), watch_hit: None }
    }

    /// Add a watchpoint. Returns its index.
    pub fn add_watchpoint(&mut self, offset: u64, kind: WatchKind) -> usize {
        let idx = self.watchpoints.len();
        self.watchpoints.push(Watchpoint {
            offset, kind, value_match: None, hits: 0, enabled: true,
        });
        idx
    }

    /// Remove a watchpoint by index.
    pub fn remove_watchpoint(&mut self, idx: usize) -> bool {
        if idx < self.watchpoints.len() {
            self.watchpoints.remove(idx);
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn check_write(&mut self, offset: u64, old_val: u32, new_val: u32) {
        self.check(offset, old_val, new_val, WatchKind::Write);
    }

    #[inline]
    pub fn check_read(&mut self, offset: u64, old_val: u32, val: u32) {
        self.check(offset, old_val, val, WatchKind::Read);
    }

    fn check(&mut self, offset: u64, old_val: u32, new_val: u32, access: WatchKind) {
        if self.watchpoints.is_empty() { return; }
        for (i, wp) in self.watchpoints.iter_mut().enumerate() {
            if !wp.enabled || wp.offset != offset { continue; }
            let wanted = match wp.kind {
                WatchKind::ReadWrite => true,
                k => k == access,
            };
            if !wanted { continue; }
            if let Some(v) = wp.value_match {
                if new_val != v { continue; }
            }
            wp.hits += 1;
            if self.watch_hit.is_none() {
                self.watch_hit = Some(WatchHit { index: i, offset, old_val, new_val, access });
            }
        }
    }

    /// Take pending watchpoint hit (returns and clears it).
    pub fn take_hit(&mut self) -> Option<WatchHit> {
        self.watch_hit.take()
    }

    /// Format watchpoints list.
    pub fn list_watchpoints(&self) -> String {
        if self.watchpoints.is_empty() { return "No watchpoints set.\n".into(); }
        let mut s = String::new();
        for (i, wp) in self.watchpoints.iter().enumerate() {
            let k = match wp.kind {
                WatchKind::Write => "W",
                WatchKind::Read => "R",
                WatchKind::ReadWrite => "RW",
            };
            let en = if wp.enabled { " " } else { "!" };
            let vm = wp.value_match.map(|v| format!(" =0x{:08X}", v)).unwrap_or_default();
            let name = register_name(wp.offset).unwrap_or("-");
            s.push_str(&format!("  [{}]{} 0x{:02X} {:<7} {:<2} hits={}{}\n",
                i, en, wp.offset, name, k, wp.hits, vm));
        }
        s
    }
}

/// Named dump of a register bank, one register per line. Unnamed words are
/// listed only when non-zero.
pub fn dump_registers(regs: &[u32]) -> String {
    let mut s = String::new();
    for (i, &v) in regs.iter().enumerate().take(REG_COUNT) {
        let offset = (i * 4) as u64;
        match register_name(offset) {
            Some(name) => s.push_str(&format!("  0x{:02X} {:<7} = 0x{:08X}\n", offset, name, v)),
            None if v != 0 => s.push_str(&format!("  0x{:02X} {:<7} = 0x{:08X}\n", offset, "?", v)),
            None => {}
        }
    }
    s
}
