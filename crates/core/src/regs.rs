//! Register map and register bank.
//!
//! The controller exposes a 0x78-byte MMIO window of 32-bit registers.
//! Offsets below are byte offsets; the bank itself is indexed by word
//! (`offset >> 2`).

/// Serial clock divisor
pub const SCKDIV: u64 = 0x00;
/// Serial clock mode
pub const SCKMODE: u64 = 0x04;
/// Chip select ID
pub const CSID: u64 = 0x10;
/// Chip select default (idle level per line)
pub const CSDEF: u64 = 0x14;
/// Chip select mode
pub const CSMODE: u64 = 0x18;
/// Delay control 0
pub const DELAY0: u64 = 0x28;
/// Delay control 1
pub const DELAY1: u64 = 0x2C;
/// Frame format
pub const FMT: u64 = 0x40;
/// Transmit data
pub const TXDATA: u64 = 0x48;
/// Receive data
pub const RXDATA: u64 = 0x4C;
/// Transmit watermark
pub const TXMARK: u64 = 0x50;
/// Receive watermark
pub const RXMARK: u64 = 0x54;
/// SPI flash interface control
pub const FCTRL: u64 = 0x60;
/// SPI flash instruction format
pub const FFMT: u64 = 0x64;
/// Interrupt enable
pub const IE: u64 = 0x70;
/// Interrupt pending
pub const IP: u64 = 0x74;

/// Size of the MMIO window in bytes.
pub const MMIO_SIZE: u64 = 0x78;
/// Number of 32-bit registers in the bank.
pub const REG_COUNT: usize = (MMIO_SIZE / 4) as usize;

/// IE/IP bit: transmit watermark
pub const IP_TXWM: u32 = 1 << 0;
/// IE/IP bit: receive watermark
pub const IP_RXWM: u32 = 1 << 1;

/// Significant bits of TXDATA / RXDATA
pub const DATA_MASK: u32 = 0xFF;

/// CSMODE encodings
pub const CSMODE_AUTO: u32 = 0;
pub const CSMODE_HOLD: u32 = 2;
pub const CSMODE_OFF: u32 = 3;

/// Named registers, in offset order.
pub const REGISTER_NAMES: &[(u64, &str)] = &[
    (SCKDIV, "SCKDIV"),
    (SCKMODE, "SCKMODE"),
    (CSID, "CSID"),
    (CSDEF, "CSDEF"),
    (CSMODE, "CSMODE"),
    (DELAY0, "DELAY0"),
    (DELAY1, "DELAY1"),
    (FMT, "FMT"),
    (TXDATA, "TXDATA"),
    (RXDATA, "RXDATA"),
    (TXMARK, "TXMARK"),
    (RXMARK, "RXMARK"),
    (FCTRL, "FCTRL"),
    (FFMT, "FFMT"),
    (IE, "IE"),
    (IP, "IP"),
];

/// Look up the name of the register at a byte offset.
pub fn register_name(offset: u64) -> Option<&'static str> {
    REGISTER_NAMES.iter().find(|(o, _)| *o == offset).map(|(_, n)| *n)
}

/// Word index for a byte offset, or `None` when outside the window.
#[inline]
pub fn word_index(offset: u64) -> Option<usize> {
    let idx = (offset >> 2) as usize;
    if idx < REG_COUNT { Some(idx) } else { None }
}

/// Flat storage for the controller's registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterBank {
    regs: [u32; REG_COUNT],
}

impl RegisterBank {
    /// Create a bank holding the reset values.
    pub fn new() -> Self {
        let mut bank = RegisterBank { regs: [0; REG_COUNT] };
        bank.reset();
        bank
    }

    /// Zero every register, then apply the named defaults.
    pub fn reset(&mut self) {
        self.regs = [0; REG_COUNT];
        self.set(TXMARK, 1);
        self.set(CSDEF, 1);
        // Both watermarks are trivially satisfied with empty FIFOs
        self.set(IP, IP_TXWM | IP_RXWM);
    }

    /// Read the register at a byte offset. Out of range reads return 0.
    pub fn read(&self, offset: u64) -> u32 {
        word_index(offset).map_or(0, |i| self.regs[i])
    }

    /// Write the register at a byte offset. Out of range writes are dropped.
    /// Returns true if the write landed in the bank.
    pub fn write(&mut self, offset: u64, value: u32) -> bool {
        match word_index(offset) {
            Some(i) => {
                self.regs[i] = value;
                true
            }
            None => false,
        }
    }

    /// Set a register that is known to be in range.
    #[inline]
    pub(crate) fn set(&mut self, offset: u64, value: u32) {
        self.write(offset, value);
    }

    /// OR bits into a register.
    #[inline]
    pub(crate) fn set_bits(&mut self, offset: u64, bits: u32) {
        let v = self.read(offset);
        self.set(offset, v | bits);
    }

    /// All registers in word order.
    pub fn as_slice(&self) -> &[u32] {
        &self.regs
    }

    /// Replace the bank contents. Returns false (and leaves the bank
    /// untouched) if `words` is not exactly `REG_COUNT` long.
    pub fn load(&mut self, words: &[u32]) -> bool {
        if words.len() != REG_COUNT {
            return false;
        }
        self.regs.copy_from_slice(words);
        true
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}
