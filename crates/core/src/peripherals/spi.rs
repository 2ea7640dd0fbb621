//! SPI master controller.
//!
//! Register accesses arrive as byte offsets into the 0x78-byte MMIO window.
//! A write to TXDATA performs one full-duplex byte exchange on the spot:
//! there is no clock-cycle delay and no transfer-in-progress state, so the
//! received byte is already in RXDATA when the write returns. The TX
//! watermark pending bit is set by every transfer; reading IP sets the RX
//! watermark pending bit. Neither is ever cleared by the controller itself.
//!
//! RXDATA reads return the last received byte without starting a transfer.

use crate::bus::{ChipSelect, IrqLine, SpiBus};
use crate::config::SpiConfig;
use crate::debugger::Debugger;
use crate::error::{Error, Result};
use crate::regs::*;
use crate::savestate::SpiState;

use super::chip_select::ChipSelectDriver;
use super::irq::IrqLogic;

pub struct SpiController<B, I, C> {
    regs: RegisterBank,
    irq: IrqLogic,
    cs_driver: ChipSelectDriver,
    bus: B,
    irq_line: I,
    cs_lines: C,
    /// Register watchpoints
    pub debugger: Debugger,
    /// Total byte exchanges since construction
    pub transfers: u64,
}

impl<B: SpiBus, I: IrqLine, C: ChipSelect> SpiController<B, I, C> {
    /// Build a controller in reset state. Chip-select lines are driven to
    /// their reset levels before this returns.
    pub fn new(config: SpiConfig, bus: B, irq_line: I, cs_lines: C) -> Result<Self> {
        config.validate()?;
        let mut spi = SpiController {
            regs: RegisterBank::new(),
            irq: IrqLogic::new(),
            cs_driver: ChipSelectDriver::new(config.num_cs as usize),
            bus,
            irq_line,
            cs_lines,
            debugger: Debugger::new(),
            transfers: 0,
        };
        spi.reset();
        Ok(spi)
    }

    /// Zero the register bank, apply defaults and re-drive every output.
    pub fn reset(&mut self) {
        log::debug!("spi reset");
        self.regs.reset();
        self.update_irq();
        self.update_cs();
    }

    /// Handle a 32-bit register read at byte offset `offset`.
    pub fn read(&mut self, offset: u64) -> u32 {
        let old = self.regs.read(offset);
        let value = match offset & !3 {
            IP => {
                self.regs.set_bits(IP, IP_RXWM);
                self.update_irq();
                self.regs.read(IP)
            }
            RXDATA => {
                let r = self.regs.read(RXDATA);
                log::debug!("data received: {:#04x}", r);
                r
            }
            _ => {
                if word_index(offset).is_none() {
                    log::debug!("read from unmapped offset {:#x}", offset);
                }
                old
            }
        };
        log::trace!("read  {:#04x} = {:#010x}", offset, value);
        self.debugger.check_read(offset & !3, old, value);
        value
    }

    /// Handle a 32-bit register write at byte offset `offset`.
    pub fn write(&mut self, offset: u64, value: u32) {
        log::trace!("write {:#04x} = {:#010x}", offset, value);
        let offset = offset & !3;
        if word_index(offset).is_none() {
            log::debug!("write to unmapped offset {:#x} dropped", offset);
            return;
        }
        let old = self.regs.read(offset);
        self.debugger.check_write(offset, old, value);

        match offset {
            TXDATA => self.transfer(value),
            IE | IP => {
                self.regs.set(offset, value);
                self.update_irq();
            }
            CSID | CSDEF | CSMODE => {
                self.regs.set(offset, value);
                self.update_cs();
            }
            _ => self.regs.set(offset, value),
        }
    }

    /// Send the low byte of `value`, latch the reply into RXDATA and flag
    /// the TX watermark.
    fn transfer(&mut self, value: u32) {
        let mosi = value & DATA_MASK;
        self.regs.set(TXDATA, mosi);
        log::debug!("data to send: {:#04x}", mosi);

        let miso = self.bus.transfer(mosi as u8);
        self.regs.set(RXDATA, miso as u32);
        self.transfers += 1;
        log::debug!("data received: {:#04x}", miso);

        self.regs.set_bits(IP, IP_TXWM);
        self.update_irq();
    }

    fn update_irq(&mut self) {
        let ip = self.regs.read(IP);
        let ie = self.regs.read(IE);
        self.irq.recompute(ip, ie, &mut self.irq_line);
    }

    fn update_cs(&mut self) {
        let csid = self.regs.read(CSID);
        let csdef = self.regs.read(CSDEF);
        let csmode = self.regs.read(CSMODE);
        self.cs_driver.recompute(csid, csdef, csmode, &mut self.cs_lines);
    }

    /// Current level of the interrupt output.
    pub fn irq_level(&self) -> bool {
        self.irq.level()
    }

    /// Last level driven on chip-select line `line`.
    pub fn cs_level(&self, line: usize) -> Option<bool> {
        self.cs_driver.level(line)
    }

    pub fn num_cs(&self) -> usize {
        self.cs_driver.num_cs()
    }

    /// Register contents without read side effects.
    pub fn peek(&self, offset: u64) -> u32 {
        self.regs.read(offset)
    }

    pub fn registers(&self) -> &[u32] {
        self.regs.as_slice()
    }

    pub fn bus(&self) -> &B { &self.bus }
    pub fn bus_mut(&mut self) -> &mut B { &mut self.bus }
    pub fn irq_line(&self) -> &I { &self.irq_line }
    pub fn cs_lines(&self) -> &C { &self.cs_lines }

    /// Capture state for save state.
    pub fn save_state(&self) -> SpiState {
        SpiState {
            num_cs: self.cs_driver.num_cs() as u8,
            regs: self.regs.as_slice().to_vec(),
        }
    }

    /// Restore state from save state. The image is checked before anything
    /// is touched; outputs are re-driven from the restored registers.
    pub fn load_state(&mut self, s: &SpiState) -> Result<()> {
        let expected = self.cs_driver.num_cs() as u8;
        if s.num_cs != expected {
            return Err(Error::ChipSelectMismatch { found: s.num_cs, expected });
        }
        if !self.regs.load(&s.regs) {
            return Err(Error::RegisterCount { found: s.regs.len() });
        }
        self.update_irq();
        self.update_cs();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{Disconnected, LevelLog, Loopback};

    type Recorded = SpiController<Loopback, LevelLog, LevelLog>;

    fn make(num_cs: u8) -> Recorded {
        SpiController::new(SpiConfig::new(num_cs), Loopback, LevelLog::new(), LevelLog::new())
            .unwrap()
    }

    #[test]
    fn test_reset_state() {
        let mut spi = make(1);
        assert_eq!(spi.peek(TXMARK), 1);
        assert_eq!(spi.peek(CSDEF), 1);
        assert_eq!(spi.peek(IP), IP_TXWM | IP_RXWM);
        assert!(!spi.irq_level());
        assert!(spi.irq_line().events.is_empty());

        spi.write(SCKDIV, 7);
        spi.write(IE, 3);
        spi.reset();
        assert_eq!(spi.peek(SCKDIV), 0);
        assert_eq!(spi.peek(IE), 0);
        assert!(!spi.irq_level());
    }

    #[test]
    fn test_txdata_loopback_scenario() {
        let mut spi = make(1);
        spi.write(IP, 0);
        spi.write(TXDATA, 0x5A);
        assert_eq!(spi.peek(TXDATA), 0x5A);
        assert_eq!(spi.read(RXDATA), 0x5A);
        assert_eq!(spi.peek(IP) & IP_TXWM, IP_TXWM);
        // IE was clear: line stays low
        assert!(!spi.irq_level());
        assert!(spi.irq_line().events.is_empty());
    }

    #[test]
    fn test_txdata_with_ie_preset() {
        let mut spi = make(1);
        spi.write(IP, 0);
        spi.write(IE, IP_TXWM);
        assert!(!spi.irq_level());
        spi.write(TXDATA, 0x5A);
        assert!(spi.irq_level());
        assert_eq!(spi.irq_line().events, vec![(0, true)]);
    }

    #[test]
    fn test_rxdata_is_bus_reply() {
        let mut seen = Vec::new();
        {
            let bus = |mosi: u8| {
                seen.push(mosi);
                mosi.wrapping_mul(3) ^ 0x11
            };
            let mut spi = SpiController::new(SpiConfig::default(), bus, Disconnected, Disconnected)
                .unwrap();
            for b in [0x00u8, 0x01, 0x7F, 0x80, 0xFF] {
                spi.write(TXDATA, b as u32);
                assert_eq!(spi.read(RXDATA), (b.wrapping_mul(3) ^ 0x11) as u32);
                assert_ne!(spi.peek(IP) & IP_TXWM, 0);
            }
            // Only the low byte goes out
            spi.write(TXDATA, 0x1234);
            assert_eq!(spi.peek(TXDATA), 0x34);
            assert_eq!(spi.transfers, 6);
        }
        assert_eq!(seen, vec![0x00, 0x01, 0x7F, 0x80, 0xFF, 0x34]);
    }

    #[test]
    fn test_rxdata_read_does_not_transfer() {
        let mut spi = make(1);
        spi.write(TXDATA, 0x42);
        for _ in 0..3 {
            assert_eq!(spi.read(RXDATA), 0x42);
        }
        assert_eq!(spi.transfers, 1);
    }

    #[test]
    fn test_disconnected_bus_reads_zero() {
        let mut spi = SpiController::new(SpiConfig::default(), Disconnected, Disconnected, Disconnected)
            .unwrap();
        spi.write(TXDATA, 0xA5);
        assert_eq!(spi.read(RXDATA), 0);
    }

    #[test]
    fn test_ip_read_sets_rxwm() {
        let mut spi = make(1);
        spi.write(IE, IP_RXWM);
        spi.write(IP, 0);
        assert!(!spi.irq_level());
        assert_eq!(spi.read(IP), IP_RXWM);
        assert!(spi.irq_level());
        assert_eq!(spi.irq_line().events, vec![(0, true), (0, false), (0, true)]);
    }

    #[test]
    fn test_ie_toggle_notifies_once_per_change() {
        let mut spi = make(1);
        // IP = TXWM | RXWM after reset
        spi.write(IE, IP_TXWM);
        spi.write(IE, IP_TXWM);
        spi.write(IE, IP_TXWM | IP_RXWM);
        spi.write(IE, 0);
        spi.write(IE, 0);
        spi.write(IE, IP_RXWM);
        assert_eq!(spi.irq_line().events, vec![(0, true), (0, false), (0, true)]);
    }

    #[test]
    fn test_irq_matches_ip_and_ie() {
        for ip in 0..4u32 {
            for ie in 0..4u32 {
                let mut spi = make(1);
                spi.write(IP, ip);
                spi.write(IE, ie);
                assert_eq!(spi.irq_level(), ip & ie != 0, "ip={} ie={}", ip, ie);
            }
        }
    }

    #[test]
    fn test_chip_select_follows_csid() {
        let mut spi = make(4);
        spi.write(CSDEF, 0xF);
        for k in 0..4u32 {
            spi.write(CSID, k);
            for line in 0..4 {
                // active-low: selected line low, others idle high
                assert_eq!(spi.cs_level(line), Some(line as u32 != k), "csid={} line={}", k, line);
            }
        }
    }

    #[test]
    fn test_chip_select_reset_levels() {
        let spi = make(2);
        // CSDEF=1: line 0 idles high and is selected, line 1 idles low
        assert_eq!(spi.cs_lines().events, vec![(0, false), (1, false)]);
    }

    #[test]
    fn test_chip_select_mode_off() {
        let mut spi = make(1);
        assert_eq!(spi.cs_level(0), Some(false));
        spi.write(CSMODE, CSMODE_OFF);
        assert_eq!(spi.cs_level(0), Some(true));
        spi.write(CSMODE, CSMODE_AUTO);
        assert_eq!(spi.cs_level(0), Some(false));
        assert_eq!(spi.cs_lines().events, vec![(0, false), (0, true), (0, false)]);
    }

    #[test]
    fn test_stored_only_round_trip() {
        let mut spi = make(1);
        for (off, val) in [
            (SCKDIV, 0x0000_0FFF),
            (SCKMODE, 0x3),
            (DELAY0, 0x0001_0001),
            (DELAY1, 0x0000_0001),
            (FMT, 0x0008_0008),
            (TXMARK, 0x7),
            (RXMARK, 0x4),
            (FCTRL, 0x1),
            (FFMT, 0x0003_0007),
            (0x08, 0xDEAD_BEEF),
        ] {
            spi.write(off, val);
            assert_eq!(spi.read(off), val, "offset 0x{:02X}", off);
        }
    }

    #[test]
    fn test_out_of_range_write_is_noop() {
        let mut spi = make(1);
        let before = spi.registers().to_vec();
        spi.write(0x7C, 0xFF);
        assert_eq!(spi.read(0x7C), 0);
        assert_eq!(spi.read(0x1_0000), 0);
        assert_eq!(spi.registers(), &before[..]);
    }

    #[test]
    fn test_watchpoint_on_txdata() {
        use crate::debugger::WatchKind;
        let mut spi = make(1);
        spi.debugger.add_watchpoint(TXDATA, WatchKind::Write);
        spi.write(TXDATA, 0x99);
        let hit = spi.debugger.take_hit().unwrap();
        assert_eq!(hit.new_val, 0x99);
        assert_eq!(hit.access, WatchKind::Write);
    }

    #[test]
    fn test_state_round_trip() {
        let mut spi = make(2);
        spi.write(SCKDIV, 3);
        spi.write(IE, IP_TXWM);
        spi.write(CSID, 1);
        spi.write(TXDATA, 0x66);
        let state = spi.save_state();
        assert_eq!(state.regs.len(), REG_COUNT);

        let mut other = make(2);
        other.load_state(&state).unwrap();
        assert_eq!(other.registers(), spi.registers());
        assert!(other.irq_level());
        assert_eq!(other.cs_level(1), spi.cs_level(1));
    }

    #[test]
    fn test_state_rejects_malformed() {
        let mut spi = make(1);
        spi.write(SCKDIV, 9);
        let mut state = spi.save_state();
        state.regs.pop();
        assert!(matches!(
            spi.load_state(&state),
            Err(Error::RegisterCount { found }) if found == REG_COUNT - 1
        ));
        assert_eq!(spi.peek(SCKDIV), 9);

        let other = make(3).save_state();
        assert!(matches!(
            spi.load_state(&other),
            Err(Error::ChipSelectMismatch { found: 3, expected: 1 })
        ));
    }

    #[test]
    fn test_bad_config() {
        let r = SpiController::new(SpiConfig::new(40), Loopback, Disconnected, Disconnected);
        assert!(matches!(r, Err(Error::TooManyChipSelects(40))));
    }
}
