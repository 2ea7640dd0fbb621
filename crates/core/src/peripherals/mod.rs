//! SiFive-style SPI controller emulation.
//!
//! The controller is split along its hardware blocks:
//!
//! - [`SpiController`] — register dispatch and the transfer engine
//! - [`IrqLogic`] — IP/IE gating of the single interrupt output
//! - [`ChipSelectDriver`] — CSID/CSDEF/CSMODE to select-line levels

mod spi;
mod irq;
mod chip_select;

pub use spi::SpiController;
pub use irq::IrqLogic;
pub use chip_select::ChipSelectDriver;
