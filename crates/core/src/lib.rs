//! # spi-core
//!
//! Register-level model of a SiFive-style memory-mapped SPI master
//! controller, meant to be plugged into a machine emulator.
//!
//! The host routes 32-bit MMIO accesses to [`SpiController::read`] and
//! [`SpiController::write`] and supplies three collaborators: the downstream
//! bus ([`bus::SpiBus`]), the interrupt output ([`bus::IrqLine`]) and the
//! chip-select outputs ([`bus::ChipSelect`]). Every access completes
//! synchronously; a TXDATA write exchanges one byte before it returns.
//!
//! ## Architecture
//!
//! - [`regs`] — register offsets, IE/IP bits and the [`regs::RegisterBank`]
//! - [`peripherals`] — the controller, its interrupt logic and chip-select driver
//! - [`bus`] — collaborator traits plus [`bus::Disconnected`] and [`bus::Loopback`]
//! - [`config`] — [`SpiConfig`] construction parameters
//! - [`savestate`] — compressed register-bank images
//! - [`debugger`] — register viewer and watchpoints
//!
//! ## Example
//!
//! ```
//! use spi_core::{bus::{Disconnected, Loopback}, regs, SpiConfig, SpiController};
//!
//! let mut spi = SpiController::new(SpiConfig::default(), Loopback, Disconnected, Disconnected)?;
//! spi.write(regs::TXDATA, 0x5A);
//! assert_eq!(spi.read(regs::RXDATA), 0x5A);
//! # Ok::<(), spi_core::Error>(())
//! ```

pub mod bus;
pub mod config;
pub mod debugger;
pub mod error;
pub mod peripherals;
pub mod regs;
pub mod savestate;

pub use config::SpiConfig;
pub use error::{Error, Result};
pub use peripherals::SpiController;
pub use savestate::SpiState;

/// Most chip-select lines a controller can drive (one CSDEF bit each).
pub const MAX_CS: usize = 32;
