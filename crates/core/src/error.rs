//! Error type for configuration and save-state handling.
//!
//! Register accesses never fail; every error here comes from building a
//! controller or moving its state in or out.

use thiserror::Error;

use crate::regs::REG_COUNT;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config: {0} chip-select lines (at most {})", crate::MAX_CS)]
    TooManyChipSelects(usize),
    #[error("state image too small ({0} bytes)")]
    Truncated(usize),
    #[error("invalid state image (bad magic)")]
    BadMagic,
    #[error("unsupported state version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("chip-select count mismatch: image={found} controller={expected}")]
    ChipSelectMismatch { found: u8, expected: u8 },
    #[error("register count mismatch: image={found} expected={}", REG_COUNT)]
    RegisterCount { found: usize },
    #[error("decompress error: {0}")]
    Decompress(String),
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
