//! Host configuration and the simulated downstream device.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use spi_core::bus::SpiBus;
use spi_core::SpiConfig;

/// Contents of the `--config` TOML file.
///
/// ```toml
/// [spi]
/// num_cs = 2
///
/// [device]
/// kind = "sequence"
/// bytes = [0xEF, 0x40, 0x18]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub spi: SpiConfig,
    pub device: DeviceConfig,
}

impl HostConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// What answers on MISO.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DeviceConfig {
    /// Empty bus, reads back 0
    Null,
    /// MISO tied to MOSI
    #[default]
    Loopback,
    /// Always answers `value`
    Constant { value: u8 },
    /// Answers `bytes` in order, wrapping around
    Sequence { bytes: Vec<u8> },
}

/// Downstream device built from a [`DeviceConfig`]. Remembers every byte
/// the controller sent.
#[derive(Debug, Clone)]
pub struct Device {
    kind: DeviceConfig,
    pos: usize,
    pub sent: Vec<u8>,
}

impl Device {
    pub fn new(kind: DeviceConfig) -> Self {
        Device { kind, pos: 0, sent: Vec::new() }
    }
}

impl SpiBus for Device {
    fn transfer(&mut self, mosi: u8) -> u8 {
        self.sent.push(mosi);
        match &self.kind {
            DeviceConfig::Null => 0,
            DeviceConfig::Loopback => mosi,
            DeviceConfig::Constant { value } => *value,
            DeviceConfig::Sequence { bytes } => {
                if bytes.is_empty() { return 0; }
                let b = bytes[self.pos % bytes.len()];
                self.pos += 1;
                b
            }
        }
    }
}
