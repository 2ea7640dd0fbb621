//! Construction-time configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::MAX_CS;

/// Controller build parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiConfig {
    /// Number of chip-select lines (one CSDEF bit each)
    pub num_cs: u8,
}

impl SpiConfig {
    pub fn new(num_cs: u8) -> Self {
        SpiConfig { num_cs }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_cs as usize > MAX_CS {
            return Err(Error::TooManyChipSelects(self.num_cs as usize));
        }
        Ok(())
    }
}

impl Default for SpiConfig {
    fn default() -> Self {
        SpiConfig { num_cs: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_one_line() {
        assert_eq!(SpiConfig::default().num_cs, 1);
        assert!(SpiConfig::default().validate().is_ok());
    }

    #[test]
    fn test_limit() {
        assert!(SpiConfig::new(32).validate().is_ok());
        assert!(SpiConfig::new(0).validate().is_ok());
        assert!(matches!(
            SpiConfig::new(33).validate(),
            Err(Error::TooManyChipSelects(33))
        ));
    }
}
