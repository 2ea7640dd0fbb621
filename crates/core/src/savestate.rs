//! Save state for the SPI controller.
//!
//! The persisted unit is the whole register bank. It is serialized with
//! bincode and deflate-compressed behind a small header so an image from a
//! differently-configured controller is rejected before anything is loaded.
//!
//! ## Image format
//!
//! ```text
//! +------------------+
//! | Magic "SSPI"     |  4 bytes
//! +------------------+
//! | Format version   |  u32 little-endian (currently 1)
//! +------------------+
//! | Chip-select count|  u8
//! +------------------+
//! | Compressed data  |  deflate-compressed bincode payload
//! +------------------+
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::regs::REG_COUNT;

/// Magic bytes identifying a state image.
const MAGIC: &[u8; 4] = b"SSPI";
/// Current state image format version.
const FORMAT_VERSION: u32 = 1;
/// Bytes before the compressed payload.
const HEADER_LEN: usize = 9;

/// Everything needed to resume a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiState {
    /// Chip-select lines of the controller the image came from
    #[serde(skip)]
    pub num_cs: u8,
    /// Register bank, word order
    pub regs: Vec<u32>,
}

/// Encode a state image.
pub fn encode(state: &SpiState) -> Result<Vec<u8>> {
    let payload = bincode::serialize(state)?;
    let compressed = miniz_oxide::deflate::compress_to_vec(&payload, 6);

    let mut out = Vec::with_capacity(HEADER_LEN + compressed.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.push(state.num_cs);
    out.extend_from_slice(&compressed);
    Ok(out)
}

/// Decode a state image, verifying header and register count.
pub fn decode(data: &[u8]) -> Result<SpiState> {
    if data.len() < HEADER_LEN {
        return Err(Error::Truncated(data.len()));
    }
    if &data[0..4] != MAGIC {
        return Err(Error::BadMagic);
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != FORMAT_VERSION {
        return Err(Error::UnsupportedVersion { found: version, expected: FORMAT_VERSION });
    }
    let num_cs = data[8];

    let decompressed = miniz_oxide::inflate::decompress_to_vec(&data[HEADER_LEN..])
        .map_err(|e| Error::Decompress(format!("{:?}", e)))?;

    let mut state: SpiState = bincode::deserialize(&decompressed)?;
    if state.regs.len() != REG_COUNT {
        return Err(Error::RegisterCount { found: state.regs.len() });
    }
    state.num_cs = num_cs;
    Ok(state)
}

/// Save state to file.
pub fn save_to_file(state: &SpiState, path: &Path) -> Result<()> {
    let out = encode(state)?;
    std::fs::write(path, out)?;
    log::debug!("state saved to {}", path.display());
    Ok(())
}

/// Load state from file.
pub fn load_from_file(path: &Path) -> Result<SpiState> {
    let data = std::fs::read(path)?;
    let state = decode(&data)?;
    log::debug!("state loaded from {}", path.display());
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SpiState {
        let mut regs = vec![0u32; REG_COUNT];
        regs[0] = 3;
        regs[REG_COUNT - 1] = 0x3;
        SpiState { num_cs: 2, regs }
    }

    #[test]
    fn test_encode_decode() {
        let img = encode(&sample()).unwrap();
        assert_eq!(&img[0..4], b"SSPI");
        assert_eq!(img[8], 2);
        assert_eq!(decode(&img).unwrap(), sample());
    }

    #[test]
    fn test_rejects_bad_header() {
        let mut img = encode(&sample()).unwrap();
        assert!(matches!(decode(&img[..5]), Err(Error::Truncated(5))));

        img[4] = 9;
        assert!(matches!(
            decode(&img),
            Err(Error::UnsupportedVersion { found: 9, expected: 1 })
        ));

        img[0] = b'X';
        assert!(matches!(decode(&img), Err(Error::BadMagic)));
    }

    #[test]
    fn test_rejects_wrong_register_count() {
        let mut short = sample();
        short.regs.truncate(REG_COUNT - 2);
        let img = encode(&short).unwrap();
        assert!(matches!(
            decode(&img),
            Err(Error::RegisterCount { found }) if found == REG_COUNT - 2
        ));
    }

    #[test]
    fn test_rejects_corrupt_payload() {
        let mut img = encode(&sample()).unwrap();
        img.truncate(HEADER_LEN + 1);
        assert!(decode(&img).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spi.state");
        save_to_file(&sample(), &path).unwrap();
        assert_eq!(load_from_file(&path).unwrap(), sample());
        assert!(matches!(
            load_from_file(&dir.path().join("missing.state")),
            Err(Error::Io(_))
        ));
    }
}
