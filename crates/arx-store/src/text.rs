use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Compression applied to a file or dataset payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compression {
    #[default]
    None,
    /// zstd at the given level.
    Zstd(i32),
}

impl Compression {
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Zstd(_))
    }

    /// Compress `data` according to this setting.
    pub fn compress(&self, data: &[u8]) -> StoreResult<Vec<u8>> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Zstd(level) => zstd::encode_all(data, *level)
                .map_err(|e| StoreError::CompressionFailed(e.to_string())),
        }
    }

    /// Inverse of [`Compression::compress`].
    pub fn decompress(&self, data: &[u8]) -> StoreResult<Vec<u8>> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Zstd(_) => {
                zstd::decode_all(data).map_err(|e| StoreError::DecompressionFailed(e.to_string()))
            }
        }
    }
}

/// Write bytes to `path`, compressing them first if requested.
pub fn write_bytes(path: &Path, data: &[u8], compression: Compression) -> StoreResult<()> {
    let bytes = compression.compress(data)?;
    std::fs::write(path, &bytes).map_err(|e| StoreError::file(path, e))?;
    debug!(path = %path.display(), raw = data.len(), stored = bytes.len(), "wrote file");
    Ok(())
}

/// Read a file, transparently decompressing zstd frames.
pub fn read_bytes(path: &Path) -> StoreResult<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|e| StoreError::file(path, e))?;
    if bytes.starts_with(&ZSTD_MAGIC) {
        Compression::Zstd(0).decompress(&bytes)
    } else {
        Ok(bytes)
    }
}

/// Serialize a JSON document to `path`.
pub fn write_json(path: &Path, value: &serde_json::Value, compression: Compression) -> StoreResult<()> {
    let text = serde_json::to_vec(value)?;
    write_bytes(path, &text, compression)
}

/// Parse a JSON document from `path`, compressed or not.
pub fn read_json(path: &Path) -> StoreResult<serde_json::Value> {
    let bytes = read_bytes(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressed_json_is_detected_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json.zst");
        let doc = serde_json::json!({"type": "list", "values": [1, 2, 3]});
        write_json(&path, &doc, Compression::Zstd(3)).unwrap();
        assert_eq!(&std::fs::read(&path).unwrap()[..4], &ZSTD_MAGIC);
        assert_eq!(read_json(&path).unwrap(), doc);
    }

    #[test]
    fn plain_bytes_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        write_bytes(&path, b"hello", Compression::None).unwrap();
        assert_eq!(read_bytes(&path).unwrap(), b"hello");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_bytes(Path::new("/nonexistent/arx/file")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/arx/file"));
    }
}
