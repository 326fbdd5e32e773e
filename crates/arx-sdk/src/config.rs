use std::path::{Path, PathBuf};

use arx_store::Compression;
use serde::{Deserialize, Serialize};

use crate::error::{ArxError, ArxResult};

/// Physical backend for data frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    /// `basic_columns.hds`
    #[default]
    Hds,
    /// `table.csv`, optionally zstd-compressed
    Csv,
}

impl FrameFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hds => "hds",
            Self::Csv => "csv",
        }
    }
}

/// Physical encoding of simple lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFormat {
    #[default]
    Json,
    Hds,
}

impl ListFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Hds => "hds",
        }
    }
}

/// Format preferences and safety switches of an [`Arx`](crate::Arx) session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxConfig {
    pub frame_format: FrameFormat,
    pub list_format: ListFormat,
    /// Compress CSV tables with zstd.
    pub compress_csv: bool,
    pub zstd_level: i32,
    /// Store homogeneous list columns of a data frame as typed vectors.
    pub convert_list_to_vector: bool,
    /// Re-hash data files when reading artifacts.
    pub verify_checksums: bool,
    /// Re-validate every artifact right after it is committed.
    pub validate_on_save: bool,
    /// Extra schemas, consulted after the built-in ones.
    pub schema_dir: Option<PathBuf>,
}

impl Default for ArxConfig {
    fn default() -> Self {
        Self {
            frame_format: FrameFormat::Hds,
            list_format: ListFormat::Json,
            compress_csv: true,
            zstd_level: 3,
            convert_list_to_vector: true,
            verify_checksums: false,
            validate_on_save: false,
            schema_dir: None,
        }
    }
}

impl ArxConfig {
    pub fn from_toml_str(text: &str) -> ArxResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ArxError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ArxResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ArxError::file(path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ArxResult<String> {
        toml::to_string_pretty(self).map_err(|e| ArxError::Config(e.to_string()))
    }

    fn check(&self) -> ArxResult<()> {
        if !(1..=22).contains(&self.zstd_level) {
            return Err(ArxError::Config(format!(
                "zstd_level must be between 1 and 22, got {}",
                self.zstd_level
            )));
        }
        Ok(())
    }

    /// Compression for hierarchical datasets and JSON documents.
    pub fn compression(&self) -> Compression {
        Compression::Zstd(self.zstd_level)
    }

    /// Compression for CSV tables.
    pub fn csv_compression(&self) -> Compression {
        if self.compress_csv {
            self.compression()
        } else {
            Compression::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ArxConfig::default();
        assert_eq!(c.frame_format, FrameFormat::Hds);
        assert_eq!(c.list_format, ListFormat::Json);
        assert!(c.compress_csv);
        assert!(c.convert_list_to_vector);
        assert!(!c.verify_checksums);
        assert_eq!(c.compression(), Compression::Zstd(3));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ArxConfig::from_toml_str(
            r#"
            frame_format = "csv"
            compress_csv = false
            schema_dir = "/opt/arx/schemas"
            "#,
        )
        .unwrap();
        assert_eq!(c.frame_format, FrameFormat::Csv);
        assert_eq!(c.csv_compression(), Compression::None);
        assert_eq!(c.list_format, ListFormat::Json);
        assert_eq!(c.schema_dir, Some(PathBuf::from("/opt/arx/schemas")));
    }

    #[test]
    fn toml_roundtrip_and_rejects_bad_values() {
        let mut c = ArxConfig::default();
        c.list_format = ListFormat::Hds;
        let text = c.to_toml_string().unwrap();
        assert_eq!(ArxConfig::from_toml_str(&text).unwrap(), c);

        assert!(matches!(
            ArxConfig::from_toml_str("zstd_level = 40"),
            Err(ArxError::Config(_))
        ));
        assert!(ArxConfig::from_toml_str("frame_format = \"parquet\"").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arx.toml");
        std::fs::write(&path, "verify_checksums = true\n").unwrap();
        assert!(ArxConfig::load(&path).unwrap().verify_checksums);
        assert!(ArxConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
