//! Dashboard configuration

use crate::assembler::RenderSettings;
use crate::store::{LoadOptions, Strictness};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub map: MapConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Upper bound on request worker threads
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_workers: default_max_workers(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Beneficiary CSV file
    #[serde(default = "default_data_path")]
    pub path: PathBuf,

    /// Fail the whole load on the first invalid row instead of skipping it
    #[serde(default)]
    pub strict: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            strict: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Decimal places of the clustering grid (1 ≈ 11 km cells)
    #[serde(default = "default_grid_precision")]
    pub grid_precision: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            grid_precision: default_grid_precision(),
        }
    }
}

fn default_bind_addr() -> String { "127.0.0.1:3000".to_string() }
fn default_max_workers() -> usize { 8 }
fn default_data_path() -> PathBuf { PathBuf::from("data/sample_data.csv") }
fn default_grid_precision() -> u8 { 1 }

impl DashboardConfig {
    /// Reads `path` if it exists, otherwise returns the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn strictness(&self) -> Strictness {
        if self.data.strict {
            Strictness::Strict
        } else {
            Strictness::Lenient
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            strictness: self.strictness(),
            ..LoadOptions::default()
        }
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            grid_precision: self.map.grid_precision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let cfg = DashboardConfig::load(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(cfg, DashboardConfig::default());
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:3000");
        assert_eq!(cfg.strictness(), Strictness::Lenient);
        assert_eq!(cfg.render_settings().grid_precision, 1);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[data]
path = "/srv/dashboard/beneficiaries.csv"
strict = true

[map]
grid_precision = 2
"#
        )
        .unwrap();

        let cfg = DashboardConfig::load(file.path()).unwrap();
        assert_eq!(cfg.data.path, PathBuf::from("/srv/dashboard/beneficiaries.csv"));
        assert_eq!(cfg.strictness(), Strictness::Strict);
        assert_eq!(cfg.map.grid_precision, 2);
        assert_eq!(cfg.server.max_workers, 8);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[map]\ngrid_precision = \"fine\"").unwrap();
        assert!(matches!(
            DashboardConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
