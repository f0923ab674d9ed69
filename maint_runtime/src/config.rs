//! Configuration for the tracker runtime.
//!
//! Read from an optional `maint.toml` in the working directory. Every key
//! has a default, so no file at all is the normal case.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, File};
use serde::Deserialize;

pub const DEFAULT_CONFIG_NAME: &str = "maint";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub departments_file: String,
    pub assets_file: String,
    pub technicians_file: String,
    pub orders_file: String,
    pub materials_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            departments_file: "departamentos.bin".to_string(),
            assets_file: "ativos.bin".to_string(),
            technicians_file: "tecnicos.bin".to_string(),
            orders_file: "ordens.bin".to_string(),
            materials_file: "materiais.bin".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// The same layout rooted somewhere else.
    pub fn rooted_at(dir: &Path) -> Self {
        Self {
            data_dir: dir.to_path_buf(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Activity log, relative to the data directory.
    pub activity_file: String,
    /// Diagnostics written through `tracing`, relative to the data directory.
    pub diagnostics_file: String,
    /// `tracing` filter directive, e.g. `warn` or `maint_engine=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            activity_file: "log.txt".to_string(),
            diagnostics_file: "diagnostics.log".to_string(),
            level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl TrackerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_NAME)
    }

    /// Load `<name>.toml` (or any format `config` recognises) if present.
    pub fn load_from(name: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(name).required(false))
            .build()?;

        config.try_deserialize()
    }

    pub fn activity_log_path(&self) -> PathBuf {
        self.storage.path(&self.logging.activity_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_file_gives_defaults() {
        let name = std::env::temp_dir()
            .join("maint_config_test_missing")
            .join("nothing_here");
        let config = TrackerConfig::load_from(&name.to_string_lossy()).unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.storage.assets_file, "ativos.bin");
        assert_eq!(config.activity_log_path(), PathBuf::from("./log.txt"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = std::env::temp_dir().join("maint_config_test_partial");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("maint.toml");
        fs::write(&file, "[storage]\ndata_dir = \"/var/lib/maint\"\n\n[logging]\nlevel = \"debug\"\n").unwrap();

        let config = TrackerConfig::load_from(&dir.join("maint").to_string_lossy()).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/maint"));
        assert_eq!(config.storage.orders_file, "ordens.bin");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.activity_file, "log.txt");

        let _ = fs::remove_dir_all(&dir);
    }
}
