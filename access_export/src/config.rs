//! Configuration handling for access_export

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::schema::typemap::StorageClass;

/// Load configuration from a TOML file
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path).map_err(|e| {
        Error::ConfigError(format!("Failed to read config file '{}': {}", path.display(), e))
    })?;

    parse(&config_str)
}

/// Parse configuration from TOML text
pub fn parse(config_str: &str) -> Result<Config> {
    toml::from_str(config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))
}

/// Represents the complete access_export configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub logging: Option<LoggingConfig>,
    pub export: ExportConfig,
    pub csv: CsvConfig,
    pub type_mapping: TypeMappingConfig,
}

/// Output format of an export run
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// A new SQLite database file
    #[default]
    Sqlite,
    /// One CSV file per table in an existing directory
    Csv,
}

/// Export defaults used when the command line does not say otherwise
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    /// Allow-list of table names; absent means every table
    pub tables: Option<Vec<String>>,
}

/// Flat-file output configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CsvConfig {
    pub delimiter: char,
    pub extension: String,
    pub header: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            extension: "csv".to_string(),
            header: true,
        }
    }
}

impl CsvConfig {
    /// The delimiter as the single byte the CSV writer expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                Error::ConfigError(format!(
                    "CSV delimiter must be a single ASCII character, got '{}'",
                    self.delimiter
                ))
            })
    }
}

/// Type mapping configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TypeMappingConfig {
    /// Semantic type name to storage class
    pub overrides: HashMap<String, StorageClass>,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: "text".to_string(),
            stdout: true,
        }
    }
}
