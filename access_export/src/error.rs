//! Error types for access_export

use std::path::PathBuf;

use thiserror::Error;

use crate::schema::types::DataType;

/// Result type for access_export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Exit status for malformed or insufficient arguments
pub const EXIT_STATUS_INVALID_USAGE: i32 = 1;
/// Exit status when the source database does not exist
pub const EXIT_STATUS_SOURCE_DOES_NOT_EXIST: i32 = 2;
/// Exit status when the SQLite target already exists
pub const EXIT_STATUS_TARGET_DOES_ALREADY_EXIST: i32 = 3;
/// Exit status when the source database cannot be read
pub const EXIT_STATUS_ERROR_OPENING_SOURCE: i32 = 4;
/// Exit status when the target database cannot be opened
pub const EXIT_STATUS_ERROR_OPENING_TARGET: i32 = 5;
/// Exit status for any other failure during the export
pub const EXIT_STATUS_EXPORT_FAILED: i32 = 6;
/// Exit status when the CSV target directory is missing or not a directory
pub const EXIT_STATUS_INVALID_TARGET_DIRECTORY: i32 = 7;

/// Error types for access_export
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("'{}' does not exist", .0.display())]
    SourceNotFound(PathBuf),

    #[error("'{}' does already exist", .0.display())]
    TargetExists(PathBuf),

    #[error("'{}' does not exist or is not a directory", .0.display())]
    InvalidTargetDirectory(PathBuf),

    #[error("Error opening the source database: {0}")]
    SourceOpenError(String),

    #[error("Error opening the target database: {0}")]
    TargetOpenError(String),

    #[error("Unsupported data type {data_type} for column '{column}' of table '{table}'")]
    UnsupportedType {
        table: String,
        column: String,
        data_type: DataType,
    },

    #[error("Error executing SQL '{sql}': {source}")]
    Execution {
        sql: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Source read error: {0}")]
    SourceReadError(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Wrap a failed statement together with its text
    pub fn execution(sql: impl Into<String>, source: sqlx::Error) -> Self {
        Error::Execution {
            sql: sql.into(),
            source,
        }
    }

    /// The process exit status reserved for this kind of failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ConfigError(_) => EXIT_STATUS_INVALID_USAGE,
            Error::SourceNotFound(_) => EXIT_STATUS_SOURCE_DOES_NOT_EXIST,
            Error::TargetExists(_) => EXIT_STATUS_TARGET_DOES_ALREADY_EXIST,
            Error::SourceOpenError(_) => EXIT_STATUS_ERROR_OPENING_SOURCE,
            Error::TargetOpenError(_) => EXIT_STATUS_ERROR_OPENING_TARGET,
            Error::InvalidTargetDirectory(_) => EXIT_STATUS_INVALID_TARGET_DIRECTORY,
            _ => EXIT_STATUS_EXPORT_FAILED,
        }
    }
}

/// Convert Serde JSON errors to access_export errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to access_export errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}
