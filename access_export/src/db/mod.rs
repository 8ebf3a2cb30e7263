//! Database module for access_export
//!
//! This module handles the SQLite target connection and statement execution.

pub mod connection;
pub mod executor;

// Re-export key types
pub use connection::DatabaseConnection;
