//! Schema module for access_export
//!
//! This module holds the source schema model and translates it into target
//! statements.

pub mod generator;
pub mod indexes;
pub mod typemap;
pub mod types;

// Re-export key types
pub use generator::{SqlGenerator, SqliteGenerator};
pub use indexes::deduplicate_indexes;
pub use typemap::{StorageClass, TypeMapper};
pub use types::{Column, DataType, DatabaseSchema, Index, Relationship, Table};
