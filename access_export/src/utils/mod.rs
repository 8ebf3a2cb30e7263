//! Utilities for access_export
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use naming::{format_file_name, get_index_name, quoted_list, string_constant};
