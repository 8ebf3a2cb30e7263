//! Naming utilities for access_export
//!
//! This module provides identifier quoting and the names synthesized for
//! target objects.

/// Quote an identifier as a SQLite string constant, doubling embedded quotes
///
/// See <http://www.sqlite.org/lang_expr.html>.
pub fn string_constant(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Quote every name and join them with `", "`
pub fn quoted_list<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|name| string_constant(name.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Name of a target index; source index names are per table, SQLite's are global
pub fn get_index_name(table_name: &str, index_name: &str) -> String {
    format!("{}_{}", table_name, index_name)
}

/// File name of a flat-file export, `<table>.<extension>`
pub fn format_file_name(table_name: &str, extension: &str) -> String {
    let sanitized = table_name.replace(['/', '\\'], "_");

    if extension.is_empty() {
        sanitized
    } else {
        format!("{}.{}", sanitized, extension)
    }
}
