//! Index de-duplication
//!
//! Indexes covering the same set of columns are collapsed to one before any
//! `CREATE INDEX` is emitted. A unique index always wins over a non-unique
//! one; among equals the first declared index wins.

use std::collections::BTreeSet;

use crate::schema::types::{Index, Table};

/// The indexes of `table` that should be created, one per distinct column set
///
/// Groups keep the position of the first index seen for their column set.
pub fn deduplicate_indexes(table: &Table) -> Vec<&Index> {
    let mut groups: Vec<(BTreeSet<&str>, &Index)> = Vec::new();

    for index in &table.indexes {
        let column_set = index.column_set();

        match groups.iter_mut().find(|(set, _)| *set == column_set) {
            Some((_, kept)) => {
                if index.is_unique && !kept.is_unique {
                    tracing::debug!(
                        table = %table.name,
                        dropped = %kept.name,
                        kept = %index.name,
                        "Replacing non-unique index with unique index on the same columns"
                    );
                    *kept = index;
                } else {
                    tracing::debug!(
                        table = %table.name,
                        dropped = %index.name,
                        kept = %kept.name,
                        "Skipping redundant index"
                    );
                }
            }
            None => groups.push((column_set, index)),
        }
    }

    groups.into_iter().map(|(_, index)| index).collect()
}
