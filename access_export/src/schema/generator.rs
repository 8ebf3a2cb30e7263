//! SQL generator
//!
//! This module generates the SQLite statements that recreate a source table:
//! `CREATE TABLE` with its key constraints, `CREATE INDEX`, and the
//! parameterised `INSERT` used to load rows.

use crate::error::Result;
use crate::schema::typemap::TypeMapper;
use crate::schema::types::{Index, Relationship, Table};
use crate::utils::naming::{get_index_name, quoted_list, string_constant};

/// Generates target statements for source schema objects
pub trait SqlGenerator {
    /// `CREATE TABLE` for `table`, with foreign keys for the relationships that reference from it
    fn create_table(&self, table: &Table, relationships: &[Relationship]) -> Result<String>;

    /// `CREATE [UNIQUE] INDEX` for `index`
    fn create_index(&self, index: &Index) -> String;

    /// `INSERT` with one placeholder per column, in declared column order
    fn insert_into_table(&self, table: &Table) -> String;
}

/// Statement generator for SQLite targets
#[derive(Debug, Clone, Default)]
pub struct SqliteGenerator {
    type_mapper: TypeMapper,
}

impl SqliteGenerator {
    /// Create a generator using the given type mapper
    pub fn new(type_mapper: TypeMapper) -> Self {
        Self { type_mapper }
    }

    /// The type mapper used for column definitions
    pub fn type_mapper(&self) -> &TypeMapper {
        &self.type_mapper
    }

    /// `PRIMARY KEY('a', 'b')`
    fn primary_key_table_constraint(primary_key_columns: &[String]) -> String {
        format!("PRIMARY KEY({})", quoted_list(primary_key_columns))
    }

    /// `FOREIGN KEY('otherTableId') REFERENCES 'otherTable'('id')`
    fn foreign_key_table_constraint(relationship: &Relationship) -> String {
        format!(
            "FOREIGN KEY({}) REFERENCES {}({})",
            quoted_list(&relationship.to_columns),
            string_constant(&relationship.from_table.name),
            quoted_list(&relationship.from_columns)
        )
    }
}

impl SqlGenerator for SqliteGenerator {
    fn create_table(&self, table: &Table, relationships: &[Relationship]) -> Result<String> {
        let primary_key_columns = table.primary_key_columns();
        let mut definitions = Vec::with_capacity(table.columns.len());

        for column in &table.columns {
            let storage_class = self.type_mapper.map_column(table, column)?;
            let mut definition = format!("{} {}", string_constant(&column.name), storage_class);

            // Only a key on exactly this one column is written inline
            if primary_key_columns.len() == 1 && primary_key_columns[0] == column.name {
                definition.push_str(" PRIMARY KEY");
            }

            definitions.push(definition);
        }

        if primary_key_columns.len() > 1 {
            definitions.push(Self::primary_key_table_constraint(primary_key_columns));
        }

        for relationship in relationships {
            if !relationship.is_referenced_from(table) {
                continue;
            }
            definitions.push(Self::foreign_key_table_constraint(relationship));
        }

        Ok(format!(
            "CREATE TABLE {} ({})",
            string_constant(&table.name),
            definitions.join(", ")
        ))
    }

    fn create_index(&self, index: &Index) -> String {
        let unique = if index.is_unique { "UNIQUE " } else { "" };

        format!(
            "CREATE {}INDEX {} ON {} ({})",
            unique,
            string_constant(&get_index_name(&index.table_name, &index.name)),
            string_constant(&index.table_name),
            quoted_list(&index.columns)
        )
    }

    fn insert_into_table(&self, table: &Table) -> String {
        let column_names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        let placeholders = vec!["?"; column_names.len()].join(", ");

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            string_constant(&table.name),
            quoted_list(&column_names),
            placeholders
        )
    }
}
