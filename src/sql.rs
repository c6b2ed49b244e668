// src/sql.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Statement text for the table lifecycle and the COPY load

use crate::schema::Schema;

/// `DROP TABLE IF EXISTS <name> CASCADE`
pub fn drop_table(table_name: &str) -> String {
    format!("DROP TABLE IF EXISTS {} CASCADE", table_name)
}

/// `CREATE TABLE <name> (<col> <type>, ...) [PARTITION BY (<expr>)]`
pub fn create_table(table_name: &str, schema: &Schema, partition: Option<&str>) -> String {
    let columns = schema
        .columns()
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!("CREATE TABLE {} ({})", table_name, columns);
    if let Some(expr) = partition.map(str::trim).filter(|e| !e.is_empty()) {
        sql.push_str(&format!(" PARTITION BY ({})", expr));
    }
    sql
}

/// `COPY <name>(<cols>) FROM STDIN DELIMITER ','`, enclosed by double quotes
/// whenever the schema has a text column
pub fn copy_from_stdin(table_name: &str, schema: &Schema) -> String {
    let columns = schema.column_names().collect::<Vec<_>>().join(", ");
    let mut sql = format!("COPY {}({}) FROM STDIN DELIMITER ','", table_name, columns);
    if schema.has_text() {
        sql.push_str(" ENCLOSED BY '\"'");
    }
    sql
}
