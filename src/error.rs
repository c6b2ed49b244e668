// src/error.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for schema building, generation and bulk load

use thiserror::Error;

/// Errors that can occur while building a schema or loading a table.
#[derive(Error, Debug)]
pub enum Error {
    /// A type character other than `i` or `v` in a column type string.
    #[error("Unknown column type '{0}' (expected 'i' for int or 'v' for varchar)")]
    UnknownColumnType(char),

    /// Custom type strings cannot be turned into a table name.
    #[error("A table name is required when using per-column type strings such as \"viivi\"")]
    TableNameRequired,

    /// A schema must contain at least one column.
    #[error("Schema has no columns")]
    EmptySchema,

    /// Explicit column names do not line up with the column types.
    #[error("Got {names} column names for {columns} columns")]
    ColumnNameMismatch { names: usize, columns: usize },

    /// An explicit column name is empty or whitespace.
    #[error("Column name {index} is empty")]
    EmptyColumnName { index: usize },

    /// Connection or statement failure reported by the server.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// Failure writing a script or reading the row stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The background generation task did not finish cleanly.
    #[error("Row producer failed: {0}")]
    Producer(String),
}

pub type Result<T> = std::result::Result<T, Error>;
