// src/lib.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synthetic column data generation with streaming COPY bulk load
//!
//! This library provides:
//! - Seeded Xoshiro256++ row generation for int and bounded varchar columns
//! - A pull-based byte stream that generates rows lazily (memory bounded by the
//!   read size, not the row count)
//! - Table lifecycle and `COPY ... FROM STDIN` loading over the
//!   PostgreSQL-derived wire protocol spoken by Vertica
//! - A file-like Python row source via PyO3 (optional)

// Core modules
pub mod config;
pub mod constants;
pub mod error;
pub mod generator;
pub mod loader;
pub mod schema;
pub mod sql;
pub mod stream;

// Python bindings
#[cfg(feature = "python-bindings")]
mod python_api;

// Re-export main API
pub use config::{ConnectionConfig, StreamConfig, TablePlan};
pub use error::{Error, Result};
pub use generator::{GeneratorConfig, Row, RowGenerator, Value};
pub use loader::{load_table, ChunkReceiver, CopyTarget, LoadMetrics, PgTarget, ScriptTarget};
pub use schema::{Column, ColumnType, Schema, TypeSpec};
pub use stream::{ReadBoundary, RowStream, StreamState};

// PyO3 module initialization
#[cfg(feature = "python-bindings")]
use pyo3::prelude::*;

#[cfg(feature = "python-bindings")]
#[pymodule]
fn _tablegen(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python_api::register_functions(m)?;
    Ok(())
}
