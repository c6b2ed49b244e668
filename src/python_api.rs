// src/python_api.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Python bindings: a file-like row source for driver-side `COPY`

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyBytes;

use crate::constants::{DEFAULT_READ_SIZE, DEFAULT_SEED, DEFAULT_VARCHAR_SIZE};
use crate::generator::{GeneratorConfig, RowGenerator};
use crate::schema::TypeSpec;
use crate::sql;
use crate::stream::{ReadBoundary, RowStream};

/// File-like source of generated rows
///
/// Hand it to any driver that reads a COPY payload through `read(size)`.
///
/// # Example
/// ```python
/// import tablegen
///
/// src = tablegen.RowSource(rows=1_000_000, types="iv", varchar_size=16, seed=42)
/// cur.copy(src.copy_sql("mixed"), src)
/// ```
#[pyclass(name = "RowSource")]
struct PyRowSource {
    inner: RowStream,
}

#[pymethods]
impl PyRowSource {
    /// Create a row source
    ///
    /// # Arguments
    /// * `rows` - Rows to generate
    /// * `types` - "int", "varchar", or one of 'i'/'v' per column
    /// * `cols` - Column count for "int"/"varchar"
    /// * `varchar_size` - Maximum varchar length
    /// * `seed` - Random seed (negative = non-deterministic)
    /// * `row_aligned` - End every read on a row boundary
    #[new]
    #[pyo3(signature = (rows, types="int", cols=1, varchar_size=DEFAULT_VARCHAR_SIZE, seed=DEFAULT_SEED, row_aligned=false))]
    fn new(
        rows: u64,
        types: &str,
        cols: usize,
        varchar_size: usize,
        seed: i64,
        row_aligned: bool,
    ) -> PyResult<Self> {
        let schema = TypeSpec::parse(types, varchar_size)
            .and_then(|spec| spec.schema(cols, varchar_size, &[]))
            .map_err(|e| PyValueError::new_err(e.to_string()))?;

        let generator = RowGenerator::new(
            schema,
            GeneratorConfig {
                total_rows: rows,
                seed: GeneratorConfig::seed_from_cli(seed),
                ..Default::default()
            },
        );
        let boundary = if row_aligned {
            ReadBoundary::RowAligned
        } else {
            ReadBoundary::Exact
        };

        Ok(Self {
            inner: RowStream::with_boundary(generator, boundary),
        })
    }

    /// Read up to `size` bytes; empty bytes at end of stream.
    /// A negative size reads one default-sized chunk rather than everything.
    #[pyo3(signature = (size=-1))]
    fn read<'py>(&mut self, py: Python<'py>, size: isize) -> Bound<'py, PyBytes> {
        let requested = usize::try_from(size).unwrap_or(DEFAULT_READ_SIZE);
        match self.inner.read(requested) {
            Some(chunk) => PyBytes::new(py, &chunk),
            None => PyBytes::new(py, b""),
        }
    }

    /// `COPY` statement matching this source's columns
    fn copy_sql(&self, table_name: &str) -> String {
        sql::copy_from_stdin(table_name, self.inner.generator().schema())
    }

    /// `CREATE TABLE` statement matching this source's columns
    #[pyo3(signature = (table_name, partition=None))]
    fn create_sql(&self, table_name: &str, partition: Option<&str>) -> String {
        sql::create_table(table_name, self.inner.generator().schema(), partition)
    }

    /// Rows generated so far
    fn rows_produced(&self) -> u64 {
        self.inner.rows_produced()
    }

    /// Effective seed (useful when constructed with a negative seed)
    fn seed(&self) -> u64 {
        self.inner.generator().seed()
    }

    /// Check if the stream is exhausted
    fn is_exhausted(&self) -> bool {
        self.inner.is_exhausted()
    }
}

// =============================================================================
// Module Registration
// =============================================================================

pub fn register_functions(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyRowSource>()?;
    Ok(())
}
