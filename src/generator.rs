// src/generator.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seeded row generation for integer and bounded-text columns
//!
//! Every row is drawn from a single Xoshiro256++ stream: columns left to right,
//! and for text columns the length draw precedes the character draws. The same
//! seed, schema and row count therefore reproduce the same dataset byte for byte.

use bytes::{BufMut, BytesMut};
use rand::{Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::*;
use crate::schema::{ColumnType, Schema};

/// Configuration for row generation
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of rows to produce before the generator is exhausted
    pub total_rows: u64,
    /// Random seed for reproducible data generation (None = use time + urandom)
    pub seed: Option<u64>,
    /// Lowest value drawn for integer columns (inclusive)
    pub int_min: i64,
    /// Highest value drawn for integer columns (inclusive)
    pub int_max: i64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            total_rows: DEFAULT_ROWS,
            seed: Some(DEFAULT_SEED as u64),
            int_min: INT_MIN,
            int_max: INT_MAX,
        }
    }
}

impl GeneratorConfig {
    /// Map a command-line seed to a config seed: negative means non-deterministic
    pub fn seed_from_cli(seed: i64) -> Option<u64> {
        u64::try_from(seed).ok()
    }
}

/// A single generated column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    /// Unquoted text; quotes are added when rendered
    Text(String),
}

impl Value {
    fn write_to(&self, out: &mut BytesMut) {
        match self {
            Value::Int(v) => put_decimal(out, *v),
            Value::Text(s) => {
                out.put_u8(TEXT_QUOTE);
                out.put_slice(s.as_bytes());
                out.put_u8(TEXT_QUOTE);
            }
        }
    }
}

/// Append `v` in decimal without a heap allocation
fn put_decimal(out: &mut BytesMut, v: i64) {
    let mut digits = [0u8; 20];
    let mut pos = digits.len();
    let mut n = v.unsigned_abs();
    loop {
        pos -= 1;
        digits[pos] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    if v < 0 {
        out.put_u8(b'-');
    }
    out.put_slice(&digits[pos..]);
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// One logical row, rendered as `v1, v2, ...\n`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Append the serialized row, terminator included
    pub fn write_to(&self, out: &mut BytesMut) {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                out.put_slice(FIELD_SEPARATOR.as_bytes());
            }
            value.write_to(out);
        }
        out.put_u8(ROW_TERMINATOR);
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(FIELD_SEPARATOR)?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str("\n")
    }
}

/// Produces `total_rows` rows for a schema, one at a time
pub struct RowGenerator {
    schema: Schema,
    rng: Xoshiro256PlusPlus,
    seed: u64,
    int_min: i64,
    int_max: i64,
    total_rows: u64,
    produced: u64,
}

impl RowGenerator {
    /// Create new row generator
    pub fn new(schema: Schema, config: GeneratorConfig) -> Self {
        // Use provided seed or generate entropy from time + urandom
        let seed = config.seed.unwrap_or_else(generate_call_entropy);
        let (int_min, int_max) = if config.int_min <= config.int_max {
            (config.int_min, config.int_max)
        } else {
            (config.int_max, config.int_min)
        };

        tracing::info!(
            "Creating RowGenerator: rows={}, columns={} ({}), seed={} ({})",
            config.total_rows,
            schema.len(),
            schema.type_string(),
            seed,
            if config.seed.is_some() {
                "deterministic"
            } else {
                "non-deterministic"
            }
        );

        Self {
            schema,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            seed,
            int_min,
            int_max,
            total_rows: config.total_rows,
            produced: 0,
        }
    }

    /// Generate the next row, or `None` once `total_rows` rows were produced
    pub fn next_row(&mut self) -> Option<Row> {
        if self.is_exhausted() {
            return None;
        }

        let values = self
            .schema
            .columns()
            .iter()
            .map(|column| match column.column_type {
                ColumnType::Integer => Value::Int(self.rng.random_range(self.int_min..=self.int_max)),
                ColumnType::BoundedText(max_len) => {
                    Value::Text(generate_text(&mut self.rng, max_len))
                }
            })
            .collect();

        self.produced += 1;
        tracing::trace!("Generated row {}/{}", self.produced, self.total_rows);

        Some(Row { values })
    }

    /// Serialize the next row into `out`. Returns false once exhausted.
    pub fn write_next_row(&mut self, out: &mut BytesMut) -> bool {
        match self.next_row() {
            Some(row) => {
                row.write_to(out);
                true
            }
            None => false,
        }
    }

    /// Check if generation is complete
    pub fn is_exhausted(&self) -> bool {
        self.produced >= self.total_rows
    }

    /// Rows produced so far
    pub fn produced(&self) -> u64 {
        self.produced
    }

    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    pub fn remaining(&self) -> u64 {
        self.total_rows - self.produced
    }

    /// Effective seed, including one drawn from entropy
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl Iterator for RowGenerator {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.next_row()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining()) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

/// Draw 1..=max(1, max_len) characters from the text alphabet
fn generate_text<R: Rng>(rng: &mut R, max_len: usize) -> String {
    let len = rng.random_range(1..=max_len.max(1));
    (0..len)
        .map(|_| TEXT_ALPHABET[rng.random_range(0..TEXT_ALPHABET.len())] as char)
        .collect()
}

/// Generate per-call entropy from time + urandom
fn generate_call_entropy() -> u64 {
    let time_entropy = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;

    let urandom_entropy: u64 = {
        let mut rng = rand::rng();
        rng.next_u64()
    };

    time_entropy.wrapping_add(urandom_entropy)
}
