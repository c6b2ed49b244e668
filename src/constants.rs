// src/constants.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Seed used when none is given on the command line
pub const DEFAULT_SEED: i64 = 3_141_592;

/// Closed range for integer column values
pub const INT_MIN: i64 = 0;
pub const INT_MAX: i64 = 10_000;

/// Characters drawn for text columns
pub const TEXT_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Quote wrapped around every text value (matches `ENCLOSED BY '"'`)
pub const TEXT_QUOTE: u8 = b'"';

/// Separator between rendered values within a row
pub const FIELD_SEPARATOR: &str = ", ";

pub const ROW_TERMINATOR: u8 = b'\n';

/// Default rows per table
pub const DEFAULT_ROWS: u64 = 100_000;

/// Default maximum length of varchar columns
pub const DEFAULT_VARCHAR_SIZE: usize = 32;

/// Default table name prefix when the name is inferred
pub const DEFAULT_TABLE_PREFIX: &str = "T";

/// Default read size handed to the adapter (64 KiB)
/// Large enough to amortize per-message protocol overhead, small enough to keep
/// several chunks in flight without noticeable memory use
pub const DEFAULT_READ_SIZE: usize = 64 * 1024;

/// Default depth of the producer -> COPY channel
pub const DEFAULT_PREFETCH_DEPTH: usize = 4;

/// Connection defaults for a local single-node Vertica
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5433;
pub const DEFAULT_USER: &str = "dbadmin";
pub const DEFAULT_APPLICATION_NAME: &str = "tablegen";
