// src/stream.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pull-based byte stream over a [`RowGenerator`]
//!
//! The bulk-load client asks for "up to N bytes"; [`RowStream::read`] tops up a
//! pending buffer with whole rows until it holds at least N bytes (or rows run
//! out), hands back a prefix and keeps the rest. Memory stays bounded by the read
//! size plus one row no matter how many rows the load asks for.

use bytes::{Bytes, BytesMut};
use std::io;

use crate::constants::ROW_TERMINATOR;
use crate::generator::RowGenerator;

/// Where a read is allowed to end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadBoundary {
    /// Cut at exactly the requested size. Reads may end mid-row; only the
    /// concatenation of all reads is row-exact.
    #[default]
    Exact,
    /// Cut after the last row terminator that fits in the request. A row longer
    /// than the request is split so a read never exceeds the requested size.
    RowAligned,
}

/// Adapter state, observable between reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Generator still has rows
    Filling,
    /// Generator exhausted, buffer still holds bytes
    Draining,
    /// Nothing left to return
    Exhausted,
}

/// Streaming adapter handed to the COPY sink
pub struct RowStream {
    generator: RowGenerator,
    // invariant: holds only whole rows appended by the generator, minus a
    // prefix already returned to the reader
    pending: BytesMut,
    boundary: ReadBoundary,
    state: StreamState,
    peak_buffered: usize,
    bytes_emitted: u64,
}

impl RowStream {
    pub fn new(generator: RowGenerator) -> Self {
        Self::with_boundary(generator, ReadBoundary::default())
    }

    pub fn with_boundary(generator: RowGenerator, boundary: ReadBoundary) -> Self {
        let state = if generator.is_exhausted() {
            StreamState::Exhausted
        } else {
            StreamState::Filling
        };
        Self {
            generator,
            pending: BytesMut::new(),
            boundary,
            state,
            peak_buffered: 0,
            bytes_emitted: 0,
        }
    }

    /// Return up to `requested` bytes of serialized rows.
    ///
    /// Returns `None` at end of stream, and also for `requested == 0`.
    pub fn read(&mut self, requested: usize) -> Option<Bytes> {
        if requested == 0 || self.state == StreamState::Exhausted {
            return None;
        }

        let mut rows_added = 0u64;
        while self.pending.len() < requested && self.generator.write_next_row(&mut self.pending) {
            rows_added += 1;
        }
        self.peak_buffered = self.peak_buffered.max(self.pending.len());

        if self.pending.is_empty() {
            self.state = StreamState::Exhausted;
            tracing::debug!(
                "RowStream exhausted: {} rows, {} bytes",
                self.generator.produced(),
                self.bytes_emitted
            );
            return None;
        }

        let cut = self.cut_point(requested);
        let chunk = self.pending.split_to(cut).freeze();
        self.bytes_emitted += chunk.len() as u64;

        self.state = if !self.generator.is_exhausted() {
            StreamState::Filling
        } else if self.pending.is_empty() {
            StreamState::Exhausted
        } else {
            StreamState::Draining
        };

        tracing::trace!(
            "read({}): +{} rows, returned {} bytes, {} pending, state={:?}",
            requested,
            rows_added,
            chunk.len(),
            self.pending.len(),
            self.state
        );

        Some(chunk)
    }

    fn cut_point(&self, requested: usize) -> usize {
        let available = self.pending.len();
        if available <= requested {
            return available;
        }
        match self.boundary {
            ReadBoundary::Exact => requested,
            ReadBoundary::RowAligned => {
                match memchr::memrchr(ROW_TERMINATOR, &self.pending[..requested]) {
                    Some(pos) => pos + 1,
                    None => requested,
                }
            }
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == StreamState::Exhausted
    }

    pub fn boundary(&self) -> ReadBoundary {
        self.boundary
    }

    /// Largest number of bytes held in the pending buffer so far
    pub fn peak_buffered(&self) -> usize {
        self.peak_buffered
    }

    /// Bytes currently held back for the next read
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    pub fn bytes_emitted(&self) -> u64 {
        self.bytes_emitted
    }

    pub fn rows_produced(&self) -> u64 {
        self.generator.produced()
    }

    pub fn generator(&self) -> &RowGenerator {
        &self.generator
    }
}

impl io::Read for RowStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match RowStream::read(self, buf.len()) {
            Some(chunk) => {
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(chunk.len())
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorConfig;
    use crate::schema::{Schema, TypeSpec};
    use std::io::Read;

    fn init_tracing() {
        use tracing_subscriber::{fmt, EnvFilter};
        let _ = fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    fn generator(schema: &Schema, total_rows: u64, seed: u64) -> RowGenerator {
        RowGenerator::new(
            schema.clone(),
            GeneratorConfig {
                total_rows,
                seed: Some(seed),
                ..Default::default()
            },
        )
    }

    fn drain(stream: &mut RowStream, read_size: usize) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.read(read_size) {
            assert!(!chunk.is_empty());
            assert!(chunk.len() <= read_size);
            out.extend_from_slice(&chunk);
        }
        out
    }

    fn rows_directly(schema: &Schema, total_rows: u64, seed: u64) -> Vec<u8> {
        let mut out = BytesMut::new();
        for row in generator(schema, total_rows, seed) {
            row.write_to(&mut out);
        }
        out.to_vec()
    }

    #[test]
    fn test_three_int_rows_single_read() {
        init_tracing();
        let schema = TypeSpec::Int.schema(1, 0, &[]).unwrap();
        let mut stream = RowStream::new(generator(&schema, 3, 42));

        let chunk = stream.read(1000).expect("first read returns data");
        assert_eq!(&chunk[..], &rows_directly(&schema, 3, 42)[..]);
        assert_eq!(chunk.iter().filter(|&&b| b == b'\n').count(), 3);
        assert!(chunk.ends_with(b"\n"));
        assert_eq!(stream.state(), StreamState::Exhausted);

        assert!(stream.read(1000).is_none());
        assert!(stream.read(1000).is_none());
        assert_eq!(stream.rows_produced(), 3);
    }

    #[test]
    fn test_one_byte_reads_lose_nothing() {
        init_tracing();
        let schema = TypeSpec::parse("iv", 3).unwrap().schema(0, 3, &[]).unwrap();
        let mut stream = RowStream::new(generator(&schema, 5, 42));

        let out = drain(&mut stream, 1);
        assert_eq!(out, rows_directly(&schema, 5, 42));

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 5);
        for line in text.lines() {
            assert_eq!(line.split(',').count(), 2);
        }
    }

    #[test]
    fn test_content_fidelity_across_read_sizes() {
        init_tracing();
        let schema = TypeSpec::parse("ivvi", 24).unwrap().schema(0, 24, &[]).unwrap();
        let expected = rows_directly(&schema, 2_000, 1234);

        for read_size in [1, 7, 64, 1000, 4096, 1 << 20] {
            let mut stream = RowStream::new(generator(&schema, 2_000, 1234));
            assert_eq!(drain(&mut stream, read_size), expected, "read_size={}", read_size);
            assert_eq!(stream.bytes_emitted(), expected.len() as u64);
        }
    }

    #[test]
    fn test_varying_read_sizes() {
        let schema = TypeSpec::Varchar.schema(3, 10, &[]).unwrap();
        let expected = rows_directly(&schema, 777, 8);

        let mut stream = RowStream::new(generator(&schema, 777, 8));
        let sizes = [3usize, 500, 1, 64, 10_000, 17];
        let mut out = Vec::new();
        let mut i = 0;
        while let Some(chunk) = stream.read(sizes[i % sizes.len()]) {
            out.extend_from_slice(&chunk);
            i += 1;
        }
        assert_eq!(out, expected);
    }

    #[test]
    fn test_reproducible_streams() {
        let schema = TypeSpec::parse("vi", 40).unwrap().schema(0, 40, &[]).unwrap();
        let mut a = RowStream::new(generator(&schema, 1_000, 99));
        let mut b = RowStream::new(generator(&schema, 1_000, 99));
        assert_eq!(drain(&mut a, 333), drain(&mut b, 333));
    }

    #[test]
    fn test_bounded_memory_with_many_rows() {
        init_tracing();
        let schema = TypeSpec::parse("iv", 32).unwrap().schema(0, 32, &[]).unwrap();
        let read_size = 4096;
        let mut stream = RowStream::new(generator(&schema, 10_000_000, 1));

        // Only a slice of the rows is pulled; the rest must never be materialized
        for _ in 0..2_000 {
            stream.read(read_size).expect("rows remain");
        }
        assert!(stream.peak_buffered() <= 4 * read_size);
        assert!(stream.buffered() < read_size);
        assert!(stream.rows_produced() < 10_000_000);
        assert_eq!(stream.state(), StreamState::Filling);
    }

    #[test]
    fn test_zero_size_read_is_end_of_stream_signal() {
        let schema = TypeSpec::Int.schema(1, 0, &[]).unwrap();
        let mut stream = RowStream::new(generator(&schema, 10, 1));

        assert!(stream.read(0).is_none());
        assert_eq!(stream.rows_produced(), 0);
        // a zero-size request does not end the stream
        assert_eq!(drain(&mut stream, 8), rows_directly(&schema, 10, 1));
    }

    #[test]
    fn test_zero_rows() {
        let schema = TypeSpec::Int.schema(2, 0, &[]).unwrap();
        let mut stream = RowStream::new(generator(&schema, 0, 1));
        assert_eq!(stream.state(), StreamState::Exhausted);
        assert!(stream.read(100).is_none());
    }

    #[test]
    fn test_draining_state() {
        let schema = TypeSpec::Varchar.schema(1, 8, &[]).unwrap();
        let mut stream = RowStream::new(generator(&schema, 4, 3));

        stream.read(1000).unwrap();
        assert_eq!(stream.state(), StreamState::Exhausted);

        // One byte short of everything: the last byte stays pending
        let mut stream = RowStream::new(generator(&schema, 4, 3));
        let total = rows_directly(&schema, 4, 3).len();
        let mut seen = 0;
        let mut states = Vec::new();
        while let Some(chunk) = stream.read(total - 1) {
            seen += chunk.len();
            states.push(stream.state());
        }
        assert_eq!(seen, total);
        assert_eq!(states, vec![StreamState::Draining, StreamState::Exhausted]);
    }

    #[test]
    fn test_row_aligned_reads_end_on_terminators() {
        let schema = TypeSpec::parse("ivi", 12).unwrap().schema(0, 12, &[]).unwrap();
        let expected = rows_directly(&schema, 500, 77);
        let mut stream = RowStream::with_boundary(generator(&schema, 500, 77), ReadBoundary::RowAligned);

        let mut out = Vec::new();
        while let Some(chunk) = stream.read(256) {
            assert!(chunk.len() <= 256);
            assert!(chunk.ends_with(b"\n"), "chunk ends mid-row: {:?}", chunk);
            out.extend_from_slice(&chunk);
        }
        assert_eq!(out, expected);
    }

    #[test]
    fn test_row_aligned_splits_oversized_rows() {
        let schema = TypeSpec::Varchar.schema(2, 30, &[]).unwrap();
        let expected = rows_directly(&schema, 20, 5);
        let mut stream = RowStream::with_boundary(generator(&schema, 20, 5), ReadBoundary::RowAligned);

        // Every row is at least 8 bytes, so 4 byte reads must split rows
        let out = drain(&mut stream, 4);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_io_read_impl() {
        let schema = TypeSpec::parse("vi", 5).unwrap().schema(0, 5, &[]).unwrap();
        let mut stream = RowStream::new(generator(&schema, 300, 21));

        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, rows_directly(&schema, 300, 21));

        let mut buf = [0u8; 16];
        assert_eq!(Read::read(&mut stream, &mut buf).unwrap(), 0);
    }
}
