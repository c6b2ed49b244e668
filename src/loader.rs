// src/loader.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Table lifecycle and streaming COPY load
//!
//! [`load_table`] drops and recreates the target table, then streams generated
//! rows into `COPY ... FROM STDIN`. Generation runs on a blocking task and feeds
//! a bounded channel so row generation overlaps with network I/O while the row
//! order stays exactly the generation order.

use async_trait::async_trait;
use bytes::Bytes;
use futures::SinkExt;
use std::io::Write;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, CopyInSink, NoTls};
use tracing::{debug, info, warn};

use crate::config::{ConnectionConfig, StreamConfig, TablePlan};
use crate::constants::ROW_TERMINATOR;
use crate::error::{Error, Result};
use crate::generator::{GeneratorConfig, RowGenerator};
use crate::stream::RowStream;

/// Something that can run statements and accept a COPY payload
#[async_trait]
pub trait CopyTarget: Send {
    /// Run a statement that returns no rows
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Run `sql` (a `COPY ... FROM STDIN`) fed by `chunks` until the producer
    /// signals the end of the stream. Returns the number of rows the target
    /// accepted. If `chunks` yields an error the COPY must not be committed.
    async fn copy_in(&mut self, sql: &str, chunks: ChunkReceiver) -> Result<u64>;
}

#[derive(Debug)]
enum Chunk {
    Data(Bytes),
    Done,
}

/// Receiving half of the producer channel.
///
/// The producer sends an explicit end marker after the last chunk, so a
/// channel that closes without one (the producer panicked or was cancelled)
/// is reported as [`Error::Producer`] instead of a short but complete stream.
pub struct ChunkReceiver {
    rx: mpsc::Receiver<Chunk>,
}

impl ChunkReceiver {
    /// Next payload chunk, `Ok(None)` once the producer finished
    pub async fn next(&mut self) -> Result<Option<Bytes>> {
        match self.rx.recv().await {
            Some(Chunk::Data(bytes)) => Ok(Some(bytes)),
            Some(Chunk::Done) => Ok(None),
            None => Err(Error::Producer(
                "row producer stopped before the end of the stream".to_string(),
            )),
        }
    }
}

fn chunk_channel(depth: usize) -> (mpsc::Sender<Chunk>, ChunkReceiver) {
    let (tx, rx) = mpsc::channel(depth.max(1));
    (tx, ChunkReceiver { rx })
}

/// Live server reached over the PostgreSQL-derived wire protocol
pub struct PgTarget {
    client: Client,
}

impl PgTarget {
    /// Connect and verify the session with a trivial query
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        info!(
            "Connecting to {}:{} as {} (database: {})",
            config.host,
            config.port,
            config.user,
            config.database.as_deref().unwrap_or("<default>")
        );

        let (client, connection) = config.to_pg_config().connect(NoTls).await?;

        // Spawn the connection task
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("Database connection error: {}", e);
            }
        });

        client.simple_query("SELECT 1").await?;

        Ok(Self { client })
    }
}

#[async_trait]
impl CopyTarget for PgTarget {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        debug!("Executing: {}", sql);
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    async fn copy_in(&mut self, sql: &str, mut chunks: ChunkReceiver) -> Result<u64> {
        debug!("Starting COPY: {}", sql);
        let sink: CopyInSink<Bytes> = self.client.copy_in(sql).await?;
        futures::pin_mut!(sink);

        // Returning early drops the sink unfinished, which aborts the COPY
        while let Some(chunk) = chunks.next().await? {
            sink.send(chunk).await?;
        }

        Ok(sink.as_mut().finish().await?)
    }
}

/// Writes the statements and the COPY payload as a script (dry run / export).
///
/// The payload is terminated by `\.` so the output can be replayed with an
/// interactive SQL client.
pub struct ScriptTarget<W> {
    writer: W,
}

impl<W: Write + Send> ScriptTarget<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: Write + Send> CopyTarget for ScriptTarget<W> {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        writeln!(self.writer, "{};", sql)?;
        Ok(())
    }

    async fn copy_in(&mut self, sql: &str, mut chunks: ChunkReceiver) -> Result<u64> {
        writeln!(self.writer, "{};", sql)?;

        let mut rows = 0u64;
        while let Some(chunk) = chunks.next().await? {
            rows += memchr::memchr_iter(ROW_TERMINATOR, &chunk).count() as u64;
            self.writer.write_all(&chunk)?;
        }

        self.writer.write_all(b"\\.\n")?;
        self.writer.flush()?;
        Ok(rows)
    }
}

/// Metrics from a load operation
#[derive(Debug, Clone, Default)]
pub struct LoadMetrics {
    /// Rows produced by the generator
    pub rows_generated: u64,
    /// Rows the target reported as loaded
    pub rows_loaded: u64,
    /// Bytes of COPY payload streamed
    pub bytes_streamed: u64,
    /// Number of chunks handed to the target
    pub chunk_count: u64,
    /// Largest pending buffer held by the row stream
    pub peak_buffered: usize,
    /// Total time including DDL
    pub total_duration: Duration,
    /// Time spent in COPY
    pub copy_duration: Duration,
}

impl LoadMetrics {
    /// Calculate rows per second over the COPY phase
    pub fn rows_per_second(&self) -> f64 {
        if self.copy_duration.as_secs_f64() > 0.0 {
            self.rows_loaded as f64 / self.copy_duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Calculate MiB per second over the COPY phase
    pub fn mib_per_second(&self) -> f64 {
        if self.copy_duration.as_secs_f64() > 0.0 {
            self.bytes_streamed as f64 / (1024.0 * 1024.0) / self.copy_duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// What the producer task saw by the time it stopped
#[derive(Debug, Clone, Copy)]
struct ProducerReport {
    rows: u64,
    bytes: u64,
    chunks: u64,
    peak_buffered: usize,
}

/// Run the row stream on a blocking task, feeding chunks into a bounded channel
fn spawn_producer(
    mut stream: RowStream,
    config: StreamConfig,
) -> (ChunkReceiver, JoinHandle<ProducerReport>) {
    let (tx, rx) = chunk_channel(config.prefetch_depth);
    let read_size = config.read_size.max(1);

    let handle = tokio::task::spawn_blocking(move || {
        let mut chunks = 0u64;
        let mut sink_open = true;
        while let Some(chunk) = stream.read(read_size) {
            if tx.blocking_send(Chunk::Data(chunk)).is_err() {
                debug!(
                    "COPY sink closed after {} chunks, stopping row producer",
                    chunks
                );
                sink_open = false;
                break;
            }
            chunks += 1;
        }
        if sink_open {
            let _ = tx.blocking_send(Chunk::Done);
        }
        ProducerReport {
            rows: stream.rows_produced(),
            bytes: stream.bytes_emitted(),
            chunks,
            peak_buffered: stream.peak_buffered(),
        }
    });

    (rx, handle)
}

/// Drop, recreate and bulk-load a table with generated rows.
///
/// Failures from the target are returned unchanged; the table is left in
/// whatever state the server left it.
pub async fn load_table<T: CopyTarget + ?Sized>(
    target: &mut T,
    plan: &TablePlan,
    generator: GeneratorConfig,
    stream: StreamConfig,
) -> Result<LoadMetrics> {
    let start_time = Instant::now();

    info!("Dropping table: {}", plan.table_name);
    target.execute(&plan.drop_sql()).await?;

    info!("Creating table: {}", plan.table_name);
    target.execute(&plan.create_sql()).await?;

    info!(
        "Loading {} rows into '{}' (read size: {}, boundary: {:?}, prefetch: {})",
        generator.total_rows,
        plan.table_name,
        stream.read_size,
        stream.boundary,
        stream.prefetch_depth
    );

    let row_stream = RowStream::with_boundary(
        RowGenerator::new(plan.schema.clone(), generator),
        stream.boundary,
    );
    let (chunks, producer) = spawn_producer(row_stream, stream);

    let copy_start = Instant::now();
    let copied = target.copy_in(&plan.copy_sql(), chunks).await;
    let copy_duration = copy_start.elapsed();

    // A producer failure explains a truncated stream better than the target does
    let report = producer
        .await
        .map_err(|e| Error::Producer(e.to_string()))?;
    let rows_loaded = copied?;

    if rows_loaded != report.rows {
        warn!(
            "Target reported {} rows loaded, {} were generated",
            rows_loaded, report.rows
        );
    }

    let metrics = LoadMetrics {
        rows_generated: report.rows,
        rows_loaded,
        bytes_streamed: report.bytes,
        chunk_count: report.chunks,
        peak_buffered: report.peak_buffered,
        total_duration: start_time.elapsed(),
        copy_duration,
    };

    info!(
        "Load complete: {} rows ({} bytes, {} chunks) in {:?} ({:.2} rows/sec, {:.2} MiB/sec)",
        metrics.rows_loaded,
        metrics.bytes_streamed,
        metrics.chunk_count,
        metrics.total_duration,
        metrics.rows_per_second(),
        metrics.mib_per_second()
    );

    Ok(metrics)
}
