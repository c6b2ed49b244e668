// Generate rows and write the COPY payload to a file - no database needed
// Load it later with: COPY T4v32 FROM LOCAL 'T4v32.csv' DELIMITER ',' ENCLOSED BY '"'

use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;
use tablegen::{GeneratorConfig, RowGenerator, RowStream, TypeSpec};

fn main() -> anyhow::Result<()> {
    let total_rows = 1_000_000;
    let chunk_size = 1024 * 1024; // 1 MB

    let spec = TypeSpec::Varchar;
    let schema = spec.schema(4, 32, &[])?;
    let table_name = spec.infer_table_name("T", 4, 32)?;

    let generator = RowGenerator::new(
        schema,
        GeneratorConfig {
            total_rows,
            seed: Some(42),
            ..Default::default()
        },
    );
    let mut stream = RowStream::new(generator);

    let path = format!("{}.csv", table_name);
    let mut file = BufWriter::new(File::create(&path)?);

    let start = Instant::now();
    while let Some(chunk) = stream.read(chunk_size) {
        file.write_all(&chunk)?;
    }
    file.flush()?;
    let elapsed = start.elapsed().as_secs_f64();

    println!(
        "Generated {} rows ({} bytes) into {} in {:.2}s",
        stream.rows_produced(),
        stream.bytes_emitted(),
        path,
        elapsed
    );
    println!(
        "Throughput: {:.2} MB/s, peak buffer {} bytes",
        stream.bytes_emitted() as f64 / elapsed / 1e6,
        stream.peak_buffered()
    );

    Ok(())
}
