//! Synthetic benchmark of index building and subsequence fetching.

use crate::error::{FastaError, Result};
use crate::store::{FastaStore, StoreOptions};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

const NUCLEOTIDES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Parameters of a benchmark run.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub sequences: usize,
    pub sequence_length: u64,
    pub line_width: usize,
    /// Number of small fetches; medium and large workloads run 1/10 and 1/100 as many
    pub fetches: usize,
    pub batch_size: usize,
    pub seed: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            sequences: 10,
            sequence_length: 1_000_000,
            line_width: 60,
            fetches: 1000,
            batch_size: 100,
            seed: 0,
        }
    }
}

/// Timing of one fetch workload.
#[derive(Debug, Clone)]
pub struct Workload {
    pub label: &'static str,
    pub count: usize,
    pub bases: u64,
    pub elapsed: Duration,
}

impl Workload {
    /// Mean time per fetch in milliseconds.
    pub fn mean_ms(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.elapsed.as_secs_f64() * 1000.0 / self.count as f64
    }
}

/// Results of a benchmark run.
#[derive(Debug, Clone)]
pub struct BenchReport {
    pub file_size: u64,
    pub records: usize,
    pub total_bases: u64,
    pub build: Duration,
    pub workloads: Vec<Workload>,
}

impl BenchReport {
    /// Index building throughput in megabases per second.
    pub fn build_throughput_mbps(&self) -> f64 {
        let secs = self.build.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.total_bases as f64 / secs / 1_000_000.0
    }
}

/// Writes `sequences` random records of `length` bases wrapped at `line_width`.
///
/// Returns the number of bytes written.
pub fn write_synthetic_fasta<W: Write, R: Rng>(
    writer: W,
    sequences: usize,
    length: u64,
    line_width: usize,
    rng: &mut R,
) -> Result<u64> {
    if line_width == 0 {
        return Err(FastaError::format("line width must be positive"));
    }

    let mut writer = BufWriter::new(writer);
    let mut written: u64 = 0;
    let mut line = Vec::with_capacity(line_width + 1);

    for i in 1..=sequences {
        let header = format!(">seq{} Test sequence {}\n", i, i);
        writer.write_all(header.as_bytes())?;
        written += header.len() as u64;
        let mut remaining = length;
        while remaining > 0 {
            let width = remaining.min(line_width as u64);
            line.clear();
            line.extend((0..width).map(|_| NUCLEOTIDES[rng.random_range(0..NUCLEOTIDES.len())]));
            line.push(b'\n');
            writer.write_all(&line)?;
            written += line.len() as u64;
            remaining -= width;
        }
    }

    writer.flush()?;
    Ok(written)
}

/// Generates a synthetic FASTA file and times indexing and fetching.
///
/// The file is a uniquely named temporary file inside `dir` (or the system
/// temp directory) and is removed when the run finishes.
pub fn run(dir: Option<&Path>, config: &BenchConfig) -> Result<BenchReport> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut builder = tempfile::Builder::new();
    builder.prefix("fastaccess_bench").suffix(".fa");
    let scratch: NamedTempFile = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    let path = scratch.path();
    let file_size = write_synthetic_fasta(
        scratch.as_file(),
        config.sequences,
        config.sequence_length,
        config.line_width,
        &mut rng,
    )?;

    let options = StoreOptions {
        use_cache: false,
        cache_dir: None,
    };
    let started = Instant::now();
    let store = FastaStore::open_with(path, options)?;
    let build = started.elapsed();

    let names: Vec<String> = store.list_sequences().into_iter().map(String::from).collect();
    let mut workloads = Vec::new();
    for (label, window, count) in [
        ("small (100 bp)", 100, config.fetches),
        ("medium (10 kb)", 10_000, config.fetches / 10),
        ("large (100 kb)", 100_000, config.fetches / 100),
    ] {
        let queries = random_queries(&store, &names, window, count, &mut rng)?;
        workloads.push(time_fetches(&store, label, &queries, false)?);
    }

    let batch = random_queries(&store, &names, 100, config.batch_size, &mut rng)?;
    workloads.push(time_fetches(&store, "batch (100 bp)", &batch, true)?);

    Ok(BenchReport {
        file_size,
        records: store.index().len(),
        total_bases: store.index().total_length(),
        build,
        workloads,
    })
}

fn random_queries<R: Rng>(
    store: &FastaStore,
    names: &[String],
    window: u64,
    count: usize,
    rng: &mut R,
) -> Result<Vec<(String, u64, u64)>> {
    let mut queries = Vec::with_capacity(count);
    let candidates: Vec<(&String, u64)> = names
        .iter()
        .map(|name| store.get_length(name).map(|length| (name, length)))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .filter(|&(_, length)| length > 0)
        .collect();

    if candidates.is_empty() {
        return Ok(queries);
    }

    for i in 0..count {
        let (name, length) = candidates[i % candidates.len()];
        let span = window.min(length);
        let start = rng.random_range(1..=length - span + 1);
        queries.push((name.clone(), start, start + span - 1));
    }
    Ok(queries)
}

fn time_fetches(
    store: &FastaStore,
    label: &'static str,
    queries: &[(String, u64, u64)],
    batched: bool,
) -> Result<Workload> {
    let started = Instant::now();
    let bases = if batched {
        store.fetch_many(queries)?.iter().map(|s| s.len() as u64).sum()
    } else {
        let mut bases = 0;
        for (name, start, stop) in queries {
            bases += store.fetch(name, *start, *stop)?.len() as u64;
        }
        bases
    };

    Ok(Workload {
        label,
        count: queries.len(),
        bases,
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;
    use std::fs::{self, File};

    #[test]
    fn test_synthetic_fasta_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("synthetic.fa");
        let mut rng = StdRng::seed_from_u64(7);

        let written = write_synthetic_fasta(File::create(&path).unwrap(), 3, 130, 60, &mut rng).unwrap();
        assert_eq!(written, fs::metadata(&path).unwrap().len());
        let index = build_index(&path).unwrap();

        assert_eq!(index.len(), 3);
        let entry = index.get("seq2").unwrap();
        assert_eq!(entry.description, "Test sequence 2");
        assert_eq!(entry.length, 130);
        assert_eq!(entry.line_blen, 60);
        assert_eq!(entry.line_len, 61);
    }

    #[test]
    fn test_zero_line_width_rejected() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(write_synthetic_fasta(Vec::new(), 1, 10, 0, &mut rng).is_err());
    }

    #[test]
    fn test_small_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = BenchConfig {
            sequences: 2,
            sequence_length: 5_000,
            line_width: 70,
            fetches: 200,
            batch_size: 10,
            seed: 42,
        };

        let report = run(Some(dir.path()), &config).unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(report.total_bases, 10_000);

        let counts: Vec<usize> = report.workloads.iter().map(|w| w.count).collect();
        assert_eq!(counts, vec![200, 20, 2, 10]);
        assert_eq!(report.workloads[0].bases, 200 * 100);
        // windows larger than a record are clamped to the record length
        assert_eq!(report.workloads[2].bases, 2 * 5_000);
    }

    #[test]
    fn test_run_leaves_existing_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("fastaccess_bench.fa");
        fs::write(&existing, ">mine\nPRECIOUS\n").unwrap();
        let config = BenchConfig {
            sequences: 1,
            sequence_length: 500,
            fetches: 10,
            batch_size: 2,
            ..BenchConfig::default()
        };

        run(Some(dir.path()), &config).unwrap();

        assert_eq!(fs::read_to_string(&existing).unwrap(), ">mine\nPRECIOUS\n");
        let leftover: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftover.len(), 1);
    }
}
