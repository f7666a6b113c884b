use anyhow::{Context, Result};
use clap::Parser;
use fastaccess::bench::{self, BenchConfig};
use fastaccess::cli::{fmt, CacheArgs, Cli, Command};
use fastaccess::FastaStore;
use log::LevelFilter;
use std::io::{self, BufWriter, Write};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    match cli.command {
        Command::Index { fasta, force, cache } => index(&fasta, force, &cache, cli.verbose),
        Command::Fetch {
            fasta,
            name,
            start,
            stop,
            reverse_complement,
            line_width,
            cache,
        } => {
            let store = open_store(&fasta, &cache)?;
            let seq = if reverse_complement {
                store.fetch_reverse_complement(&name, start, stop)
            } else {
                store.fetch(&name, start, stop)
            }
            .with_context(|| format!("Failed to fetch {}:{}-{}", name, start, stop))?;

            let suffix = if reverse_complement { "/rc" } else { "" };
            let header = format!("{}:{}-{}{}", name, start, stop, suffix);
            write_fasta_record(&header, &seq, line_width).context("Failed to write sequence")
        }
        Command::Info {
            fasta,
            name,
            json,
            cache,
        } => {
            let store = open_store(&fasta, &cache)?;
            let info = store.get_info(&name)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("{}: {}", fmt::param_aligned("Name", 12), info.name);
                println!("{}: {}", fmt::param_aligned("Description", 12), info.description);
                println!("{}: {}", fmt::param_aligned("Length", 12), info.length);
            }
            Ok(())
        }
        Command::List { fasta, cache } => {
            let store = open_store(&fasta, &cache)?;
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            for entry in store.index() {
                writeln!(out, "{}\t{}", entry.name, entry.length)?;
            }
            out.flush()?;
            Ok(())
        }
        Command::Bench {
            sequences,
            length,
            fetches,
            batch_size,
            seed,
            dir,
        } => {
            let config = BenchConfig {
                sequences,
                sequence_length: length,
                fetches,
                batch_size,
                seed,
                ..BenchConfig::default()
            };
            run_bench(dir.as_deref(), &config)
        }
    }
}

fn init_logging(verbose: bool, debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    let env = env_logger::Env::default().default_filter_or(level.as_str());
    // RUST_LOG still takes precedence over the flags
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn open_store(fasta: &Path, cache: &CacheArgs) -> Result<FastaStore> {
    FastaStore::open_with(fasta, cache.store_options())
        .with_context(|| format!("Failed to index FASTA file: {}", fasta.display()))
}

fn index(fasta: &Path, force: bool, cache: &CacheArgs, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!("{}", fmt::progress(format!("Indexing {}...", fasta.display())));
    }

    let mut store = open_store(fasta, cache)?;
    if force && store.is_cached() {
        store
            .rebuild_index()
            .with_context(|| format!("Failed to rebuild index of {}", fasta.display()))?;
    }

    let index = store.index();
    eprintln!("{}", fmt::header("Index Summary"));
    eprintln!("{}: {}", fmt::param_aligned("FASTA", 12), fasta.display());
    eprintln!("{}: {}", fmt::param_aligned("Sequences", 12), index.len());
    eprintln!("{}: {}", fmt::param_aligned("Total bases", 12), index.total_length());
    if cache.no_cache {
        eprintln!("{}: disabled", fmt::param_aligned("Cache", 12));
    } else {
        let source = if store.is_cached() && !force { "loaded" } else { "written" };
        eprintln!(
            "{}: {} ({})",
            fmt::param_aligned("Cache", 12),
            store.cache_path().display(),
            source
        );
        if !store.cache_exists() {
            eprintln!("{}", fmt::warning("Index cache could not be written"));
        }
    }
    Ok(())
}

fn write_fasta_record(header: &str, seq: &str, line_width: usize) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(out, ">{}", header)?;
    if line_width == 0 {
        writeln!(out, "{}", seq)?;
    } else {
        for line in seq.as_bytes().chunks(line_width) {
            out.write_all(line)?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()
}

fn run_bench(dir: Option<&Path>, config: &BenchConfig) -> Result<()> {
    let location = dir.map_or_else(|| "the system temp dir".to_string(), |d| d.display().to_string());
    eprintln!("{}", fmt::header("fastaccess Benchmark"));
    eprintln!(
        "{}",
        fmt::progress(format!(
            "Generating {} sequences x {} bp in {}...",
            config.sequences,
            config.sequence_length,
            location
        ))
    );

    let report = bench::run(dir, config).context("Benchmark failed")?;

    eprintln!();
    eprintln!("{}: {:.1} MB", fmt::param_aligned("File size", 16), report.file_size as f64 / 1024.0 / 1024.0);
    eprintln!("{}: {}", fmt::param_aligned("Sequences", 16), report.records);
    eprintln!("{}: {}", fmt::param_aligned("Total bases", 16), report.total_bases);
    eprintln!("{}: {:.3} s", fmt::param_aligned("Index build", 16), report.build.as_secs_f64());
    eprintln!("{}: {:.1} Mbp/s", fmt::param_aligned("Throughput", 16), report.build_throughput_mbps());
    eprintln!();

    for workload in &report.workloads {
        eprintln!(
            "{}: {} fetches, {:.3} s total, {:.3} ms/fetch, {} bases",
            fmt::param_aligned(workload.label, 16),
            workload.count,
            workload.elapsed.as_secs_f64(),
            workload.mean_ms(),
            workload.bases
        );
    }

    eprintln!();
    eprintln!("{}", fmt::success("Benchmark complete"));
    Ok(())
}
