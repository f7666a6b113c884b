// Command-line interface definition

use crate::store::StoreOptions;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fastaccess",
    version,
    about = "Indexed random access to subsequences of large FASTA files",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (info-level logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug-level logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Index cache settings shared by commands that open a FASTA file
#[derive(Args, Debug, Clone)]
pub struct CacheArgs {
    /// Directory for the index cache (default: next to the FASTA file)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Neither read nor write the index cache
    #[arg(long)]
    pub no_cache: bool,
}

impl CacheArgs {
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            use_cache: !self.no_cache,
            cache_dir: self.cache_dir.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Build (or load) the index of a FASTA file and summarize it
    Index {
        /// FASTA file to index
        #[arg(value_name = "FASTA")]
        fasta: PathBuf,

        /// Rebuild the index even if a valid cache exists
        #[arg(short, long)]
        force: bool,

        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Print a subsequence using 1-based inclusive coordinates
    Fetch {
        #[arg(value_name = "FASTA")]
        fasta: PathBuf,

        /// Sequence name
        name: String,

        /// Start position (1-based, inclusive)
        start: u64,

        /// Stop position (1-based, inclusive)
        stop: u64,

        /// Output the reverse complement
        #[arg(short = 'r', long)]
        reverse_complement: bool,

        /// Wrap output lines at this many bases (0 disables wrapping)
        #[arg(short = 'w', long, default_value = "60")]
        line_width: usize,

        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Show name, description and length of a sequence
    Info {
        #[arg(value_name = "FASTA")]
        fasta: PathBuf,

        /// Sequence name
        name: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        cache: CacheArgs,
    },

    /// List sequence names and lengths
    List {
        #[arg(value_name = "FASTA")]
        fasta: PathBuf,

        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Benchmark indexing and fetching on a generated FASTA file
    Bench {
        /// Number of sequences to generate
        #[arg(long, default_value = "10")]
        sequences: usize,

        /// Length of each generated sequence
        #[arg(long, default_value = "1000000")]
        length: u64,

        /// Number of small fetches
        #[arg(short = 'n', long, default_value = "1000")]
        fetches: usize,

        /// Number of queries in the batch workload
        #[arg(long, default_value = "100")]
        batch_size: usize,

        /// Random seed for reproducibility
        #[arg(short = 's', long, default_value = "0")]
        seed: u64,

        /// Directory for the generated file (default: system temp dir)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

/// Styled status messages for stderr
pub mod fmt {
    use console::style;
    use std::fmt::Display;

    pub fn header(text: impl Display) -> String {
        style(format!("=== {} ===", text)).bold().cyan().to_string()
    }

    pub fn param_aligned(name: &str, width: usize) -> String {
        style(format!("{:<width$}", name, width = width)).bold().to_string()
    }

    pub fn progress(text: impl Display) -> String {
        format!("{} {}", style("→").cyan(), text)
    }

    pub fn success(text: impl Display) -> String {
        format!("{} {}", style("✓").green().bold(), text)
    }

    pub fn warning(text: impl Display) -> String {
        format!("{} {}", style("!").yellow().bold(), text)
    }
}
