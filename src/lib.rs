//! # fastaccess
//!
//! Indexed random access to subsequences of large multi-record FASTA files.
//!
//! One sequential pass over the file ([`build_index`]) records, for every
//! record, where its first base lives and how its lines are wrapped. Any
//! 1-based inclusive range can then be fetched with one seek and one bounded
//! read ([`fetch_subseq`]), independent of the record's total length.
//!
//! ```no_run
//! use fastaccess::FastaStore;
//!
//! let store = FastaStore::open("genome.fa")?;
//! let seq = store.fetch("chr1", 10_001, 20_000)?;
//! assert_eq!(seq.len(), 10_000);
//! # Ok::<(), fastaccess::FastaError>(())
//! ```

pub mod bench;
pub mod cache;
pub mod cli;
pub mod error;
pub mod fetch;
pub mod index;
pub mod sequence;
pub mod store;

pub use error::{CacheError, FastaError, Result};
pub use fetch::{fetch_from_reader, fetch_subseq};
pub use index::{Entry, Index, build_index};
pub use store::{FastaStore, SequenceInfo, StoreOptions};
