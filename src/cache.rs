//! JSON sidecar persistence for an [`Index`].
//!
//! The cache stores the FASTA file's modification time next to the entries.
//! A cache is only trusted when that timestamp matches the file's current
//! modification time exactly; there is no content hashing.
//!
//! ```text
//! {
//!   "fasta_mtime": 1718031112.5123,
//!   "sequences": {
//!     "chr1": { "name": "chr1", "description": "", "length": 44, ... }
//!   }
//! }
//! ```

use crate::error::CacheError;
use crate::index::{Entry, Index};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Extension appended to the FASTA file name to form the cache file name.
pub const CACHE_EXTENSION: &str = "fidx";

/// Source of file modification times, as seconds since the Unix epoch.
pub trait MtimeSource {
    fn mtime(&self, path: &Path) -> io::Result<f64>;
}

/// Reads modification times from the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMtime;

impl MtimeSource for FsMtime {
    fn mtime(&self, path: &Path) -> io::Result<f64> {
        let modified = fs::metadata(path)?.modified()?;
        Ok(match modified.duration_since(UNIX_EPOCH) {
            Ok(since) => since.as_secs_f64(),
            Err(before) => -before.duration().as_secs_f64(),
        })
    }
}

#[derive(Serialize)]
struct CacheFileOut<'a> {
    fasta_mtime: f64,
    sequences: SequenceMap<'a>,
}

struct SequenceMap<'a>(&'a Index);

impl Serialize for SequenceMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|entry| (&entry.name, entry)))
    }
}

#[derive(Deserialize)]
struct CacheFileIn {
    fasta_mtime: f64,
    #[serde(deserialize_with = "deserialize_sequences")]
    sequences: Vec<Entry>,
}

// serde_json's default map type sorts keys, so read the map by hand to keep
// file order.
fn deserialize_sequences<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Entry>, D::Error> {
    struct SequencesVisitor;

    impl<'de> Visitor<'de> for SequencesVisitor {
        type Value = Vec<Entry>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map from sequence name to index entry")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, entry)) = map.next_entry::<String, Entry>()? {
                if key != entry.name {
                    return Err(de::Error::custom(format!(
                        "key '{}' does not match entry name '{}'",
                        key, entry.name
                    )));
                }
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(SequencesVisitor)
}

/// Serializes an index and the FASTA modification time it was built from.
pub fn encode(index: &Index, fasta_mtime: f64) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&CacheFileOut {
        fasta_mtime,
        sequences: SequenceMap(index),
    })
}

/// Parses cache contents into the stored modification time and index.
pub fn decode(json: &str) -> serde_json::Result<(f64, Vec<Entry>)> {
    let cache: CacheFileIn = serde_json::from_str(json)?;
    Ok((cache.fasta_mtime, cache.sequences))
}

/// Writes the cache file.
pub fn save(cache_path: &Path, index: &Index, fasta_mtime: f64) -> Result<(), CacheError> {
    let json = encode(index, fasta_mtime).map_err(|source| CacheError::Json {
        path: cache_path.to_path_buf(),
        source,
    })?;
    fs::write(cache_path, json).map_err(|source| CacheError::Io {
        path: cache_path.to_path_buf(),
        source,
    })
}

/// Reads the cache file, rejecting it unless it was written for
/// `current_mtime` and every entry has an addressable line layout.
pub fn load(cache_path: &Path, current_mtime: f64) -> Result<Index, CacheError> {
    let json = fs::read_to_string(cache_path).map_err(|source| CacheError::Io {
        path: cache_path.to_path_buf(),
        source,
    })?;
    let (stored, entries) = decode(&json).map_err(|source| CacheError::Json {
        path: cache_path.to_path_buf(),
        source,
    })?;

    if stored != current_mtime {
        return Err(CacheError::Stale {
            path: cache_path.to_path_buf(),
            stored,
            current: current_mtime,
        });
    }

    let to_cache_error = |source| CacheError::Index {
        path: cache_path.to_path_buf(),
        source,
    };
    for entry in &entries {
        entry.validate_layout().map_err(to_cache_error)?;
    }
    Index::from_entries(entries).map_err(to_cache_error)
}
