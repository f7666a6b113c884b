//! High-level access to an indexed FASTA file.
//!
//! [`FastaStore`] builds the offset index on open (or loads it from a JSON
//! sidecar cache) and serves subsequence fetches from it. Cache problems are
//! never fatal: an unreadable, stale or unwritable cache only costs a
//! rebuild.

use crate::cache::{self, CACHE_EXTENSION, FsMtime, MtimeSource};
use crate::error::Result;
use crate::fetch::fetch_subseq;
use crate::index::{Index, build_index};
use crate::sequence::reverse_complement;
use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Options controlling index caching.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Load the index from, and save it to, a sidecar cache file
    pub use_cache: bool,
    /// Directory for the cache file; defaults to the FASTA file's directory
    pub cache_dir: Option<PathBuf>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_dir: None,
        }
    }
}

/// Summary metadata of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceInfo {
    pub name: String,
    pub description: String,
    pub length: u64,
}

/// Indexed FASTA file with cached index persistence.
///
/// # Example
/// ```no_run
/// use fastaccess::FastaStore;
///
/// let store = FastaStore::open("genome.fa")?;
/// let seq = store.fetch("chr1", 10_001, 20_000)?;
/// println!("{} {}", seq.len(), &seq[..30]);
///
/// let batch = store.fetch_many(&[("chr1", 1, 60), ("chr2", 500, 560)])?;
/// assert_eq!(batch[1].len(), 61);
/// # Ok::<(), fastaccess::FastaError>(())
/// ```
#[derive(Debug)]
pub struct FastaStore<M: MtimeSource = FsMtime> {
    path: PathBuf,
    cache_path: PathBuf,
    use_cache: bool,
    index: Index,
    loaded_from_cache: bool,
    mtime: M,
}

impl FastaStore<FsMtime> {
    /// Opens a FASTA file with default options (cache next to the file).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, StoreOptions::default())
    }

    /// Opens a FASTA file with explicit caching options.
    pub fn open_with<P: AsRef<Path>>(path: P, options: StoreOptions) -> Result<Self> {
        Self::open_with_source(path, options, FsMtime)
    }
}

impl<M: MtimeSource> FastaStore<M> {
    /// Opens a FASTA file, reading modification times through `mtime`.
    pub fn open_with_source<P: AsRef<Path>>(path: P, options: StoreOptions, mtime: M) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let cache_path = cache_path_for(&path, options.cache_dir.as_deref());

        let mut store = Self {
            path,
            cache_path,
            use_cache: options.use_cache,
            index: Index::new(),
            loaded_from_cache: false,
            mtime,
        };

        match store.load_cache() {
            Some(index) => {
                store.index = index;
                store.loaded_from_cache = true;
            }
            None => store.rebuild_index()?,
        }

        Ok(store)
    }

    fn load_cache(&self) -> Option<Index> {
        if !self.use_cache || !self.cache_path.exists() {
            return None;
        }

        let current = match self.mtime.mtime(&self.path) {
            Ok(mtime) => mtime,
            Err(e) => {
                warn!("Cannot read modification time of {}: {}", self.path.display(), e);
                return None;
            }
        };

        match cache::load(&self.cache_path, current) {
            Ok(index) => {
                info!("Loaded index of {} from {}", self.path.display(), self.cache_path.display());
                Some(index)
            }
            Err(e) => {
                info!("Ignoring index cache: {}", e);
                None
            }
        }
    }

    fn save_cache(&self) {
        let result = self
            .mtime
            .mtime(&self.path)
            .map_err(|e| e.to_string())
            .and_then(|mtime| {
                if let Some(dir) = self.cache_path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    fs::create_dir_all(dir).map_err(|e| e.to_string())?;
                }
                cache::save(&self.cache_path, &self.index, mtime).map_err(|e| e.to_string())
            });

        match result {
            Ok(()) => debug!("Wrote index cache {}", self.cache_path.display()),
            Err(e) => warn!("Could not write index cache {}: {}", self.cache_path.display(), e),
        }
    }

    /// Rebuilds the index from the FASTA file and refreshes the cache.
    ///
    /// Requires exclusive access, so no fetch can observe a half-built index.
    pub fn rebuild_index(&mut self) -> Result<()> {
        info!("Building index for {}", self.path.display());
        self.index = build_index(&self.path)?;
        if self.use_cache {
            self.save_cache();
        }
        Ok(())
    }

    /// Fetches bases `start..=stop` (1-based, inclusive) of `name`, uppercased.
    pub fn fetch(&self, name: &str, start: u64, stop: u64) -> Result<String> {
        fetch_subseq(&self.path, &self.index, name, start, stop)
    }

    /// Fetches a range and returns its reverse complement.
    pub fn fetch_reverse_complement(&self, name: &str, start: u64, stop: u64) -> Result<String> {
        self.fetch(name, start, stop)
            .map(|seq| reverse_complement(&seq))
    }

    /// Fetches several ranges, in order. Fails on the first invalid query.
    pub fn fetch_many<S: AsRef<str>>(&self, queries: &[(S, u64, u64)]) -> Result<Vec<String>> {
        queries
            .iter()
            .map(|(name, start, stop)| self.fetch(name.as_ref(), *start, *stop))
            .collect()
    }

    /// Record names in file order.
    pub fn list_sequences(&self) -> Vec<&str> {
        self.index.names().collect()
    }

    pub fn get_length(&self, name: &str) -> Result<u64> {
        Ok(self.index.entry(name)?.length)
    }

    pub fn get_description(&self, name: &str) -> Result<&str> {
        Ok(&self.index.entry(name)?.description)
    }

    pub fn get_info(&self, name: &str) -> Result<SequenceInfo> {
        let entry = self.index.entry(name)?;
        Ok(SequenceInfo {
            name: entry.name.clone(),
            description: entry.description.clone(),
            length: entry.length,
        })
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the index was loaded from the cache when the store was opened.
    pub fn is_cached(&self) -> bool {
        self.loaded_from_cache
    }

    pub fn cache_exists(&self) -> bool {
        self.cache_path.exists()
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Deletes the cache file. Returns `false` if there was none or it could
    /// not be removed.
    pub fn delete_cache(&self) -> bool {
        match fs::remove_file(&self.cache_path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Could not delete index cache {}: {}", self.cache_path.display(), e);
                false
            }
        }
    }
}

/// `<cache_dir>/<file name>.fidx`, or `<path>.fidx` without a cache directory.
fn cache_path_for(path: &Path, cache_dir: Option<&Path>) -> PathBuf {
    let mut file_name = match cache_dir {
        Some(_) => path
            .file_name()
            .unwrap_or(path.as_os_str())
            .to_os_string(),
        None => path.as_os_str().to_os_string(),
    };
    file_name.push(".");
    file_name.push(CACHE_EXTENSION);

    match cache_dir {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FastaError;
    use std::io;

    struct FixedMtime(f64);

    impl MtimeSource for FixedMtime {
        fn mtime(&self, _path: &Path) -> io::Result<f64> {
            Ok(self.0)
        }
    }

    fn write_fasta(dir: &Path) -> PathBuf {
        let path = dir.join("test.fa");
        fs::write(&path, ">chr1 first\nACGTACGT\nACGT\n>chr2\nggcc\n").unwrap();
        path
    }

    #[test]
    fn test_cache_path_for() {
        assert_eq!(
            cache_path_for(Path::new("data/genome.fa"), None),
            PathBuf::from("data/genome.fa.fidx")
        );
        assert_eq!(
            cache_path_for(Path::new("data/genome.fa"), Some(Path::new("/tmp/idx"))),
            PathBuf::from("/tmp/idx/genome.fa.fidx")
        );
    }

    #[test]
    fn test_cache_reused_when_mtime_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(dir.path());

        let first = FastaStore::open_with_source(&path, StoreOptions::default(), FixedMtime(10.0)).unwrap();
        assert!(!first.is_cached());
        assert!(first.cache_exists());

        let second = FastaStore::open_with_source(&path, StoreOptions::default(), FixedMtime(10.0)).unwrap();
        assert!(second.is_cached());
        assert_eq!(second.index(), first.index());
        assert_eq!(second.fetch("chr1", 7, 10).unwrap(), "GTAC");
    }

    #[test]
    fn test_cache_discarded_when_mtime_differs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(dir.path());

        FastaStore::open_with_source(&path, StoreOptions::default(), FixedMtime(10.0)).unwrap();
        let store = FastaStore::open_with_source(&path, StoreOptions::default(), FixedMtime(11.0)).unwrap();
        assert!(!store.is_cached());

        // the rebuilt index was written back with the new timestamp
        let again = FastaStore::open_with_source(&path, StoreOptions::default(), FixedMtime(11.0)).unwrap();
        assert!(again.is_cached());
    }

    #[test]
    fn test_corrupt_cache_rebuilds() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(dir.path());
        fs::write(cache_path_for(&path, None), "garbage").unwrap();

        let store = FastaStore::open_with_source(&path, StoreOptions::default(), FixedMtime(1.0)).unwrap();
        assert!(!store.is_cached());
        assert_eq!(store.get_length("chr1").unwrap(), 12);
    }

    #[test]
    fn test_inconsistent_cached_layout_rebuilds() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(dir.path());
        let layouts = [
            (12, 0, 0),
            (12, 1, u64::MAX),
        ];

        for (length, line_blen, line_len) in layouts {
            let cache = format!(
                r#"{{"fasta_mtime": 3.0, "sequences": {{"chr1": {{"name": "chr1",
                    "description": "first", "length": {length}, "line_blen": {line_blen},
                    "line_len": {line_len}, "offset": 12}}}}}}"#
            );
            fs::write(cache_path_for(&path, None), cache).unwrap();

            let store = FastaStore::open_with_source(&path, StoreOptions::default(), FixedMtime(3.0)).unwrap();
            assert!(!store.is_cached());
            assert_eq!(store.fetch("chr1", 2, 2).unwrap(), "C");
            assert_eq!(store.list_sequences(), vec!["chr1", "chr2"]);
        }
    }

    #[test]
    fn test_no_cache_option() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(dir.path());
        let options = StoreOptions {
            use_cache: false,
            cache_dir: None,
        };

        let store = FastaStore::open_with(&path, options).unwrap();
        assert!(!store.cache_exists());
        assert!(!store.delete_cache());
    }

    #[test]
    fn test_custom_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(dir.path());
        let options = StoreOptions {
            use_cache: true,
            cache_dir: Some(dir.path().join("caches/nested")),
        };

        let store = FastaStore::open_with(&path, options).unwrap();
        assert_eq!(store.cache_path(), dir.path().join("caches/nested/test.fa.fidx"));
        assert!(store.cache_exists());
        assert!(store.delete_cache());
        assert!(!store.cache_exists());
    }

    #[test]
    fn test_metadata_accessors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(dir.path());
        let store = FastaStore::open_with_source(&path, StoreOptions::default(), FixedMtime(1.0)).unwrap();

        assert_eq!(store.list_sequences(), vec!["chr1", "chr2"]);
        assert_eq!(store.get_description("chr1").unwrap(), "first");
        assert_eq!(
            store.get_info("chr2").unwrap(),
            SequenceInfo {
                name: "chr2".to_string(),
                description: String::new(),
                length: 4,
            }
        );
        assert!(matches!(store.get_length("chr3"), Err(FastaError::NotFound(_))));
    }

    #[test]
    fn test_fetch_variants() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(dir.path());
        let store = FastaStore::open_with_source(&path, StoreOptions::default(), FixedMtime(1.0)).unwrap();

        assert_eq!(store.fetch("chr2", 1, 4).unwrap(), "GGCC");
        assert_eq!(store.fetch_reverse_complement("chr1", 1, 3).unwrap(), "CGT");
        assert_eq!(
            store.fetch_many(&[("chr1", 8, 9), ("chr2", 2, 3)]).unwrap(),
            vec!["TA".to_string(), "GC".to_string()]
        );
        assert!(matches!(
            store.fetch_many(&[("chr1", 1, 2), ("chr2", 1, 5)]),
            Err(FastaError::Range { .. })
        ));
    }

    #[test]
    fn test_rebuild_index_after_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(dir.path());
        let mut store = FastaStore::open_with_source(&path, StoreOptions::default(), FixedMtime(1.0)).unwrap();

        fs::write(&path, ">chr9\nTTTT\n").unwrap();
        store.rebuild_index().unwrap();
        assert_eq!(store.list_sequences(), vec!["chr9"]);
        assert_eq!(store.fetch("chr9", 1, 4).unwrap(), "TTTT");
    }
}
