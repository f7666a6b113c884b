//! Per-record offset table for a FASTA file.
//!
//! The [`Index`] maps each record name to an [`Entry`] describing where its
//! bases live on disk. It keeps records in the order they first appear in
//! the file and rejects repeated names instead of overwriting them.

mod builder;
mod entry;

pub use builder::{build_index, build_index_from_reader};
pub use entry::Entry;

use crate::error::{FastaError, Result};
use std::collections::HashMap;

/// Ordered, read-only mapping from record name to [`Entry`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    entries: Vec<Entry>,
    positions: HashMap<String, usize>,
}

impl Index {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from entries in file order.
    ///
    /// # Errors
    /// Returns [`FastaError::DuplicateName`] if two entries share a name.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut index = Self::new();
        for entry in entries {
            index.insert(entry)?;
        }
        Ok(index)
    }

    pub(crate) fn insert(&mut self, entry: Entry) -> Result<()> {
        if self.positions.contains_key(&entry.name) {
            return Err(FastaError::DuplicateName(entry.name));
        }
        self.positions.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Looks up a record by name.
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.positions.get(name).map(|&i| &self.entries[i])
    }

    /// Looks up a record by name, failing with [`FastaError::NotFound`].
    pub fn entry(&self, name: &str) -> Result<&Entry> {
        self.get(name)
            .ok_or_else(|| FastaError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Record names in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all record lengths.
    pub fn total_length(&self) -> u64 {
        self.entries.iter().map(|e| e.length).sum()
    }
}

impl<'a> IntoIterator for &'a Index {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
