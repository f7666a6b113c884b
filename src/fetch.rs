//! Seek-based subsequence extraction.
//!
//! Given an [`Entry`], a 1-based inclusive range maps to a single byte span
//! in the FASTA file. The fetcher seeks to the first base, reads exactly up to
//! the last requested base and drops the line terminators in between, so the
//! cost depends on the size of the range and never on the record length.

use crate::error::{FastaError, Result};
use crate::index::{Entry, Index};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Fetches bases `start..=stop` (1-based, inclusive) of record `name`.
///
/// The result is uppercased and contains exactly `stop - start + 1` bases.
///
/// # Errors
/// - [`FastaError::NotFound`] if `name` is not in the index
/// - [`FastaError::Range`] if `start < 1`, `stop < start` or `stop` exceeds the
///   record length
/// - [`FastaError::Io`] if the file cannot be opened or is shorter than the
///   index claims
///
/// # Example
/// ```no_run
/// use fastaccess::{build_index, fetch_subseq};
///
/// let index = build_index("genome.fa")?;
/// let seq = fetch_subseq("genome.fa", &index, "chr1", 10_001, 20_000)?;
/// assert_eq!(seq.len(), 10_000);
/// # Ok::<(), fastaccess::FastaError>(())
/// ```
pub fn fetch_subseq<P: AsRef<Path>>(
    path: P,
    index: &Index,
    name: &str,
    start: u64,
    stop: u64,
) -> Result<String> {
    let entry = index.entry(name)?;
    check_range(entry, start, stop)?;

    let mut file = File::open(path)?;
    fetch_from_reader(&mut file, entry, start, stop)
}

/// Fetches bases `start..=stop` of `entry` from an already opened source.
pub fn fetch_from_reader<R: Read + Seek>(
    reader: &mut R,
    entry: &Entry,
    start: u64,
    stop: u64,
) -> Result<String> {
    check_range(entry, start, stop)?;
    entry.validate_layout()?;

    let zstart = start - 1;
    let first_byte = entry.byte_position(zstart)?;
    let last_byte = entry.byte_position(stop - 1)?;
    let span_len = to_usize(last_byte - first_byte + 1)?;
    let count = to_usize(stop - start + 1)?;

    reader.seek(SeekFrom::Start(first_byte))?;
    let mut span = vec![0u8; span_len];
    reader.read_exact(&mut span)?;

    let bases = collect_bases(entry, &span, zstart % entry.line_blen, count)?;
    String::from_utf8(bases)
        .map_err(|_| FastaError::format(format!("record '{}' holds non-UTF-8 bytes", entry.name)))
}

/// Validates a 1-based inclusive range against a record.
pub fn check_range(entry: &Entry, start: u64, stop: u64) -> Result<()> {
    if start < 1 || stop < start || stop > entry.length {
        return Err(FastaError::Range {
            name: entry.name.clone(),
            start,
            stop,
            length: entry.length,
        });
    }
    Ok(())
}

/// Walks a raw byte span line by line, keeping bases and skipping terminators.
fn collect_bases(entry: &Entry, span: &[u8], column: u64, count: usize) -> Result<Vec<u8>> {
    let line_blen = to_usize(entry.line_blen)?;
    let terminator = to_usize(entry.terminator_len())?;
    let mut column = to_usize(column)?;
    let mut bases = Vec::with_capacity(count);
    let mut pos = 0;

    while bases.len() < count {
        let take = (line_blen - column).min(count - bases.len());
        let chunk = span
            .get(pos..pos + take)
            .filter(|chunk| !chunk.iter().any(|&b| b == b'\n' || b == b'\r'))
            .ok_or_else(|| {
                FastaError::format(format!(
                    "line structure of record '{}' does not match the index; rebuild it",
                    entry.name
                ))
            })?;
        bases.extend(chunk.iter().map(u8::to_ascii_uppercase));
        pos += take + terminator;
        column = 0;
    }

    Ok(bases)
}

fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| FastaError::format(format!("{value} exceeds the addressable size")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index_from_reader;
    use std::io::Cursor;

    fn setup(data: &str) -> (Cursor<Vec<u8>>, Index) {
        let bytes = data.as_bytes().to_vec();
        let index = build_index_from_reader(Cursor::new(bytes.clone())).unwrap();
        (Cursor::new(bytes), index)
    }

    fn fetch(data: &str, name: &str, start: u64, stop: u64) -> Result<String> {
        let (mut reader, index) = setup(data);
        let entry = index.entry(name)?;
        fetch_from_reader(&mut reader, entry, start, stop)
    }

    #[test]
    fn test_within_one_line() {
        let data = ">s1\nacgtACGTaa\nCCCCGGGGTT\nAT\n";
        assert_eq!(fetch(data, "s1", 1, 4).unwrap(), "ACGT");
        assert_eq!(fetch(data, "s1", 3, 6).unwrap(), "GTAC");
    }

    #[test]
    fn test_across_lines() {
        let data = ">s1\nacgtACGTaa\nCCCCGGGGTT\nAT\n";
        assert_eq!(fetch(data, "s1", 9, 12).unwrap(), "AACC");
        assert_eq!(fetch(data, "s1", 1, 22).unwrap(), "ACGTACGTAACCCCGGGGTTAT");
        assert_eq!(fetch(data, "s1", 20, 22).unwrap(), "TAT");
    }

    #[test]
    fn test_crlf_span() {
        let data = ">s1\r\nACGTA\r\nCGTAC\r\nGG\r\n";
        assert_eq!(fetch(data, "s1", 4, 12).unwrap(), "TACGTACGG");
    }

    #[test]
    fn test_second_record() {
        let data = ">a\nAAAA\nAA\n>b desc\nCCCG\nGT\n";
        assert_eq!(fetch(data, "b", 1, 6).unwrap(), "CCCGGT");
        assert_eq!(fetch(data, "b", 4, 4).unwrap(), "G");
    }

    #[test]
    fn test_range_rejections() {
        let data = ">s1\nACGT\nAC\n>empty\n";
        for (start, stop) in [(0, 2), (3, 2), (1, 7)] {
            assert!(matches!(
                fetch(data, "s1", start, stop),
                Err(FastaError::Range { .. })
            ));
        }
        assert!(matches!(
            fetch(data, "empty", 1, 1),
            Err(FastaError::Range { length: 0, .. })
        ));
    }

    #[test]
    fn test_truncated_file_is_io_error() {
        let (_, index) = setup(">s1\nACGT\nACGT\nAC\n");
        let mut truncated = Cursor::new(b">s1\nACGT\nAC".to_vec());
        let err = fetch_from_reader(&mut truncated, index.entry("s1").unwrap(), 1, 10).unwrap_err();
        assert!(matches!(err, FastaError::Io(_)));
    }

    #[test]
    fn test_invalid_layout_rejected() {
        let entry = Entry {
            name: "bad".to_string(),
            description: String::new(),
            length: 10,
            line_blen: 0,
            line_len: 0,
            offset: 0,
        };
        let mut reader = Cursor::new(b">bad\nACGT\n".to_vec());
        assert!(matches!(
            fetch_from_reader(&mut reader, &entry, 1, 2),
            Err(FastaError::Format { .. })
        ));
    }

    #[test]
    fn test_stale_index_detected() {
        let (_, index) = setup(">s1\nACGTACGT\nACGT\n");
        let mut rewrapped = Cursor::new(b">s1\nACGT\nACGT\nACGT\n".to_vec());
        let err = fetch_from_reader(&mut rewrapped, index.entry("s1").unwrap(), 1, 8).unwrap_err();
        assert!(matches!(err, FastaError::Format { .. }));
    }
}
