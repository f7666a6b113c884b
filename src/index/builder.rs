// Single-pass FASTA index construction

use super::{Entry, Index};
use crate::error::{FastaError, Result};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const READ_BUFFER_SIZE: usize = 1 << 16;

/// Builds an [`Index`] from a FASTA file in one sequential pass.
///
/// Every record's interior content lines must share one length; only the
/// last content line of a record may be shorter. Trailing blank lines
/// inside a record are tolerated as long as no more content follows them.
///
/// # Errors
/// - [`FastaError::Format`] if the file is empty, has content before the first
///   header, has a header without a name, or has ragged interior lines
/// - [`FastaError::DuplicateName`] if a record name repeats
/// - [`FastaError::Io`] if the file cannot be read
///
/// # Example
/// ```no_run
/// use fastaccess::index::build_index;
///
/// let index = build_index("genome.fa")?;
/// for entry in &index {
///     println!("{}\t{}", entry.name, entry.length);
/// }
/// # Ok::<(), fastaccess::FastaError>(())
/// ```
pub fn build_index<P: AsRef<Path>>(path: P) -> Result<Index> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let index = build_index_from_reader(BufReader::with_capacity(READ_BUFFER_SIZE, file))?;
    debug!(
        "Indexed {} records ({} bases) from {}",
        index.len(),
        index.total_length(),
        path.display()
    );
    Ok(index)
}

/// Same as [`build_index`], over any buffered byte source.
pub fn build_index_from_reader<R: BufRead>(mut reader: R) -> Result<Index> {
    let mut index = Index::new();
    let mut current: Option<RecordBuilder> = None;
    let mut line = Vec::new();
    let mut cursor: u64 = 0;
    let mut line_no: u64 = 0;

    loop {
        line.clear();
        let bytes_read = reader.read_until(b'\n', &mut line)? as u64;
        if bytes_read == 0 {
            break;
        }
        line_no += 1;
        cursor += bytes_read;

        let content = strip_terminator(&line);

        if content.first() == Some(&b'>') {
            if let Some(record) = current.take() {
                index.insert(record.finish())?;
            }
            let (name, description) = parse_header(&content[1..], line_no)?;
            if index.contains(&name) {
                return Err(FastaError::DuplicateName(name));
            }
            current = Some(RecordBuilder::new(name, description, cursor));
        } else if let Some(record) = current.as_mut() {
            record.push_line(content.len() as u64, bytes_read, line_no)?;
        } else if !content.is_empty() {
            return Err(FastaError::format_at(
                line_no,
                "sequence content before the first header",
            ));
        }
    }

    if cursor == 0 {
        return Err(FastaError::format("file is empty"));
    }
    match current {
        Some(record) => index.insert(record.finish())?,
        None => return Err(FastaError::format("no header line found")),
    }

    Ok(index)
}

/// Accumulates the layout of the record currently being scanned.
struct RecordBuilder {
    name: String,
    description: String,
    offset: u64,
    length: u64,
    line_blen: u64,
    line_len: u64,
    // set once a short or blank line has been seen; no content may follow
    closed: bool,
}

impl RecordBuilder {
    fn new(name: String, description: String, offset: u64) -> Self {
        Self {
            name,
            description,
            offset,
            length: 0,
            line_blen: 0,
            line_len: 0,
            closed: false,
        }
    }

    fn push_line(&mut self, bases: u64, raw_len: u64, line_no: u64) -> Result<()> {
        if bases == 0 {
            self.closed = true;
            return Ok(());
        }
        if self.closed {
            return Err(FastaError::format_at(
                line_no,
                format!(
                    "record '{}' continues after a short or blank line",
                    self.name
                ),
            ));
        }

        if self.line_blen == 0 {
            self.line_blen = bases;
            self.line_len = raw_len;
        } else if bases == self.line_blen && raw_len == self.line_len {
            // full interior line
        } else if bases <= self.line_blen {
            // candidate last line: shorter, or missing its terminator at EOF
            self.closed = true;
        } else {
            return Err(FastaError::format_at(
                line_no,
                format!(
                    "record '{}' has {} bases on a line, expected at most {}",
                    self.name, bases, self.line_blen
                ),
            ));
        }

        self.length += bases;
        Ok(())
    }

    fn finish(self) -> Entry {
        debug!(
            "Record {}: length={} offset={} line_blen={} line_len={}",
            self.name, self.length, self.offset, self.line_blen, self.line_len
        );
        Entry {
            name: self.name,
            description: self.description,
            length: self.length,
            line_blen: self.line_blen,
            line_len: self.line_len,
            offset: self.offset,
        }
    }
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Splits a header (without the leading `>`) into name and description.
///
/// Headers must be valid UTF-8 so that distinct names stay distinct.
fn parse_header(header: &[u8], line_no: u64) -> Result<(String, String)> {
    let header = std::str::from_utf8(header)
        .map_err(|_| FastaError::format_at(line_no, "header is not valid UTF-8"))?
        .trim_start();
    let name_end = header.find(char::is_whitespace).unwrap_or(header.len());
    let name = &header[..name_end];
    if name.is_empty() {
        return Err(FastaError::format_at(line_no, "header line has no name"));
    }
    Ok((name.to_string(), header[name_end..].trim().to_string()))
}
