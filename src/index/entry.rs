use crate::error::{FastaError, Result};
use serde::{Deserialize, Serialize};

/// On-disk layout of one FASTA record.
///
/// Built once by [`crate::index::build_index`] and never mutated; a changed
/// file needs a fresh index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// First whitespace-delimited token of the header line
    pub name: String,
    /// Remainder of the header line after the name (may be empty)
    pub description: String,
    /// Total number of bases in the record
    pub length: u64,
    /// Bases per full content line
    pub line_blen: u64,
    /// Bytes per full content line, terminator included
    pub line_len: u64,
    /// Byte offset of the first base of the first content line
    pub offset: u64,
}

impl Entry {
    /// Width of the line terminator (1 for `\n`, 2 for `\r\n`).
    pub fn terminator_len(&self) -> u64 {
        self.line_len.saturating_sub(self.line_blen)
    }

    /// Byte position of a 0-based base position, accounting for line wrapping.
    pub(crate) fn byte_position(&self, zpos: u64) -> Result<u64> {
        if self.line_blen == 0 {
            return Err(self.layout_error("no bases per line"));
        }
        let line = zpos / self.line_blen;
        let column = zpos % self.line_blen;
        line.checked_mul(self.line_len)
            .and_then(|bytes| bytes.checked_add(self.offset))
            .and_then(|bytes| bytes.checked_add(column))
            .ok_or_else(|| self.layout_error("byte position overflows"))
    }

    /// Checks that the layout fields are consistent with each other, so every
    /// base of the record has an addressable byte position.
    pub fn validate_layout(&self) -> Result<()> {
        if self.line_len < self.line_blen {
            return Err(self.layout_error("line is shorter than its bases"));
        }
        if (self.line_blen == 0) != (self.length == 0) {
            return Err(self.layout_error("bases per line and length disagree"));
        }
        if self.length > 0 {
            let end = self.byte_position(self.length - 1)?;
            end.checked_add(self.line_len - self.line_blen + 1)
                .ok_or_else(|| self.layout_error("record end overflows"))?;
        }
        Ok(())
    }

    fn layout_error(&self, reason: &str) -> FastaError {
        FastaError::format(format!(
            "invalid line layout for '{}' ({} bases, {} bytes per line, offset {}): {}",
            self.name, self.line_blen, self.line_len, self.offset, reason
        ))
    }
}
