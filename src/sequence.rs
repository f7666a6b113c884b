// Nucleotide sequence helpers

/// Returns the IUPAC complement of an uppercase nucleotide code.
///
/// Characters outside the IUPAC alphabet are returned unchanged.
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        // N, S and W are their own complements
        other => other,
    }
}

/// Reverse complement of a nucleotide sequence.
///
/// # Example
/// ```
/// use fastaccess::sequence::reverse_complement;
///
/// assert_eq!(reverse_complement("AACGTN"), "NACGTT");
/// ```
pub fn reverse_complement(seq: &str) -> String {
    seq.bytes().rev().map(|b| complement(b) as char).collect()
}
