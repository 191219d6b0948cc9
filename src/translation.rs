//! Standard genetic code (NCBI table 1) translation.

use std::collections::BTreeSet;
use std::fmt;

const BASE_A: u8 = 1;
const BASE_C: u8 = 2;
const BASE_G: u8 = 4;
const BASE_T: u8 = 8;

static BASES: [(u8, u8); 4] = [(BASE_A, b'A'), (BASE_C, b'C'), (BASE_G, b'G'), (BASE_T, b'T')];

pub const STOP: u8 = b'*';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationError {
    pub codon: String,
    pub position: usize,
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid codon '{}' at position {}", self.codon, self.position)
    }
}

/// Translates a nucleotide sequence codon by codon.
///
/// Stop codons become `*` and translation continues past them. A trailing
/// partial codon is ignored. Ambiguous codons resolve to the single amino
/// acid all of their expansions agree on (or B/Z/J for the classic pairs),
/// otherwise `X`.
pub fn translate(sequence: &[u8]) -> Result<String, TranslationError> {
    let mut protein = String::with_capacity(sequence.len() / 3);
    for (index, codon) in sequence.chunks_exact(3).enumerate() {
        let amino_acid = translate_codon(codon).ok_or_else(|| TranslationError {
            codon: String::from_utf8_lossy(codon).to_string(),
            position: index * 3,
        })?;
        protein.push(amino_acid as char);
    }
    Ok(protein)
}

fn translate_codon(codon: &[u8]) -> Option<u8> {
    let masks = [
        base_mask(codon[0])?,
        base_mask(codon[1])?,
        base_mask(codon[2])?,
    ];
    let mut amino_acids = BTreeSet::new();
    for first in expand(masks[0]) {
        for second in expand(masks[1]) {
            for third in expand(masks[2]) {
                amino_acids.insert(standard_code(first, second, third));
            }
        }
    }
    let resolved: Vec<u8> = amino_acids.into_iter().collect();
    Some(match resolved.as_slice() {
        [single] => *single,
        [b'D', b'N'] => b'B',
        [b'E', b'Q'] => b'Z',
        [b'I', b'L'] => b'J',
        _ => b'X',
    })
}

/// IUPAC letter to a bitmask of concrete bases; `None` for non-nucleotides.
fn base_mask(letter: u8) -> Option<u8> {
    Some(match letter.to_ascii_uppercase() {
        b'A' => BASE_A,
        b'C' => BASE_C,
        b'G' => BASE_G,
        b'T' | b'U' => BASE_T,
        b'W' => BASE_A | BASE_T,
        b'S' => BASE_C | BASE_G,
        b'M' => BASE_A | BASE_C,
        b'K' => BASE_G | BASE_T,
        b'R' => BASE_A | BASE_G,
        b'Y' => BASE_C | BASE_T,
        b'B' => BASE_C | BASE_G | BASE_T,
        b'D' => BASE_A | BASE_G | BASE_T,
        b'H' => BASE_A | BASE_C | BASE_T,
        b'V' => BASE_A | BASE_C | BASE_G,
        b'N' => BASE_A | BASE_C | BASE_G | BASE_T,
        _ => return None,
    })
}

fn expand(mask: u8) -> impl Iterator<Item = u8> {
    BASES
        .iter()
        .filter(move |(bit, _)| mask & bit != 0)
        .map(|(_, base)| *base)
}

fn standard_code(first: u8, second: u8, third: u8) -> u8 {
    match [first, second, third] {
        [b'T', b'T', b'T' | b'C'] => b'F',
        [b'T', b'T', b'A' | b'G'] => b'L',
        [b'C', b'T', _] => b'L',
        [b'A', b'T', b'T' | b'C' | b'A'] => b'I',
        [b'A', b'T', b'G'] => b'M',
        [b'G', b'T', _] => b'V',
        [b'T', b'C', _] => b'S',
        [b'C', b'C', _] => b'P',
        [b'A', b'C', _] => b'T',
        [b'G', b'C', _] => b'A',
        [b'T', b'A', b'T' | b'C'] => b'Y',
        [b'T', b'A', b'A' | b'G'] => STOP,
        [b'C', b'A', b'T' | b'C'] => b'H',
        [b'C', b'A', b'A' | b'G'] => b'Q',
        [b'A', b'A', b'T' | b'C'] => b'N',
        [b'A', b'A', b'A' | b'G'] => b'K',
        [b'G', b'A', b'T' | b'C'] => b'D',
        [b'G', b'A', b'A' | b'G'] => b'E',
        [b'T', b'G', b'T' | b'C'] => b'C',
        [b'T', b'G', b'A'] => STOP,
        [b'T', b'G', b'G'] => b'W',
        [b'C', b'G', _] => b'R',
        [b'A', b'G', b'T' | b'C'] => b'S',
        [b'A', b'G', b'A' | b'G'] => b'R',
        [b'G', b'G', _] => b'G',
        _ => b'X',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_through_stop_codons() {
        assert_eq!(translate(b"ATGAAATAAGGG").unwrap(), "MK*G");
        assert_eq!(translate(b"atgtgg").unwrap(), "MW");
        assert_eq!(translate(b"AUGUGA").unwrap(), "M*");
    }

    #[test]
    fn drops_trailing_partial_codon() {
        assert_eq!(translate(b"ATGGC").unwrap(), "M");
        assert_eq!(translate(b"AT").unwrap(), "");
    }

    #[test]
    fn resolves_ambiguous_codons() {
        // GCN is always alanine
        assert_eq!(translate(b"GCN").unwrap(), "A");
        // RAY is GAY (D) or AAY (N)
        assert_eq!(translate(b"RAY").unwrap(), "B");
        assert_eq!(translate(b"NNN").unwrap(), "X");
        assert_eq!(translate(b"TRA").unwrap(), "*");
    }

    #[test]
    fn rejects_non_nucleotide_symbols() {
        let err = translate(b"ATGA-G").unwrap_err();
        assert_eq!(err.codon, "A-G");
        assert_eq!(err.position, 3);
    }

    #[test]
    fn all_sixty_four_codons_are_assigned() {
        let bases = [b'A', b'C', b'G', b'T'];
        let mut stops = 0;
        for a in bases {
            for b in bases {
                for c in bases {
                    let aa = standard_code(a, b, c);
                    assert_ne!(aa, b'X');
                    if aa == STOP {
                        stops += 1;
                    }
                }
            }
        }
        assert_eq!(stops, 3);
    }
}
