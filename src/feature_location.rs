//! Location semantics for annotated features: bounds, strand and
//! strand-aware sequence extraction over `gb_io` locations.

use crate::feature_table::FieldError;
use bio::alphabets::dna;
use gb_io::seq::Location;

/// Strand of a feature as reported in the feature table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn sign(self) -> i8 {
        match self {
            Strand::Forward => 1,
            Strand::Reverse => -1,
        }
    }
}

pub fn collect_location_strands(location: &Location, reverse: bool, strands: &mut Vec<bool>) {
    match location {
        Location::Range(_, _) | Location::Between(_, _) => strands.push(reverse),
        Location::Complement(inner) => collect_location_strands(inner, !reverse, strands),
        Location::Join(parts)
        | Location::Order(parts)
        | Location::Bond(parts)
        | Location::OneOf(parts) => {
            for part in parts {
                collect_location_strands(part, reverse, strands);
            }
        }
        Location::External(_, maybe_loc) => {
            if let Some(loc) = maybe_loc {
                collect_location_strands(loc, reverse, strands);
            }
        }
        Location::Gap(_) => {}
    }
}

pub fn collect_location_ranges(location: &Location, ranges: &mut Vec<(i64, i64)>) {
    match location {
        Location::Range((from, _), (to, _)) | Location::Between(from, to) => {
            let mut start = *from;
            let mut end = *to;
            if end < start {
                std::mem::swap(&mut start, &mut end);
            }
            ranges.push((start, end));
        }
        Location::Complement(inner) => collect_location_ranges(inner, ranges),
        Location::Join(parts)
        | Location::Order(parts)
        | Location::Bond(parts)
        | Location::OneOf(parts) => {
            for part in parts {
                collect_location_ranges(part, ranges);
            }
        }
        Location::External(_, maybe_loc) => {
            if let Some(loc) = maybe_loc {
                collect_location_ranges(loc, ranges);
            }
        }
        Location::Gap(_) => {}
    }
}

/// Outermost `(start, end)` of a location, 0-based with exclusive end.
pub fn location_bounds(location: &Location) -> Result<(i64, i64), FieldError> {
    let mut ranges = Vec::new();
    collect_location_ranges(location, &mut ranges);
    let start = ranges.iter().map(|(start, _)| *start).min();
    let end = ranges.iter().map(|(_, end)| *end).max();
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(FieldError::NoRanges),
    }
}

/// A location has a strand only when all of its ranges agree on it.
pub fn location_strand(location: &Location) -> Result<Strand, FieldError> {
    let mut strands = Vec::new();
    collect_location_strands(location, false, &mut strands);
    if strands.is_empty() {
        return Err(FieldError::NoRanges);
    }
    if strands.iter().all(|is_reverse| *is_reverse) {
        Ok(Strand::Reverse)
    } else if strands.iter().all(|is_reverse| !*is_reverse) {
        Ok(Strand::Forward)
    } else {
        Err(FieldError::MixedStrand)
    }
}

/// Extracts the bases covered by `location`, reverse-complementing
/// complemented parts and concatenating multi-part locations in order.
pub fn extract_location(sequence: &[u8], location: &Location) -> Result<Vec<u8>, FieldError> {
    match location {
        Location::Range((from, _), (to, _)) => slice_range(sequence, *from, *to),
        Location::Between(_, _) => Ok(vec![]),
        Location::Complement(inner) => Ok(dna::revcomp(extract_location(sequence, inner)?)),
        Location::Join(parts) | Location::Order(parts) | Location::Bond(parts) => {
            let mut ret = Vec::new();
            for part in parts {
                ret.extend(extract_location(sequence, part)?);
            }
            Ok(ret)
        }
        Location::OneOf(_) => Err(FieldError::UnsupportedLocation("one-of")),
        Location::External(_, _) => Err(FieldError::UnsupportedLocation("external")),
        Location::Gap(_) => Err(FieldError::UnsupportedLocation("gap")),
    }
}

fn slice_range(sequence: &[u8], from: i64, to: i64) -> Result<Vec<u8>, FieldError> {
    let out_of_bounds = FieldError::OutOfBounds {
        start: from,
        end: to,
        len: sequence.len(),
    };
    let start = usize::try_from(from).map_err(|_| out_of_bounds.clone())?;
    let end = usize::try_from(to).map_err(|_| out_of_bounds.clone())?;
    if start > end || end > sequence.len() {
        return Err(out_of_bounds);
    }
    Ok(sequence[start..end].to_vec())
}
