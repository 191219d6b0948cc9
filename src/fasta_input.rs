use crate::error::{EngineError, EngineResult};
use std::fs;

/// Reads a FASTA file holding exactly one record on two lines: a `>` header
/// and the whole sequence. Wrapped sequences are rejected.
pub fn read_two_line_fasta(path: &str) -> EngineResult<(String, Vec<u8>)> {
    let text = fs::read_to_string(path)
        .map_err(|e| EngineError::io(format!("Could not read FASTA file '{path}': {e}")))?;
    parse_two_line_fasta(&text)
        .map_err(|e| EngineError::invalid_input(format!("Invalid FASTA file '{path}': {}", e.message)))
}

pub fn parse_two_line_fasta(text: &str) -> EngineResult<(String, Vec<u8>)> {
    let mut lines = text.lines();
    let header = lines
        .next()
        .ok_or_else(|| EngineError::invalid_input("empty input"))?;
    let accession = header
        .strip_prefix('>')
        .ok_or_else(|| EngineError::invalid_input("first line is not a '>' header"))?
        .trim_end();
    let sequence = lines
        .next()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .ok_or_else(|| EngineError::invalid_input("missing sequence line"))?;
    if lines.any(|line| !line.trim().is_empty()) {
        return Err(EngineError::invalid_input(
            "expected a single header line and a single sequence line",
        ));
    }
    Ok((accession.to_string(), sequence.as_bytes().to_vec()))
}
