//! Sliding-window nucleotide content with Savitzky-Golay smoothing.

use crate::{
    error::{EngineError, EngineResult},
    fasta_input::read_two_line_fasta,
    savgol::SavitzkyGolay,
    wig_track::write_wig,
};
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_WINDOW: usize = 100;
pub const DEFAULT_SMOOTH: usize = 101;
pub const POLYNOMIAL_ORDER: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    GC,
    AT,
}

impl ContentKind {
    pub fn nucleotides(self) -> &'static [u8] {
        match self {
            ContentKind::GC => b"GC",
            ContentKind::AT => b"AT",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContentKind::GC => "GC",
            ContentKind::AT => "AT",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GC" => Ok(ContentKind::GC),
            "AT" => Ok(ContentKind::AT),
            _ => Err(format!("Unknown content '{s}', expected 'GC' or 'AT'")),
        }
    }
}

/// The smoothing filter needs an odd window.
pub fn odd_smoothing_window(smooth: usize) -> usize {
    if smooth % 2 == 0 { smooth + 1 } else { smooth }
}

#[derive(Debug, Clone)]
pub struct NucleotideContent {
    accession: String,
    sequence: Vec<u8>,
    window: usize,
    smoother: SavitzkyGolay,
}

impl NucleotideContent {
    /// Fails for a zero window, a smoothing window not above the polynomial
    /// order, or a sequence shorter than the smoothing window.
    pub fn new(accession: &str, sequence: &[u8], window: usize, smooth: usize) -> EngineResult<Self> {
        if window == 0 {
            return Err(EngineError::invalid_input("Content window must be positive"));
        }
        let smooth = odd_smoothing_window(smooth);
        if sequence.len() < smooth {
            return Err(EngineError::invalid_input(format!(
                "Sequence '{accession}' has {} bases, shorter than the smoothing window {smooth}",
                sequence.len()
            )));
        }
        let smoother = SavitzkyGolay::new(smooth, POLYNOMIAL_ORDER)?;
        debug!(
            "Content calculator for '{accession}': {} bases, window {window}, smooth {smooth}",
            sequence.len()
        );
        Ok(Self {
            accession: accession.to_string(),
            sequence: sequence.to_vec(),
            window,
            smoother,
        })
    }

    pub fn from_fasta_file(fasta_path: &str, window: usize, smooth: usize) -> EngineResult<Self> {
        let (accession, sequence) = read_two_line_fasta(fasta_path)?;
        info!(
            "Read '{accession}' ({} bases) from '{fasta_path}'",
            sequence.len()
        );
        Self::new(&accession, &sequence, window, smooth)
    }

    pub fn accession(&self) -> &str {
        &self.accession
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn smooth(&self) -> usize {
        self.smoother.window()
    }

    /// Unsmoothed density: targets in `sequence[i..=i+window]`, clipped at
    /// the sequence end, always divided by `window`.
    pub fn raw_content(&self, nucleotides: &[u8]) -> Vec<f64> {
        let n = self.sequence.len();
        let mut counts = Vec::with_capacity(n + 1);
        let mut running = 0usize;
        counts.push(running);
        for base in &self.sequence {
            if nucleotides.contains(base) {
                running += 1;
            }
            counts.push(running);
        }
        let window = self.window;
        (0..n)
            .into_par_iter()
            .map(|i| {
                let end = n.min(i + window + 1);
                (counts[end] - counts[i]) as f64 / window as f64
            })
            .collect()
    }

    pub fn calculate_content(&self, nucleotides: &[u8]) -> EngineResult<Vec<f64>> {
        self.smoother.apply(&self.raw_content(nucleotides))
    }

    pub fn gc_content(&self) -> EngineResult<Vec<f64>> {
        self.calculate_content(ContentKind::GC.nucleotides())
    }

    pub fn at_content(&self) -> EngineResult<Vec<f64>> {
        self.calculate_content(ContentKind::AT.nucleotides())
    }

    pub fn content_wig(&self, kind: ContentKind, wig_output: &str) -> EngineResult<()> {
        let content = self.calculate_content(kind.nucleotides())?;
        write_wig(&content, wig_output, &self.accession, kind.label())
    }

    pub fn gc_content_wig(&self, wig_output: &str) -> EngineResult<()> {
        self.content_wig(ContentKind::GC, wig_output)
    }

    pub fn at_content_wig(&self, wig_output: &str) -> EngineResult<()> {
        self.content_wig(ContentKind::AT, wig_output)
    }
}
