//! Fixed-schema feature table built from the CDS, rRNA and tRNA features of
//! an annotated record.
//!
//! Every cell is resolved on its own. A cell that cannot be resolved is kept
//! as [`Resolved::Missing`] together with the reason, and is written out as
//! the sentinel `na`. Nothing in here fails a whole row.

use crate::{
    annotated_record::AnnotatedRecord,
    error::{EngineError, EngineResult},
    feature_location::{extract_location, location_bounds, location_strand},
    translation::{translate, TranslationError},
};
use gb_io::seq::Feature;
use log::{debug, info, warn};
use serde::{Serialize, Serializer};
use std::{
    fmt,
    fs::File,
    io::{BufWriter, Write},
};

pub const SENTINEL: &str = "na";

/// Feature kinds that contribute rows; all other kinds are skipped.
pub const TABLE_FEATURE_KINDS: [&str; 3] = ["CDS", "rRNA", "tRNA"];

const FASTA_LINE_WIDTH: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualifierKey {
    LocusTag,
    OldLocusTag,
    Gene,
    Function,
}

impl QualifierKey {
    pub fn as_str(self) -> &'static str {
        match self {
            QualifierKey::LocusTag => "locus_tag",
            QualifierKey::OldLocusTag => "old_locus_tag",
            QualifierKey::Gene => "gene",
            QualifierKey::Function => "function",
        }
    }
}

/// Why a cell ended up as `na`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    MissingQualifier(QualifierKey),
    NoRanges,
    MixedStrand,
    OutOfBounds { start: i64, end: i64, len: usize },
    UnsupportedLocation(&'static str),
    NoNucleotides,
    Untranslatable(TranslationError),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::MissingQualifier(key) => write!(f, "no /{} qualifier", key.as_str()),
            FieldError::NoRanges => write!(f, "location has no ranges"),
            FieldError::MixedStrand => write!(f, "location parts disagree on strand"),
            FieldError::OutOfBounds { start, end, len } => {
                write!(f, "range {start}..{end} outside sequence of length {len}")
            }
            FieldError::UnsupportedLocation(kind) => write!(f, "cannot extract {kind} location"),
            FieldError::NoNucleotides => write!(f, "nucleotide sequence unavailable"),
            FieldError::Untranslatable(err) => write!(f, "{err}"),
        }
    }
}

impl From<TranslationError> for FieldError {
    fn from(err: TranslationError) -> Self {
        FieldError::Untranslatable(err)
    }
}

/// A table cell: either a value or the reason it is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<T> {
    Value(T),
    Missing(FieldError),
}

impl<T> Resolved<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Resolved::Value(v) => Some(v),
            Resolved::Missing(_) => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Resolved::Missing(_))
    }

    pub fn missing_reason(&self) -> Option<&FieldError> {
        match self {
            Resolved::Value(_) => None,
            Resolved::Missing(reason) => Some(reason),
        }
    }
}

impl<T> From<Result<T, FieldError>> for Resolved<T> {
    fn from(result: Result<T, FieldError>) -> Self {
        match result {
            Ok(v) => Resolved::Value(v),
            Err(e) => Resolved::Missing(e),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Resolved<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Value(v) => write!(f, "{v}"),
            Resolved::Missing(_) => write!(f, "{SENTINEL}"),
        }
    }
}

impl<T: Serialize> Serialize for Resolved<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Resolved::Value(v) => v.serialize(serializer),
            Resolved::Missing(_) => serializer.serialize_str(SENTINEL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureRow {
    pub locus_tag: Resolved<String>,
    pub old_locus_tag: Resolved<String>,
    pub gene: Resolved<String>,
    pub function: Resolved<String>,
    pub start: Resolved<i64>,
    pub stop: Resolved<i64>,
    pub strand: Resolved<i8>,
    pub nts: Resolved<String>,
    pub aa: Resolved<String>,
}

impl FeatureRow {
    pub fn from_feature(feature: &Feature, sequence: &[u8]) -> Self {
        let bounds = location_bounds(&feature.location);
        let nts = extract_location(sequence, &feature.location);
        let aa = match &nts {
            Ok(nts) => translate(nts).map_err(FieldError::from),
            Err(_) => Err(FieldError::NoNucleotides),
        };
        Self {
            locus_tag: qualifier(feature, QualifierKey::LocusTag).into(),
            old_locus_tag: qualifier(feature, QualifierKey::OldLocusTag).into(),
            gene: qualifier(feature, QualifierKey::Gene).into(),
            function: qualifier(feature, QualifierKey::Function).into(),
            start: bounds.clone().map(|(start, _)| start).into(),
            stop: bounds.map(|(_, stop)| stop).into(),
            strand: location_strand(&feature.location)
                .map(|strand| strand.sign())
                .into(),
            nts: nts
                .map(|nts| String::from_utf8_lossy(&nts).to_string())
                .into(),
            aa: aa.into(),
        }
    }

    /// Cells in column order, rendered with the `na` sentinel.
    pub fn cells(&self) -> [String; 9] {
        [
            self.locus_tag.to_string(),
            self.old_locus_tag.to_string(),
            self.gene.to_string(),
            self.function.to_string(),
            self.start.to_string(),
            self.stop.to_string(),
            self.strand.to_string(),
            self.nts.to_string(),
            self.aa.to_string(),
        ]
    }

    pub fn missing_count(&self) -> usize {
        [
            self.locus_tag.is_missing(),
            self.old_locus_tag.is_missing(),
            self.gene.is_missing(),
            self.function.is_missing(),
            self.start.is_missing(),
            self.stop.is_missing(),
            self.strand.is_missing(),
            self.nts.is_missing(),
            self.aa.is_missing(),
        ]
        .iter()
        .filter(|missing| **missing)
        .count()
    }
}

/// First value of the qualifier with exactly this key.
fn qualifier(feature: &Feature, key: QualifierKey) -> Result<String, FieldError> {
    feature
        .qualifier_values(key.as_str().into())
        .next()
        .map(|value| value.to_string())
        .ok_or(FieldError::MissingQualifier(key))
}

pub fn is_table_feature(feature: &Feature) -> bool {
    let kind = feature.kind.to_string();
    TABLE_FEATURE_KINDS.contains(&kind.as_str())
}

/// One row per CDS/rRNA/tRNA feature, in feature order.
pub fn extract_features(record: &AnnotatedRecord) -> Vec<FeatureRow> {
    let rows: Vec<FeatureRow> = record
        .features()
        .iter()
        .filter(|feature| is_table_feature(feature))
        .map(|feature| FeatureRow::from_feature(feature, record.sequence()))
        .collect();
    debug!(
        "Record '{}': {} of {} features tabulated",
        record.identifier(),
        rows.len(),
        record.features().len()
    );
    rows
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub const COLUMNS: [&'static str; 9] = [
        "locus_tag",
        "old_locus_tag",
        "gene",
        "function",
        "start",
        "stop",
        "strand",
        "nts",
        "aa",
    ];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_record(record: &AnnotatedRecord) -> Self {
        Self {
            rows: extract_features(record),
        }
    }

    pub fn append_record(&mut self, record: &AnnotatedRecord) -> usize {
        let rows = extract_features(record);
        let added = rows.len();
        self.rows.extend(rows);
        added
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tab-separated output with a header row, also for an empty table.
    pub fn write_tsv_to<W: Write>(&self, writer: W) -> EngineResult<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(writer);
        csv_writer
            .write_record(Self::COLUMNS)
            .map_err(|e| EngineError::io(format!("Could not write table header: {e}")))?;
        for row in &self.rows {
            csv_writer
                .serialize(row)
                .map_err(|e| EngineError::io(format!("Could not write table row: {e}")))?;
        }
        csv_writer
            .flush()
            .map_err(|e| EngineError::io(format!("Could not flush table: {e}")))
    }

    pub fn write_tsv(&self, path: &str) -> EngineResult<()> {
        let file = File::create(path)
            .map_err(|e| EngineError::io(format!("Could not create table file '{path}': {e}")))?;
        self.write_tsv_to(BufWriter::new(file))?;
        info!("Wrote {} feature rows to '{path}'", self.len());
        Ok(())
    }

    /// Nucleotide FASTA of every row with resolved `nts`.
    pub fn write_gene_fna(&self, path: &str) -> EngineResult<usize> {
        self.write_gene_fasta(path, |row| row.nts.value())
    }

    /// Protein FASTA of every row with resolved `aa`.
    pub fn write_gene_faa(&self, path: &str) -> EngineResult<usize> {
        self.write_gene_fasta(path, |row| row.aa.value())
    }

    fn write_gene_fasta<F>(&self, path: &str, sequence_of: F) -> EngineResult<usize>
    where
        F: Fn(&FeatureRow) -> Option<&String>,
    {
        let file = File::create(path)
            .map_err(|e| EngineError::io(format!("Could not create FASTA file '{path}': {e}")))?;
        let mut writer = BufWriter::new(file);
        let mut written = 0;
        for (index, row) in self.rows.iter().enumerate() {
            let Some(sequence) = sequence_of(row) else {
                continue;
            };
            let header = match row.locus_tag.value() {
                Some(tag) => tag.replace(' ', "_"),
                None => format!("feature_{}", index + 1),
            };
            write_fasta_record(&mut writer, &header, sequence.as_bytes())
                .map_err(|e| EngineError::io(format!("Could not write FASTA to '{path}': {e}")))?;
            written += 1;
        }
        writer
            .flush()
            .map_err(|e| EngineError::io(format!("Could not write FASTA to '{path}': {e}")))?;
        if written < self.len() {
            warn!(
                "Skipped {} rows without a sequence while writing '{path}'",
                self.len() - written
            );
        }
        Ok(written)
    }
}

impl Extend<FeatureRow> for FeatureTable {
    fn extend<I: IntoIterator<Item = FeatureRow>>(&mut self, iter: I) {
        self.rows.extend(iter);
    }
}

fn write_fasta_record<W: Write>(writer: &mut W, header: &str, seq: &[u8]) -> std::io::Result<()> {
    writeln!(writer, ">{header}")?;
    for chunk in seq.chunks(FASTA_LINE_WIDTH) {
        writer.write_all(chunk)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
