use gb_io::seq::{Feature, Seq};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Identifier prefix that marks a record as a plasmid.
pub const PLASMID_PREFIX: &str = "plasmid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordClass {
    #[default]
    Genome,
    Plasmid,
}

impl RecordClass {
    /// Naming convention only: identifiers starting with `plasmid` are
    /// plasmids, everything else is genome.
    pub fn of(identifier: &str) -> Self {
        if identifier.starts_with(PLASMID_PREFIX) {
            RecordClass::Plasmid
        } else {
            RecordClass::Genome
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordClass::Genome => write!(f, "genome"),
            RecordClass::Plasmid => write!(f, "plasmid"),
        }
    }
}

impl FromStr for RecordClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "genome" => Ok(RecordClass::Genome),
            "plasmid" => Ok(RecordClass::Plasmid),
            _ => Err(format!(
                "Unknown record class '{s}', expected 'genome' or 'plasmid'"
            )),
        }
    }
}

/// One parsed sequence entry, read-only for the extraction code.
#[derive(Debug, Clone)]
pub struct AnnotatedRecord {
    identifier: String,
    name: Option<String>,
    sequence: Vec<u8>,
    features: Vec<Feature>,
}

impl AnnotatedRecord {
    pub fn new(identifier: &str, sequence: &[u8], features: Vec<Feature>) -> Self {
        Self {
            identifier: identifier.to_string(),
            name: Some(identifier.to_string()),
            sequence: sequence.to_ascii_uppercase(),
            features,
        }
    }

    /// The identifier is the VERSION value, falling back to the first
    /// ACCESSION and then to the LOCUS name.
    pub fn from_genbank_seq(seq: Seq) -> Self {
        let accession = seq
            .accession
            .as_deref()
            .and_then(|acc| acc.split_whitespace().next())
            .map(str::to_string);
        let identifier = seq
            .version
            .clone()
            .filter(|version| !version.trim().is_empty())
            .or(accession)
            .or_else(|| seq.name.clone())
            .unwrap_or_default();
        Self {
            identifier,
            name: seq.name,
            sequence: seq.seq.to_ascii_uppercase(),
            features: seq.features,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// LOCUS name, or the identifier when the record has none.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.identifier)
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn record_class(&self) -> RecordClass {
        RecordClass::of(&self.identifier)
    }
}
