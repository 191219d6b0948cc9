//! Streaming access to multi-record GenBank files: feature tables per record
//! class and single-record FASTA re-emission.

use crate::{
    annotated_record::{AnnotatedRecord, RecordClass},
    error::{EngineError, EngineResult},
    feature_table::FeatureTable,
};
use gb_io::reader::SeqReader;
use log::{debug, info};
use std::{
    fs::File,
    io::{BufReader, Write},
};

#[derive(Debug, Clone)]
pub struct GenBankProcessor {
    gbk_path: String,
}

impl GenBankProcessor {
    pub fn new(gbk_path: &str) -> Self {
        Self {
            gbk_path: gbk_path.to_string(),
        }
    }

    pub fn path(&self) -> &str {
        &self.gbk_path
    }

    /// Records in file order, parsed one at a time.
    pub fn records(&self) -> EngineResult<impl Iterator<Item = EngineResult<AnnotatedRecord>>> {
        let path = self.gbk_path.clone();
        let file = File::open(&path)
            .map_err(|e| EngineError::io(format!("Could not open GenBank file '{path}': {e}")))?;
        Ok(SeqReader::new(BufReader::new(file)).map(move |result| {
            result.map(AnnotatedRecord::from_genbank_seq).map_err(|e| {
                EngineError::invalid_input(format!("Could not parse GenBank file '{path}': {e}"))
            })
        }))
    }

    /// Feature table of every record in `record_class`.
    pub fn full_info_table(&self, record_class: RecordClass) -> EngineResult<FeatureTable> {
        let table = collect_records(self.records()?, record_class)?;
        info!(
            "Collected {} {record_class} feature rows from '{}'",
            table.len(),
            self.gbk_path
        );
        Ok(table)
    }

    /// Writes the only record of the file as unwrapped FASTA.
    pub fn write_full_sequence(&self, out_path: &str) -> EngineResult<()> {
        let record = self.single_record()?;
        let mut file = File::create(out_path).map_err(|e| {
            EngineError::io(format!("Could not create FASTA file '{out_path}': {e}"))
        })?;
        write_full_sequence_to(&mut file, &record).map_err(|e| {
            EngineError::io(format!("Could not write FASTA file '{out_path}': {e}"))
        })?;
        info!(
            "Wrote {} bp of '{}' to '{out_path}'",
            record.sequence().len(),
            record.name()
        );
        Ok(())
    }

    fn single_record(&self) -> EngineResult<AnnotatedRecord> {
        let mut records = self.records()?;
        let record = records.next().transpose()?.ok_or_else(|| {
            EngineError::invalid_input(format!("No records found in '{}'", self.gbk_path))
        })?;
        if records.next().is_some() {
            return Err(EngineError::invalid_input(format!(
                "More than one record found in '{}'",
                self.gbk_path
            )));
        }
        Ok(record)
    }
}

/// Concatenates the feature rows of all records in `record_class`, keeping
/// record order and row order. The first source error aborts the pass.
pub fn collect_records<I>(source: I, record_class: RecordClass) -> EngineResult<FeatureTable>
where
    I: IntoIterator<Item = EngineResult<AnnotatedRecord>>,
{
    let mut table = FeatureTable::new();
    for record in source {
        let record = record?;
        if record.record_class() != record_class {
            debug!(
                "Skipping record '{}' ({})",
                record.identifier(),
                record.record_class()
            );
            continue;
        }
        let added = table.append_record(&record);
        debug!("Record '{}' added {added} rows", record.identifier());
    }
    Ok(table)
}

/// `>{name}\n{sequence}` with no wrapping and no trailing newline.
pub fn write_full_sequence_to<W: Write>(
    writer: &mut W,
    record: &AnnotatedRecord,
) -> std::io::Result<()> {
    writeln!(writer, ">{}", record.name())?;
    writer.write_all(record.sequence())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_table::FeatureRow;
    use gb_io::seq::{Feature, Location};
    use std::borrow::Cow as FeatureKind;

    fn cds(tag: &str) -> Feature {
        Feature {
            kind: FeatureKind::from("CDS"),
            location: Location::simple_range(0, 6),
            qualifiers: vec![("locus_tag".into(), Some(tag.to_string()))],
        }
    }

    fn tags(rows: &[FeatureRow]) -> Vec<String> {
        rows.iter().map(|r| r.locus_tag.to_string()).collect()
    }

    fn source() -> Vec<EngineResult<AnnotatedRecord>> {
        vec![
            Ok(AnnotatedRecord::new("chr1", b"ATGAAA", vec![cds("g1"), cds("g2")])),
            Ok(AnnotatedRecord::new("plasmid1", b"ATGCCC", vec![cds("p1")])),
            Ok(AnnotatedRecord::new("chr2", b"ATGGGG", vec![cds("g3")])),
        ]
    }

    #[test]
    fn collects_genome_records_in_order() {
        let table = collect_records(source(), RecordClass::Genome).unwrap();
        assert_eq!(tags(table.rows()), vec!["g1", "g2", "g3"]);
    }

    #[test]
    fn collects_plasmid_records() {
        let table = collect_records(source(), RecordClass::Plasmid).unwrap();
        assert_eq!(tags(table.rows()), vec!["p1"]);
        assert_eq!(table.rows()[0].aa.to_string(), "MP");
    }

    #[test]
    fn no_matching_record_gives_empty_table() {
        let only_genome = vec![Ok(AnnotatedRecord::new("chr1", b"ATG", vec![cds("g1")]))];
        let table = collect_records(only_genome, RecordClass::Plasmid).unwrap();
        assert!(table.is_empty());
        assert_eq!(FeatureTable::COLUMNS.len(), 9);
    }

    #[test]
    fn source_error_aborts_collection() {
        let mut records = source();
        records.insert(1, Err(EngineError::invalid_input("truncated record")));
        let err = collect_records(records, RecordClass::Genome).unwrap_err();
        assert!(err.message.contains("truncated"));
    }

    #[test]
    fn fasta_has_no_trailing_newline() {
        let record = AnnotatedRecord::new("plasmid1", b"acgt", vec![]);
        let mut out = Vec::new();
        write_full_sequence_to(&mut out, &record).unwrap();
        assert_eq!(out, b">plasmid1\nACGT");
    }
}
