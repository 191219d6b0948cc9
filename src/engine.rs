use crate::{
    annotated_record::RecordClass,
    error::{EngineError, EngineResult},
    feature_table::FeatureTable,
    genbank_file::GenBankProcessor,
    nucleotide_content::{ContentKind, NucleotideContent},
    parameters::AnalysisParameters,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

pub type OpId = String;
pub type RunId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    FeatureTable {
        path: String,
        record_class: Option<RecordClass>,
        output: Option<String>,
    },
    FullSequence {
        path: String,
        output: String,
    },
    ContentTrack {
        path: String,
        content: ContentKind,
        output: String,
    },
    GeneFasta {
        path: String,
        record_class: Option<RecordClass>,
        nucleotides: Option<String>,
        proteins: Option<String>,
    },
    SetParameter {
        name: String,
        value: serde_json::Value,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::FeatureTable { .. } => "FeatureTable",
            Operation::FullSequence { .. } => "FullSequence",
            Operation::ContentTrack { .. } => "ContentTrack",
            Operation::GeneFasta { .. } => "GeneFasta",
            Operation::SetParameter { .. } => "SetParameter",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub run_id: RunId,
    pub ops: Vec<Operation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpResult {
    pub op_id: OpId,
    /// Files written by the operation.
    pub outputs: Vec<String>,
    /// Table rows or track values produced.
    pub rows: usize,
    pub messages: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub run_id: RunId,
    pub op: Operation,
    pub result: OpResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    pub protocol_version: String,
    pub supported_operations: Vec<String>,
    pub supported_contents: Vec<String>,
    pub feature_kinds: Vec<String>,
    pub deterministic_operation_log: bool,
}

pub trait Engine {
    fn apply(&mut self, op: Operation) -> EngineResult<OpResult>;
    fn apply_workflow(&mut self, wf: Workflow) -> EngineResult<Vec<OpResult>>;
    fn parameters(&self) -> &AnalysisParameters;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnaBactEngine {
    parameters: AnalysisParameters,
    journal: Vec<OperationRecord>,
    op_counter: u64,
}

impl DnaBactEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(parameters: AnalysisParameters) -> Self {
        Self {
            parameters,
            ..Self::default()
        }
    }

    pub fn capabilities() -> Capabilities {
        Capabilities {
            protocol_version: "v1".to_string(),
            supported_operations: vec![
                "FeatureTable".to_string(),
                "FullSequence".to_string(),
                "ContentTrack".to_string(),
                "GeneFasta".to_string(),
                "SetParameter".to_string(),
            ],
            supported_contents: vec![ContentKind::GC.to_string(), ContentKind::AT.to_string()],
            feature_kinds: AnalysisParameters::default()
                .feature_kinds()
                .iter()
                .map(|kind| kind.to_string())
                .collect(),
            deterministic_operation_log: true,
        }
    }

    pub fn operation_log(&self) -> &[OperationRecord] {
        &self.journal
    }

    fn next_op_id(&mut self) -> OpId {
        self.op_counter += 1;
        format!("op-{}", self.op_counter)
    }

    fn table_for(&self, path: &str, record_class: Option<RecordClass>) -> EngineResult<FeatureTable> {
        let record_class = record_class.unwrap_or(self.parameters.record_class);
        GenBankProcessor::new(path).full_info_table(record_class)
    }

    fn note_gene_export(
        result: &mut OpResult,
        rows: usize,
        written: usize,
        label: &str,
        output: String,
    ) {
        if written < rows {
            result.warnings.push(format!(
                "{} of {rows} rows had no {label} sequence",
                rows - written
            ));
        }
        result
            .messages
            .push(format!("Wrote {written} {label} records to '{output}'"));
        result.outputs.push(output);
    }

    fn apply_internal(&mut self, op: Operation, run_id: &str) -> EngineResult<OpResult> {
        let op_id = self.next_op_id();
        debug!("{run_id}/{op_id}: {}", op.name());
        let mut result = OpResult {
            op_id,
            ..OpResult::default()
        };

        match op {
            Operation::FeatureTable {
                path,
                record_class,
                output,
            } => {
                let table = self.table_for(&path, record_class)?;
                result.rows = table.len();
                let missing: usize = table.rows().iter().map(|row| row.missing_count()).sum();
                if missing > 0 {
                    result
                        .warnings
                        .push(format!("{missing} cells could not be resolved and read 'na'"));
                }
                match output {
                    Some(output) => {
                        table.write_tsv(&output)?;
                        result.messages.push(format!(
                            "Wrote {} feature rows from '{path}' to '{output}'",
                            table.len()
                        ));
                        result.outputs.push(output);
                    }
                    None => result
                        .messages
                        .push(format!("Extracted {} feature rows from '{path}'", table.len())),
                }
            }
            Operation::FullSequence { path, output } => {
                GenBankProcessor::new(&path).write_full_sequence(&output)?;
                result.rows = 1;
                result
                    .messages
                    .push(format!("Wrote sequence of '{path}' to '{output}'"));
                result.outputs.push(output);
            }
            Operation::ContentTrack {
                path,
                content,
                output,
            } => {
                let calculator = NucleotideContent::from_fasta_file(
                    &path,
                    self.parameters.window,
                    self.parameters.smooth,
                )?;
                calculator.content_wig(content, &output)?;
                result.rows = calculator.sequence().len();
                result.messages.push(format!(
                    "Wrote {content} track of '{}' (window {}, smooth {}) to '{output}'",
                    calculator.accession(),
                    calculator.window(),
                    calculator.smooth()
                ));
                result.outputs.push(output);
            }
            Operation::GeneFasta {
                path,
                record_class,
                nucleotides,
                proteins,
            } => {
                if nucleotides.is_none() && proteins.is_none() {
                    return Err(EngineError::invalid_input(
                        "GeneFasta requires 'nucleotides' and/or 'proteins' output paths",
                    ));
                }
                let table = self.table_for(&path, record_class)?;
                result.rows = table.len();
                if let Some(output) = nucleotides {
                    let count = table.write_gene_fna(&output)?;
                    Self::note_gene_export(&mut result, table.len(), count, "nucleotide", output);
                }
                if let Some(output) = proteins {
                    let count = table.write_gene_faa(&output)?;
                    Self::note_gene_export(&mut result, table.len(), count, "protein", output);
                }
            }
            Operation::SetParameter { name, value } => {
                self.parameters.set(&name, &value)?;
                result
                    .messages
                    .push(format!("Set parameter '{name}' to {value}"));
            }
        }

        for warning in &result.warnings {
            warn!("{}: {warning}", result.op_id);
        }
        Ok(result)
    }
}

impl Engine for DnaBactEngine {
    fn apply(&mut self, op: Operation) -> EngineResult<OpResult> {
        let run_id = "interactive".to_string();
        let result = self.apply_internal(op.clone(), &run_id)?;
        self.journal.push(OperationRecord {
            run_id,
            op,
            result: result.clone(),
        });
        Ok(result)
    }

    fn apply_workflow(&mut self, wf: Workflow) -> EngineResult<Vec<OpResult>> {
        info!("Running workflow '{}' with {} operations", wf.run_id, wf.ops.len());
        let mut results = Vec::new();
        for op in &wf.ops {
            let result = self.apply_internal(op.clone(), &wf.run_id)?;
            self.journal.push(OperationRecord {
                run_id: wf.run_id.clone(),
                op: op.clone(),
                result: result.clone(),
            });
            results.push(result);
        }
        Ok(results)
    }

    fn parameters(&self) -> &AnalysisParameters {
        &self.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::tempdir;

    #[test]
    fn test_set_parameter() {
        let mut engine = DnaBactEngine::new();
        let res = engine
            .apply(Operation::SetParameter {
                name: "window".to_string(),
                value: serde_json::json!(50),
            })
            .unwrap();
        assert_eq!(res.op_id, "op-1");
        assert_eq!(engine.parameters().window, 50);
        assert_eq!(engine.operation_log().len(), 1);
    }

    #[test]
    fn test_unknown_parameter_is_not_journaled() {
        let mut engine = DnaBactEngine::new();
        let err = engine
            .apply(Operation::SetParameter {
                name: "colour".to_string(),
                value: serde_json::json!("red"),
            })
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(engine.operation_log().is_empty());
    }

    #[test]
    fn test_content_track_uses_engine_parameters() {
        let td = tempdir().unwrap();
        let fasta = td.path().join("chr1.fa");
        std::fs::write(&fasta, format!(">chr1\n{}\n", "GC".repeat(30))).unwrap();
        let wig = td.path().join("chr1.wig");
        let mut engine = DnaBactEngine::with_parameters(AnalysisParameters {
            window: 10,
            smooth: 10,
            ..AnalysisParameters::default()
        });
        let res = engine
            .apply(Operation::ContentTrack {
                path: fasta.to_string_lossy().to_string(),
                content: ContentKind::GC,
                output: wig.to_string_lossy().to_string(),
            })
            .unwrap();
        assert_eq!(res.rows, 60);
        assert!(res.messages[0].contains("smooth 11"));
        let text = std::fs::read_to_string(&wig).unwrap();
        assert_eq!(text.lines().count(), 62);
        assert!(text.contains("chrom=chr1"));
    }

    #[test]
    fn test_content_track_rejects_short_sequence() {
        let td = tempdir().unwrap();
        let fasta = td.path().join("short.fa");
        std::fs::write(&fasta, ">short\nACGT\n").unwrap();
        let mut engine = DnaBactEngine::new();
        let err = engine
            .apply(Operation::ContentTrack {
                path: fasta.to_string_lossy().to_string(),
                content: ContentKind::AT,
                output: td.path().join("short.wig").to_string_lossy().to_string(),
            })
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(!td.path().join("short.wig").exists());
    }

    #[test]
    fn test_gene_fasta_needs_an_output() {
        let mut engine = DnaBactEngine::new();
        let err = engine
            .apply(Operation::GeneFasta {
                path: "unused.gbk".to_string(),
                record_class: None,
                nucleotides: None,
                proteins: None,
            })
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_missing_genbank_file_is_io_error() {
        let mut engine = DnaBactEngine::new();
        let err = engine
            .apply(Operation::FeatureTable {
                path: "/nonexistent/input.gbk".to_string(),
                record_class: None,
                output: None,
            })
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Io);
    }

    #[test]
    fn test_workflow_journals_run_id() {
        let mut engine = DnaBactEngine::new();
        let wf: Workflow = serde_json::from_str(
            r#"{
                "run_id": "setup",
                "ops": [
                    {"SetParameter": {"name": "smooth", "value": 51}},
                    {"SetParameter": {"name": "record_class", "value": "plasmid"}}
                ]
            }"#,
        )
        .unwrap();
        let results = engine.apply_workflow(wf).unwrap();
        assert_eq!(
            results.iter().map(|r| r.op_id.as_str()).collect::<Vec<_>>(),
            vec!["op-1", "op-2"]
        );
        assert_eq!(engine.parameters().smooth, 51);
        assert_eq!(engine.parameters().record_class, RecordClass::Plasmid);
        assert!(engine.operation_log().iter().all(|r| r.run_id == "setup"));
    }

    #[test]
    fn test_capabilities_list_every_operation() {
        let caps = DnaBactEngine::capabilities();
        assert_eq!(caps.supported_operations.len(), 5);
        assert!(caps.supported_operations.contains(&"ContentTrack".to_string()));
        assert_eq!(caps.supported_contents, vec!["GC", "AT"]);
        assert_eq!(caps.feature_kinds, vec!["CDS", "rRNA", "tRNA"]);
    }
}
