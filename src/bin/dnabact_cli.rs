use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dnabact::{
    annotated_record::RecordClass,
    engine::{DnaBactEngine, Engine, OpResult, Operation, Workflow},
    genbank_file::GenBankProcessor,
    nucleotide_content::ContentKind,
    parameters::AnalysisParameters,
};
use log::{Level, info, warn};
use serde::Serialize;
use simple_logger::init_with_level;
use std::{fs, io};

#[derive(Parser, Debug)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Args {
    /// Logging verbosity level
    #[arg(short = 'L', long, default_value = "info", global = true)]
    level: Level,

    /// JSON file with analysis parameters
    #[arg(short = 'P', long, global = true)]
    params: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feature table of one record class; TSV on stdout unless --output is set
    Features {
        #[arg(short = 'g', long)]
        gbk: String,
        #[arg(short = 'c', long)]
        class: Option<RecordClass>,
        #[arg(short = 'o', long)]
        output: Option<String>,
    },
    /// Single-record GenBank file to unwrapped FASTA
    FullSeq {
        #[arg(short = 'g', long)]
        gbk: String,
        #[arg(short = 'o', long)]
        output: String,
    },
    /// Smoothed GC or AT content of a two-line FASTA as a wiggle track
    Content {
        #[arg(short = 'f', long)]
        fasta: String,
        #[arg(short = 'c', long, default_value = "GC")]
        content: ContentKind,
        #[arg(short = 'o', long)]
        output: String,
        #[arg(short = 'w', long)]
        window: Option<usize>,
        #[arg(short = 's', long)]
        smooth: Option<usize>,
    },
    /// Per-gene nucleotide and/or protein FASTA
    GeneFasta {
        #[arg(short = 'g', long)]
        gbk: String,
        #[arg(short = 'c', long)]
        class: Option<RecordClass>,
        #[arg(long)]
        fna: Option<String>,
        #[arg(long)]
        faa: Option<String>,
    },
    /// Apply one operation given as JSON or @file.json
    Op { json: String },
    /// Run a workflow given as JSON or @file.json
    Workflow { json: String },
    /// Print supported operations
    Capabilities,
}

fn load_json_arg(value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Could not read JSON file '{path}'"))
        }
        None => Ok(value.to_string()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Could not serialize JSON output")?;
    println!("{text}");
    Ok(())
}

fn report(result: &OpResult) {
    for message in &result.messages {
        info!("{message}");
    }
    for warning in &result.warnings {
        warn!("{warning}");
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_with_level(args.level)?;

    let parameters = match &args.params {
        Some(path) => AnalysisParameters::load_from_path(path)?,
        None => AnalysisParameters::default(),
    };

    match args.command {
        Command::Features {
            gbk,
            class,
            output: None,
        } => {
            let record_class = class.unwrap_or(parameters.record_class);
            let table = GenBankProcessor::new(&gbk).full_info_table(record_class)?;
            table.write_tsv_to(io::stdout().lock())?;
        }
        Command::Features {
            gbk,
            class,
            output: Some(output),
        } => {
            let mut engine = DnaBactEngine::with_parameters(parameters);
            report(&engine.apply(Operation::FeatureTable {
                path: gbk,
                record_class: class,
                output: Some(output),
            })?);
        }
        Command::FullSeq { gbk, output } => {
            let mut engine = DnaBactEngine::with_parameters(parameters);
            report(&engine.apply(Operation::FullSequence { path: gbk, output })?);
        }
        Command::Content {
            fasta,
            content,
            output,
            window,
            smooth,
        } => {
            let parameters = AnalysisParameters {
                window: window.unwrap_or(parameters.window),
                smooth: smooth.unwrap_or(parameters.smooth),
                ..parameters
            };
            let mut engine = DnaBactEngine::with_parameters(parameters);
            report(&engine.apply(Operation::ContentTrack {
                path: fasta,
                content,
                output,
            })?);
        }
        Command::GeneFasta {
            gbk,
            class,
            fna,
            faa,
        } => {
            let mut engine = DnaBactEngine::with_parameters(parameters);
            report(&engine.apply(Operation::GeneFasta {
                path: gbk,
                record_class: class,
                nucleotides: fna,
                proteins: faa,
            })?);
        }
        Command::Op { json } => {
            let json = load_json_arg(&json)?;
            let op: Operation =
                serde_json::from_str(&json).context("Invalid operation JSON")?;
            let mut engine = DnaBactEngine::with_parameters(parameters);
            print_json(&engine.apply(op)?)?;
        }
        Command::Workflow { json } => {
            let json = load_json_arg(&json)?;
            let workflow: Workflow =
                serde_json::from_str(&json).context("Invalid workflow JSON")?;
            let mut engine = DnaBactEngine::with_parameters(parameters);
            print_json(&engine.apply_workflow(workflow)?)?;
        }
        Command::Capabilities => print_json(&DnaBactEngine::capabilities())?,
    }
    Ok(())
}
