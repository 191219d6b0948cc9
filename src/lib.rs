pub mod annotated_record;
pub mod engine;
pub mod error;
pub mod fasta_input;
pub mod feature_location;
pub mod feature_table;
pub mod genbank_file;
pub mod nucleotide_content;
pub mod parameters;
pub mod savgol;
pub mod translation;
pub mod wig_track;
