//! Fixed-step wiggle tracks for genome browsers.

use crate::error::{EngineError, EngineResult};
use log::info;
use std::{
    fs::File,
    io::{BufWriter, Write},
};

pub const TRACK_COLOR: &str = "168,130,88";

pub fn track_header(content_label: &str) -> String {
    format!(
        "track\ttype=wiggle_0\tname={content_label}_content\tgraphType=points\tvisibility=full\tcolor={TRACK_COLOR}"
    )
}

pub fn fixed_step_header(chrom: &str) -> String {
    format!("fixedStep\tchrom={chrom}\tstart=1\tstep=1\tspan=1")
}

/// Two header lines, then one value per line with one decimal place.
pub fn write_track<W: Write>(
    writer: &mut W,
    content: &[f64],
    chrom: &str,
    content_label: &str,
) -> std::io::Result<()> {
    writeln!(writer, "{}", track_header(content_label))?;
    writeln!(writer, "{}", fixed_step_header(chrom))?;
    for value in content {
        writeln!(writer, "{value:.1}")?;
    }
    writer.flush()
}

/// Creates or truncates `wig_output`. A failed write leaves whatever was
/// already written in place.
pub fn write_wig(
    content: &[f64],
    wig_output: &str,
    chrom: &str,
    content_label: &str,
) -> EngineResult<()> {
    let file = File::create(wig_output)
        .map_err(|e| EngineError::io(format!("Could not create track '{wig_output}': {e}")))?;
    let mut writer = BufWriter::new(file);
    write_track(&mut writer, content, chrom, content_label)
        .map_err(|e| EngineError::io(format!("Could not write track '{wig_output}': {e}")))?;
    info!(
        "Wrote {content_label} track with {} values to '{wig_output}'",
        content.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_values_with_one_decimal() {
        let mut out = Vec::new();
        write_track(&mut out, &[12.34, 5.0], "chr1", "GC").unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "track\ttype=wiggle_0\tname=GC_content\tgraphType=points\tvisibility=full\tcolor=168,130,88",
                "fixedStep\tchrom=chr1\tstart=1\tstep=1\tspan=1",
                "12.3",
                "5.0",
            ]
        );
        assert!(text.ends_with("5.0\n"));
    }

    #[test]
    fn empty_signal_writes_headers_only() {
        let mut out = Vec::new();
        write_track(&mut out, &[], "plasmid1", "AT").unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    }
}
