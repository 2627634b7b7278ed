//! Report rendering for text, JSON and CSV output.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use treevol_io::report::{self, ReportOptions, ReportSummary, VolumeReport};

use crate::{Cli, OutputFormat};

/// Format used for a report file. Text output has no file form, so the
/// extension decides.
fn file_format(format: OutputFormat, path: &Path) -> OutputFormat {
    match format {
        OutputFormat::Text => match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Csv,
        },
        other => other,
    }
}

/// Emit reports according to the global output options.
pub fn emit_reports(reports: &[VolumeReport], cli: &Cli) -> Result<()> {
    let options = ReportOptions::default().with_delimiter(cli.delimiter);

    if let Some(path) = &cli.output {
        let written = match file_format(cli.format, path) {
            OutputFormat::Json => report::write_json_file(reports, path),
            _ => report::write_csv_file(reports, path, &options),
        };
        written.with_context(|| format!("Failed to write report to {:?}", path))?;
    }

    if cli.quiet {
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match (cli.format, &cli.output) {
        (OutputFormat::Text, _) => print_text(reports, &mut out)?,
        (OutputFormat::Json, None) => {
            report::write_json(reports, &mut out)?;
            writeln!(out)?;
        }
        (OutputFormat::Csv, None) => report::write_csv(reports, &mut out, &options)?,
        (_, Some(path)) => writeln!(out, "Results: {}", path.display())?,
    }

    Ok(())
}

fn print_text<W: Write>(reports: &[VolumeReport], out: &mut W) -> io::Result<()> {
    for r in reports {
        let status = if r.success { "ok  " } else { "FAIL" };
        let volume = r
            .volume_m3
            .map(|v| format!("{:.4} m3", v))
            .unwrap_or_else(|| "N/A".to_string());
        write!(out, "  {} {}: {}", status, r.filename, volume)?;
        if let Some(area) = r.surface_area_m2 {
            write!(out, ", area {:.4} m2", area)?;
        }
        if let Some(height) = r.height_m {
            write!(out, ", height {:.2} m", height)?;
        }
        if let Some(method) = r.method {
            write!(out, " [{}]", method)?;
        }
        writeln!(out)?;
    }

    let summary = ReportSummary::from_reports(reports);
    writeln!(out)?;
    writeln!(out, "Processed: {} files", summary.processed)?;
    writeln!(out, "Successful: {}", summary.successful)?;
    writeln!(out, "Total volume: {:.4} m3", summary.total_volume_m3)?;
    Ok(())
}

/// Print any serializable value in the selected format.
pub fn print<T: Serialize + std::fmt::Debug>(value: &T, format: OutputFormat, quiet: bool) -> Result<()> {
    if quiet {
        return Ok(());
    }
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        _ => println!("{:#?}", value),
    }
    Ok(())
}
