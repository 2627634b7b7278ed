//! Volume reports
//!
//! One [`VolumeReport`] per tree, written as a pretty-printed JSON array or as
//! CSV with the columns `filename,volume_m3,surface_area_m2,height_m,method`.

use crate::error::{IoError, IoResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use treevol_core::MeshMeasurement;

/// Decimal places kept for volumes and areas
pub const VOLUME_DECIMALS: u32 = 4;

/// CSV column names
pub const CSV_COLUMNS: [&str; 5] = ["filename", "volume_m3", "surface_area_m2", "height_m", "method"];

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Which mesh a volume was measured on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementMethod {
    /// A mesh file measured as given
    Direct,
    /// The per-tree mesh from tree extraction
    TreesMesh,
    /// The wrapped cloud mesh, used when tree extraction gave nothing
    WrapMesh,
}

impl MeasurementMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementMethod::Direct => "direct",
            MeasurementMethod::TreesMesh => "trees_mesh",
            MeasurementMethod::WrapMesh => "wrap_mesh",
        }
    }
}

impl std::fmt::Display for MeasurementMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurement results for one tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeReport {
    pub filename: String,
    pub volume_m3: Option<f64>,
    pub surface_area_m2: Option<f64>,
    pub height_m: Option<f64>,
    pub method: Option<MeasurementMethod>,
    pub success: bool,
}

impl VolumeReport {
    /// An empty, unsuccessful report
    pub fn new<S: Into<String>>(filename: S) -> Self {
        Self {
            filename: filename.into(),
            volume_m3: None,
            surface_area_m2: None,
            height_m: None,
            method: None,
            success: false,
        }
    }

    /// Record a measurement.
    ///
    /// Any measurement is stored, including a zero volume, so a measured zero
    /// stays distinguishable from an unreadable mesh. Returns whether the
    /// volume is non-zero; a zero or absent volume leaves `success` false so
    /// a fallback mesh can be tried. An absent measurement changes nothing.
    pub fn record(&mut self, measurement: Option<MeshMeasurement>, method: MeasurementMethod) -> bool {
        let Some(m) = measurement else {
            return false;
        };

        self.volume_m3 = Some(round_to(m.volume, VOLUME_DECIMALS));
        self.surface_area_m2 = Some(round_to(m.area, VOLUME_DECIMALS));
        self.method = Some(method);
        self.success = m.volume > 0.0;
        self.success
    }

    pub fn with_height(mut self, height_m: Option<f64>) -> Self {
        self.height_m = height_m;
        self
    }
}

/// CSV report options
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub delimiter: char,
    pub header: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            header: true,
        }
    }
}

impl ReportOptions {
    /// Semicolon separated, for spreadsheets in locales with a decimal comma
    pub fn semicolon() -> Self {
        Self {
            delimiter: ';',
            ..Self::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn without_header(mut self) -> Self {
        self.header = false;
        self
    }
}

/// Totals over a batch of reports
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub processed: usize,
    pub successful: usize,
    pub total_volume_m3: f64,
}

impl ReportSummary {
    pub fn from_reports(reports: &[VolumeReport]) -> Self {
        Self {
            processed: reports.len(),
            successful: reports.iter().filter(|r| r.success).count(),
            total_volume_m3: reports.iter().filter_map(|r| r.volume_m3).sum(),
        }
    }
}

/// Write reports as a pretty-printed JSON array
pub fn write_json<W: Write>(reports: &[VolumeReport], writer: W) -> IoResult<()> {
    serde_json::to_writer_pretty(writer, reports)?;
    Ok(())
}

/// Write reports as CSV. Absent values are empty cells.
pub fn write_csv<W: Write>(reports: &[VolumeReport], writer: &mut W, options: &ReportOptions) -> IoResult<()> {
    let delimiter = options.delimiter.to_string();

    if options.header {
        writeln!(writer, "{}", CSV_COLUMNS.join(delimiter.as_str()))?;
    }

    for report in reports {
        if report.filename.contains(options.delimiter) {
            return Err(IoError::WriteError {
                message: format!("File name '{}' contains the CSV delimiter", report.filename),
            });
        }

        let cells = [
            report.filename.clone(),
            format_cell(report.volume_m3),
            format_cell(report.surface_area_m2),
            format_cell(report.height_m),
            report.method.map(|m| m.to_string()).unwrap_or_default(),
        ];
        writeln!(writer, "{}", cells.join(delimiter.as_str()))?;
    }

    Ok(())
}

fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write reports to a JSON file
pub fn write_json_file<P: AsRef<Path>>(reports: &[VolumeReport], path: P) -> IoResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_json(reports, &mut writer)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Write reports to a CSV file
pub fn write_csv_file<P: AsRef<Path>>(reports: &[VolumeReport], path: P, options: &ReportOptions) -> IoResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_csv(reports, &mut writer, options)?;
    writer.flush()?;
    Ok(())
}
