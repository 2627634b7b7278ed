//! Tree height from reconstruction tree summaries
//!
//! The summary is comma separated text, one row per tree segment with the
//! height (`z`) in the third column. Comment lines start with `#` and the
//! column header starts with `x,`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;
use treevol_core::{Error, Result};

/// Decimal places kept for heights
pub const HEIGHT_DECIMALS: u32 = 2;

/// Tree height from a summary file, or `None` if it can't be read.
pub fn tree_height<P: AsRef<Path>>(path: P) -> Option<f64> {
    let path = path.as_ref();
    let result = File::open(path)
        .map_err(Error::from)
        .and_then(|file| parse_tree_height(BufReader::new(file)));

    match result {
        Ok(height) => height,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No height from tree summary");
            None
        }
    }
}

/// Parse a tree summary and return the highest `z` value.
///
/// Heights are measured from the ground plane at `z = 0`, so the result is
/// never negative. Returns `None` when there are no data rows.
pub fn parse_tree_height<R: BufRead>(reader: R) -> Result<Option<f64>> {
    let mut max_z = 0.0_f64;
    let mut rows = 0usize;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') || line.starts_with("x,") {
            continue;
        }
        rows += 1;

        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() >= 3 {
            let z: f64 = parts[2]
                .trim()
                .parse()
                .map_err(|_| Error::Parse(format!("Invalid height value: {}", parts[2])))?;
            max_z = max_z.max(z);
        }
    }

    if rows == 0 {
        return Ok(None);
    }

    Ok(Some(crate::report::round_to(max_z, HEIGHT_DECIMALS)))
}
