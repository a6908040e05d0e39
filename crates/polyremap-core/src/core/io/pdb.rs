//! Periodic cell recovery from builder-written PDB files.
//!
//! The builder does not wrap chains back into the cell, so any box a downstream tool
//! derives from the coordinates is too large. The `CRYST1` record the builder writes
//! is the only trustworthy description of the cell.

use crate::core::models::cell::BoxMetadata;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

pub const CELL_RECORD: &str = "CRYST1";

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("No CRYST1 record found; the periodic cell is unknown")]
    BoxInfoMissing,
    #[error("Invalid CRYST1 record on line {line}: {message}")]
    InvalidCellRecord { line: usize, message: String },
}

/// Extracts the periodic cell from the first `CRYST1` record of a PDB stream.
///
/// # Errors
///
/// Returns [`PdbError::BoxInfoMissing`] if no `CRYST1` record exists; a default box
/// is never substituted.
pub fn read_cell(reader: impl BufRead) -> Result<BoxMetadata, PdbError> {
    for (idx, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let mut fields = line.split_whitespace();
        if fields.next() != Some(CELL_RECORD) {
            continue;
        }

        let values: Vec<f64> = fields
            .take(6)
            .map(|v| {
                v.parse::<f64>().map_err(|_| PdbError::InvalidCellRecord {
                    line: idx + 1,
                    message: format!("'{}' is not a number", v),
                })
            })
            .collect::<Result<_, _>>()?;
        if values.len() < 6 {
            return Err(PdbError::InvalidCellRecord {
                line: idx + 1,
                message: format!("expected 6 numeric fields, found {}", values.len()),
            });
        }
        if values[..3].iter().any(|&l| l <= 0.0) {
            return Err(PdbError::InvalidCellRecord {
                line: idx + 1,
                message: "cell lengths must be positive".to_string(),
            });
        }

        return Ok(BoxMetadata::new(
            [values[0], values[1], values[2]],
            [values[3], values[4], values[5]],
        ));
    }
    Err(PdbError::BoxInfoMissing)
}

pub fn read_cell_from_path<P: AsRef<Path>>(path: P) -> Result<BoxMetadata, PdbError> {
    let file = File::open(path)?;
    read_cell(BufReader::new(file))
}
