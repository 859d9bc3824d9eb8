//! Matrix File: dense, line-oriented text persistence of a correlation matrix.
//!
//! ```text
//! 3                                            <- N, number of rows
//! k=200,overlap_threshold=125,threads=4,...    <- parameter annotation
//! NaN,-0.3650,NaN                              <- row 0: N cells
//! -0.3650,NaN,0.0012                           <- row 1
//! NaN,0.0012,NaN                               <- row 2
//! ```
//!
//! Positions are those of the canonical user ordering; the file stores no
//! ids. A cell is `NaN` exactly when the row retains no neighbor for that
//! column, the diagonal included.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::{info, warn};

use crate::config::annotation_value;
use crate::error::{CodecError, ConfigError};
use crate::fingerprint::ordering_fingerprint;
use crate::matrix::CorrelationMatrix;
use crate::neighbors::{BoundedNeighborSet, NAN_CELL};
use crate::score::QuantizedScore;
use crate::ratings::{check_ordering, UserId};

// ============================================================================
// WRITE
// ============================================================================

/// Write `matrix` to `path`, creating missing parent directories.
///
/// A failure part-way leaves a truncated file behind; discard it and rebuild.
pub fn write_matrix<P: AsRef<Path>>(
    path: P,
    matrix: &CorrelationMatrix,
    annotation: &str,
) -> Result<(), CodecError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    write_to(&mut writer, matrix, annotation)?;
    writer.flush()?;

    info!("wrote {} matrix rows to {}", matrix.len(), path.display());
    Ok(())
}

pub fn write_to<W: Write>(
    writer: &mut W,
    matrix: &CorrelationMatrix,
    annotation: &str,
) -> Result<(), CodecError> {
    let width = matrix.len();
    writeln!(writer, "{}", width)?;
    writeln!(writer, "{}", annotation.replace(['\r', '\n'], " "))?;

    for row in matrix.rows() {
        let cells = row.to_dense_row_indexed(width, matrix.positions());
        writeln!(writer, "{}", cells.join(","))?;
    }
    Ok(())
}

// ============================================================================
// READ
// ============================================================================

/// Read a matrix written for `ordering`.
///
/// The whole file must be well formed; no partial matrix is returned. Rows
/// holding more than `capacity` neighbors are rejected, not truncated.
pub fn read_matrix<P: AsRef<Path>>(
    path: P,
    ordering: &[UserId],
    capacity: usize,
) -> Result<CorrelationMatrix, CodecError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let matrix = read_from(reader, ordering, capacity)?;

    info!("read {} matrix rows from {}", matrix.len(), path.display());
    Ok(matrix)
}

pub fn read_from<R: BufRead>(
    reader: R,
    ordering: &[UserId],
    capacity: usize,
) -> Result<CorrelationMatrix, CodecError> {
    if capacity == 0 {
        return Err(ConfigError::ZeroCapacity.into());
    }
    check_ordering(ordering)?;
    let mut lines = reader.lines();

    let header = lines.next().ok_or(CodecError::MissingHeader)??;
    let declared: usize = header
        .trim()
        .parse()
        .map_err(|_| CodecError::InvalidRowCount(header.clone()))?;

    let annotation = lines.next().ok_or(CodecError::MissingHeader)??;
    if let Some(written) = annotation_value(&annotation, "ordering") {
        if written != ordering_fingerprint(ordering) {
            warn!("matrix was written for a different user ordering (fingerprint {})", written);
        }
    }

    if declared != ordering.len() {
        return Err(CodecError::RowCountMismatch {
            declared,
            expected: ordering.len(),
        });
    }

    let mut rows = Vec::with_capacity(declared);
    for (row, &owner) in ordering.iter().enumerate() {
        let line = lines.next().ok_or(CodecError::MissingRow { row })??;
        rows.push(parse_row(line.trim_end(), row, owner, ordering, capacity)?);
    }

    for line in lines {
        if !line?.trim().is_empty() {
            return Err(CodecError::TrailingData { rows: declared });
        }
    }

    Ok(CorrelationMatrix::from_rows(ordering, rows, capacity))
}

fn parse_row(
    line: &str,
    row: usize,
    owner: UserId,
    ordering: &[UserId],
    capacity: usize,
) -> Result<BoundedNeighborSet, CodecError> {
    let cells: Vec<&str> = line.split(',').collect();
    if cells.len() != ordering.len() {
        return Err(CodecError::CellCount {
            row,
            expected: ordering.len(),
            actual: cells.len(),
        });
    }

    let mut neighbors = BoundedNeighborSet::new(owner, capacity);
    let mut entries = 0;
    for (column, token) in cells.into_iter().enumerate() {
        let token = token.trim();
        if token == NAN_CELL {
            continue;
        }
        let similarity = parse_cell(token).ok_or_else(|| CodecError::InvalidCell {
            row,
            column,
            token: token.to_string(),
        })?;
        if column == row {
            return Err(CodecError::SelfCorrelation { row });
        }
        entries += 1;
        if entries > capacity {
            return Err(CodecError::RowOverCapacity {
                row,
                entries: count_entries(line),
                capacity,
            });
        }
        neighbors.insert_unchecked(ordering[column], similarity);
    }
    Ok(neighbors)
}

/// Accepts `0.0012`, `.0012`, `-.3650`. A stored similarity lies in
/// `[-1, 1]` and is non-zero at four decimals; anything else is rejected.
fn parse_cell(token: &str) -> Option<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|value| (-1.0..=1.0).contains(value))
        .filter(|&value| !QuantizedScore::new(0, value).is_zero())
}

fn count_entries(line: &str) -> usize {
    line.split(',').filter(|cell| cell.trim() != NAN_CELL).count()
}
