//! Row-major <-> column-major conversion.
//!
//! [`transpose`] is its own inverse: feeding it the columns of a table yields
//! the original rows again, so the same call converts in both directions.

use log::debug;

use crate::{
    error::{EvolveError, Result},
    row::Row,
};

/// Transposes `rows`, treating `rows[0]` as the header that fixes the width.
///
/// All fields are flattened into one sequence `F` of length `width * n`;
/// column `i` is the strided run `F[i], F[i + width], ...`.
pub fn transpose(rows: &[Row]) -> Result<Vec<Row>> {
    let header = rows.first().ok_or(EvolveError::MalformedTable {
        row: 0,
        expected: 0,
        found: 0,
    })?;
    let width = header.width();

    if let Some((idx, row)) = rows
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, row)| row.width() != width)
    {
        return Err(EvolveError::MalformedTable {
            row: idx + 1,
            expected: width,
            found: row.width(),
        });
    }

    let flat: Vec<&String> = rows.iter().flat_map(|row| row.iter()).collect();
    debug!(
        "Transposing {} row(s) x {} field(s) ({} value(s))",
        rows.len(),
        width,
        flat.len()
    );

    let columns = (0..width)
        .map(|offset| Row::new(flat.iter().skip(offset).step_by(width).map(|f| f.as_str())))
        .collect();
    Ok(columns)
}

/// Number of data records held by a column-major table (the length of any column).
pub fn row_count_of(columns: &[Row]) -> usize {
    columns.first().map(Row::width).unwrap_or(0)
}
