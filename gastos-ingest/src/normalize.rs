//! Turn a raw cell grid into a clean `Table`.
//!
//! Bank exports often carry a preamble (account number, period, blank rows)
//! before the real header, trailing empty rows/columns, and blank or repeated
//! header names. The classifier expects one header row with unique names.

use anyhow::{Result, bail};
use gastos_core::{ColumnRoleMap, Table};
use tracing::debug;

/// How far down we look for a header row that names a description column.
const HEADER_SCAN_ROWS: usize = 30;

pub fn normalize_grid(grid: Vec<Vec<String>>) -> Result<Table> {
    let rows: Vec<Vec<String>> = grid
        .into_iter()
        .map(|r| r.into_iter().map(|c| c.trim().to_string()).collect())
        .collect();

    let header_idx = match find_header_row(&rows) {
        Some(i) => i,
        None => bail!("input has no header row"),
    };
    if header_idx > 0 {
        debug!(row = header_idx, "header row found below preamble");
    }

    let header = &rows[header_idx];
    let data: Vec<&Vec<String>> = rows[header_idx + 1..]
        .iter()
        .filter(|r| !is_blank(r))
        .collect();

    let width = data
        .iter()
        .map(|r| used_width(r))
        .chain(std::iter::once(used_width(header)))
        .max()
        .unwrap_or(0);

    let headers = unique_headers(header, width);
    let rows = data.into_iter().cloned().collect();
    Ok(Table::new(headers, rows))
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.is_empty())
}

fn non_empty(row: &[String]) -> usize {
    row.iter().filter(|c| !c.is_empty()).count()
}

/// Index just past the last non-empty cell.
fn used_width(row: &[String]) -> usize {
    row.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1)
}

/// Prefer a row that names a description column; otherwise the first row
/// with at least two filled cells; otherwise the first non-blank row.
fn find_header_row(rows: &[Vec<String>]) -> Option<usize> {
    let candidates: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| !is_blank(r))
        .map(|(i, _)| i)
        .take(HEADER_SCAN_ROWS)
        .collect();

    candidates
        .iter()
        .copied()
        .find(|&i| ColumnRoleMap::resolve(&rows[i]).note.is_some())
        .or_else(|| candidates.iter().copied().find(|&i| non_empty(&rows[i]) >= 2))
        .or_else(|| candidates.first().copied())
}

/// Backfill blank names as `Column N` and suffix repeats with ` (2)`, ` (3)`...
fn unique_headers(header: &[String], width: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(width);
    for i in 0..width {
        let base = match header.get(i) {
            Some(h) if !h.is_empty() => h.clone(),
            _ => format!("Column {}", i + 1),
        };
        let mut name = base.clone();
        let mut n = 2;
        while out.contains(&name) {
            name = format!("{base} ({n})");
            n += 1;
        }
        out.push(name);
    }
    out
}
