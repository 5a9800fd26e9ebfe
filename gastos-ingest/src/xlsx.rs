//! Spreadsheet (xlsx/xls/ods) statement parsing via calamine.
//!
//! Only the first worksheet is read. Dates stored as Excel serials are
//! rendered as `YYYY-MM-DD`; everything else keeps its display text.

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader};
use chrono::{Duration, NaiveDate};
use gastos_core::Table;
use std::io::Cursor;
use tracing::debug;

use crate::normalize::normalize_grid;

pub fn parse_xlsx(bytes: &[u8]) -> Result<Table> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .context("open spreadsheet")?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("spreadsheet has no worksheets"))?;
    debug!(sheet = %sheet, "reading first worksheet");

    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("read worksheet {sheet}"))?;

    let grid = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    normalize_grid(grid)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{e:?}"),
    }
}

/// Whole floats print without a trailing `.0` (amounts are often integral).
fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug).
fn excel_serial_to_date(serial: f64) -> String {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|base| base.checked_add_signed(Duration::days(serial.floor() as i64)))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| format_float(serial))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(45292.0), "2024-01-01");
        assert_eq!(excel_serial_to_date(1.0), "1899-12-31");
        assert_eq!(excel_serial_to_date(60.5), "1900-02-28");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(-5200.0)), "-5200");
        assert_eq!(cell_text(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_text(&Data::String("Uber".into())), "Uber");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(parse_xlsx(b"PK\x03\x04 not really a zip").is_err());
    }
}
