//! Delimited text (CSV/TSV/semicolon) statement parsing.
//!
//! Spanish-locale exports commonly use `;` because `,` is the decimal mark,
//! and older bank portals emit Windows-1252 instead of UTF-8.

use anyhow::{Context, Result};
use gastos_core::Table;
use tracing::debug;

use crate::normalize::normalize_grid;

const DELIMITERS: &[u8] = b",;\t|";
const SNIFF_LINES: usize = 20;

pub fn parse_delimited(bytes: &[u8]) -> Result<Table> {
    let text = decode(bytes);
    let delimiter = sniff_delimiter(&text);
    debug!(delimiter = %(delimiter as char).escape_default(), "parsing delimited input");

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut grid = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("reading line {}", i + 1))?;
        grid.push(record.iter().map(|c| c.to_string()).collect());
    }

    normalize_grid(grid)
}

/// UTF-8 (BOM stripped) when valid, otherwise Latin-1 byte-for-char.
fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            debug!("input is not UTF-8; decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

/// The delimiter present on the most of the first lines; ties go to the one
/// with more occurrences, then to declaration order.
fn sniff_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best = (b',', 0usize, 0usize);
    for &d in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|l| l.bytes().filter(|&b| b == d).count())
            .collect();
        let lines_with = counts.iter().filter(|&&c| c > 0).count();
        let total: usize = counts.iter().sum();
        if (lines_with, total) > (best.1, best.2) {
            best = (d, lines_with, total);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_csv() {
        let t = parse_delimited(b"Date,Note,Amount\n2024-01-02,\"Uber, viaje\",-10.5\n").unwrap();
        assert_eq!(t.headers, vec!["Date", "Note", "Amount"]);
        assert_eq!(t.rows[0], vec!["2024-01-02", "Uber, viaje", "-10.5"]);
    }

    #[test]
    fn test_semicolon_with_decimal_comma() {
        let input = "Fecha;Descripción;Monto\n01/02/2024;Farmacia;-12,50\n02/02/2024;Sueldo;1500,00\n";
        let t = parse_delimited(input.as_bytes()).unwrap();
        assert_eq!(t.headers, vec!["Fecha", "Descripción", "Monto"]);
        assert_eq!(t.rows[0][2], "-12,50");
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_bom_and_latin1() {
        let mut utf8 = b"\xEF\xBB\xBFNote,Amount\nx,1\n".to_vec();
        let t = parse_delimited(&utf8).unwrap();
        assert_eq!(t.headers[0], "Note");

        // "Descripción" in Latin-1: ó = 0xF3
        utf8 = b"Descripci\xF3n;Monto\ncaf\xE9;1\n".to_vec();
        let t = parse_delimited(&utf8).unwrap();
        assert_eq!(t.headers[0], "Descripción");
        assert_eq!(t.rows[0][0], "café");
    }

    #[test]
    fn test_tab_separated() {
        let t = parse_delimited(b"Date\tNote\tAmount\n1\tx\t2\n").unwrap();
        assert_eq!(t.headers.len(), 3);
    }
}
