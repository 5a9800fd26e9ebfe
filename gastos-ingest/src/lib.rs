//! gastos-ingest: statement files (CSV/XLSX bytes) in, clean tables out, and
//! CSV serialization for exports.

pub mod delimited;
pub mod normalize;
pub mod writer;
#[cfg(feature = "xlsx")]
pub mod xlsx;

use anyhow::Result;
use gastos_core::Table;
use std::path::Path;

pub use delimited::parse_delimited;
pub use normalize::normalize_grid;
pub use writer::write_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Delimited,
    Spreadsheet,
}

impl Format {
    /// Guess from the file extension, falling back to the leading bytes
    /// (xlsx is a zip archive, legacy xls an OLE2 compound file).
    pub fn detect(path: Option<&Path>, bytes: &[u8]) -> Format {
        let ext = path
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("xlsx" | "xlsm" | "xls" | "ods") => return Format::Spreadsheet,
            Some("csv" | "tsv" | "txt") => return Format::Delimited,
            _ => {}
        }
        if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
            Format::Spreadsheet
        } else {
            Format::Delimited
        }
    }
}

/// Parse raw bytes into a normalized table.
pub fn parse_table(bytes: &[u8], format: Format) -> Result<Table> {
    match format {
        Format::Delimited => parse_delimited(bytes),
        Format::Spreadsheet => parse_spreadsheet(bytes),
    }
}

/// Read a file from disk and parse it, detecting the format.
pub fn read_table(path: impl AsRef<Path>) -> Result<Table> {
    use anyhow::Context;

    let path = path.as_ref();
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let format = Format::detect(Some(path), &bytes);
    parse_table(&bytes, format).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(feature = "xlsx")]
fn parse_spreadsheet(bytes: &[u8]) -> Result<Table> {
    xlsx::parse_xlsx(bytes)
}

#[cfg(not(feature = "xlsx"))]
fn parse_spreadsheet(_bytes: &[u8]) -> Result<Table> {
    anyhow::bail!("spreadsheet support not compiled in (enable the `xlsx` feature)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(Format::detect(Some(Path::new("a.XLSX")), b""), Format::Spreadsheet);
        assert_eq!(Format::detect(Some(Path::new("a.csv")), b"PK\x03\x04"), Format::Delimited);
    }

    #[test]
    fn test_detect_by_magic() {
        assert_eq!(Format::detect(None, b"PK\x03\x04rest"), Format::Spreadsheet);
        assert_eq!(Format::detect(Some(Path::new("upload")), b"Date,Note\n"), Format::Delimited);
    }

    #[test]
    fn test_parse_table_delimited() {
        let t = parse_table(b"Date,Note,Amount\n2024-01-01,Uber,-10\n", Format::Delimited).unwrap();
        assert_eq!(t.headers, vec!["Date", "Note", "Amount"]);
        assert_eq!(t.len(), 1);
    }
}
