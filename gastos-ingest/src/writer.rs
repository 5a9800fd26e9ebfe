//! CSV serialization for export tables.

use anyhow::{Context, Result, anyhow};

/// Comma-delimited, header first, fields quoted only when needed.
pub fn write_csv<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(headers.iter().map(|h| h.as_ref()))
        .context("write header")?;
    for (i, row) in rows.iter().enumerate() {
        wtr.write_record(row)
            .with_context(|| format!("write row {}", i + 1))?;
    }
    wtr.into_inner()
        .map_err(|e| anyhow!("flush csv: {}", e.error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_csv_quotes_when_needed() {
        let rows = vec![
            vec!["2024-01-01".to_string(), "-10,5".to_string(), "Comida".to_string()],
            vec!["2024-01-02".to_string(), "3".to_string(), "Error: \"timeout\"".to_string()],
        ];
        let out = write_csv(&["Date", "Amount", "Category"], &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Date,Amount,Category\n2024-01-01,\"-10,5\",Comida\n2024-01-02,3,\"Error: \"\"timeout\"\"\"\n"
        );
    }

    #[test]
    fn test_header_only() {
        let out = write_csv(&["Date", "Amount", "Category"], &[]).unwrap();
        assert_eq!(out, b"Date,Amount,Category\n");
    }
}
