//! Tabular input: an ordered sequence of records with named fields.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table; every row is padded or truncated to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, String::new());
                r
            })
            .collect();
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn test_rows_padded_to_header_width() {
        let t = Table::new(s(&["Date", "Note", "Amount"]), vec![s(&["2024-01-01"]), s(&["a", "b", "c", "d"])]);
        assert_eq!(t.rows[0], s(&["2024-01-01", "", ""]));
        assert_eq!(t.rows[1], s(&["a", "b", "c"]));
        assert_eq!(t.column_index("Amount"), Some(2));
        assert!(t.column_index("Saldo").is_none());
    }
}
