//! Transaction rows and the classification attached to them.

use serde::{Deserialize, Serialize};

use crate::columns::ColumnRoleMap;
use crate::error::Result;
use crate::table::Table;
use crate::taxonomy::Category;

/// One input row, role-resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Free-text description; empty when the cell was empty.
    pub description: String,
    /// Opaque date value, as it appeared in the input.
    pub date: Option<String>,
    /// Opaque amount value, as it appeared in the input.
    pub amount: Option<String>,
    /// Every original field, in header order.
    pub raw_fields: Vec<(String, String)>,
}

impl Transaction {
    /// Build one transaction per table row.
    ///
    /// Fails with `Schema` when the description column is unresolved.
    pub fn from_table(table: &Table, roles: &ColumnRoleMap) -> Result<Vec<Transaction>> {
        let note_col = table.column_index(roles.require_note()?);
        let date_col = roles.date.as_deref().and_then(|h| table.column_index(h));
        let amount_col = roles.amount.as_deref().and_then(|h| table.column_index(h));

        let cell = |row: &Vec<String>, col: Option<usize>| col.and_then(|c| row.get(c)).cloned();

        Ok(table
            .rows
            .iter()
            .map(|row| Transaction {
                description: cell(row, note_col).unwrap_or_default(),
                date: cell(row, date_col),
                amount: cell(row, amount_col),
                raw_fields: table
                    .headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect(),
            })
            .collect())
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.raw_fields
            .iter()
            .find(|(h, _)| h == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Which stage of the cascade produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Cache,
    Keyword,
    Remote,
    /// Blank description: nothing to classify.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub source: Source,
    pub explanation: Option<String>,
}

impl Classification {
    pub fn new(category: Category, source: Source) -> Self {
        Self {
            category,
            source,
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: Option<String>) -> Self {
        self.explanation = explanation;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedTransaction {
    pub transaction: Transaction,
    pub classification: Classification,
}

impl ClassifiedTransaction {
    pub fn category(&self) -> &Category {
        &self.classification.category
    }
}
