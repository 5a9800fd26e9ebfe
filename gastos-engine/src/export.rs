//! Projection of classified rows onto the output schema.
//!
//! Output columns are `Date`, `Amount`, `Category`, then optionally `Note`
//! and `Explanation`. Date and amount values are copied from the resolved
//! input columns untouched.

use gastos_core::{ClassifiedTransaction, ColumnRoleMap, Table};

pub const DATE_HEADER: &str = "Date";
pub const AMOUNT_HEADER: &str = "Amount";
pub const CATEGORY_HEADER: &str = "Category";
pub const NOTE_HEADER: &str = "Note";
pub const EXPLANATION_HEADER: &str = "Explanation";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Keep the original description as a `Note` column.
    pub include_note: bool,
    pub include_explanation: bool,
}

/// Fails with `MissingColumn` when date or amount was not resolved.
pub fn export_table(
    rows: &[ClassifiedTransaction],
    roles: &ColumnRoleMap,
    options: ExportOptions,
) -> gastos_core::Result<Table> {
    let (date_col, amount_col) = roles.require_export()?;

    let mut headers = vec![
        DATE_HEADER.to_string(),
        AMOUNT_HEADER.to_string(),
        CATEGORY_HEADER.to_string(),
    ];
    if options.include_note {
        headers.push(NOTE_HEADER.to_string());
    }
    if options.include_explanation {
        headers.push(EXPLANATION_HEADER.to_string());
    }

    let out = rows
        .iter()
        .map(|row| {
            let t = &row.transaction;
            let date = t.field(date_col).or(t.date.as_deref()).unwrap_or_default();
            let amount = t.field(amount_col).or(t.amount.as_deref()).unwrap_or_default();

            let mut cells = vec![date.to_string(), amount.to_string(), row.category().to_string()];
            if options.include_note {
                cells.push(t.description.clone());
            }
            if options.include_explanation {
                cells.push(row.classification.explanation.clone().unwrap_or_default());
            }
            cells
        })
        .collect();

    Ok(Table::new(headers, out))
}
