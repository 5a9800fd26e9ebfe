//! Column role resolution across locale-variant headers.
//!
//! Bank exports name the same column many ways ("Note", "Descripción",
//! "Glosa", "Fecha valor", "Cargo"...). We map each header onto one of three
//! logical roles and remember which kind of amount column was found.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GastosError, Result};
use crate::text::fold;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Note,
    Date,
    Amount,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Note => "note",
            Role::Date => "date",
            Role::Amount => "amount",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the amount column's header says about the sign of its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmountKind {
    /// One signed column (positive income, negative expense).
    Signed,
    /// A credit/deposit column: money coming in.
    Credit,
    /// A debit/charge column: money going out.
    Debit,
}

/// Accepted description headers, already folded.
pub const NOTE_CANDIDATES: &[&str] = &[
    "note",
    "nota",
    "notas",
    "descripcion",
    "description",
    "detalle",
    "concepto",
    "glosa",
    "memo",
    "narrative",
    "payee",
    "movimiento",
    "referencia",
];

pub const DATE_CANDIDATES: &[&str] = &[
    "date",
    "fecha",
    "fecha operacion",
    "fecha valor",
    "transaction date",
    "posted date",
    "dia",
];

pub const AMOUNT_CANDIDATES: &[(&str, AmountKind)] = &[
    ("amount", AmountKind::Signed),
    ("monto", AmountKind::Signed),
    ("importe", AmountKind::Signed),
    ("valor", AmountKind::Signed),
    ("cantidad", AmountKind::Signed),
    ("total", AmountKind::Signed),
    ("abono", AmountKind::Credit),
    ("abonos", AmountKind::Credit),
    ("ingreso", AmountKind::Credit),
    ("credito", AmountKind::Credit),
    ("credit", AmountKind::Credit),
    ("deposit", AmountKind::Credit),
    ("deposito", AmountKind::Credit),
    ("cargo", AmountKind::Debit),
    ("cargos", AmountKind::Debit),
    ("egreso", AmountKind::Debit),
    ("debito", AmountKind::Debit),
    ("debit", AmountKind::Debit),
    ("gasto", AmountKind::Debit),
    ("withdrawal", AmountKind::Debit),
    ("retiro", AmountKind::Debit),
];

/// Fold a header for comparison: case, accents, `_`/`-` separators, spacing.
fn header_key(header: &str) -> String {
    fold(&header.replace(['_', '-'], " "))
}

/// Logical role → resolved header name. Built once per input table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoleMap {
    pub note: Option<String>,
    pub date: Option<String>,
    pub amount: Option<String>,
    pub amount_kind: Option<AmountKind>,
    headers: Vec<String>,
}

impl ColumnRoleMap {
    /// Resolve roles from an ordered header row.
    ///
    /// For each role the first header (in header order) equal to any
    /// candidate wins. Roles claim headers in the order note, date, amount and
    /// a claimed header is never reused.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let keys: Vec<String> = headers.iter().map(|h| header_key(h.as_ref())).collect();
        let mut claimed = vec![false; headers.len()];

        let mut pick = |accept: &dyn Fn(&str) -> bool| -> Option<usize> {
            let idx = keys
                .iter()
                .enumerate()
                .find(|(i, k)| !claimed[*i] && accept(k))
                .map(|(i, _)| i)?;
            claimed[idx] = true;
            Some(idx)
        };

        let note = pick(&|k| NOTE_CANDIDATES.contains(&k));
        let date = pick(&|k| DATE_CANDIDATES.contains(&k));
        let amount = pick(&|k| AMOUNT_CANDIDATES.iter().any(|(c, _)| *c == k));

        let amount_kind = amount.and_then(|i| {
            AMOUNT_CANDIDATES
                .iter()
                .find(|(c, _)| *c == keys[i])
                .map(|(_, kind)| *kind)
        });

        let name = |i: usize| headers[i].as_ref().to_string();
        Self {
            note: note.map(name),
            date: date.map(name),
            amount: amount.map(name),
            amount_kind,
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
        }
    }

    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::Note => self.note.as_deref(),
            Role::Date => self.date.as_deref(),
            Role::Amount => self.amount.as_deref(),
        }
    }

    /// Headers the map was resolved from.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The description column, or a `Schema` error naming what was expected.
    pub fn require_note(&self) -> Result<&str> {
        self.note.as_deref().ok_or_else(|| GastosError::Schema {
            expected: NOTE_CANDIDATES.join(", "),
            found: if self.headers.is_empty() {
                "(none)".to_string()
            } else {
                self.headers.join(", ")
            },
        })
    }

    /// Date and amount columns, both required for export.
    pub fn require_export(&self) -> Result<(&str, &str)> {
        match (self.date.as_deref(), self.amount.as_deref()) {
            (Some(d), Some(a)) => Ok((d, a)),
            (d, a) => {
                let mut missing = Vec::new();
                if d.is_none() {
                    missing.push(Role::Date);
                }
                if a.is_none() {
                    missing.push(Role::Amount);
                }
                Err(GastosError::MissingColumn { missing })
            }
        }
    }
}
