//! Category taxonomy: the fixed, ordered set of labels a transaction may get.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GastosError, Result};
use crate::text::fold;

/// Sentinel for rows the classifier could not place in the taxonomy.
pub const UNCLASSIFIED: &str = "No clasificado";

/// Prefix of the error marker rendered for rows whose chunk failed.
pub const ERROR_PREFIX: &str = "Error";

/// Default labels, in rule evaluation order.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Comida",
    "Transporte",
    "Salud",
    "Vivienda",
    "Entretenimiento",
    "Servicios",
    "Transferencias",
    "Ingresos",
    "Deuda",
    "Compras",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    labels: Vec<String>,
}

impl Taxonomy {
    /// Build a taxonomy, rejecting empty lists, blank labels, duplicates
    /// (compared case/accent-insensitively) and the reserved sentinel.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels
            .into_iter()
            .map(|l| l.into().trim().to_string())
            .collect();

        if labels.is_empty() {
            return Err(GastosError::Config("taxonomy has no categories".to_string()));
        }

        let mut seen: Vec<String> = Vec::with_capacity(labels.len());
        for label in &labels {
            if label.is_empty() {
                return Err(GastosError::Config("taxonomy contains a blank category".to_string()));
            }
            let key = fold(label);
            if key == fold(UNCLASSIFIED) || label.starts_with(ERROR_PREFIX) {
                return Err(GastosError::Config(format!(
                    "category '{label}' collides with a reserved marker"
                )));
            }
            if seen.contains(&key) {
                return Err(GastosError::Config(format!("duplicate category '{label}'")));
            }
            seen.push(key);
        }

        Ok(Self { labels })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Validate free text returned by the classification service.
    ///
    /// Exact match first, then a case/accent-insensitive match after removing
    /// quoting, markdown emphasis, a `Categoría:` lead-in and a trailing period
    /// or colon.
    /// There is no fuzzy matching: anything else is `None`.
    pub fn resolve(&self, raw: &str) -> Option<&str> {
        let raw = raw.trim();
        if let Some(l) = self.labels.iter().find(|l| *l == raw) {
            return Some(l);
        }

        let cleaned = clean_label(raw);
        let key = fold(cleaned);
        if key.is_empty() {
            return None;
        }
        self.labels
            .iter()
            .find(|l| fold(l) == key)
            .map(|l| l.as_str())
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self {
            labels: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn clean_label(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some((lead, rest)) = s.split_once(':') {
        if matches!(fold(lead).as_str(), "categoria" | "category") {
            s = rest.trim();
        }
    }
    let s = s.trim_matches(|c: char| matches!(c, '"' | '\'' | '*' | '`' | '_'));
    s.trim_end_matches(['.', ':']).trim()
}

/// The category assigned to one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// A member of the taxonomy.
    Label(String),
    /// Reply missing, or outside the taxonomy.
    Unclassified,
    /// The request for this row's chunk failed; carries the reason.
    Failed(String),
}

impl Category {
    pub fn label(label: impl Into<String>) -> Self {
        Category::Label(label.into())
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Category::Failed(reason.into())
    }

    /// Taxonomy label, if this is a real assignment.
    pub fn as_label(&self) -> Option<&str> {
        match self {
            Category::Label(l) => Some(l),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Category::Failed(_))
    }

    pub fn is_unclassified(&self) -> bool {
        matches!(self, Category::Unclassified)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Label(l) => f.write_str(l),
            Category::Unclassified => f.write_str(UNCLASSIFIED),
            Category::Failed(reason) => write!(f, "{ERROR_PREFIX}: {reason}"),
        }
    }
}
