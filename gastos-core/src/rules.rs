//! Keyword rule matcher: first-match-wins substring triggers.
//!
//! No LLM needed for the common merchants. Rules are evaluated in declared
//! order (the default set follows the taxonomy order) and the first category
//! with any trigger contained in the lower-cased description wins. There is
//! no scoring: "uber eats" is Comida because Comida is declared before
//! Transporte.

use serde::{Deserialize, Serialize};

use crate::error::{GastosError, Result};
use crate::taxonomy::Taxonomy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub category: String,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new<I, S>(category: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            category: category.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

/// Which rule fired, for logging and explanations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordMatch<'a> {
    pub category: &'a str,
    pub keyword: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatcher {
    rules: Vec<KeywordRule>,
}

impl KeywordMatcher {
    /// Build a matcher. Every rule must name a taxonomy category; triggers are
    /// lower-cased and blank triggers dropped.
    pub fn new(rules: Vec<KeywordRule>, taxonomy: &Taxonomy) -> Result<Self> {
        let mut out = Vec::with_capacity(rules.len());
        for rule in rules {
            if !taxonomy.contains(&rule.category) {
                return Err(GastosError::Config(format!(
                    "keyword rule names unknown category '{}'",
                    rule.category
                )));
            }
            let keywords: Vec<String> = rule
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            out.push(KeywordRule {
                category: rule.category,
                keywords,
            });
        }
        Ok(Self { rules: out })
    }

    /// Matcher with no rules; everything falls through to the next stage.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn find(&self, description: &str) -> Option<KeywordMatch<'_>> {
        let desc = description.to_lowercase();
        for rule in &self.rules {
            if let Some(k) = rule.keywords.iter().find(|k| desc.contains(k.as_str())) {
                return Some(KeywordMatch {
                    category: &rule.category,
                    keyword: k,
                });
            }
        }
        None
    }
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

/// Built-in merchant triggers for the default taxonomy, in taxonomy order.
pub fn default_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new(
            "Comida",
            [
                "restaurant", "supermercado", "panader", "cafeter", "starbucks", "mcdonald",
                "burger", "pizza", "sushi", "uber eats", "rappi", "pedidosya", "didi food",
                "unimarc", "jumbo", "lider", "tottus", "walmart",
            ],
        ),
        KeywordRule::new(
            "Transporte",
            [
                "uber", "cabify", "didi", "taxi", "metro", "gasolina", "combustible", "copec",
                "peaje", "autopista", "estacionamiento", "parking", "latam", "sky airline",
            ],
        ),
        KeywordRule::new(
            "Salud",
            [
                "farmacia", "clinica", "clínica", "hospital", "medic", "médic", "dental",
                "isapre", "fonasa", "cruz verde", "salcobrand", "laboratorio",
            ],
        ),
        KeywordRule::new(
            "Vivienda",
            ["arriendo", "alquiler", "hipoteca", "dividendo", "condominio", "gastos comunes"],
        ),
        KeywordRule::new(
            "Entretenimiento",
            [
                "netflix", "spotify", "disney", "hbo", "prime video", "steam", "playstation",
                "xbox", "cine", "teatro", "concierto", "ticketmaster",
            ],
        ),
        KeywordRule::new(
            "Servicios",
            [
                "electricidad", "enel", "aguas", "gas natural", "internet", "telefon",
                "movistar", "entel", "claro", "vtr",
            ],
        ),
        KeywordRule::new(
            "Transferencias",
            ["transferencia", "transf.", "traspaso", "transfer"],
        ),
        KeywordRule::new(
            "Ingresos",
            ["sueldo", "salario", "nomina", "nómina", "remuneraci", "payroll", "honorarios"],
        ),
        KeywordRule::new(
            "Deuda",
            [
                "cuota", "prestamo", "préstamo", "pago tarjeta", "interes", "interés",
                "avance en efectivo",
            ],
        ),
        KeywordRule::new(
            "Compras",
            [
                "amazon", "mercadolibre", "mercado libre", "aliexpress", "falabella", "ripley",
                "ikea", "tienda",
            ],
        ),
    ]
}
