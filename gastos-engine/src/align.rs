//! Alignment of parsed reply lines onto chunk positions.
//!
//! Policy: positional pad/ignore. Lines are taken in order and assigned 1:1
//! to the chunk's positions. Missing lines leave `No clasificado`; extra
//! lines are ignored. Ordinals are not used to reorder. Every parsed label
//! goes through taxonomy validation; labels outside it become
//! `No clasificado` as well.

use gastos_core::{Category, Taxonomy};
use tracing::debug;

use crate::reply::ReplyLine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedChunk {
    /// Exactly `expected` entries, in chunk order.
    pub items: Vec<(Category, Option<String>)>,
    /// Number of lines the reply actually had.
    pub received: usize,
}

impl AlignedChunk {
    pub fn is_mismatch(&self) -> bool {
        self.received != self.items.len()
    }
}

pub fn align_reply(lines: &[ReplyLine], expected: usize, taxonomy: &Taxonomy) -> AlignedChunk {
    let items = (0..expected)
        .map(|i| match lines.get(i) {
            Some(line) => match taxonomy.resolve(&line.label) {
                Some(label) => (Category::label(label), line.explanation.clone()),
                None => {
                    debug!(label = %line.label, "reply label outside taxonomy");
                    (Category::Unclassified, line.explanation.clone())
                }
            },
            None => (Category::Unclassified, None),
        })
        .collect();

    AlignedChunk {
        items,
        received: lines.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::parse_reply;

    fn categories(chunk: &AlignedChunk) -> Vec<String> {
        chunk.items.iter().map(|(c, _)| c.to_string()).collect()
    }

    #[test]
    fn test_exact_count() {
        let t = Taxonomy::default();
        let a = align_reply(&parse_reply("1. Transporte\n2. Comida"), 2, &t);
        assert_eq!(categories(&a), vec!["Transporte", "Comida"]);
        assert!(!a.is_mismatch());
    }

    #[test]
    fn test_short_reply_pads_with_sentinel() {
        let t = Taxonomy::default();
        let a = align_reply(&parse_reply("1. Transporte\n2. Comida\n3. Salud"), 5, &t);
        assert_eq!(
            categories(&a),
            vec!["Transporte", "Comida", "Salud", "No clasificado", "No clasificado"]
        );
        assert_eq!(a.received, 3);
        assert!(a.is_mismatch());
    }

    #[test]
    fn test_long_reply_ignores_excess() {
        let t = Taxonomy::default();
        let a = align_reply(&parse_reply("Salud\nDeuda\nCompras"), 2, &t);
        assert_eq!(categories(&a), vec!["Salud", "Deuda"]);
        assert_eq!(a.items.len(), 2);
        assert!(a.is_mismatch());
    }

    #[test]
    fn test_invalid_label_routes_to_sentinel() {
        let t = Taxonomy::default();
        let a = align_reply(&parse_reply("1. Suscripciones | streaming\n2. comida"), 2, &t);
        assert_eq!(a.items[0], (Category::Unclassified, Some("streaming".to_string())));
        assert_eq!(a.items[1].0, Category::label("Comida"));
    }

    #[test]
    fn test_empty_reply() {
        let a = align_reply(&[], 3, &Taxonomy::default());
        assert!(a.items.iter().all(|(c, _)| c.is_unclassified()));
        assert_eq!(a.received, 0);
    }
}
