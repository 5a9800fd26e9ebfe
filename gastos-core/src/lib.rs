//! gastos-core: data model and pure classification components
//!
//! Everything here is deterministic and side-effect free: the category
//! taxonomy, column role resolution, the run-scoped classification cache and
//! the keyword rule matcher. Remote classification lives in `gastos-engine`.

pub mod cache;
pub mod columns;
pub mod error;
pub mod rules;
pub mod table;
pub mod taxonomy;
pub mod text;
pub mod transaction;

pub use cache::{CacheEntry, ClassificationCache};
pub use columns::{AmountKind, ColumnRoleMap, Role};
pub use error::{GastosError, Result};
pub use rules::{KeywordMatch, KeywordMatcher, KeywordRule};
pub use table::Table;
pub use taxonomy::{Category, Taxonomy, UNCLASSIFIED};
pub use transaction::{Classification, ClassifiedTransaction, Source, Transaction};
