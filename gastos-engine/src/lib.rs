//! gastos-engine: the cache → keyword → remote classification cascade,
//! batched prompt construction, reply parsing/alignment and export mapping.

pub mod align;
pub mod batch;
pub mod export;
pub mod pipeline;
pub mod prompt;
pub mod reply;
pub mod service;
pub mod settings;

pub use align::{AlignedChunk, align_reply};
pub use batch::{BatchClassifier, BatchOutcome, BatchReport, ChunkMismatch, PendingItem};
pub use export::{ExportOptions, export_table};
pub use pipeline::{ClassificationReport, ClassificationRun, Classifier};
pub use reply::{ReplyLine, parse_reply};
pub use service::{CompletionRequest, CompletionService};
pub use settings::BatchSettings;
