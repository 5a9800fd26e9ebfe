//! Batch classifier: chunked remote classification.
//!
//! Unresolved descriptions are grouped by exact text (so a text is sent once
//! and every position holding it gets the same answer), split into chunks of
//! at most `chunk_size`, sent one request per chunk, parsed, aligned and
//! scattered back. A failed request only affects its own chunk.

use anyhow::{Result, anyhow};
use gastos_core::{
    AmountKind, Category, Classification, ClassificationCache, Source, Taxonomy,
};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::align::align_reply;
use crate::prompt::{SYSTEM_PROMPT, build_prompt};
use crate::reply::parse_reply;
use crate::service::{CompletionRequest, CompletionService};
use crate::settings::BatchSettings;

/// Longest failure reason carried in an error marker.
const MAX_REASON_CHARS: usize = 120;

/// One distinct description still needing a remote answer, with every
/// original position that holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingItem {
    pub text: String,
    pub positions: Vec<usize>,
}

/// Group `(position, text)` pairs by exact text, in first-occurrence order.
pub fn group_pending<'s, I>(items: I) -> Vec<PendingItem>
where
    I: IntoIterator<Item = (usize, &'s str)>,
{
    let mut index: HashMap<&'s str, usize> = HashMap::new();
    let mut out: Vec<PendingItem> = Vec::new();
    for (pos, text) in items {
        match index.get(text) {
            Some(&i) => out[i].positions.push(pos),
            None => {
                index.insert(text, out.len());
                out.push(PendingItem {
                    text: text.to_string(),
                    positions: vec![pos],
                });
            }
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMismatch {
    pub chunk: usize,
    pub expected: usize,
    pub received: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub chunks: usize,
    /// Requests sent, retries included.
    pub requests: usize,
    pub failed_chunks: Vec<usize>,
    pub mismatches: Vec<ChunkMismatch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Same length and order as the input.
    pub classifications: Vec<Classification>,
    pub report: BatchReport,
}

impl BatchOutcome {
    pub fn categories(&self) -> Vec<&Category> {
        self.classifications.iter().map(|c| &c.category).collect()
    }
}

pub struct BatchClassifier<'a> {
    service: &'a dyn CompletionService,
    taxonomy: &'a Taxonomy,
    settings: &'a BatchSettings,
    amount_kind: Option<AmountKind>,
}

impl<'a> BatchClassifier<'a> {
    pub fn new(
        service: &'a dyn CompletionService,
        taxonomy: &'a Taxonomy,
        settings: &'a BatchSettings,
    ) -> Self {
        Self {
            service,
            taxonomy,
            settings,
            amount_kind: None,
        }
    }

    pub fn with_amount_kind(mut self, kind: Option<AmountKind>) -> Self {
        self.amount_kind = kind;
        self
    }

    /// Classify an ordered list of descriptions. The result always has the
    /// input's length and order, whatever happens to individual requests.
    ///
    /// Blank descriptions are not sent (`No clasificado`, source `Skipped`);
    /// texts already in `cache` are answered from it. Every taxonomy label
    /// obtained remotely is stored in `cache` before returning.
    pub fn classify<S: AsRef<str>>(
        &self,
        descriptions: &[S],
        cache: &mut ClassificationCache,
    ) -> BatchOutcome {
        let mut out: Vec<Option<Classification>> = vec![None; descriptions.len()];
        let mut unresolved: Vec<(usize, &str)> = Vec::new();

        for (i, d) in descriptions.iter().enumerate() {
            let d = d.as_ref();
            if d.trim().is_empty() {
                out[i] = Some(Classification::new(Category::Unclassified, Source::Skipped));
            } else if let Some(entry) = cache.lookup(d) {
                out[i] = Some(
                    Classification::new(Category::label(&entry.label), Source::Cache)
                        .with_explanation(entry.explanation.clone()),
                );
            } else {
                unresolved.push((i, d));
            }
        }

        let pending = group_pending(unresolved);
        let mut report = BatchReport::default();

        for (chunk_idx, chunk) in pending.chunks(self.settings.effective_chunk_size()).enumerate() {
            report.chunks += 1;
            let results = self.classify_chunk(chunk_idx, chunk, &mut report);

            for (item, (category, explanation)) in chunk.iter().zip(results) {
                if let Some(label) = category.as_label() {
                    cache.store_explained(item.text.as_str(), label, explanation.clone());
                }
                for &pos in &item.positions {
                    out[pos] = Some(
                        Classification::new(category.clone(), Source::Remote)
                            .with_explanation(explanation.clone()),
                    );
                }
            }
        }

        let classifications = out
            .into_iter()
            .map(|c| c.unwrap_or_else(|| Classification::new(Category::Unclassified, Source::Remote)))
            .collect();

        BatchOutcome {
            classifications,
            report,
        }
    }

    /// One request for one chunk; always returns `chunk.len()` results.
    fn classify_chunk(
        &self,
        chunk_idx: usize,
        chunk: &[PendingItem],
        report: &mut BatchReport,
    ) -> Vec<(Category, Option<String>)> {
        let texts: Vec<&str> = chunk.iter().map(|p| p.text.as_str()).collect();
        let prompt = build_prompt(self.taxonomy, &texts, self.amount_kind, self.settings.explain);
        let request = CompletionRequest {
            system: SYSTEM_PROMPT,
            prompt: &prompt,
            temperature: self.settings.temperature,
            max_tokens: self.settings.token_budget(chunk.len()),
        };

        match self.request_with_retry(chunk_idx, &request, report) {
            Ok(reply) => {
                let lines = parse_reply(&reply);
                let aligned = align_reply(&lines, chunk.len(), self.taxonomy);
                if aligned.is_mismatch() {
                    warn!(
                        chunk = chunk_idx,
                        expected = chunk.len(),
                        received = aligned.received,
                        "reply line count differs from request; aligning positionally"
                    );
                    report.mismatches.push(ChunkMismatch {
                        chunk: chunk_idx,
                        expected: chunk.len(),
                        received: aligned.received,
                    });
                }
                aligned.items
            }
            Err(e) => {
                warn!(chunk = chunk_idx, items = chunk.len(), error = %format!("{e:#}"), "chunk failed");
                report.failed_chunks.push(chunk_idx);
                let marker = Category::failed(short_reason(&e));
                vec![(marker, None); chunk.len()]
            }
        }
    }

    fn request_with_retry(
        &self,
        chunk_idx: usize,
        request: &CompletionRequest<'_>,
        report: &mut BatchReport,
    ) -> Result<String> {
        let mut attempt: u32 = 0;
        loop {
            report.requests += 1;
            debug!(
                chunk = chunk_idx,
                attempt,
                max_tokens = request.max_tokens,
                "sending classification request"
            );

            let result = self.service.complete(request).and_then(|reply| {
                if reply.trim().is_empty() {
                    Err(anyhow!("empty reply"))
                } else {
                    Ok(reply)
                }
            });

            match result {
                Ok(reply) => return Ok(reply),
                Err(e) if attempt < self.settings.max_retries => {
                    let delay = self
                        .settings
                        .retry_backoff_ms
                        .saturating_mul(1u64 << attempt.min(16));
                    warn!(chunk = chunk_idx, attempt, delay_ms = delay, error = %e, "retrying chunk");
                    std::thread::sleep(Duration::from_millis(delay));
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// First line of the error chain, bounded for display in a table cell.
fn short_reason(e: &anyhow::Error) -> String {
    let full = format!("{e:#}");
    let first = full.lines().next().unwrap_or("").trim();
    if first.chars().count() > MAX_REASON_CHARS {
        let cut: String = first.chars().take(MAX_REASON_CHARS).collect();
        format!("{cut}…")
    } else if first.is_empty() {
        "request failed".to_string()
    } else {
        first.to_string()
    }
}
