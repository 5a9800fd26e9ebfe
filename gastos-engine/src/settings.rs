use serde::{Deserialize, Serialize};

/// Chunking, sampling and budget settings for remote classification.
///
/// The output budget scales with the chunk: a chunk of `n` items may use
/// `base_tokens + n * per_item_tokens()` tokens. Raising `chunk_size`
/// therefore raises the per-request budget with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Maximum descriptions per request.
    pub chunk_size: usize,
    pub temperature: f32,
    /// Fixed headroom per request.
    pub base_tokens: u32,
    /// Per-item budget; defaults depend on `explain`.
    pub tokens_per_item: Option<u32>,
    /// Ask the service for a short explanation next to each category.
    pub explain: bool,
    /// Extra attempts per chunk after a failed request.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            chunk_size: 50,
            temperature: 0.2,
            base_tokens: 64,
            tokens_per_item: None,
            explain: false,
            max_retries: 0,
            retry_backoff_ms: 500,
        }
    }
}

impl BatchSettings {
    pub fn per_item_tokens(&self) -> u32 {
        self.tokens_per_item
            .unwrap_or(if self.explain { 64 } else { 16 })
    }

    pub fn token_budget(&self, items: usize) -> u32 {
        let items = u32::try_from(items).unwrap_or(u32::MAX);
        self.base_tokens
            .saturating_add(items.saturating_mul(self.per_item_tokens()))
    }

    /// Never zero, so chunking always makes progress.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_scales_with_chunk() {
        let s = BatchSettings::default();
        assert_eq!(s.token_budget(0), 64);
        assert_eq!(s.token_budget(50), 64 + 50 * 16);
        assert!(s.token_budget(10) < s.token_budget(11));
    }

    #[test]
    fn test_explain_raises_item_budget() {
        let s = BatchSettings {
            explain: true,
            ..Default::default()
        };
        assert_eq!(s.per_item_tokens(), 64);
        let s = BatchSettings {
            explain: true,
            tokens_per_item: Some(30),
            ..Default::default()
        };
        assert_eq!(s.token_budget(2), 64 + 60);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let s: BatchSettings = serde_json::from_str(r#"{"chunk_size": 10}"#).unwrap();
        assert_eq!(s.chunk_size, 10);
        assert_eq!(s.temperature, 0.2);
        assert_eq!(BatchSettings { chunk_size: 0, ..s }.effective_chunk_size(), 1);
    }
}
