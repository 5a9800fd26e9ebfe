//! Run-scoped classification cache.
//!
//! Keyed by the exact description text (no trimming, no case folding).
//! The caller owns the cache and passes it into each classification run, so
//! its lifetime is whatever the caller decides; nothing here is global.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Always a taxonomy label; sentinels and error markers are never stored.
    pub label: String,
    pub explanation: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ClassificationCache {
    entries: HashMap<String, CacheEntry>,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, description: &str) -> Option<&CacheEntry> {
        self.entries.get(description)
    }

    /// Label previously stored for this exact text.
    pub fn lookup_label(&self, description: &str) -> Option<&str> {
        self.lookup(description).map(|e| e.label.as_str())
    }

    pub fn store(&mut self, description: impl Into<String>, label: impl Into<String>) {
        self.store_explained(description, label, None);
    }

    pub fn store_explained(
        &mut self,
        description: impl Into<String>,
        label: impl Into<String>,
        explanation: Option<String>,
    ) {
        self.entries.insert(
            description.into(),
            CacheEntry {
                label: label.into(),
                explanation,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
