//! The external text-classification capability.
//!
//! Anything that turns a prompt into free text: the HTTP clients in the CLI,
//! or a scripted stand-in in tests.

use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

pub trait CompletionService {
    /// Blocking request/response call. Errors are request-level failures
    /// (transport, timeout, non-success status, unparseable body).
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String>;
}
