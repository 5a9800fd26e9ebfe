use anyhow::{Context, Result, bail};
use gastos_engine::{CompletionRequest, CompletionService};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::LlmSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    pub fn parse(name: &str) -> Result<Provider> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "anthropic" => Ok(Provider::Anthropic),
            other => bail!("unknown provider '{other}' (expected openai or anthropic)"),
        }
    }

    pub fn env_var(self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com",
            Provider::Anthropic => "https://api.anthropic.com",
        }
    }

    fn path(self) -> &'static str {
        match self {
            Provider::OpenAI => "/v1/chat/completions",
            Provider::Anthropic => "/v1/messages",
        }
    }

    pub fn auth_hint(self) -> &'static str {
        match self {
            Provider::OpenAI => "gastos auth paste-openai-api-key",
            Provider::Anthropic => "gastos auth paste-anthropic-api-key",
        }
    }
}

/// Remote chat model used as the classification service.
pub struct RemoteClassifier {
    provider: Provider,
    model: String,
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl RemoteClassifier {
    pub fn new(section: &LlmSection, api_key: String) -> Result<Self> {
        let provider = Provider::parse(&section.provider)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(section.timeout_secs.max(1)))
            .build()
            .context("build http client")?;
        Ok(Self {
            provider,
            model: section.model.clone(),
            endpoint: endpoint(provider, section.base_url.as_deref()),
            api_key,
            client,
        })
    }

    async fn complete_async(&self, request: &CompletionRequest<'_>) -> Result<String> {
        debug!(provider = ?self.provider, model = %self.model, max_tokens = request.max_tokens, "completion request");
        match self.provider {
            Provider::OpenAI => self.openai(request).await,
            Provider::Anthropic => self.anthropic(request).await,
        }
    }

    async fn openai(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let body = OpenAiRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: request.system,
                },
                Message {
                    role: "user",
                    content: request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("openai error: {status} {}", txt.trim());
        }

        let out: OpenAiResponse = resp.json().await.context("parse openai response")?;
        Ok(out.text())
    }

    async fn anthropic(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system,
            messages: vec![Message {
                role: "user",
                content: request.prompt,
            }],
        };

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("anthropic request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("anthropic error: {status} {}", txt.trim());
        }

        let out: AnthropicResponse = resp.json().await.context("parse anthropic response")?;
        Ok(out.text())
    }
}

impl CompletionService for RemoteClassifier {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        // main runs inside a tokio runtime; nesting a second runtime would panic
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.complete_async(request)))
        } else {
            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            rt.block_on(self.complete_async(request))
        }
    }
}

fn endpoint(provider: Provider, base_url: Option<&str>) -> String {
    let base = base_url
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(provider.default_base_url());
    format!("{}{}", base.trim_end_matches('/'), provider.path())
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiResponse {
    fn text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    t: String,
    text: Option<String>,
}

impl AnthropicResponse {
    fn text(self) -> String {
        let mut s = String::new();
        for b in self.content {
            if b.t == "text" {
                if let Some(t) = b.text {
                    s.push_str(&t);
                }
            }
        }
        s.trim().to_string()
    }
}

/// Build the service for the configured provider. `None` when no API key
/// is available; the caller decides how to report that.
pub fn remote_from_config(section: &LlmSection) -> Result<Option<RemoteClassifier>> {
    let provider = Provider::parse(&section.provider)?;
    match crate::auth::api_key(provider)? {
        Some(key) => Ok(Some(RemoteClassifier::new(section, key)?)),
        None => Ok(None),
    }
}
