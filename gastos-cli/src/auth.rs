use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::llm::Provider;
use crate::state::ensure_gastos_home;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

impl AuthState {
    pub fn key_for(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Anthropic => self.anthropic_api_key.as_deref(),
        }
    }
}

fn auth_path() -> Result<PathBuf> {
    Ok(ensure_gastos_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    load_auth_from(&auth_path()?)
}

pub fn load_auth_from(p: &Path) -> Result<AuthState> {
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_auth_to(p: &Path, auth: &AuthState) -> Result<()> {
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Environment first (`OPENAI_API_KEY` / `ANTHROPIC_API_KEY`), then auth.json.
pub fn api_key(provider: Provider) -> Result<Option<String>> {
    if let Some(key) = std::env::var(provider.env_var())
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
    {
        return Ok(Some(key));
    }
    Ok(load_auth()?.key_for(provider).map(str::to_string))
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn openai_paste_api_key() -> Result<()> {
    let key = prompt_secret("Paste OpenAI API key (starts with sk-)")?;
    if !key.starts_with("sk-") {
        bail!("key didn't look like an OpenAI API key (expected prefix sk-)");
    }
    let p = auth_path()?;
    let mut auth = load_auth_from(&p)?;
    auth.openai_api_key = Some(key);
    save_auth_to(&p, &auth)?;
    println!("Saved OpenAI API key to {}", p.display());
    Ok(())
}

pub fn anthropic_paste_api_key() -> Result<()> {
    let key = prompt_secret("Paste Anthropic API key (starts with sk-ant-)")?;
    if !key.starts_with("sk-ant-") {
        bail!("key didn't look like an Anthropic API key (expected prefix sk-ant-)");
    }
    let p = auth_path()?;
    let mut auth = load_auth_from(&p)?;
    auth.anthropic_api_key = Some(key);
    save_auth_to(&p, &auth)?;
    println!("Saved Anthropic API key to {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("auth.json");
        assert_eq!(load_auth_from(&p).unwrap(), AuthState::default());

        let auth = AuthState {
            openai_api_key: Some("sk-test".to_string()),
            anthropic_api_key: None,
        };
        save_auth_to(&p, &auth).unwrap();
        let loaded = load_auth_from(&p).unwrap();
        assert_eq!(loaded.key_for(Provider::OpenAI), Some("sk-test"));
        assert_eq!(loaded.key_for(Provider::Anthropic), None);
    }

    #[test]
    fn test_corrupt_auth_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("auth.json");
        fs::write(&p, "{not json").unwrap();
        let err = load_auth_from(&p).unwrap_err();
        assert!(format!("{err:#}").contains("auth.json"));
    }
}
