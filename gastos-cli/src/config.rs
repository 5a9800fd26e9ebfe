use anyhow::{Context, Result};
use gastos_core::rules::default_rules;
use gastos_core::taxonomy::DEFAULT_CATEGORIES;
use gastos_core::{KeywordMatcher, KeywordRule, Taxonomy};
use gastos_engine::{BatchSettings, Classifier};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_gastos_home;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub batch: BatchSettings,
    pub taxonomy: TaxonomySection,
    /// Keyword rules, evaluated in order. An empty list disables the stage.
    pub rules: Vec<KeywordRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// "openai" or "anthropic".
    pub provider: String,
    pub model: String,
    /// Override the provider's API root (proxies, compatible servers).
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomySection {
    pub categories: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmSection::default(),
            batch: BatchSettings::default(),
            taxonomy: TaxonomySection::default(),
            rules: default_rules(),
        }
    }
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            timeout_secs: 60,
        }
    }
}

impl Default for TaxonomySection {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Config {
    /// Validate taxonomy and rules and build a classifier without a service.
    pub fn classifier<'a>(&self) -> Result<Classifier<'a>> {
        let taxonomy = Taxonomy::new(self.taxonomy.categories.iter().cloned())
            .context("invalid [taxonomy] in config.toml")?;
        let rules = KeywordMatcher::new(self.rules.clone(), &taxonomy)
            .context("invalid [[rules]] in config.toml")?;
        Ok(Classifier::new(taxonomy, rules, self.batch.clone()))
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_gastos_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Missing file means defaults.
pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(p: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&p, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let p = config_path()?;
    let cfg = load_config_from(&p)?;
    if !p.exists() {
        println!("# {} not found; showing defaults", p.display());
    }
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.batch.chunk_size, 50);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.llm.provider = "anthropic".to_string();
        cfg.batch.chunk_size = 20;
        cfg.batch.explain = true;
        save_config_to(&p, &cfg).unwrap();
        assert_eq!(load_config_from(&p).unwrap(), cfg);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(
            &p,
            r#"
[batch]
chunk_size = 10

[taxonomy]
categories = ["Comida", "Otros"]

[[rules]]
category = "Comida"
keywords = ["kiosko"]
"#,
        )
        .unwrap();
        let cfg = load_config_from(&p).unwrap();
        assert_eq!(cfg.batch.chunk_size, 10);
        assert_eq!(cfg.batch.temperature, 0.2);
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.rules.len(), 1);

        let classifier = cfg.classifier().unwrap();
        assert_eq!(classifier.taxonomy().len(), 2);
        assert_eq!(classifier.rules().find("KIOSKO central").map(|m| m.category), Some("Comida"));
    }

    #[test]
    fn test_rules_must_name_taxonomy_categories() {
        let cfg = Config {
            taxonomy: TaxonomySection {
                categories: vec!["Otros".to_string()],
            },
            ..Default::default()
        };
        let err = cfg.classifier().unwrap_err();
        assert!(format!("{err:#}").contains("unknown category"));
    }
}
