//! Configuration management for supportrag
//!
//! Provides TOML-based configuration with defaults, environment overrides
//! and validation.
//! Location: ~/.supportrag/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::embedding::DEFAULT_MODEL_ID;
use crate::errors::{Result, SupportError};
use crate::generation::{anthropic::DEFAULT_BASE_URL, ollama::DEFAULT_OLLAMA_URL};
use crate::rag::{ContextConfig, PipelineConfig, ReRankConfig, SearchParams};

/// Complete configuration for supportrag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub rules: RulesConfig,
}

/// Sentence-embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model_id: String,
    pub normalize: bool,
}

/// Where document vectors live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    Local,
    Qdrant,
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub backend: IndexBackend,
    pub storage_dir: String,
    pub collection: String,
    pub qdrant_url: String,
    pub batch_size: usize,
}

/// Ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub recency_weight: f64,
    pub overfetch_factor: usize,
    pub recency_horizon_days: f64,
    pub undated_age_days: f64,
}

/// Answer model provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    Ollama,
}

/// Answer and triage model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: Provider,
    pub model: String,
    pub max_tokens: u32,
    pub triage_max_tokens: u32,
    /// Usually supplied through ANTHROPIC_API_KEY instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub support_contact: String,
}

/// Authoritative rules file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub path: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            normalize: true,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::Local,
            storage_dir: "~/.supportrag/index".to_string(),
            collection: "support_emails".to_string(),
            qdrant_url: "http://localhost:6334".to_string(),
            batch_size: 100,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            recency_weight: 0.3,
            overfetch_factor: 3,
            recency_horizon_days: 730.0,
            undated_age_days: 365.0,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Anthropic,
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_tokens: 1024,
            triage_max_tokens: 20,
            api_key: None,
            base_url: None,
            support_contact: "the support team".to_string(),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: "~/.supportrag/rules.txt".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults, then apply the environment
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(config_path) = path {
            Self::load_from_file(&config_path)?
        } else {
            Self::load_default()?
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SupportError::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| SupportError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from the standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// ~/.supportrag/config.toml
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".supportrag").join("config.toml"))
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("ANTHROPIC_API_KEY") {
            self.generation.api_key = Some(key);
        }
        if let Some(raw) = get("SUPPORTRAG_TOP_K") {
            self.retrieval.top_k = parse_env("SUPPORTRAG_TOP_K", &raw)?;
        }
        if let Some(raw) = get("SUPPORTRAG_RECENCY_WEIGHT") {
            self.retrieval.recency_weight = parse_env("SUPPORTRAG_RECENCY_WEIGHT", &raw)?;
        }
        if let Some(dir) = get("SUPPORTRAG_INDEX_DIR") {
            self.index.storage_dir = dir;
        }
        if let Some(collection) = get("SUPPORTRAG_COLLECTION") {
            self.index.collection = collection;
        }
        if let Some(model) = get("SUPPORTRAG_EMBEDDING_MODEL") {
            self.embedding.model_id = model;
        }
        if let Some(model) = get("SUPPORTRAG_GENERATION_MODEL") {
            self.generation.model = model;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(SupportError::Config(
                "top_k must be greater than 0".to_string(),
            ));
        }

        let w = self.retrieval.recency_weight;
        if !(0.0..=1.0).contains(&w) {
            return Err(SupportError::Config(format!(
                "recency_weight must be between 0.0 and 1.0, got {}",
                w
            )));
        }

        if self.retrieval.overfetch_factor == 0 {
            return Err(SupportError::Config(
                "overfetch_factor must be at least 1".to_string(),
            ));
        }

        if !(self.retrieval.recency_horizon_days > 0.0) {
            return Err(SupportError::Config(
                "recency_horizon_days must be greater than 0".to_string(),
            ));
        }

        if !(self.retrieval.undated_age_days >= 0.0) {
            return Err(SupportError::Config(
                "undated_age_days must not be negative".to_string(),
            ));
        }

        if self.index.batch_size == 0 {
            return Err(SupportError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }

        if self.index.collection.trim().is_empty() {
            return Err(SupportError::Config(
                "collection name must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SupportError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SupportError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Render as TOML with the API key masked
    pub fn to_display_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.generation.api_key.is_some() {
            shown.generation.api_key = Some("********".to_string());
        }
        shown.to_toml()
    }

    fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| SupportError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    pub fn index_dir(&self) -> PathBuf {
        Self::expand_path(&self.index.storage_dir)
    }

    pub fn rules_path(&self) -> PathBuf {
        Self::expand_path(&self.rules.path)
    }

    /// Console history lives next to the default config
    pub fn history_path(&self) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".supportrag").join("history"))
    }

    /// Base URL for the configured provider
    pub fn generation_url(&self) -> String {
        match (&self.generation.base_url, self.generation.provider) {
            (Some(url), _) => url.clone(),
            (None, Provider::Anthropic) => DEFAULT_BASE_URL.to_string(),
            (None, Provider::Ollama) => DEFAULT_OLLAMA_URL.to_string(),
        }
    }

    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            top_k: self.retrieval.top_k,
            overfetch_factor: self.retrieval.overfetch_factor,
        }
    }

    pub fn rerank_config(&self) -> ReRankConfig {
        ReRankConfig {
            recency_weight: self.retrieval.recency_weight,
            horizon_days: self.retrieval.recency_horizon_days,
            undated_age_days: self.retrieval.undated_age_days,
        }
    }

    pub fn context_config(&self) -> ContextConfig {
        ContextConfig {
            support_contact: self.generation.support_contact.clone(),
            ..ContextConfig::default()
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            max_tokens: self.generation.max_tokens,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| SupportError::Config(format!("Invalid value for {}: {:?}", key, raw)))
}
