//! Layered configuration and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_SEARCH__DEDUP_KEY=id`). Every key
//! has a built-in default, so a missing file is not an error.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::DedupKey;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_top_k: usize,
    /// Lexical candidates kept per query (`bm25_top`).
    pub lexical_pool: usize,
    /// How many of each retriever's candidates enter the refinement union.
    pub candidate_pool: usize,
    /// Vector neighbours fetched per requested result.
    pub vector_overfetch: usize,
    /// Fused chunks kept per requested result before deduplication.
    pub dedup_overfetch: usize,
    pub lexical_weight: f64,
    pub rank_weight: f64,
    pub vector_weight: f64,
    pub snippet_chars: usize,
    pub dedup_key: DedupKey,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            lexical_pool: 100,
            candidate_pool: 50,
            vector_overfetch: 5,
            dedup_overfetch: 3,
            lexical_weight: 0.4,
            rank_weight: 0.1,
            vector_weight: 0.6,
            snippet_chars: 250,
            dedup_key: DedupKey::Name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub use_fake: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_model_dir: Option<String>,
    pub batch_size: usize,
    pub max_len: usize,
    pub fake_dim: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { use_fake: false, model_dir: None, fallback_model_dir: None, batch_size: 32, max_len: 256, fake_dim: 384 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Upper bound on documents held by one engine.
    pub max_documents: usize,
}

impl Default for IngestConfig {
    fn default() -> Self { Self { max_documents: 10 } }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingConfig,
    pub search: SearchConfig,
    pub embedding: EmbeddingConfig,
    pub ingest: IngestConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        let weights = [
            ("search.lexical_weight", self.search.lexical_weight),
            ("search.rank_weight", self.search.rank_weight),
            ("search.vector_weight", self.search.vector_weight),
        ];
        for (key, w) in weights {
            if !w.is_finite() || w < 0.0 {
                return Err(Error::InvalidConfig(format!("{key} must be a non-negative number, got {w}")));
            }
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be positive".into()));
        }
        if self.embedding.max_len == 0 || self.embedding.fake_dim == 0 {
            return Err(Error::InvalidConfig("embedding.max_len and embedding.fake_dim must be positive".into()));
        }
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(Path::new("."), &env_name)
    }

    /// Load `config.toml` and the overlay for `env_name` from `dir`, then `APP_*` vars.
    pub fn load_from(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            other => tracing::debug!(env = other, "no overlay for unknown environment"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self { Self { figment } }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed, validated settings.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
