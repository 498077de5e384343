//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge compiled-in defaults + `config.toml` +
//! `config.<env>.toml` + `APP_*` env vars (`__` separates nesting, so
//! `APP_CHUNKING__CHUNK_SIZE` overrides `chunking.chunk_size`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::data_processor::ChunkingConfig;
use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let config = Self::for_env(&env_name);
        config.settings()?;
        Ok(config)
    }

    pub fn for_env(env_name: &str) -> Self {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Self { figment, env_name: env_name.to_string() }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed view of the merged configuration, validated for the active env.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        self.validate_for_env(&settings)?;
        Ok(settings)
    }

    fn validate_for_env(&self, settings: &Settings) -> Result<()> {
        match self.env_name.as_str() {
            "prod" | "production" => {
                if settings.embedding.backend == EmbeddingBackend::Fake {
                    return Err(Error::InvalidConfig(
                        "the fake encoder cannot be used in production".to_string(),
                    ));
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub plan: PlanSettings,
    pub distill: DistillSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.plan.months.is_empty() {
            return Err(Error::InvalidConfig("plan.months must not be empty".to_string()));
        }
        if self.distill.window_chars == 0 {
            return Err(Error::InvalidConfig("distill.window_chars must be positive".to_string()));
        }
        if self.embedding.max_len == 0 || self.embedding.fake_dim == 0 {
            return Err(Error::InvalidConfig(
                "embedding.max_len and embedding.fake_dim must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Distilled plain-text documents the corpus is built from.
    pub corpus_dir: String,
    /// Raw plain-text documents consumed by the distiller.
    pub raw_dir: String,
    /// Directory holding `index.json`, `chunks.json` and `manifest.json`.
    pub index_dir: String,
    pub curriculum_map: String,
    pub output_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            corpus_dir: "final_docs".to_string(),
            raw_dir: "raw_docs".to_string(),
            index_dir: "knowledge_base".to_string(),
            curriculum_map: "curriculum_map.json".to_string(),
            output_dir: ".".to_string(),
        }
    }
}

impl DataSettings {
    pub fn corpus_dir(&self) -> PathBuf { expand_path(&self.corpus_dir) }
    pub fn raw_dir(&self) -> PathBuf { expand_path(&self.raw_dir) }
    pub fn index_dir(&self) -> PathBuf { expand_path(&self.index_dir) }
    pub fn curriculum_map(&self) -> PathBuf { expand_path(&self.curriculum_map) }
    pub fn output_dir(&self) -> PathBuf { expand_path(&self.output_dir) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Candle,
    Fake,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    /// Local directory with `config.json`, `tokenizer.json`, `pytorch_model.bin`.
    pub model_dir: String,
    /// Model name recorded in the encoder id.
    pub model_name: String,
    pub max_len: usize,
    pub fake_dim: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Candle,
            model_dir: "models/all-MiniLM-L6-v2".to_string(),
            model_name: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            max_len: 256,
            fake_dim: 384,
            batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 120,
            api_key: None,
        }
    }
}

impl GenerationSettings {
    /// Configured key, else `GEMINI_API_KEY`. Blank values count as absent.
    pub fn api_key(&self) -> Result<String> {
        non_blank(self.api_key.as_deref())
            .or_else(|| non_blank(env::var("GEMINI_API_KEY").ok().as_deref()))
            .ok_or(Error::MissingCredential)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanSettings {
    pub year: String,
    /// Calendar order of the academic year; drives the outer row loop.
    pub months: Vec<String>,
    /// Choices offered by the interactive age-group prompt.
    pub age_groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates_file: Option<String>,
}

impl Default for PlanSettings {
    fn default() -> Self {
        let months = ["Сентябрь", "Октябрь", "Ноябрь", "Декабрь", "Январь", "Февраль", "Март", "Апрель", "Май"];
        let age_groups = [
            "Младшая группа (2-3 года)",
            "Средняя группа (3-4 года)",
            "Старшая группа (4-5 лет)",
            "Предшкольная группа (5-6 лет)",
        ];
        Self {
            year: "2025-2026".to_string(),
            months: months.iter().map(|m| (*m).to_string()).collect(),
            age_groups: age_groups.iter().map(|g| (*g).to_string()).collect(),
            templates_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistillSettings {
    pub window_chars: usize,
}

impl Default for DistillSettings {
    fn default() -> Self { Self { window_chars: 7000 } }
}

fn non_blank(key: Option<&str>) -> Option<String> {
    key.map(str::trim).filter(|k| !k.is_empty()).map(str::to_string)
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
