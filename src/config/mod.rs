//! Configuration management for docqa
//!
//! Configuration is a TOML file with one section per pipeline stage. Values
//! can be overridden per profile and through `DOCQA_SECTION__KEY`
//! environment variables.

use crate::error::{DocqaError, Result};
use crate::store::{DuplicatePolicy, IndexParams};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod validator;

pub use validator::ConfigValidator;

pub const SCHEMA_VERSION: &str = "1.0.0";

const ENV_PREFIX: &str = "DOCQA_";
const OLLAMA_BASE_URL_ENV: &str = "OLLAMA_BASE_URL";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub ingest: IngestConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub store: StoreConfig,
    pub query: QueryConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Where documents come from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub docs_dir: PathBuf,
    /// Extensions read as plain source text (PDFs are always accepted)
    pub source_extensions: Vec<String>,
}

/// Embedding service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    pub base_url: String,
    /// Maximum concurrent embedding requests
    pub workers: usize,
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Generation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Vector store and HNSW parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub collection: String,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    pub max_elements: usize,
    pub hnsw_m: usize,
    pub hnsw_ef_construction: usize,
    pub hnsw_ef_search: usize,
}

impl StoreConfig {
    pub fn index_params(&self) -> IndexParams {
        IndexParams {
            max_elements: self.max_elements,
            m: self.hnsw_m,
            ef_construction: self.hnsw_ef_construction,
            ef_search: self.hnsw_ef_search,
        }
    }
}

/// Interactive loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub exit_token: String,
    pub top_k: usize,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DocqaError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| DocqaError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Load `path` if it exists, otherwise start from defaults.
    ///
    /// Environment overrides and validation apply either way.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(DocqaError::ConfigNotFound { .. }) => {
                tracing::debug!("No config at {:?}, using defaults", path);
                let mut config = Self::default();
                config.apply_env_overrides();
                ConfigValidator::validate(&config)?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DocqaError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", parent),
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| DocqaError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| DocqaError::Config(format!("Unknown profile: {}", profile)))?;

        if let Some(model) = overrides.embedding_model {
            self.embedding.model = model;
        }
        if let Some(workers) = overrides.embedding_workers {
            self.embedding.workers = workers;
        }
        if let Some(model) = overrides.generation_model {
            self.generation.model = model;
        }
        if let Some(top_k) = overrides.top_k {
            self.query.top_k = top_k;
        }

        ConfigValidator::validate(self)
    }

    /// Apply environment variable overrides
    /// Environment variables in format: DOCQA_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    fn apply_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut scoped = Vec::new();
        for (key, value) in vars {
            if key == OLLAMA_BASE_URL_ENV {
                self.embedding.base_url = value.clone();
                self.generation.base_url = value;
            } else if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                scoped.push((config_key.to_string(), value));
            }
        }

        // Section-specific keys win over OLLAMA_BASE_URL
        for (config_key, value) in scoped {
            if let Err(e) = self.set_value_from_env(&config_key, &value) {
                tracing::warn!("Failed to apply env override {}{}: {}", ENV_PREFIX, config_key, e);
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "INGEST__DOCS_DIR" => self.ingest.docs_dir = PathBuf::from(value),
            "EMBEDDING__MODEL" => self.embedding.model = value.to_string(),
            "EMBEDDING__BASE_URL" => self.embedding.base_url = value.to_string(),
            "EMBEDDING__WORKERS" => self.embedding.workers = parse_number(path, value)?,
            "EMBEDDING__TIMEOUT_SECS" => self.embedding.timeout_secs = parse_number(path, value)?,
            "GENERATION__MODEL" => self.generation.model = value.to_string(),
            "GENERATION__BASE_URL" => self.generation.base_url = value.to_string(),
            "GENERATION__TIMEOUT_SECS" => {
                self.generation.timeout_secs = parse_number(path, value)?
            }
            "STORE__COLLECTION" => self.store.collection = value.to_string(),
            "STORE__DUPLICATE_POLICY" => {
                self.store.duplicate_policy = match value.to_ascii_lowercase().as_str() {
                    "overwrite" => DuplicatePolicy::Overwrite,
                    "reject" => DuplicatePolicy::Reject,
                    _ => {
                        return Err(DocqaError::InvalidConfigValue {
                            path: path.to_string(),
                            message: format!("Expected 'overwrite' or 'reject', got '{}'", value),
                        })
                    }
                }
            }
            "QUERY__EXIT_TOKEN" => self.query.exit_token = value.to_string(),
            "QUERY__TOP_K" => self.query.top_k = parse_number(path, value)?,
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DocqaError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("docqa").join("config.toml"))
    }
}

fn parse_number<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| DocqaError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}' as a number", value),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            ingest: IngestConfig {
                docs_dir: PathBuf::from("docs"),
                source_extensions: ["py", "rs", "md", "txt"]
                    .iter()
                    .map(|ext| ext.to_string())
                    .collect(),
            },
            embedding: EmbeddingConfig {
                model: "mxbai-embed-large".to_string(),
                base_url: DEFAULT_OLLAMA_URL.to_string(),
                workers: 4,
                timeout_secs: 60,
            },
            generation: GenerationConfig {
                model: "llama2-uncensored:latest".to_string(),
                base_url: DEFAULT_OLLAMA_URL.to_string(),
                timeout_secs: 300,
            },
            store: StoreConfig {
                collection: "docs".to_string(),
                duplicate_policy: DuplicatePolicy::Overwrite,
                max_elements: 100_000,
                hnsw_m: 16,
                hnsw_ef_construction: 200,
                hnsw_ef_search: 64,
            },
            query: QueryConfig {
                exit_token: "exit".to_string(),
                top_k: 1,
            },
            profiles: HashMap::new(),
        }
    }
}
