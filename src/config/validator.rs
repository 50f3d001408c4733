use crate::config::{Config, SCHEMA_VERSION};
use crate::error::{DocqaError, Result, ValidationError};

/// Upper bound accepted for HNSW M
const MAX_HNSW_M: usize = 256;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every problem found
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_ingest(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_generation(config, &mut errors);
        Self::validate_store(config, &mut errors);
        Self::validate_query(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DocqaError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_ingest(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.ingest.docs_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "ingest.docs_dir",
                "Documents directory cannot be empty",
            ));
        }

        for ext in &config.ingest.source_extensions {
            if ext.is_empty() || ext.starts_with('.') {
                errors.push(ValidationError::new(
                    "ingest.source_extensions",
                    format!("Extensions are written without a dot, got '{}'", ext),
                ));
            }
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }

        Self::validate_url("embedding.base_url", &config.embedding.base_url, errors);

        if config.embedding.workers == 0 {
            errors.push(ValidationError::new(
                "embedding.workers",
                "Worker count must be greater than 0",
            ));
        }

        if config.embedding.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "embedding.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }

    fn validate_generation(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.generation.model.is_empty() {
            errors.push(ValidationError::new(
                "generation.model",
                "Model name cannot be empty",
            ));
        }

        Self::validate_url("generation.base_url", &config.generation.base_url, errors);

        if config.generation.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "generation.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }

    fn validate_store(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.store.collection.trim().is_empty() {
            errors.push(ValidationError::new(
                "store.collection",
                "Collection name cannot be empty",
            ));
        }

        if config.store.max_elements == 0 {
            errors.push(ValidationError::new(
                "store.max_elements",
                "max_elements must be greater than 0",
            ));
        }

        if !(1..=MAX_HNSW_M).contains(&config.store.hnsw_m) {
            errors.push(ValidationError::new(
                "store.hnsw_m",
                format!(
                    "HNSW M must be between 1 and {}, got {}",
                    MAX_HNSW_M, config.store.hnsw_m
                ),
            ));
        }

        if config.store.hnsw_ef_construction == 0 {
            errors.push(ValidationError::new(
                "store.hnsw_ef_construction",
                "HNSW ef_construction must be greater than 0",
            ));
        }

        if config.store.hnsw_ef_search == 0 {
            errors.push(ValidationError::new(
                "store.hnsw_ef_search",
                "HNSW ef_search must be greater than 0",
            ));
        }
    }

    fn validate_query(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.query.exit_token.trim().is_empty() {
            errors.push(ValidationError::new(
                "query.exit_token",
                "Exit token cannot be empty",
            ));
        }

        if config.query.top_k == 0 {
            errors.push(ValidationError::new(
                "query.top_k",
                "top_k must be greater than 0",
            ));
        }
    }

    fn validate_url(path: &str, url: &str, errors: &mut Vec<ValidationError>) {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ValidationError::new(
                path,
                format!("Expected an http(s) URL, got '{}'", url),
            ));
        }
    }
}
