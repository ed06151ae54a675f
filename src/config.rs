//! Configuration System
//!
//! Hierarchical configuration with file sources and environment variable
//! overrides. Generation knobs (timeouts, retries, term shape) live in
//! [`GenerationConfig`] so the orchestrator and prompt builders share one
//! source of defaults.

use crate::error::PipelineError;
use crate::logging::LoggingConfig;
use crate::provider::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CurrigenConfig {
    /// Model provider configurations, keyed by provider name
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Generation pipeline settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Generation pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Hard timeout for a single model call, in seconds
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,

    /// Maximum model call attempts before falling back
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Responses shorter than this count as failures
    #[serde(default = "default_min_response_length")]
    pub min_response_length: usize,

    /// Concept cells shorter than this are rejected by the extractor
    #[serde(default = "default_min_concept_length")]
    pub min_concept_length: usize,

    /// Term shape defaults used when a request omits them
    #[serde(default = "default_weeks_per_term")]
    pub weeks_per_term: u32,

    #[serde(default = "default_lessons_per_week")]
    pub lessons_per_week: u32,

    #[serde(default = "default_lesson_duration_minutes")]
    pub lesson_duration_minutes: u32,

    /// TTL for the curriculum reference cache, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_model_timeout_secs() -> u64 {
    180
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_min_response_length() -> usize {
    50
}

fn default_min_concept_length() -> usize {
    10
}

fn default_weeks_per_term() -> u32 {
    12
}

fn default_lessons_per_week() -> u32 {
    5
}

fn default_lesson_duration_minutes() -> u32 {
    35
}

fn default_cache_ttl_secs() -> u64 {
    300
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_timeout_secs: default_model_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            min_response_length: default_min_response_length(),
            min_concept_length: default_min_concept_length(),
            weeks_per_term: default_weeks_per_term(),
            lessons_per_week: default_lessons_per_week(),
            lesson_duration_minutes: default_lesson_duration_minutes(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Provider(String, String),
    Generation(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(name, msg) => {
                write!(f, "Provider '{}': {}", name, msg)
            }
            ValidationError::Generation(msg) => {
                write!(f, "Generation: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.model_timeout_secs == 0 {
            return Err("model_timeout_secs must be positive".to_string());
        }
        if self.weeks_per_term == 0 || self.lessons_per_week == 0 {
            return Err("term shape values must be positive".to_string());
        }
        Ok(())
    }
}

impl CurrigenConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (name, provider) in &self.providers {
            if let Err(e) = provider.validate() {
                errors.push(ValidationError::Provider(name.clone(), e));
            }
        }

        if let Err(e) = self.generation.validate() {
            errors.push(ValidationError::Generation(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Load configuration from an optional file plus `CURRIGEN_` environment
    /// overrides (e.g. `CURRIGEN_GENERATION__MAX_ATTEMPTS=5`).
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        } else {
            builder = builder.add_source(
                config::File::with_name("currigen").required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CURRIGEN").separator("__"),
        );

        let settings = builder.build()?;
        let config: CurrigenConfig = settings
            .try_deserialize()
            .map_err(|e| PipelineError::ConfigError(e.to_string()))?;

        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            PipelineError::ConfigError(messages.join("; "))
        })?;

        Ok(config)
    }
}
