//! Pipeline configuration.
//!
//! One explicit configuration object, validated once at startup. The CLI
//! fills it from flags; `from_env` applies `PAPERFORGE_*` overrides for
//! non-interactive deployments.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable or credential is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Which kind of source a run discovers papers from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A local directory of PDF files.
    Folder,
    /// A remote library listing, optionally restricted to one collection.
    Library,
}

/// Configuration for the paper pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    // Source settings
    /// Kind of paper source.
    pub source_kind: SourceKind,
    /// Folder path for [`SourceKind::Folder`] sources.
    pub source_path: PathBuf,
    /// Collection name for [`SourceKind::Library`] sources.
    pub collection: Option<String>,

    // Output settings
    /// Root directory for per-paper result directories.
    pub output_dir: PathBuf,

    // Concurrency settings
    /// Maximum number of papers processed concurrently (worker pool size).
    pub max_concurrent_papers: usize,
    /// Maximum number of completion calls in flight across the whole run.
    pub max_concurrent_requests: usize,
    /// Fixed delay applied after acquiring a request slot (zero disables).
    pub inter_call_delay: Duration,

    // Retry settings
    /// Total attempts per completion call (initial call included).
    pub max_attempts: u32,
    /// Base backoff delay; doubles on each re-attempt.
    pub base_retry_delay: Duration,

    // LLM settings
    /// Sampling temperature for per-demand analysis calls.
    pub temperature: f64,
    /// Sampling temperature for report synthesis calls.
    pub synthesis_temperature: f64,
    /// Maximum tokens to generate per call.
    pub max_tokens: u32,
    /// Character budget for paper text in per-demand prompts.
    pub demand_char_budget: usize,
    /// Character budget for the corpus in synthesis prompts.
    pub synthesis_char_budget: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            // Source defaults
            source_kind: SourceKind::Folder,
            source_path: PathBuf::from("."),
            collection: None,

            // Output defaults
            output_dir: PathBuf::from("./analysis-output"),

            // Concurrency defaults
            max_concurrent_papers: 10,
            max_concurrent_requests: 10,
            inter_call_delay: Duration::from_secs(2),

            // Retry defaults
            max_attempts: 3,
            base_retry_delay: Duration::from_secs(1),

            // LLM defaults
            temperature: 0.3,
            synthesis_temperature: 0.4,
            max_tokens: 4000,
            demand_char_budget: 15_000,
            synthesis_char_budget: 150_000,
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `PAPERFORGE_*` environment overrides to the defaults.
    ///
    /// # Environment Variables
    ///
    /// - `PAPERFORGE_MAX_CONCURRENT_PAPERS`: worker pool size (default: 10)
    /// - `PAPERFORGE_MAX_CONCURRENT_REQUESTS`: global API-call bound (default: 10)
    /// - `PAPERFORGE_INTER_CALL_DELAY_SECS`: post-acquire delay (default: 2)
    /// - `PAPERFORGE_MAX_ATTEMPTS`: attempts per completion call (default: 3)
    /// - `PAPERFORGE_BASE_RETRY_DELAY_MS`: base backoff delay (default: 1000)
    /// - `PAPERFORGE_DEMAND_CHAR_BUDGET`: per-demand text budget (default: 15000)
    /// - `PAPERFORGE_SYNTHESIS_CHAR_BUDGET`: synthesis corpus budget (default: 150000)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a set variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("PAPERFORGE_MAX_CONCURRENT_PAPERS") {
            config.max_concurrent_papers =
                parse_env_value(&val, "PAPERFORGE_MAX_CONCURRENT_PAPERS")?;
        }

        if let Ok(val) = std::env::var("PAPERFORGE_MAX_CONCURRENT_REQUESTS") {
            config.max_concurrent_requests =
                parse_env_value(&val, "PAPERFORGE_MAX_CONCURRENT_REQUESTS")?;
        }

        if let Ok(val) = std::env::var("PAPERFORGE_INTER_CALL_DELAY_SECS") {
            let secs: u64 = parse_env_value(&val, "PAPERFORGE_INTER_CALL_DELAY_SECS")?;
            config.inter_call_delay = Duration::from_secs(secs);
        }

        if let Ok(val) = std::env::var("PAPERFORGE_MAX_ATTEMPTS") {
            config.max_attempts = parse_env_value(&val, "PAPERFORGE_MAX_ATTEMPTS")?;
        }

        if let Ok(val) = std::env::var("PAPERFORGE_BASE_RETRY_DELAY_MS") {
            let ms: u64 = parse_env_value(&val, "PAPERFORGE_BASE_RETRY_DELAY_MS")?;
            config.base_retry_delay = Duration::from_millis(ms);
        }

        if let Ok(val) = std::env::var("PAPERFORGE_DEMAND_CHAR_BUDGET") {
            config.demand_char_budget = parse_env_value(&val, "PAPERFORGE_DEMAND_CHAR_BUDGET")?;
        }

        if let Ok(val) = std::env::var("PAPERFORGE_SYNTHESIS_CHAR_BUDGET") {
            config.synthesis_char_budget =
                parse_env_value(&val, "PAPERFORGE_SYNTHESIS_CHAR_BUDGET")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_papers == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_concurrent_papers must be greater than 0".to_string(),
            ));
        }

        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_concurrent_requests must be greater than 0".to_string(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.demand_char_budget == 0 || self.synthesis_char_budget == 0 {
            return Err(ConfigError::ValidationFailed(
                "character budgets must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature)
            || !(0.0..=2.0).contains(&self.synthesis_temperature)
        {
            return Err(ConfigError::ValidationFailed(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parses an environment variable value into the target type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{}': {}", value, e),
    })
}
