//! Error types for the Klauselwerk analysis core
//!
//! This module defines all error types used throughout the analysis pipeline.
//! We use `thiserror` for ergonomic error definitions with automatic Display/Error implementations.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Input validation errors - never retried, surfaced immediately
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// External text-generation service errors - advance the fallback chain
    #[error("External service error: {0}")]
    ExternalService(#[from] ExternalServiceError),

    /// Structured payload failed schema validation - narrow retry, then fallback
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        source: Box<AnalysisError>,
    },
}

/// Errors raised before the pipeline runs a single stage
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("Document text is empty")]
    EmptyText,

    #[error("Document text too short: {actual} chars (minimum {minimum})")]
    TextTooShort { actual: usize, minimum: usize },

    #[error("Document text is not readable prose: {0}")]
    Unreadable(String),
}

/// Errors from the external text-generation capability
#[derive(Error, Debug, Clone)]
pub enum ExternalServiceError {
    #[error("Request to model '{model}' timed out after {timeout_ms}ms")]
    Timeout { model: String, timeout_ms: u64 },

    #[error("Transport failure for model '{model}': {detail}")]
    Transport { model: String, detail: String },

    #[error("Rate limited by provider for model '{model}'")]
    RateLimited { model: String },

    #[error("All fallback tiers exhausted; rule engine unavailable: {0}")]
    FallbackExhausted(String),
}

/// Errors from parsing a well-formed response against the declared schema
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("Response is not valid JSON: {0}")]
    NotJson(String),

    #[error("Payload missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Payload contains no categories")]
    EmptyCategories,
}

impl AnalysisError {
    /// Add context to an error
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether the caller may retry the whole invocation.
    ///
    /// Validation failures are deterministic; everything else is either
    /// transient (external service) or already behind the fallback chain.
    pub fn retryable(&self) -> bool {
        match self {
            AnalysisError::Validation(_) => false,
            AnalysisError::Config(_) => false,
            AnalysisError::ExternalService(_) => true,
            AnalysisError::Parse(_) => true,
            AnalysisError::Serialization(_) => false,
            AnalysisError::WithContext { source, .. } => source.retryable(),
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add lazy context to a Result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.context(f()))
    }
}
