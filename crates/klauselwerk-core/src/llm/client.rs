//! Abstract text-generation capability
//!
//! The pipeline depends only on this contract, never on a specific provider.
//! A request carries everything a provider needs: prompt, model id, declared
//! output schema, temperature, token budget, and the deadline the caller
//! races it against.

use std::fmt;
use std::time::Duration;

use anyhow::Result;

/// One schema-constrained generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// System prompt establishing role and output discipline
    pub system_prompt: String,
    /// User prompt carrying document, context, and instructions
    pub prompt: String,
    /// Provider-side model id
    pub model: String,
    /// Declared JSON schema the response must satisfy
    pub schema: serde_json::Value,
    /// Sampling temperature; the pipeline always requests 0.0
    pub temperature: f64,
    /// Token budget for the response
    pub max_tokens: u32,
    /// Deadline the orchestrator races the call against
    pub timeout: Duration,
}

/// Raw structured result from a provider.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Model that actually served the request
    pub model: String,
    /// Raw response text; expected to contain one JSON object
    pub content: String,
    /// Total token cost reported by the provider, 0 if unknown
    pub token_cost: u32,
}

/// Minimal generation trait the orchestrator and top-up pass call into.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync + fmt::Debug {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome>;
}
