//! Conditional coverage top-up pass
//!
//! When too few findings survive quality gating, one additional narrow LLM
//! request fills in the categories not yet represented. Top-up findings
//! carry their own origin so scoring can weight them lower, and they never
//! cause a hard failure - on repeated malformed responses the finding set
//! simply stays as it is.

use crate::classifier::ContractTypeInfo;
use crate::config::LlmConfig;
use crate::document::ContractDocument;
use crate::finding::{Finding, Origin};
use crate::llm::{
    findings_from_payload, prompt, requested_categories, schema, GenerationRequest, TextGenerator,
};

/// Supplementary analysis pass for under-covered documents.
#[derive(Debug)]
pub struct CoverageTopUp<'a> {
    generator: &'a dyn TextGenerator,
    config: &'a LlmConfig,
}

impl<'a> CoverageTopUp<'a> {
    pub fn new(generator: &'a dyn TextGenerator, config: &'a LlmConfig) -> Self {
        Self { generator, config }
    }

    /// Request findings for categories the survivors do not cover.
    ///
    /// One attempt, one reduced retry on a malformed response, then give up
    /// quietly - the caller keeps its finding set either way.
    pub async fn run(
        &self,
        document: &ContractDocument,
        type_info: &ContractTypeInfo,
        survivors: &[Finding],
    ) -> Vec<Finding> {
        let missing = self.missing_categories(type_info, survivors);
        if missing.is_empty() {
            return Vec::new();
        }

        let mut tags = missing;
        for attempt in 0..2 {
            let request = self.build_request(document, type_info, &tags);
            let raw = match tokio::time::timeout(request.timeout, self.generator.generate(&request))
                .await
            {
                Ok(Ok(outcome)) => outcome.content,
                Ok(Err(err)) => {
                    tracing::warn!(error = %err, attempt, "top-up request failed");
                    return Vec::new();
                }
                Err(_) => {
                    tracing::warn!(attempt, "top-up request timed out");
                    return Vec::new();
                }
            };

            match schema::parse_payload(&raw) {
                Ok(payload) => {
                    let findings = findings_from_payload(payload, Origin::Topup);
                    tracing::info!(findings = findings.len(), "top-up pass produced findings");
                    return findings;
                }
                Err(err) if attempt == 0 && tags.len() > 1 => {
                    // Malformed response: retry once with a reduced category list.
                    tracing::debug!(error = %err, "malformed top-up payload, reducing categories");
                    tags.truncate(tags.len().div_ceil(2));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "top-up pass abandoned");
                    return Vec::new();
                }
            }
        }
        Vec::new()
    }

    fn missing_categories(
        &self,
        type_info: &ContractTypeInfo,
        survivors: &[Finding],
    ) -> Vec<&'static str> {
        requested_categories(type_info)
            .into_iter()
            .filter(|tag| !survivors.iter().any(|f| f.category == *tag))
            .collect()
    }

    fn build_request(
        &self,
        document: &ContractDocument,
        type_info: &ContractTypeInfo,
        tags: &[&'static str],
    ) -> GenerationRequest {
        GenerationRequest {
            system_prompt: prompt::system_prompt(),
            prompt: prompt::topup_prompt(document, type_info, tags),
            model: self.config.primary_model.clone(),
            schema: schema::declared_schema(tags),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens / 2,
            timeout: self.config.secondary_timeout(),
        }
    }
}
