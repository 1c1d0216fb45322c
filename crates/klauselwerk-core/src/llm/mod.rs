//! LLM analysis orchestration
//!
//! Obtains the high-recall second opinion from the external text-generation
//! capability. The fallback chain is an explicit state machine
//! (`TryPrimary -> TrySecondary -> RuleEngineOnly`) with pure transitions:
//! timeouts and transport errors retry with exponential backoff inside a
//! tier, schema violations get one narrow retry (fewer categories, smaller
//! token budget), and exhaustion advances the tier. The pipeline never fails
//! outright because the rule engine is the guaranteed last resort.

pub mod client;
pub mod prompt;
pub mod schema;

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::classifier::ContractTypeInfo;
use crate::config::LlmConfig;
use crate::document::{ContextHints, ContractDocument};
use crate::error::ExternalServiceError;
use crate::finding::{Finding, Gap, Origin};
use crate::taxonomy::{AMENDMENT_CORE_TOPICS, CATEGORIES};

pub use client::{GenerationOutcome, GenerationRequest, TextGenerator};
pub use schema::LlmAnalysisPayload;

/// Category count for the narrowed retry and the secondary tier.
const REDUCED_CATEGORY_COUNT: usize = 8;

/// Fallback chain state. Transitions are pure; the tier that produced the
/// findings travels into diagnostics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTier {
    /// Full prompt against the primary model
    Primary,
    /// Reduced prompt and schema against the cheaper model
    Secondary,
    /// Deterministic rule engine only; no model output
    RulesOnly,
}

impl FallbackTier {
    /// Next tier after exhaustion of this one.
    pub fn next(self) -> FallbackTier {
        match self {
            FallbackTier::Primary => FallbackTier::Secondary,
            FallbackTier::Secondary => FallbackTier::RulesOnly,
            FallbackTier::RulesOnly => FallbackTier::RulesOnly,
        }
    }
}

/// Result of the orchestrated analysis pass.
#[derive(Debug)]
pub struct LlmOutcome {
    /// Findings converted from the model payload; empty on RulesOnly
    pub findings: Vec<Finding>,
    /// Model's prose assessment of the contract, if provided
    pub assessment: Option<String>,
    /// Tier that produced the result
    pub tier: FallbackTier,
    /// Total external calls issued
    pub attempts: u32,
}

/// Category tags requested from the model for this document.
pub fn requested_categories(type_info: &ContractTypeInfo) -> Vec<&'static str> {
    if type_info.is_amendment {
        let mut tags: Vec<&'static str> = AMENDMENT_CORE_TOPICS.to_vec();
        for topic in type_info.changed_topics() {
            if let Some(def) = CATEGORIES.iter().find(|c| c.tag == topic.as_str()) {
                if !tags.contains(&def.tag) {
                    tags.push(def.tag);
                }
            }
        }
        tags
    } else {
        CATEGORIES
            .iter()
            .map(|c| c.tag)
            .filter(|t| !AMENDMENT_CORE_TOPICS.contains(t))
            .collect()
    }
}

/// Exponential backoff with jitter for transport retries.
pub fn backoff_delay(retry: u32, base_ms: u64) -> Duration {
    let exp = base_ms.saturating_mul(1u64 << retry.min(6)).min(30_000);
    let jitter = if base_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=base_ms / 2)
    };
    Duration::from_millis(exp + jitter)
}

/// Orchestrates the tiered analysis request against the abstract capability.
#[derive(Debug)]
pub struct AnalysisOrchestrator<'a> {
    generator: &'a dyn TextGenerator,
    config: &'a LlmConfig,
}

impl<'a> AnalysisOrchestrator<'a> {
    pub fn new(generator: &'a dyn TextGenerator, config: &'a LlmConfig) -> Self {
        Self { generator, config }
    }

    /// Run the fallback chain to completion. Never fails: exhaustion of both
    /// model tiers yields an empty finding set with tier RulesOnly.
    pub async fn run(
        &self,
        document: &ContractDocument,
        type_info: &ContractTypeInfo,
        gaps: &[Gap],
        hints: &ContextHints,
    ) -> LlmOutcome {
        let categories = requested_categories(type_info);
        let mut tier = FallbackTier::Primary;
        let mut attempts = 0u32;

        loop {
            if tier == FallbackTier::RulesOnly {
                tracing::warn!(
                    attempts,
                    "all model tiers exhausted; continuing with rule engine only"
                );
                return LlmOutcome {
                    findings: Vec::new(),
                    assessment: None,
                    tier,
                    attempts,
                };
            }

            match self
                .try_tier(tier, document, type_info, gaps, hints, &categories, &mut attempts)
                .await
            {
                Ok(payload) => {
                    let assessment = payload.assessment.clone();
                    let findings = findings_from_payload(payload, Origin::Ai);
                    tracing::info!(
                        tier = ?tier,
                        attempts,
                        findings = findings.len(),
                        "model analysis succeeded"
                    );
                    return LlmOutcome {
                        findings,
                        assessment,
                        tier,
                        attempts,
                    };
                }
                Err(err) => {
                    tracing::warn!(tier = ?tier, error = %err, "tier exhausted, advancing fallback chain");
                    tier = tier.next();
                }
            }
        }
    }

    /// One tier: transport retries with backoff, one narrow retry on schema
    /// violations, then escalation.
    #[allow(clippy::too_many_arguments)]
    async fn try_tier(
        &self,
        tier: FallbackTier,
        document: &ContractDocument,
        type_info: &ContractTypeInfo,
        gaps: &[Gap],
        hints: &ContextHints,
        categories: &[&'static str],
        attempts: &mut u32,
    ) -> crate::error::Result<LlmAnalysisPayload> {
        let mut narrowed = tier == FallbackTier::Secondary;
        let mut request = self.build_request(tier, document, type_info, gaps, hints, categories, narrowed);

        let mut transport_attempt = 0u32;
        let mut last_err: crate::error::AnalysisError =
            ExternalServiceError::Transport {
                model: request.model.clone(),
                detail: "no attempt made".to_string(),
            }
            .into();

        while transport_attempt < self.config.max_attempts {
            transport_attempt += 1;
            *attempts += 1;

            if *attempts > 1 {
                tokio::time::sleep(backoff_delay(transport_attempt - 1, self.config.backoff_base_ms)).await;
            }

            let raw = match self.call(&request).await {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::debug!(attempt = transport_attempt, error = %err, "transport attempt failed");
                    last_err = err.into();
                    continue;
                }
            };

            match schema::parse_payload(&raw) {
                Ok(payload) => return Ok(payload),
                Err(parse_err) if !narrowed => {
                    // A well-formed response that misses the schema gets one
                    // narrower attempt before the tier is given up.
                    tracing::debug!(error = %parse_err, "schema violation, issuing narrow retry");
                    narrowed = true;
                    request = self.build_request(tier, document, type_info, gaps, hints, categories, true);
                    transport_attempt -= 1;
                    continue;
                }
                Err(parse_err) => return Err(parse_err.into()),
            }
        }

        Err(last_err)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_request(
        &self,
        tier: FallbackTier,
        document: &ContractDocument,
        type_info: &ContractTypeInfo,
        gaps: &[Gap],
        hints: &ContextHints,
        categories: &[&'static str],
        reduced: bool,
    ) -> GenerationRequest {
        let tags: Vec<&str> = if reduced {
            categories.iter().take(REDUCED_CATEGORY_COUNT).copied().collect()
        } else {
            categories.to_vec()
        };

        let (model, timeout) = match tier {
            FallbackTier::Primary => (
                self.config.primary_model.clone(),
                self.config.primary_timeout(),
            ),
            _ => (
                self.config.secondary_model.clone(),
                self.config.secondary_timeout(),
            ),
        };

        let max_tokens = if reduced {
            self.config.max_tokens / 2
        } else {
            self.config.max_tokens
        };

        GenerationRequest {
            system_prompt: prompt::system_prompt(),
            prompt: prompt::analysis_prompt(document, type_info, gaps, hints, &tags, reduced),
            model,
            schema: schema::declared_schema(&tags),
            temperature: self.config.temperature,
            max_tokens,
            timeout,
        }
    }

    async fn call(&self, request: &GenerationRequest) -> Result<String, ExternalServiceError> {
        match tokio::time::timeout(request.timeout, self.generator.generate(request)).await {
            Err(_) => Err(ExternalServiceError::Timeout {
                model: request.model.clone(),
                timeout_ms: request.timeout.as_millis() as u64,
            }),
            Ok(Err(err)) => {
                let detail = err.to_string();
                if detail.to_lowercase().contains("rate limit") {
                    Err(ExternalServiceError::RateLimited {
                        model: request.model.clone(),
                    })
                } else {
                    Err(ExternalServiceError::Transport {
                        model: request.model.clone(),
                        detail,
                    })
                }
            }
            Ok(Ok(outcome)) => Ok(outcome.content),
        }
    }
}

/// Convert a parsed payload into findings, preserving provenance.
pub fn findings_from_payload(payload: LlmAnalysisPayload, origin: Origin) -> Vec<Finding> {
    let mut findings = Vec::new();
    for category in payload.categories {
        let parent_tag = category.tag.clone();
        for issue in category.issues {
            findings.push(issue.into_finding(origin, &parent_tag));
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TypeClassifier;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};

    const PAYLOAD: &str = r#"{
        "meta": { "type": "dienstvertrag" },
        "assessment": "Brauchbar mit Lücken.",
        "categories": [{
            "tag": "liability",
            "issues": [{
                "summary": "Haftung unbegrenzt",
                "original_text": "haftet unbeschränkt",
                "improved_text": "Die Haftung wird auf den vertragstypischen vorhersehbaren Schaden begrenzt.",
                "legal_reasoning": "Unbegrenzte Haftung widerspricht marktüblichen Regelungen.",
                "risk": 9, "impact": 8, "confidence": 88,
                "evidence": ["haftet unbeschränkt"]
            }]
        }]
    }"#;

    /// Scripted generator: fails `failures` times, then returns `content`.
    #[derive(Debug)]
    struct ScriptedGenerator {
        failures: AtomicU32,
        content: String,
    }

    #[async_trait::async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> anyhow::Result<GenerationOutcome> {
            if self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |f| f.checked_sub(1)).is_ok() {
                return Err(anyhow!("connection reset by peer"));
            }
            Ok(GenerationOutcome {
                model: "scripted".to_string(),
                content: self.content.clone(),
                token_cost: 100,
            })
        }
    }

    #[derive(Debug)]
    struct AlwaysFails;

    #[async_trait::async_trait]
    impl TextGenerator for AlwaysFails {
        async fn generate(&self, _request: &GenerationRequest) -> anyhow::Result<GenerationOutcome> {
            Err(anyhow!("service unavailable"))
        }
    }

    fn fast_config() -> LlmConfig {
        LlmConfig {
            backoff_base_ms: 0,
            primary_timeout_ms: 1_000,
            secondary_timeout_ms: 1_000,
            ..LlmConfig::default()
        }
    }

    fn doc_and_info() -> (ContractDocument, ContractTypeInfo) {
        let doc = ContractDocument::new(
            "Dienstvertrag zwischen Auftraggeber und Auftragnehmer über Beratungsleistungen.",
            "dienstvertrag.pdf",
        );
        let info = TypeClassifier::new().classify(&doc.text, &doc.filename);
        (doc, info)
    }

    #[tokio::test]
    async fn test_primary_success() {
        let generator = ScriptedGenerator {
            failures: AtomicU32::new(0),
            content: PAYLOAD.to_string(),
        };
        let config = fast_config();
        let orchestrator = AnalysisOrchestrator::new(&generator, &config);
        let (doc, info) = doc_and_info();

        let outcome = orchestrator.run(&doc, &info, &[], &ContextHints::default()).await;
        assert_eq!(outcome.tier, FallbackTier::Primary);
        assert_eq!(outcome.findings.len(), 1);
        assert_eq!(outcome.findings[0].origin, Origin::Ai);
        assert_eq!(outcome.findings[0].category, "liability");
        assert_eq!(outcome.assessment.as_deref(), Some("Brauchbar mit Lücken."));
    }

    #[tokio::test]
    async fn test_retry_then_success_within_primary() {
        let generator = ScriptedGenerator {
            failures: AtomicU32::new(2),
            content: PAYLOAD.to_string(),
        };
        let config = fast_config();
        let orchestrator = AnalysisOrchestrator::new(&generator, &config);
        let (doc, info) = doc_and_info();

        let outcome = orchestrator.run(&doc, &info, &[], &ContextHints::default()).await;
        assert_eq!(outcome.tier, FallbackTier::Primary);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.findings.len(), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_falls_back_to_rules_only() {
        let generator = AlwaysFails;
        let config = fast_config();
        let orchestrator = AnalysisOrchestrator::new(&generator, &config);
        let (doc, info) = doc_and_info();

        let outcome = orchestrator.run(&doc, &info, &[], &ContextHints::default()).await;
        assert_eq!(outcome.tier, FallbackTier::RulesOnly);
        assert!(outcome.findings.is_empty());
        // Both tiers burned their full transport budget.
        assert_eq!(outcome.attempts, config.max_attempts * 2);
    }

    #[tokio::test]
    async fn test_malformed_payload_gets_narrow_retry() {
        /// Returns garbage once, then a valid payload.
        #[derive(Debug)]
        struct MalformedOnce {
            served: AtomicU32,
        }

        #[async_trait::async_trait]
        impl TextGenerator for MalformedOnce {
            async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<GenerationOutcome> {
                let call = self.served.fetch_add(1, Ordering::SeqCst);
                let content = if call == 0 {
                    r#"{ "meta": {}, "categories": [] }"#.to_string()
                } else {
                    // The narrow retry must carry a reduced token budget.
                    assert!(request.max_tokens <= 4_096);
                    PAYLOAD.to_string()
                };
                Ok(GenerationOutcome {
                    model: request.model.clone(),
                    content,
                    token_cost: 10,
                })
            }
        }

        let generator = MalformedOnce {
            served: AtomicU32::new(0),
        };
        let config = fast_config();
        let orchestrator = AnalysisOrchestrator::new(&generator, &config);
        let (doc, info) = doc_and_info();

        let outcome = orchestrator.run(&doc, &info, &[], &ContextHints::default()).await;
        assert_eq!(outcome.tier, FallbackTier::Primary);
        assert_eq!(outcome.findings.len(), 1);
        assert_eq!(outcome.attempts, 2);
    }

    #[test]
    fn test_tier_transitions_are_pure() {
        assert_eq!(FallbackTier::Primary.next(), FallbackTier::Secondary);
        assert_eq!(FallbackTier::Secondary.next(), FallbackTier::RulesOnly);
        assert_eq!(FallbackTier::RulesOnly.next(), FallbackTier::RulesOnly);
    }

    #[test]
    fn test_requested_categories_for_amendment() {
        let info = TypeClassifier::new().classify(
            "Nachtrag zum Arbeitsvertrag vom 01.03.2022: Gehaltserhöhung auf 5.000 Euro.",
            "nachtrag.pdf",
        );
        let tags = requested_categories(&info);
        assert!(tags.contains(&"parent_reference"));
        assert!(tags.contains(&"compensation"));
        assert!(!tags.contains(&"termination"));
    }

    #[test]
    fn test_backoff_grows() {
        let first = backoff_delay(0, 100);
        let third = backoff_delay(2, 100);
        assert!(third >= first);
        assert!(backoff_delay(20, 100) <= Duration::from_millis(30_000 + 50));
    }
}
