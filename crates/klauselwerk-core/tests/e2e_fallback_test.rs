//! E2E tests for the fallback chain and input validation
//!
//! Simulates primary/secondary model failure and verifies the rule engine
//! carries the pipeline to a complete report.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use klauselwerk_core::llm::{FallbackTier, GenerationOutcome, GenerationRequest, TextGenerator};
use klauselwerk_core::{AnalysisConfig, AnalysisError, ContractAnalyzer, ContractDocument, Origin};
use tokio_test::assert_ok;

#[derive(Debug)]
struct AlwaysFails;

#[async_trait::async_trait]
impl TextGenerator for AlwaysFails {
    async fn generate(&self, _request: &GenerationRequest) -> anyhow::Result<GenerationOutcome> {
        Err(anyhow!("service unavailable"))
    }
}

/// Fails the first `failures` calls, then serves a valid payload.
#[derive(Debug)]
struct FlakyGenerator {
    failures: AtomicU32,
}

#[async_trait::async_trait]
impl TextGenerator for FlakyGenerator {
    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<GenerationOutcome> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |f| f.checked_sub(1))
            .is_ok()
        {
            return Err(anyhow!("connection reset"));
        }
        Ok(GenerationOutcome {
            model: request.model.clone(),
            content: r#"{
                "meta": { "type": "dienstvertrag" },
                "categories": [{
                    "tag": "liability",
                    "issues": [{
                        "summary": "Haftung ohne Begrenzung der Höhe",
                        "original_text": "haftet für alle Schäden",
                        "improved_text": "Die Haftung wird der Höhe nach auf den vertragstypischen, vorhersehbaren Schaden begrenzt.",
                        "legal_reasoning": "Ohne Haftungshöchstgrenze besteht ein unkalkulierbares Risiko; § 276 BGB lässt eine Begrenzung zu.",
                        "risk": 7, "impact": 6, "confidence": 82,
                        "evidence": ["haftet für alle Schäden"]
                    }]
                }]
            }"#
            .to_string(),
            token_cost: 200,
        })
    }
}

fn fast_config() -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    config.llm.backoff_base_ms = 0;
    config.llm.primary_timeout_ms = 2_000;
    config.llm.secondary_timeout_ms = 2_000;
    config
}

const SERVICE_CONTRACT: &str = "Dienstleistungsvertrag\n\nzwischen der Alpha GmbH, \
    Musterstraße 1, 10115 Berlin und der Beta AG, Beispielweg 2, 80331 München.\n\
    § 1 Leistungsbeschreibung\nDer Auftragnehmer erbringt folgende Leistungen: Beratung.\n\
    § 2 Vergütung\nDie Vergütung beträgt 1.200 Euro, zahlbar innerhalb von 14 Tagen.\n\
    § 3 Haftung\nDer Auftragnehmer haftet für alle Schäden.\n\
    § 4 Laufzeit\nDer Vertrag beginnt am 01.02.2025.";

#[tokio::test]
async fn e2e_total_model_failure_still_produces_report() {
    let analyzer = ContractAnalyzer::with_config(Arc::new(AlwaysFails), fast_config());
    let document = ContractDocument::new(SERVICE_CONTRACT, "dienstvertrag.pdf");

    let report = assert_ok!(analyzer.analyze(&document).await);

    assert_eq!(report.meta.fallback_tier, FallbackTier::RulesOnly);
    // Rule engine is the sole finding source.
    assert!(report.summary.total_issues > 0);
    assert!(report.findings().all(|f| f.origin == Origin::Rule));
    assert!(report.score.health >= 30);
}

#[tokio::test]
async fn e2e_flaky_primary_recovers_on_secondary_tier() {
    // 3 primary attempts fail, the 4th call (secondary tier) also fails,
    // the 5th succeeds.
    let analyzer = ContractAnalyzer::with_config(
        Arc::new(FlakyGenerator {
            failures: AtomicU32::new(4),
        }),
        fast_config(),
    );
    let document = ContractDocument::new(SERVICE_CONTRACT, "dienstvertrag.pdf");

    let report = analyzer.analyze(&document).await.unwrap();

    assert_eq!(report.meta.fallback_tier, FallbackTier::Secondary);
    assert!(report.findings().any(|f| f.origin == Origin::Ai));
}

#[tokio::test]
async fn e2e_flaky_within_primary_budget_stays_primary() {
    let analyzer = ContractAnalyzer::with_config(
        Arc::new(FlakyGenerator {
            failures: AtomicU32::new(2),
        }),
        fast_config(),
    );
    let document = ContractDocument::new(SERVICE_CONTRACT, "dienstvertrag.pdf");

    let report = analyzer.analyze(&document).await.unwrap();
    assert_eq!(report.meta.fallback_tier, FallbackTier::Primary);
}

#[tokio::test]
async fn e2e_empty_text_is_validation_error() {
    let analyzer = ContractAnalyzer::with_config(Arc::new(AlwaysFails), fast_config());
    let document = ContractDocument::new("   ", "leer.pdf");

    let err = analyzer.analyze(&document).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Validation(_)));
    assert!(!err.retryable());
}

#[tokio::test]
async fn e2e_short_text_is_validation_error() {
    let analyzer = ContractAnalyzer::with_config(Arc::new(AlwaysFails), fast_config());
    let document = ContractDocument::new("Zu kurz.", "kurz.pdf");

    let err = analyzer.analyze(&document).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Validation(_)));
    assert!(err.to_string().contains("too short"));
}

#[tokio::test]
async fn e2e_non_prose_text_is_validation_error() {
    let analyzer = ContractAnalyzer::with_config(Arc::new(AlwaysFails), fast_config());
    let document = ContractDocument::new(
        "0000 1111 2222 3333 4444 5555 6666 7777 8888 9999 ==== ---- #### 0000 1111 2222 \
         3333 4444 5555 6666 7777 8888 9999 ==== ---- ####",
        "scan.pdf",
    );

    let err = analyzer.analyze(&document).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Validation(_)));
    assert!(!err.retryable());
}

#[tokio::test]
async fn e2e_timeout_advances_fallback_chain() {
    /// Hangs until cancelled; the orchestrator's deadline must fire.
    #[derive(Debug)]
    struct Hangs;

    #[async_trait::async_trait]
    impl TextGenerator for Hangs {
        async fn generate(&self, _request: &GenerationRequest) -> anyhow::Result<GenerationOutcome> {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            unreachable!("deadline should have fired");
        }
    }

    let mut config = fast_config();
    config.llm.primary_timeout_ms = 50;
    config.llm.secondary_timeout_ms = 50;
    config.llm.max_attempts = 1;

    let analyzer = ContractAnalyzer::with_config(Arc::new(Hangs), config);
    let document = ContractDocument::new(SERVICE_CONTRACT, "dienstvertrag.pdf");

    let report = analyzer.analyze(&document).await.unwrap();
    assert_eq!(report.meta.fallback_tier, FallbackTier::RulesOnly);
}
