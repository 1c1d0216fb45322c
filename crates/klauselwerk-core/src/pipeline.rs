//! The contract analysis pipeline
//!
//! One invocation is a pure, sequential pass: classify, gap-analyze,
//! synthesize, obtain the model opinion through the fallback chain, merge,
//! quality-gate, scope-enforce, optionally top up coverage, score, audit
//! integrity, and assemble the report. The pipeline holds no state between
//! invocations and issues at most one outstanding external call at a time;
//! the analyzer itself is reentrant across documents.

use std::sync::Arc;

use chrono::Utc;

use crate::classifier::{ContractTypeInfo, TypeClassifier};
use crate::config::AnalysisConfig;
use crate::diagnostics::StageTrace;
use crate::document::{ContextHints, ContractDocument};
use crate::error::{Result, ValidationError};
use crate::finding::{Classification, Difficulty, Finding, Gap, GapKind, Origin};
use crate::gap::GapAnalyzer;
use crate::integrity::LegalIntegrityAuditor;
use crate::llm::{prompt, AnalysisOrchestrator, FallbackTier, TextGenerator};
use crate::quality::QualityGate;
use crate::report::{
    assess_maturity, group_into_categories, score_block, summarize, AnalysisReport, ReportMeta,
};
use crate::scope::ScopeEnforcer;
use crate::score::HealthScoreCalculator;
use crate::synthesis::{ClauseSynthesizer, TEMPLATE_VERSION};
use crate::topup::CoverageTopUp;

/// Minimum share of alphabetic characters for text to count as prose.
const MIN_ALPHABETIC_RATIO: f64 = 0.3;

/// The analysis pipeline. Construct once, analyze many documents.
#[derive(Debug)]
pub struct ContractAnalyzer {
    config: AnalysisConfig,
    generator: Arc<dyn TextGenerator>,
    classifier: TypeClassifier,
    gap_analyzer: GapAnalyzer,
    synthesizer: ClauseSynthesizer,
    quality_gate: QualityGate,
    scope_enforcer: ScopeEnforcer,
    score_calculator: HealthScoreCalculator,
    integrity_auditor: LegalIntegrityAuditor,
}

impl ContractAnalyzer {
    /// Analyzer with production defaults.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_config(generator, AnalysisConfig::default())
    }

    pub fn with_config(generator: Arc<dyn TextGenerator>, config: AnalysisConfig) -> Self {
        Self {
            config,
            generator,
            classifier: TypeClassifier::new(),
            gap_analyzer: GapAnalyzer::new(),
            synthesizer: ClauseSynthesizer::new(),
            quality_gate: QualityGate::new(),
            scope_enforcer: ScopeEnforcer::new(),
            score_calculator: HealthScoreCalculator::new(),
            integrity_auditor: LegalIntegrityAuditor::new(),
        }
    }

    /// Analyze a document without upstream context hints.
    pub async fn analyze(&self, document: &ContractDocument) -> Result<AnalysisReport> {
        self.analyze_with_hints(document, &ContextHints::default())
            .await
    }

    /// Full pipeline invocation.
    ///
    /// Returns a complete report or a typed error; only input validation
    /// aborts without running the fallback chain.
    pub async fn analyze_with_hints(
        &self,
        document: &ContractDocument,
        hints: &ContextHints,
    ) -> Result<AnalysisReport> {
        self.validate(document)?;
        let mut trace = StageTrace::new();

        // Stage 1: classification.
        let type_info = self.classifier.classify(&document.text, &document.filename);
        trace.record(
            "classify",
            0,
            0,
            format!(
                "kind={} confidence={} amendment={}",
                type_info.kind.tag(),
                type_info.confidence,
                type_info.is_amendment
            ),
        );

        // Stage 2: deterministic gap analysis.
        let gaps = self.gap_analyzer.analyze(&document.text, &type_info);
        let suppressed = self.gap_analyzer.suppressed_categories(&type_info);
        trace.record(
            "gap_analysis",
            0,
            gaps.len(),
            format!("suppressed_categories={}", suppressed.len()),
        );

        // Stage 3: clause synthesis; gaps become rule findings.
        let clauses =
            self.synthesizer
                .synthesize(&type_info, document.jurisdiction(), &gaps);
        let rule_findings: Vec<Finding> = gaps
            .iter()
            .map(|gap| rule_finding(gap, clauses.get(&gap.clause_id)))
            .collect();
        trace.record("synthesis", gaps.len(), rule_findings.len(), TEMPLATE_VERSION);

        // Stage 4: model opinion through the fallback chain.
        let orchestrator = AnalysisOrchestrator::new(self.generator.as_ref(), &self.config.llm);
        let llm = orchestrator.run(document, &type_info, &gaps, hints).await;
        trace.record(
            "llm_analysis",
            0,
            llm.findings.len(),
            format!("tier={:?} attempts={}", llm.tier, llm.attempts),
        );

        // Stage 5: merge and quality-gate.
        let mut merged = rule_findings;
        merged.extend(llm.findings);
        let merged_len = merged.len();
        let (gated, gate_stats) = self.quality_gate.apply(merged, &type_info);
        trace.record(
            "quality_gate",
            merged_len,
            gated.len(),
            format!(
                "merged_duplicates={} dropped_evidence={}",
                gate_stats.merged_duplicates, gate_stats.dropped_missing_evidence
            ),
        );

        // Stage 6: amendment scope enforcement.
        let (scoped, scope_stats) = self.scope_enforcer.enforce(gated, &type_info);
        trace.record(
            "scope_enforcement",
            scope_stats.input,
            scope_stats.output,
            format!(
                "removed_forbidden={} removed_out_of_scope={}",
                scope_stats.removed_forbidden, scope_stats.removed_out_of_scope
            ),
        );

        // Stage 7: conditional coverage top-up; top-up findings pass the
        // same gate and scope filter before merging.
        let mut findings = scoped;
        if findings.len() < self.config.coverage_floor && llm.tier != FallbackTier::RulesOnly {
            let topup = CoverageTopUp::new(self.generator.as_ref(), &self.config.llm)
                .run(document, &type_info, &findings)
                .await;
            let before = findings.len();
            if !topup.is_empty() {
                findings.extend(topup);
                let merged_count = findings.len();
                let (regated, _) = self.quality_gate.apply(findings, &type_info);
                let (rescoped, _) = self.scope_enforcer.enforce(regated, &type_info);
                findings = rescoped;
                trace.record("coverage_topup", before, findings.len(), format!("requested={}", merged_count - before));
            } else {
                trace.record("coverage_topup", before, before, "no supplementary findings");
            }
        }

        // Stage 8: scoring.
        let computed = self.score_calculator.score(&findings, &self.config.score);

        // Stage 9: integrity audit over the original text, then capping.
        let integrity = self
            .integrity_auditor
            .audit(&document.text, &findings, &type_info);
        let health = integrity.cap_score(computed);
        trace.record(
            "scoring",
            findings.len(),
            findings.len(),
            format!(
                "computed={} cap={} final={} level={:?}",
                computed, integrity.score_cap, health, integrity.level
            ),
        );

        Ok(self.assemble(document, type_info, llm.assessment, llm.tier, findings, health, integrity, trace))
    }

    fn validate(&self, document: &ContractDocument) -> Result<()> {
        let trimmed = document.text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyText.into());
        }
        if trimmed.len() < self.config.min_text_len {
            return Err(ValidationError::TextTooShort {
                actual: trimmed.len(),
                minimum: self.config.min_text_len,
            }
            .into());
        }

        let alphabetic = trimmed.chars().filter(|c| c.is_alphabetic()).count() as f64;
        if alphabetic / (trimmed.chars().count() as f64) < MIN_ALPHABETIC_RATIO {
            return Err(ValidationError::Unreadable(
                "text is mostly non-alphabetic; extraction likely failed".to_string(),
            )
            .into());
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        document: &ContractDocument,
        type_info: ContractTypeInfo,
        assessment: Option<String>,
        fallback_tier: FallbackTier,
        findings: Vec<Finding>,
        health: u8,
        integrity: crate::integrity::LegalIntegrity,
        trace: StageTrace,
    ) -> AnalysisReport {
        let maturity = assess_maturity(&findings);
        let score = score_block(health, &findings);
        let categories = group_into_categories(findings);
        let summary = summarize(&categories, &integrity);

        AnalysisReport {
            id: AnalysisReport::new_id(),
            meta: ReportMeta {
                type_info,
                jurisdiction: document.jurisdiction().code().to_string(),
                language: document.language(),
                maturity,
                fallback_tier,
                analyzed_at: Utc::now(),
                prompt_version: prompt::PROMPT_VERSION.to_string(),
                template_version: TEMPLATE_VERSION.to_string(),
                stages: trace.into_events(),
            },
            assessment,
            categories,
            score,
            summary,
            legal_integrity: integrity,
        }
    }
}

/// Render a rule-engine gap as a finding, with the synthesized clause as the
/// replacement text.
fn rule_finding(gap: &Gap, clause: Option<&String>) -> Finding {
    let risk = gap.severity.risk();
    let (original_text, classification, evidence) = match gap.kind {
        GapKind::MissingClause => (
            crate::finding::MISSING_CLAUSE_MARKER.to_string(),
            Classification::missing(gap.necessity),
            Vec::new(),
        ),
        GapKind::WeakClause => {
            let excerpt = gap
                .matched_excerpt
                .clone()
                .unwrap_or_else(|| crate::finding::MISSING_CLAUSE_MARKER.to_string());
            (
                excerpt.clone(),
                Classification::weak(gap.necessity),
                vec![excerpt],
            )
        }
    };

    Finding {
        id: Finding::new_id(),
        origin: Origin::Rule,
        summary: gap.title.clone(),
        original_text,
        improved_text: clause.cloned().unwrap_or_default(),
        legal_reasoning: gap.rationale.clone(),
        category: gap.category.clone(),
        risk,
        impact: risk.saturating_sub(1).max(5),
        confidence: 90,
        difficulty: if risk >= 8 {
            Difficulty::Medium
        } else {
            Difficulty::Easy
        },
        benchmark: gap.benchmark.clone(),
        evidence,
        classification,
    }
}
