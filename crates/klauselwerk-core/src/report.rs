//! Report assembly
//!
//! Groups the final finding set into ordered categories, computes the
//! aggregate summary counts and the maturity assessment, and packages the
//! whole invocation result into one immutable [`AnalysisReport`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::ContractTypeInfo;
use crate::diagnostics::StageEvent;
use crate::finding::{Category, Finding};
use crate::integrity::LegalIntegrity;
use crate::llm::FallbackTier;
use crate::taxonomy::{category_label, category_rank, Language};

/// Aggregate counts over the final finding set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub total_issues: usize,
    pub red_flags: usize,
    pub quick_wins: usize,
    pub critical_legal_risks: usize,
}

/// Score block: health plus the average risk/impact of the findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBlock {
    pub health: u8,
    pub risk: u8,
    pub impact: u8,
}

/// Coverage metrics feeding the maturity grade.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaturityMetrics {
    pub total_issues: usize,
    pub usable_issues: usize,
    pub average_confidence: u8,
    pub average_reasoning_len: usize,
    pub category_coverage: usize,
    pub has_high_priority: bool,
    pub has_benchmarks: bool,
}

/// Maturity assessment of the analysis itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaturityAssessment {
    pub grade: String,
    pub score: u8,
    pub metrics: MaturityMetrics,
}

/// Report metadata: type info, normalization results, provenance of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub type_info: ContractTypeInfo,
    pub jurisdiction: String,
    pub language: Language,
    pub maturity: MaturityAssessment,
    pub fallback_tier: FallbackTier,
    pub analyzed_at: DateTime<Utc>,
    pub prompt_version: String,
    pub template_version: String,
    /// Structured per-stage diagnostics for the observability collaborator
    pub stages: Vec<StageEvent>,
}

/// The single, atomic result of one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Stable id, `rep_<uuid>`
    pub id: String,
    pub meta: ReportMeta,
    /// Model's prose assessment, when a model tier produced the findings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<String>,
    pub categories: Vec<Category>,
    pub score: ScoreBlock,
    pub summary: Summary,
    pub legal_integrity: LegalIntegrity,
}

impl AnalysisReport {
    pub fn new_id() -> String {
        format!("rep_{}", uuid::Uuid::new_v4())
    }

    /// Flat iterator over all findings in all categories.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.categories.iter().flat_map(|c| c.issues.iter())
    }
}

/// Group findings into categories in canonical taxonomy order; issues inside
/// a category are ordered by priority, then risk.
pub fn group_into_categories(findings: Vec<Finding>) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();
    for finding in findings {
        match categories.iter_mut().find(|c| c.tag == finding.category) {
            Some(category) => category.issues.push(finding),
            None => categories.push(Category {
                tag: finding.category.clone(),
                label: category_label(&finding.category).to_string(),
                issues: vec![finding],
            }),
        }
    }

    for category in &mut categories {
        category
            .issues
            .sort_by_key(|f| (f.priority(), u8::MAX - f.risk));
    }
    categories.sort_by_key(|c| category_rank(&c.tag));
    categories
}

/// Aggregate summary over the grouped categories.
pub fn summarize(categories: &[Category], integrity: &LegalIntegrity) -> Summary {
    let all: Vec<&Finding> = categories.iter().flat_map(|c| c.issues.iter()).collect();
    Summary {
        total_issues: all.len(),
        red_flags: all.iter().filter(|f| f.is_red_flag()).count(),
        quick_wins: all.iter().filter(|f| f.is_quick_win()).count(),
        critical_legal_risks: integrity.red_flags.len() + integrity.mandatory_violations.len(),
    }
}

/// Average risk/impact block for the report.
pub fn score_block(health: u8, findings: &[Finding]) -> ScoreBlock {
    if findings.is_empty() {
        return ScoreBlock {
            health,
            risk: 0,
            impact: 0,
        };
    }
    let count = findings.len() as f64;
    let avg_risk = findings.iter().map(|f| f64::from(f.risk)).sum::<f64>() / count;
    let avg_impact = findings.iter().map(|f| f64::from(f.impact)).sum::<f64>() / count;
    ScoreBlock {
        health,
        risk: avg_risk.round() as u8,
        impact: avg_impact.round() as u8,
    }
}

/// Maturity grade over the final finding set.
pub fn assess_maturity(findings: &[Finding]) -> MaturityAssessment {
    let mut metrics = MaturityMetrics {
        total_issues: findings.len(),
        ..MaturityMetrics::default()
    };

    let mut categories: Vec<&str> = Vec::new();
    let mut confidence_total = 0u32;
    let mut reasoning_total = 0usize;

    for finding in findings {
        if finding.improved_text.len() >= 20 {
            metrics.usable_issues += 1;
        }
        confidence_total += u32::from(finding.confidence);
        reasoning_total += finding.legal_reasoning.len();
        if !categories.contains(&finding.category.as_str()) {
            categories.push(&finding.category);
        }
        if matches!(
            finding.priority(),
            crate::finding::Priority::Critical | crate::finding::Priority::High
        ) {
            metrics.has_high_priority = true;
        }
        if finding.benchmark.is_some() {
            metrics.has_benchmarks = true;
        }
    }

    metrics.category_coverage = categories.len();
    if !findings.is_empty() {
        metrics.average_confidence = (confidence_total / findings.len() as u32) as u8;
        metrics.average_reasoning_len = reasoning_total / findings.len();
    }

    let mut score = 0u8;
    if metrics.usable_issues == metrics.total_issues {
        score += 25;
    }
    if metrics.average_confidence >= 80 {
        score += 25;
    }
    if metrics.average_reasoning_len >= 100 {
        score += 20;
    }
    if metrics.category_coverage >= 3 {
        score += 15;
    }
    if metrics.has_high_priority {
        score += 10;
    }
    if metrics.has_benchmarks {
        score += 5;
    }

    let grade = match score {
        90..=100 => "A+",
        80..=89 => "A",
        70..=79 => "B",
        60..=69 => "C",
        _ => "D",
    };

    MaturityAssessment {
        grade: grade.to_string(),
        score,
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{Classification, Difficulty, Origin};
    use crate::integrity::{IntegrityLevel, LegalIntegrity};

    fn finding(category: &str, risk: u8) -> Finding {
        Finding {
            id: Finding::new_id(),
            origin: Origin::Rule,
            summary: format!("Befund {}", category),
            original_text: "Zitat aus dem Vertrag".to_string(),
            improved_text: "Eine hinreichend lange Ersatzklausel mit Rechtsgrundlage (§ 1 BGB)."
                .to_string(),
            legal_reasoning: "Eine juristische Begründung, die lang genug ist, um als \
                vollständig zu gelten und die Rechtsgrundlage nennt."
                .to_string(),
            category: category.to_string(),
            risk,
            impact: 6,
            confidence: 90,
            difficulty: Difficulty::Easy,
            benchmark: Some("95% aller Verträge regeln diesen Punkt".to_string()),
            evidence: vec!["Zitat".to_string()],
            classification: Classification::default(),
        }
    }

    fn valid_integrity() -> LegalIntegrity {
        LegalIntegrity {
            level: IntegrityLevel::Valid,
            label: IntegrityLevel::Valid.label().to_string(),
            score_cap: 100,
            red_flags: Vec::new(),
            mandatory_violations: Vec::new(),
            missing_essentialia: Vec::new(),
        }
    }

    #[test]
    fn test_grouping_follows_canonical_order() {
        let findings = vec![
            finding("general", 3),
            finding("payment", 9),
            finding("termination", 7),
            finding("payment", 5),
        ];
        let categories = group_into_categories(findings);

        assert_eq!(categories.len(), 3);
        assert_eq!(categories[0].tag, "payment");
        assert_eq!(categories[1].tag, "termination");
        assert_eq!(categories[2].tag, "general");
        // Higher risk first inside a category.
        assert_eq!(categories[0].issues[0].risk, 9);
        assert_eq!(categories[0].label, "Zahlungskonditionen");
    }

    #[test]
    fn test_summary_counts_match_categories() {
        let findings = vec![finding("payment", 9), finding("termination", 3)];
        let categories = group_into_categories(findings);
        let summary = summarize(&categories, &valid_integrity());

        let total: usize = categories.iter().map(|c| c.issues.len()).sum();
        assert_eq!(summary.total_issues, total);
        assert_eq!(summary.red_flags, 1);
        // risk 3 + easy + confidence 90 is a quick win.
        assert_eq!(summary.quick_wins, 1);
        assert_eq!(summary.critical_legal_risks, 0);
    }

    #[test]
    fn test_maturity_grades_complete_analysis_high() {
        let findings = vec![
            finding("payment", 9),
            finding("termination", 6),
            finding("liability", 8),
        ];
        let maturity = assess_maturity(&findings);
        assert_eq!(maturity.score, 100);
        assert_eq!(maturity.grade, "A+");
    }

    #[test]
    fn test_maturity_of_empty_set_is_low() {
        let maturity = assess_maturity(&[]);
        // Vacuously usable, but no confidence/coverage signals.
        assert!(maturity.score <= 25);
        assert_eq!(maturity.grade, "D");
    }

    #[test]
    fn test_score_block_averages() {
        let findings = vec![finding("payment", 8), finding("termination", 4)];
        let block = score_block(77, &findings);
        assert_eq!(block.health, 77);
        assert_eq!(block.risk, 6);
        assert_eq!(block.impact, 6);
    }
}
