//! Property-based tests for the health-score calculator

use klauselwerk_core::finding::{Classification, Difficulty, Finding, Origin};
use klauselwerk_core::score::HealthScoreCalculator;
use klauselwerk_core::ScoreConfig;
use proptest::prelude::*;

fn finding_strategy() -> impl Strategy<Value = Finding> {
    (0u8..3, 0u8..=10, 0u8..=10, 0u8..=100).prop_map(|(origin, risk, impact, confidence)| {
        Finding {
            id: Finding::new_id(),
            origin: match origin {
                0 => Origin::Rule,
                1 => Origin::Ai,
                _ => Origin::Topup,
            },
            summary: "Befund".to_string(),
            original_text: "Zitat".to_string(),
            improved_text: "Ersatzklausel".to_string(),
            legal_reasoning: "Begründung".to_string(),
            category: "general".to_string(),
            risk,
            impact,
            confidence,
            difficulty: Difficulty::Medium,
            benchmark: None,
            evidence: vec!["Zitat".to_string()],
            classification: Classification::default(),
        }
    })
}

proptest! {
    #[test]
    fn score_stays_within_bounds(findings in prop::collection::vec(finding_strategy(), 0..40)) {
        let config = ScoreConfig::default();
        let score = HealthScoreCalculator::new().score(&findings, &config);

        if findings.is_empty() {
            prop_assert_eq!(score, config.ceiling);
        } else {
            prop_assert!(score >= config.floor);
            prop_assert!(score <= config.ceiling);
        }
    }

    #[test]
    fn score_is_deterministic(findings in prop::collection::vec(finding_strategy(), 0..40)) {
        let config = ScoreConfig::default();
        let calc = HealthScoreCalculator::new();
        let first = calc.score(&findings, &config);
        prop_assert_eq!(calc.score(&findings, &config), first);
        prop_assert_eq!(calc.score(&findings, &config), first);
    }

    #[test]
    fn adding_findings_never_raises_the_score(
        findings in prop::collection::vec(finding_strategy(), 1..25)
    ) {
        let config = ScoreConfig::default();
        let calc = HealthScoreCalculator::new();

        let mut last = calc.score(&[], &config);
        for upto in 1..=findings.len() {
            let next = calc.score(&findings[..upto], &config);
            prop_assert!(
                next <= last,
                "score rose from {} to {} at prefix {}",
                last,
                next,
                upto
            );
            last = next;
        }
    }
}
