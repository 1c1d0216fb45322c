//! Health-score computation
//!
//! A pure fold over the final, immutable finding list. Each finding
//! contributes a weighted issue count; the score decreases monotonically
//! with that count through a piecewise function and is clamped before the
//! integrity cap is applied on top.

use crate::config::ScoreConfig;
use crate::finding::{Finding, Origin};

/// Provenance weight: top-up findings are lower-confidence by construction.
pub fn base_weight(origin: Origin) -> f64 {
    match origin {
        Origin::Rule => 1.0,
        Origin::Ai => 1.0,
        Origin::Topup => 0.5,
    }
}

/// High-risk model findings weigh extra.
pub fn risk_multiplier(finding: &Finding) -> f64 {
    if finding.origin == Origin::Ai && finding.risk >= 8 {
        1.3
    } else {
        1.0
    }
}

/// Weighted issue count over the whole finding set.
pub fn weighted_issue_count(findings: &[Finding]) -> f64 {
    findings
        .iter()
        .map(|f| base_weight(f.origin) * risk_multiplier(f))
        .sum()
}

/// Penalty a single finding contributes to the base score, by severity band.
fn severity_penalty(risk: u8) -> f64 {
    match risk {
        9..=10 => 7.0,
        7..=8 => 5.0,
        5..=6 => 3.0,
        _ => 1.0,
    }
}

/// Pure health-score calculator.
#[derive(Debug, Default)]
pub struct HealthScoreCalculator;

impl HealthScoreCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Compute the 0-100 health score for the final finding set.
    ///
    /// Zero findings hit the ceiling. Up to the minor-issue threshold only a
    /// small linear penalty applies; beyond it a base score driven by the
    /// severity distribution takes over, further reduced by high-risk model
    /// findings. Clamped to the configured bounds before integrity capping.
    pub fn score(&self, findings: &[Finding], config: &ScoreConfig) -> u8 {
        if findings.is_empty() {
            return config.ceiling;
        }

        let weighted = weighted_issue_count(findings);
        let high_risk_ai = findings
            .iter()
            .filter(|f| f.origin == Origin::Ai && f.risk >= 8)
            .count() as f64;

        let raw = if weighted <= config.minor_issue_threshold {
            f64::from(config.ceiling) - weighted * 4.0
        } else {
            let severity_total: f64 = findings
                .iter()
                .map(|f| severity_penalty(f.risk) * base_weight(f.origin))
                .sum();
            85.0 - severity_total - 2.0 * high_risk_ai
        };

        raw.clamp(f64::from(config.floor), f64::from(config.ceiling))
            .round() as u8
    }
}
