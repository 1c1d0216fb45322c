//! Finding model - the central entity of the pipeline
//!
//! A `Finding` is one reported improvement opportunity, regardless of which
//! analyzer produced it. Provenance is preserved in [`Origin`] and drives
//! both the evidence gate and score weighting.

use serde::{Deserialize, Serialize};

/// Marker used in `original_text` when the clause does not exist in the document.
pub const MISSING_CLAUSE_MARKER: &str = "FEHLT - Klausel nicht vorhanden";

/// Provenance of a finding
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Deterministic rule engine
    Rule,
    /// Primary or secondary LLM pass
    Ai,
    /// Supplementary coverage pass
    Topup,
}

/// Gap severity assigned per clause per contract type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Default risk value a gap of this severity contributes as a finding.
    pub fn risk(&self) -> u8 {
        match self {
            Severity::Critical => 9,
            Severity::High => 8,
            Severity::Medium => 6,
            Severity::Low => 4,
        }
    }
}

/// Kind of rule-detected gap
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    /// No positive evidence of the clause anywhere in the text
    MissingClause,
    /// Clause present but adequacy patterns did not match
    WeakClause,
}

/// Implementation difficulty of a proposed change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Complex,
}

impl Difficulty {
    /// Normalize localized/synonym spellings; anything unknown is Medium.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "easy" | "einfach" | "simple" | "low" => Difficulty::Easy,
            "complex" | "komplex" | "hard" | "difficult" | "high" => Difficulty::Complex,
            _ => Difficulty::Medium,
        }
    }
}

/// Whether the clause exists in the document at all
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Existence {
    Missing,
    Present,
    Partial,
}

/// Whether the clause as written does its legal job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sufficiency {
    Sufficient,
    Weak,
    Outdated,
}

/// Why the change matters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Necessity {
    Mandatory,
    RiskBased,
    BestPractice,
}

/// Which party the change favors
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    PartyA,
    PartyB,
    Neutral,
}

/// Four-axis classification of a finding
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classification {
    pub existence: Existence,
    pub sufficiency: Sufficiency,
    pub necessity: Necessity,
    pub perspective: Perspective,
}

impl Classification {
    /// Classification for a clause the rule engine found missing.
    pub fn missing(necessity: Necessity) -> Self {
        Self {
            existence: Existence::Missing,
            sufficiency: Sufficiency::Weak,
            necessity,
            perspective: Perspective::Neutral,
        }
    }

    /// Classification for a clause that exists but is inadequate.
    pub fn weak(necessity: Necessity) -> Self {
        Self {
            existence: Existence::Partial,
            sufficiency: Sufficiency::Weak,
            necessity,
            perspective: Perspective::Neutral,
        }
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            existence: Existence::Present,
            sufficiency: Sufficiency::Weak,
            necessity: Necessity::RiskBased,
            perspective: Perspective::Neutral,
        }
    }
}

/// Derived ordering bucket, not persisted on the finding itself
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

/// One reported improvement opportunity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Stable id, `f_<uuid>`
    pub id: String,
    /// Provenance, used for weighting and the evidence gate
    pub origin: Origin,
    /// One-sentence description of the problem
    pub summary: String,
    /// Verbatim quote from the document, or [`MISSING_CLAUSE_MARKER`]
    pub original_text: String,
    /// Full replacement clause, usable verbatim
    pub improved_text: String,
    /// Legal rationale with statutory basis
    pub legal_reasoning: String,
    /// Normalized taxonomy tag - never left unresolved
    pub category: String,
    /// Risk if left unchanged (1-10)
    pub risk: u8,
    /// Impact of the improvement (1-10)
    pub impact: u8,
    /// Analyzer confidence (0-100)
    pub confidence: u8,
    pub difficulty: Difficulty,
    /// Optional market-practice sentence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<String>,
    /// Verbatim quotes backing the finding; mandatory for ai/topup origin
    pub evidence: Vec<String>,
    pub classification: Classification,
}

impl Finding {
    /// Generate a fresh finding id.
    pub fn new_id() -> String {
        format!("f_{}", uuid::Uuid::new_v4())
    }

    /// Priority bucket from risk, impact, and confidence.
    pub fn priority(&self) -> Priority {
        let score = f64::from(self.risk) * 0.4
            + f64::from(self.impact) * 0.4
            + f64::from(100 - self.confidence.min(100)) * 0.002;

        if score >= 8.0 || self.risk >= 9 {
            Priority::Critical
        } else if score >= 6.0 || self.risk >= 7 {
            Priority::High
        } else if score >= 4.0 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    /// Red flags are high-risk or critical-priority findings.
    pub fn is_red_flag(&self) -> bool {
        self.risk >= 8 || self.priority() == Priority::Critical
    }

    /// Quick wins are easy, confident, low-risk changes.
    pub fn is_quick_win(&self) -> bool {
        self.difficulty == Difficulty::Easy && self.confidence >= 80 && self.risk <= 4
    }

    /// Whether the clause was reported as absent from the document.
    pub fn is_missing_clause(&self) -> bool {
        self.original_text == MISSING_CLAUSE_MARKER
    }
}

/// A rule-detected absence or weakness of a required clause
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gap {
    /// Clause identifier from the checklist table
    pub clause_id: String,
    /// Normalized category tag of the clause
    pub category: String,
    pub severity: Severity,
    pub kind: GapKind,
    /// Human legal rationale for why the clause matters
    pub rationale: String,
    /// Short title of the problem
    pub title: String,
    /// Excerpt that matched the presence patterns, for weak clauses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_excerpt: Option<String>,
    pub necessity: Necessity,
    /// Market-practice sentence from the checklist table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<String>,
}

/// Findings grouped under one normalized taxonomy tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub tag: String,
    pub label: String,
    pub issues: Vec<Finding>,
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn test_finding(origin: Origin, risk: u8, confidence: u8) -> Finding {
        Finding {
            id: Finding::new_id(),
            origin,
            summary: "Haftung unbegrenzt".to_string(),
            original_text: "Der Auftragnehmer haftet unbeschränkt.".to_string(),
            improved_text: "Die Haftung wird auf den vertragstypischen Schaden begrenzt."
                .to_string(),
            legal_reasoning: "Ohne Begrenzung droht unbegrenzter Schadensersatz.".to_string(),
            category: "liability".to_string(),
            risk,
            impact: 7,
            confidence,
            difficulty: Difficulty::Medium,
            benchmark: None,
            evidence: vec!["haftet unbeschränkt".to_string()],
            classification: Classification::default(),
        }
    }

    #[test]
    fn test_priority_buckets() {
        let mut f = test_finding(Origin::Ai, 9, 80);
        assert_eq!(f.priority(), Priority::Critical);

        f.risk = 7;
        assert_eq!(f.priority(), Priority::High);

        f.risk = 4;
        f.impact = 5;
        assert_eq!(f.priority(), Priority::Medium);

        f.risk = 2;
        f.impact = 2;
        assert_eq!(f.priority(), Priority::Low);
    }

    #[test]
    fn test_red_flag_threshold() {
        assert!(test_finding(Origin::Ai, 8, 75).is_red_flag());
        assert!(!test_finding(Origin::Ai, 6, 75).is_red_flag());
    }

    #[test]
    fn test_quick_win() {
        let mut f = test_finding(Origin::Rule, 3, 90);
        f.impact = 4;
        f.difficulty = Difficulty::Easy;
        assert!(f.is_quick_win());

        f.difficulty = Difficulty::Complex;
        assert!(!f.is_quick_win());
    }

    #[test]
    fn test_difficulty_normalization() {
        assert_eq!(Difficulty::from_label("Einfach"), Difficulty::Easy);
        assert_eq!(Difficulty::from_label("komplex"), Difficulty::Complex);
        assert_eq!(Difficulty::from_label("whatever"), Difficulty::Medium);
    }

    #[test]
    fn test_origin_wire_names() {
        assert_eq!(serde_json::to_string(&Origin::Topup).unwrap(), "\"topup\"");
        assert_eq!(serde_json::to_string(&Origin::Rule).unwrap(), "\"rule\"");
    }
}
