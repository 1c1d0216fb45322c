//! Declared output schema for LLM analysis responses
//!
//! The provider is asked for exactly this shape (meta, assessment,
//! categories with issues, score, summary). Parsing is tolerant about
//! camelCase aliases and missing optional blocks, strict about the parts
//! the pipeline actually consumes.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ParseError;
use crate::finding::{
    Classification, Difficulty, Existence, Finding, Necessity, Origin, Perspective, Sufficiency,
};

/// Complete analysis payload as declared to the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmAnalysisPayload {
    #[serde(default)]
    pub meta: LlmMeta,
    #[serde(default)]
    pub assessment: Option<String>,
    #[serde(default)]
    pub categories: Vec<LlmCategory>,
    #[serde(default)]
    pub score: Option<LlmScore>,
    #[serde(default)]
    pub summary: Option<LlmSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmMeta {
    #[serde(default, rename = "type")]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCategory {
    pub tag: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub issues: Vec<LlmIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmIssue {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, alias = "originalText")]
    pub original_text: Option<String>,
    #[serde(default, alias = "improvedText")]
    pub improved_text: Option<String>,
    #[serde(default, alias = "legalReasoning", alias = "reasoning")]
    pub legal_reasoning: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub risk: Option<i64>,
    #[serde(default)]
    pub impact: Option<i64>,
    #[serde(default)]
    pub confidence: Option<i64>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub classification: Option<LlmClassification>,
    #[serde(default)]
    pub benchmark: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmClassification {
    #[serde(default)]
    pub existence: Option<String>,
    #[serde(default)]
    pub sufficiency: Option<String>,
    #[serde(default)]
    pub necessity: Option<String>,
    #[serde(default)]
    pub perspective: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmScore {
    #[serde(default)]
    pub health: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmSummary {
    #[serde(default, alias = "totalIssues")]
    pub total_issues: Option<u32>,
    #[serde(default, alias = "redFlags")]
    pub red_flags: Option<u32>,
    #[serde(default, alias = "quickWins")]
    pub quick_wins: Option<u32>,
}

impl LlmIssue {
    /// Render this issue as a pipeline finding.
    ///
    /// The raw category is kept as-is (falling back to the parent category's
    /// tag); normalization and repair happen in the quality gate.
    pub fn into_finding(self, origin: Origin, parent_tag: &str) -> Finding {
        let classification = self
            .classification
            .as_ref()
            .map(LlmClassification::resolve)
            .unwrap_or_default();

        Finding {
            id: Finding::new_id(),
            origin,
            summary: self.summary.unwrap_or_default(),
            original_text: self.original_text.unwrap_or_default(),
            improved_text: self.improved_text.unwrap_or_default(),
            legal_reasoning: self.legal_reasoning.unwrap_or_default(),
            category: self
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| parent_tag.to_string()),
            risk: clamp_i64(self.risk, 5, 0, 10),
            impact: clamp_i64(self.impact, 5, 0, 10),
            confidence: clamp_i64(self.confidence, 75, 0, 100),
            difficulty: self
                .difficulty
                .as_deref()
                .map(Difficulty::from_label)
                .unwrap_or(Difficulty::Medium),
            benchmark: self.benchmark,
            evidence: self.evidence,
            classification,
        }
    }
}

impl LlmClassification {
    fn resolve(&self) -> Classification {
        Classification {
            existence: match self.existence.as_deref().map(str::to_lowercase).as_deref() {
                Some("missing") => Existence::Missing,
                Some("partial") => Existence::Partial,
                _ => Existence::Present,
            },
            sufficiency: match self.sufficiency.as_deref().map(str::to_lowercase).as_deref() {
                Some("sufficient") => Sufficiency::Sufficient,
                Some("outdated") => Sufficiency::Outdated,
                _ => Sufficiency::Weak,
            },
            necessity: match self.necessity.as_deref().map(str::to_lowercase).as_deref() {
                Some("mandatory") => Necessity::Mandatory,
                Some("best_practice") | Some("best practice") => Necessity::BestPractice,
                _ => Necessity::RiskBased,
            },
            perspective: match self.perspective.as_deref().map(str::to_lowercase).as_deref() {
                Some("party_a") | Some("partya") => Perspective::PartyA,
                Some("party_b") | Some("partyb") => Perspective::PartyB,
                _ => Perspective::Neutral,
            },
        }
    }
}

fn clamp_i64(value: Option<i64>, default: i64, min: i64, max: i64) -> u8 {
    value.unwrap_or(default).clamp(min, max) as u8
}

/// Extract and validate the analysis payload from a raw provider response.
///
/// Providers occasionally wrap the JSON in prose or code fences; the first
/// top-level object is extracted before parsing. An empty category list is
/// treated as a schema violation so the narrow retry fires.
pub fn parse_payload(raw: &str) -> Result<LlmAnalysisPayload, ParseError> {
    let start = raw.find('{').ok_or_else(|| ParseError::NotJson("no object start".into()))?;
    let end = raw.rfind('}').ok_or_else(|| ParseError::NotJson("no object end".into()))?;
    if end < start {
        return Err(ParseError::NotJson("braces out of order".into()));
    }

    let payload: LlmAnalysisPayload = serde_json::from_str(&raw[start..=end])
        .map_err(|e| ParseError::NotJson(e.to_string()))?;

    if payload.categories.is_empty() {
        return Err(ParseError::EmptyCategories);
    }
    if payload
        .categories
        .iter()
        .all(|c| c.tag.trim().is_empty())
    {
        return Err(ParseError::MissingField("categories.tag"));
    }

    Ok(payload)
}

/// The JSON schema declared to the provider, restricted to the requested
/// category tags.
pub fn declared_schema(category_tags: &[&str]) -> serde_json::Value {
    json!({
        "type": "object",
        "required": ["meta", "categories"],
        "properties": {
            "meta": {
                "type": "object",
                "properties": {
                    "type": { "type": "string" },
                    "jurisdiction": { "type": "string" },
                    "language": { "type": "string" },
                    "confidence": { "type": "number" }
                }
            },
            "assessment": { "type": "string" },
            "categories": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["tag", "issues"],
                    "properties": {
                        "tag": { "type": "string", "enum": category_tags },
                        "label": { "type": "string" },
                        "issues": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": [
                                    "summary",
                                    "original_text",
                                    "improved_text",
                                    "legal_reasoning",
                                    "evidence"
                                ],
                                "properties": {
                                    "summary": { "type": "string" },
                                    "original_text": { "type": "string" },
                                    "improved_text": { "type": "string" },
                                    "legal_reasoning": { "type": "string" },
                                    "category": { "type": "string" },
                                    "risk": { "type": "integer", "minimum": 1, "maximum": 10 },
                                    "impact": { "type": "integer", "minimum": 1, "maximum": 10 },
                                    "confidence": { "type": "integer", "minimum": 0, "maximum": 100 },
                                    "difficulty": { "type": "string", "enum": ["easy", "medium", "complex"] },
                                    "evidence": {
                                        "type": "array",
                                        "items": { "type": "string" },
                                        "minItems": 1
                                    },
                                    "classification": {
                                        "type": "object",
                                        "properties": {
                                            "existence": { "type": "string", "enum": ["missing", "present", "partial"] },
                                            "sufficiency": { "type": "string", "enum": ["sufficient", "weak", "outdated"] },
                                            "necessity": { "type": "string", "enum": ["mandatory", "risk_based", "best_practice"] },
                                            "perspective": { "type": "string", "enum": ["party_a", "party_b", "neutral"] }
                                        }
                                    },
                                    "benchmark": { "type": "string" }
                                }
                            }
                        }
                    }
                }
            },
            "score": {
                "type": "object",
                "properties": { "health": { "type": "number" } }
            },
            "summary": {
                "type": "object",
                "properties": {
                    "total_issues": { "type": "integer" },
                    "red_flags": { "type": "integer" },
                    "quick_wins": { "type": "integer" }
                }
            }
        }
    })
}
