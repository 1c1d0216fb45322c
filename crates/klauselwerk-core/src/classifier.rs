//! Contract-type classification and amendment detection
//!
//! Keyword/phrase scoring against the declarative type taxonomy. A secondary
//! pattern set detects amendment documents ("Nachtrag zu Vertrag vom ...")
//! and records the matched indicator phrase, which later drives the
//! amendment scope gate.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::gap;
use crate::taxonomy::{profile, ContractKind, TypeProfile, TYPE_PROFILES};

/// Score a profile must reach before its kind is trusted.
const TYPE_SCORE_FLOOR: u32 = 4;

/// Confidence reported when nothing scores above the floor.
const FALLBACK_CONFIDENCE: u8 = 20;

/// Classification result for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractTypeInfo {
    pub kind: ContractKind,
    /// Derived confidence (0-100)
    pub confidence: u8,
    pub is_amendment: bool,
    /// Inferred type of the parent contract, for amendments
    pub parent_kind: Option<ContractKind>,
    /// Category tags for which clause evidence exists in the document
    pub detected_clauses: Vec<String>,
    /// Applicable statutory framework references
    pub frameworks: Vec<String>,
    /// Evidence for the amendment decision, if any
    pub amendment_indicator: Option<AmendmentIndicator>,
}

impl ContractTypeInfo {
    /// Topic tags unlocked by the amendment indicator (empty for full contracts).
    pub fn changed_topics(&self) -> &[String] {
        self.amendment_indicator
            .as_ref()
            .map(|i| i.changed_topics.as_slice())
            .unwrap_or(&[])
    }
}

/// The matched amendment indicator phrase plus the topics it unlocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendmentIndicator {
    /// Verbatim phrase that triggered amendment detection
    pub phrase: String,
    /// Category tags the amendment genuinely governs
    pub changed_topics: Vec<String>,
}

lazy_static! {
    static ref AMENDMENT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)nachtrag\s+(?:nr\.?\s*\d+\s+)?zu[mr]?\s+[^\n.]{0,80}vertrag(?:\s+vom\s+\d{1,2}\.\d{1,2}\.\d{2,4})?").unwrap(),
        Regex::new(r"(?i)änderungsvereinbarung\s+zu[mr]?\s+[^\n.]{0,80}").unwrap(),
        Regex::new(r"(?i)ergänzungsvereinbarung\s+zu[mr]?\s+[^\n.]{0,80}").unwrap(),
        Regex::new(r"(?i)zusatzvereinbarung\s+zu[mr]?\s+[^\n.]{0,80}").unwrap(),
        Regex::new(r"(?i)this\s+amendment\s+(?:no\.?\s*\d+\s+)?to\s+the\s+[^\n.]{0,80}agreement").unwrap(),
        Regex::new(r"(?i)amendment\s+to\s+the\s+[^\n.]{0,80}agreement").unwrap(),
    ];
}

/// Indicator-phrase patterns mapped to the topic tags they unlock.
static CHANGED_TOPIC_RULES: &[(&str, &[&str])] = &[
    (
        r"(?i)gehaltserhöhung|gehaltsanpassung|erhöhung\s+(?:des\s+gehalts|der\s+vergütung)|salary\s+increase|vergütungsanpassung",
        &["compensation"],
    ),
    (
        r"(?i)arbeitszeit(?:erhöhung|änderung|anpassung)?|wochenstunden|stundenerhöhung|working[-\s]hours",
        &["working_hours"],
    ),
    (
        r"(?i)homeoffice|mobile[sm]?\s+arbeiten|remote\s+work",
        &["working_hours"],
    ),
    (
        r"(?i)verlängerung\s+der\s+laufzeit|laufzeitverlängerung|vertragsverlängerung|extension\s+of\s+the\s+term",
        &["term"],
    ),
    (
        r"(?i)urlaubsanspruch|urlaubstage|zusätzliche[rn]?\s+urlaub",
        &["vacation"],
    ),
    (
        r"(?i)mieterhöhung|mietanpassung|anpassung\s+der\s+miete",
        &["payment"],
    ),
    (
        r"(?i)änderung\s+der\s+kündigungsfrist|anpassung\s+der\s+kündigungsfrist",
        &["termination"],
    ),
];

lazy_static! {
    static ref CHANGED_TOPIC_REGEXES: Vec<(Regex, &'static [&'static str])> = CHANGED_TOPIC_RULES
        .iter()
        .map(|(pattern, topics)| (Regex::new(pattern).unwrap(), *topics))
        .collect();
}

/// Keyword/phrase classifier over the declarative type taxonomy.
#[derive(Debug, Default)]
pub struct TypeClassifier;

impl TypeClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a document into the type taxonomy and detect amendments.
    ///
    /// Never fails: when no type scores above the floor, the generic
    /// fallback kind is returned with low confidence and the pipeline
    /// proceeds.
    pub fn classify(&self, text: &str, filename: &str) -> ContractTypeInfo {
        let lower_text = text.to_lowercase();
        let lower_filename = filename.to_lowercase();

        let mut best: Option<(&TypeProfile, u32)> = None;
        for candidate in TYPE_PROFILES {
            let score = Self::score_profile(candidate, &lower_text, &lower_filename);
            if best.map(|(_, s)| score > s).unwrap_or(score > 0) {
                best = Some((candidate, score));
            }
        }

        let (kind, confidence) = match best {
            Some((p, score)) if score >= TYPE_SCORE_FLOOR => {
                (p.kind, (35 + score.saturating_mul(4)).min(95) as u8)
            }
            _ => (ContractKind::Other, FALLBACK_CONFIDENCE),
        };

        let amendment_indicator = Self::detect_amendment(text, &lower_text);
        let parent_kind = if amendment_indicator.is_some() {
            Self::infer_parent_kind(&lower_text, kind)
        } else {
            None
        };

        let detected_clauses = gap::detect_clauses(text, kind);
        let frameworks = profile(kind)
            .map(|p| p.frameworks.iter().map(|f| f.to_string()).collect())
            .unwrap_or_default();

        tracing::debug!(
            kind = kind.tag(),
            confidence,
            is_amendment = amendment_indicator.is_some(),
            clauses = detected_clauses.len(),
            "contract classified"
        );

        ContractTypeInfo {
            kind,
            confidence,
            is_amendment: amendment_indicator.is_some(),
            parent_kind,
            detected_clauses,
            frameworks,
            amendment_indicator,
        }
    }

    /// Score one profile: in-body keyword frequency, filename matches,
    /// exact phrase bonus.
    fn score_profile(profile: &TypeProfile, lower_text: &str, lower_filename: &str) -> u32 {
        let mut score = 0u32;

        for keyword in profile.keywords {
            let hits = lower_text.matches(keyword).count() as u32;
            if hits > 0 {
                score += 2 + hits.min(5);
            }
            if lower_filename.contains(keyword) {
                score += 3;
            }
        }

        for phrase in profile.phrases {
            if lower_text.contains(phrase) {
                score += 5;
            }
        }

        score
    }

    fn detect_amendment(text: &str, lower_text: &str) -> Option<AmendmentIndicator> {
        for pattern in AMENDMENT_PATTERNS.iter() {
            if let Some(m) = pattern.find(text) {
                let phrase = m.as_str().trim().to_string();
                let mut changed_topics = Vec::new();
                for (regex, topics) in CHANGED_TOPIC_REGEXES.iter() {
                    if regex.is_match(lower_text) {
                        for topic in *topics {
                            if !changed_topics.iter().any(|t: &String| t == topic) {
                                changed_topics.push((*topic).to_string());
                            }
                        }
                    }
                }
                return Some(AmendmentIndicator {
                    phrase,
                    changed_topics,
                });
            }
        }
        None
    }

    /// For amendments, the parent type usually dominates the scoring anyway;
    /// keep the classified kind when it is specific, otherwise give up.
    fn infer_parent_kind(lower_text: &str, classified: ContractKind) -> Option<ContractKind> {
        if classified != ContractKind::Other {
            return Some(classified);
        }
        TYPE_PROFILES
            .iter()
            .map(|p| (p.kind, Self::score_profile(p, lower_text, "")))
            .filter(|(_, score)| *score >= 2)
            .max_by_key(|(_, score)| *score)
            .map(|(kind, _)| kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPLOYMENT_TEXT: &str = "Arbeitsvertrag\n\nzwischen der Muster GmbH (Arbeitgeber) \
        und Frau Anna Beispiel (Arbeitnehmer).\n\n§ 1 Tätigkeit\nDie Arbeitnehmerin wird als \
        Entwicklerin eingestellt.\n§ 2 Arbeitszeit\nDie regelmäßige Arbeitszeit beträgt 40 Stunden.\n\
        § 3 Vergütung\nDas Gehalt beträgt 4.500 Euro brutto monatlich.\n§ 4 Urlaub\nEs besteht ein \
        Urlaubsanspruch von 28 Tagen.";

    #[test]
    fn test_classifies_employment_contract() {
        let info = TypeClassifier::new().classify(EMPLOYMENT_TEXT, "arbeitsvertrag_beispiel.pdf");
        assert_eq!(info.kind, ContractKind::Employment);
        assert!(info.confidence >= 60);
        assert!(!info.is_amendment);
        assert!(info.frameworks.iter().any(|f| f.contains("BUrlG")));
    }

    #[test]
    fn test_unknown_text_falls_back_to_other() {
        let info = TypeClassifier::new().classify("Lorem ipsum dolor sit amet.", "scan.pdf");
        assert_eq!(info.kind, ContractKind::Other);
        assert_eq!(info.confidence, FALLBACK_CONFIDENCE);
        // Pipeline must still proceed on unknown types.
        assert!(!info.is_amendment);
    }

    #[test]
    fn test_detects_german_amendment_with_salary_topic() {
        let text = "Nachtrag zum Arbeitsvertrag vom 01.03.2022\n\nDie Parteien vereinbaren eine \
            Gehaltserhöhung auf 5.200 Euro brutto monatlich mit Wirkung zum 01.07.2025.";
        let info = TypeClassifier::new().classify(text, "nachtrag.pdf");
        assert!(info.is_amendment);
        let indicator = info.amendment_indicator.as_ref().unwrap();
        assert!(indicator.phrase.to_lowercase().starts_with("nachtrag"));
        assert!(indicator.changed_topics.contains(&"compensation".to_string()));
        assert_eq!(info.parent_kind, Some(ContractKind::Employment));
    }

    #[test]
    fn test_detects_english_amendment() {
        let text = "This Amendment to the Service Agreement dated 2023-01-01 increases the \
            agreed working hours from 30 to 38 per week.";
        let info = TypeClassifier::new().classify(text, "amendment.pdf");
        assert!(info.is_amendment);
        assert!(info
            .changed_topics()
            .contains(&"working_hours".to_string()));
    }

    #[test]
    fn test_filename_contributes_to_score() {
        let thin_text = "zwischen den Parteien wird folgender Mietvertrag geschlossen";
        let with_name = TypeClassifier::new().classify(thin_text, "mietvertrag_wohnung.pdf");
        assert_eq!(with_name.kind, ContractKind::Lease);
    }
}
