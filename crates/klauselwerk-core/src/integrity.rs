//! Legal integrity audit
//!
//! Deterministic checks over the original document text, independent of both
//! the rule engine and the model's self-assessment: a red-flag pattern scan
//! for unconscionable or void clauses, a mandatory-law violation scan
//! cross-referencing findings against non-waivable topics, and a structural
//! completeness check for the essentialia negotii. The outcome is an
//! escalation level with a score cap; it influences the report but never
//! halts the pipeline.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::classifier::ContractTypeInfo;
use crate::finding::{Existence, Finding};
use crate::taxonomy::profile;

/// Escalation level, independent of the numeric score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityLevel {
    Valid,
    ReviewRecommended,
    LawyerRequired,
    NotUsable,
}

impl IntegrityLevel {
    /// Human label for the report.
    pub fn label(&self) -> &'static str {
        match self {
            IntegrityLevel::Valid => "Rechtlich unbedenklich",
            IntegrityLevel::ReviewRecommended => "Überprüfung empfohlen",
            IntegrityLevel::LawyerRequired => "Anwaltliche Prüfung erforderlich",
            IntegrityLevel::NotUsable => "In dieser Form nicht verwendbar",
        }
    }
}

/// One matched red-flag pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedFlag {
    pub id: String,
    pub label: String,
    /// Verbatim excerpt around the match
    pub excerpt: String,
}

/// One violated non-waivable topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MandatoryViolation {
    pub topic: String,
    pub citation: String,
    pub detail: String,
}

/// Complete integrity verdict attached to the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalIntegrity {
    pub level: IntegrityLevel,
    pub label: String,
    pub score_cap: u8,
    pub red_flags: Vec<RedFlag>,
    pub mandatory_violations: Vec<MandatoryViolation>,
    pub missing_essentialia: Vec<String>,
}

impl LegalIntegrity {
    /// Apply the cap: final health = min(computed, cap).
    pub fn cap_score(&self, score: u8) -> u8 {
        score.min(self.score_cap)
    }
}

/// Red-flag patterns for clauses strongly indicative of unconscionability
/// or voidness under German law.
static RED_FLAG_PATTERNS: &[(&str, &str, &str)] = &[
    (
        "unlimited_liability",
        "Unbeschränkte Haftung der schwächeren Partei",
        r"(?i)haftet\s+unbeschränkt|unbeschränkte?\s+haftung|haftet\s+.{0,40}ohne\s+begrenzung|unlimited\s+liability",
    ),
    (
        "termination_without_notice",
        "Kündigung ohne Frist und Grund",
        r"(?i)jederzeit\s+(?:und\s+)?(?:fristlos|ohne\s+(?:einhaltung\s+einer\s+)?frist)|fristlos\s+ohne\s+(?:angabe\s+von\s+)?gr(?:ü|u)nde?n?|termination\s+without\s+(?:notice|cause)",
    ),
    (
        "uncompensated_non_compete",
        "Wettbewerbsverbot ohne Karenzentschädigung",
        r"(?i)wettbewerbsverbot[^.]{0,160}ohne\s+(?:karenz)?entschädigung|zeitlich\s+unbegrenztes?\s+wettbewerbsverbot|non-?compete[^.]{0,160}without\s+(?:any\s+)?compensation",
    ),
    (
        "blanket_rights_waiver",
        "Pauschaler Verzicht auf gesetzliche Rechte",
        r"(?i)verzichtet\s+(?:unwiderruflich\s+)?auf\s+(?:alle|sämtliche|jegliche)\s+(?:gesetzlichen\s+)?(?:ansprüche|rechte)",
    ),
    (
        "unlimited_penalty",
        "Vertragsstrafe in unbegrenzter Höhe",
        r"(?i)vertragsstrafe[^.]{0,100}(?:unbegrenzt|in\s+unbegrenzter\s+höhe)",
    ),
];

/// Non-waivable legal topics, jurisdiction DE.
///
/// Reviewed legal taxonomy with statutory citations. Extension to other
/// jurisdictions requires legal sign-off, not a code change alone.
static MANDATORY_TOPICS: &[(&str, &str, &str)] = &[
    (
        "vacation",
        "§ 3 BUrlG",
        "Der gesetzliche Mindesturlaub von 24 Werktagen ist unabdingbar",
    ),
    (
        "termination",
        "§ 622 BGB",
        "Die gesetzlichen Mindestkündigungsfristen dürfen einzelvertraglich nicht unterschritten werden",
    ),
    (
        "sick_pay",
        "§ 3 EntgFG",
        "Die Entgeltfortzahlung im Krankheitsfall für sechs Wochen ist nicht abdingbar",
    ),
];

/// Essential contractual elements checked when the type requires them.
static ESSENTIALIA: &[(&str, &str)] = &[
    (
        "Gegenleistung (Vergütung)",
        r"(?i)vergütung|preis|miete|entgelt|gehalt|honorar|zins|gebühr|werklohn",
    ),
    (
        "Vertragsgegenstand",
        r"(?i)vertragsgegenstand|leistungsbeschreibung|gegenstand\s+des\s+vertrag|kaufsache|mietsache|tätigkeit|leistungen|lizenzgegenstand|darlehensbetrag",
    ),
    (
        "Laufzeit/Beginn",
        r"(?i)laufzeit|beginn|dauer|befristet|unbefristet|gilt\s+ab|tritt\s+.{0,20}in\s+kraft",
    ),
];

lazy_static! {
    static ref RED_FLAG_REGEXES: Vec<(&'static str, &'static str, Regex)> = RED_FLAG_PATTERNS
        .iter()
        .map(|(id, label, pattern)| (*id, *label, Regex::new(pattern).unwrap()))
        .collect();
    static ref ESSENTIALIA_REGEXES: Vec<(&'static str, Regex)> = ESSENTIALIA
        .iter()
        .map(|(label, pattern)| (*label, Regex::new(pattern).unwrap()))
        .collect();
}

/// Pattern-based integrity auditor.
#[derive(Debug, Default)]
pub struct LegalIntegrityAuditor;

impl LegalIntegrityAuditor {
    pub fn new() -> Self {
        Self
    }

    /// Audit the original document text and the final finding set.
    pub fn audit(
        &self,
        text: &str,
        findings: &[Finding],
        type_info: &ContractTypeInfo,
    ) -> LegalIntegrity {
        let red_flags = self.scan_red_flags(text);
        let mandatory_violations = self.scan_mandatory_violations(findings, type_info);
        let missing_essentialia = self.check_essentialia(text, type_info);

        let (level, score_cap) =
            Self::escalate(&red_flags, &mandatory_violations, &missing_essentialia);

        tracing::info!(
            level = ?level,
            red_flags = red_flags.len(),
            mandatory = mandatory_violations.len(),
            missing_essentialia = missing_essentialia.len(),
            "legal integrity audit complete"
        );

        LegalIntegrity {
            level,
            label: level.label().to_string(),
            score_cap,
            red_flags,
            mandatory_violations,
            missing_essentialia,
        }
    }

    fn scan_red_flags(&self, text: &str) -> Vec<RedFlag> {
        RED_FLAG_REGEXES
            .iter()
            .filter_map(|(id, label, regex)| {
                regex.find(text).map(|m| RedFlag {
                    id: id.to_string(),
                    label: label.to_string(),
                    excerpt: excerpt(text, m.start(), m.end()),
                })
            })
            .collect()
    }

    /// Cross-reference findings against the non-waivable topic table: a
    /// finding on a mandatory topic whose clause is absent or high-risk
    /// counts as a violation. The table covers employment law; other
    /// contract kinds are not measured against it.
    fn scan_mandatory_violations(
        &self,
        findings: &[Finding],
        type_info: &ContractTypeInfo,
    ) -> Vec<MandatoryViolation> {
        if type_info.kind != crate::taxonomy::ContractKind::Employment {
            return Vec::new();
        }
        MANDATORY_TOPICS
            .iter()
            .filter_map(|(topic, citation, detail)| {
                let violated = findings.iter().any(|f| {
                    f.category == *topic
                        && (f.classification.existence == Existence::Missing || f.risk >= 7)
                });
                violated.then(|| MandatoryViolation {
                    topic: topic.to_string(),
                    citation: citation.to_string(),
                    detail: detail.to_string(),
                })
            })
            .collect()
    }

    fn check_essentialia(&self, text: &str, type_info: &ContractTypeInfo) -> Vec<String> {
        let required = profile(type_info.kind)
            .map(|p| p.requires_essentialia)
            .unwrap_or(false);
        if !required || type_info.is_amendment {
            return Vec::new();
        }

        ESSENTIALIA_REGEXES
            .iter()
            .filter(|(_, regex)| !regex.is_match(text))
            .map(|(label, _)| label.to_string())
            .collect()
    }

    /// Pure escalation from the three violation counts to level and cap.
    fn escalate(
        red_flags: &[RedFlag],
        mandatory: &[MandatoryViolation],
        missing_essentialia: &[String],
    ) -> (IntegrityLevel, u8) {
        let reds = red_flags.len();
        let mandatories = mandatory.len();
        let essentials = missing_essentialia.len();

        if reds >= 3 || (reds >= 1 && mandatories >= 2) {
            (IntegrityLevel::NotUsable, 15)
        } else if reds >= 1 || mandatories >= 1 {
            (IntegrityLevel::LawyerRequired, 25)
        } else if essentials >= 1 {
            // Graded 60 / 50 / 40 by how much structure is missing.
            let cap = 60u8.saturating_sub(10 * (essentials.min(3) as u8 - 1)).max(40);
            (IntegrityLevel::ReviewRecommended, cap)
        } else {
            (IntegrityLevel::Valid, 100)
        }
    }
}

fn excerpt(text: &str, start: usize, end: usize) -> String {
    let mut from = start;
    let mut taken = 0;
    for (i, _) in text[..start].char_indices().rev() {
        if taken >= 30 {
            break;
        }
        from = i;
        taken += 1;
    }
    let mut to = end;
    let mut budget = 80usize;
    for (offset, ch) in text[end..].char_indices() {
        if budget == 0 {
            break;
        }
        to = end + offset + ch.len_utf8();
        budget -= 1;
    }
    text[from..to].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TypeClassifier;
    use crate::finding::{Classification, Difficulty, Origin};

    fn info(text: &str) -> ContractTypeInfo {
        TypeClassifier::new().classify(text, "vertrag.pdf")
    }

    fn mandatory_finding(category: &str, risk: u8, existence: Existence) -> Finding {
        Finding {
            id: Finding::new_id(),
            origin: Origin::Rule,
            summary: format!("{} problematisch", category),
            original_text: "FEHLT - Klausel nicht vorhanden".to_string(),
            improved_text: "Lange genug formulierte Ersatzklausel für den Test.".to_string(),
            legal_reasoning: "Begründung.".to_string(),
            category: category.to_string(),
            risk,
            impact: 6,
            confidence: 90,
            difficulty: Difficulty::Medium,
            benchmark: None,
            evidence: Vec::new(),
            classification: Classification {
                existence,
                ..Classification::default()
            },
        }
    }

    #[test]
    fn test_unlimited_liability_red_flag_caps_score() {
        let text = "Arbeitsvertrag. Der Arbeitnehmer haftet unbeschränkt für alle Schäden, \
            auch bei leichtester Fahrlässigkeit. Vergütung 3.000 Euro, Beginn am 01.01.2025, \
            Tätigkeit als Fachkraft.";
        let integrity = LegalIntegrityAuditor::new().audit(text, &[], &info(text));

        assert!(matches!(
            integrity.level,
            IntegrityLevel::LawyerRequired | IntegrityLevel::NotUsable
        ));
        assert!(integrity.score_cap <= 25);
        assert_eq!(integrity.red_flags[0].id, "unlimited_liability");
        assert!(integrity.red_flags[0].excerpt.contains("haftet unbeschränkt"));
        assert_eq!(integrity.cap_score(80), integrity.score_cap);
    }

    #[test]
    fn test_clean_contract_is_valid() {
        let text = "Dienstvertrag. Der Auftragnehmer erbringt Beratungsleistungen laut \
            Leistungsbeschreibung. Die Vergütung beträgt 1.500 Euro. Die Laufzeit beträgt \
            zwölf Monate. Die Haftung ist auf den vorhersehbaren Schaden begrenzt.";
        let integrity = LegalIntegrityAuditor::new().audit(text, &[], &info(text));
        assert_eq!(integrity.level, IntegrityLevel::Valid);
        assert_eq!(integrity.score_cap, 100);
        assert_eq!(integrity.cap_score(95), 95);
    }

    #[test]
    fn test_mandatory_violation_from_findings() {
        let text = "Arbeitsvertrag. Vergütung 3.000 Euro. Tätigkeit als Entwickler. Beginn \
            am 01.02.2025.";
        let findings = vec![mandatory_finding("vacation", 6, Existence::Missing)];
        let integrity = LegalIntegrityAuditor::new().audit(text, &findings, &info(text));

        assert_eq!(integrity.level, IntegrityLevel::LawyerRequired);
        assert_eq!(integrity.mandatory_violations.len(), 1);
        assert_eq!(integrity.mandatory_violations[0].citation, "§ 3 BUrlG");
    }

    #[test]
    fn test_red_flag_plus_two_mandatory_is_not_usable() {
        let text = "Arbeitsvertrag. Der Arbeitnehmer haftet unbeschränkt. Vergütung 3.000 \
            Euro. Tätigkeit als Entwickler. Beginn 01.02.2025.";
        let findings = vec![
            mandatory_finding("vacation", 8, Existence::Missing),
            mandatory_finding("termination", 8, Existence::Missing),
        ];
        let integrity = LegalIntegrityAuditor::new().audit(text, &findings, &info(text));
        assert_eq!(integrity.level, IntegrityLevel::NotUsable);
        assert_eq!(integrity.score_cap, 15);
    }

    #[test]
    fn test_missing_essentialia_graded_caps() {
        // An employment contract with no compensation, subject, or duration
        // language at all - structurally incomplete.
        let text = "Arbeitsvertrag zwischen dem Arbeitgeber und dem Arbeitnehmer. Es gelten \
            die betrieblichen Regelungen. Der Arbeitnehmer verpflichtet sich zur Verschwiegenheit.";
        let type_info = info(text);
        assert_eq!(type_info.kind, crate::taxonomy::ContractKind::Employment);

        let integrity = LegalIntegrityAuditor::new().audit(text, &[], &type_info);
        assert_eq!(integrity.level, IntegrityLevel::ReviewRecommended);
        assert!(integrity.score_cap >= 40 && integrity.score_cap <= 60);
        assert!(!integrity.missing_essentialia.is_empty());
    }

    #[test]
    fn test_low_risk_present_mandatory_topic_is_no_violation() {
        let text = "Arbeitsvertrag. Vergütung 3.000 Euro. Tätigkeit. Beginn 01.01.2025. \
            Urlaub 30 Tage.";
        let findings = vec![mandatory_finding("vacation", 3, Existence::Present)];
        let integrity = LegalIntegrityAuditor::new().audit(text, &findings, &info(text));
        assert!(integrity.mandatory_violations.is_empty());
    }

    #[test]
    fn test_amendment_skips_essentialia_check() {
        let text = "Nachtrag zum Arbeitsvertrag vom 01.03.2022. Gehaltserhöhung.";
        let type_info = info(text);
        assert!(type_info.is_amendment);
        let integrity = LegalIntegrityAuditor::new().audit(text, &[], &type_info);
        assert!(integrity.missing_essentialia.is_empty());
    }
}
