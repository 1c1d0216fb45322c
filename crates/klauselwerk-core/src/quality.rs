//! Result normalization and quality gating
//!
//! Takes the merged finding set and applies, in order: category repair
//! through the normalization table, the anti-fabrication filter, role and
//! terminology correction, near-duplicate merging, and the evidence gate.
//! The gate is idempotent - running it twice on an already-gated set yields
//! an identical set.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::classifier::ContractTypeInfo;
use crate::finding::{Finding, Origin};
use crate::taxonomy::{canonical_category, roles};

/// Minimum usable replacement-clause length after scrubbing.
const MIN_IMPROVED_TEXT_LEN: usize = 20;
/// Replacement clauses are truncated at a sentence boundary beyond this.
const MAX_IMPROVED_TEXT_LEN: usize = 2_000;
/// Reasoning is capped to this many sentences.
const MAX_REASONING_SENTENCES: usize = 4;
const MAX_REASONING_LEN: usize = 500;
const MAX_SUMMARY_LEN: usize = 200;
const MIN_BENCHMARK_LEN: usize = 10;

lazy_static! {
    /// Instruction phrasings that must not survive into clause text.
    static ref INSTRUCTION_PREFIXES: Vec<Regex> = vec![
        Regex::new(r"(?i)^(?:fügen\s+sie|ergänzen\s+sie|ersetzen\s+sie|ändern\s+sie|bitte|sollten\s+sie|könnten\s+sie)\s+").unwrap(),
        Regex::new(r"(?i)^(?:add|insert|replace|change|please|you\s+should|you\s+could)\s+").unwrap(),
        Regex::new(r"(?i)^(?:es\s+wird\s+empfohlen,?|wir\s+empfehlen,?|empfehlung:|vorschlag:)\s*").unwrap(),
        Regex::new(r"(?i)^(?:it\s+is\s+recommended|we\s+recommend|recommendation:|suggestion:)\s*").unwrap(),
    ];

    /// Placeholder text the anti-fabrication filter scrubs.
    static ref PLACEHOLDER_PATTERNS: Vec<Regex> = vec![
        // Bracketed blanks such as [BETRAG] or [Name des Arbeitgebers]
        Regex::new(r"\[[^\]\n]{0,60}\]").unwrap(),
        // Hand-waving references instead of concrete clause text
        Regex::new(r"(?i)siehe\s+(?:haupt)?vertrag|see\s+(?:the\s+)?agreement").unwrap(),
        // Invented paragraph numbers
        Regex::new(r"§\s*[Xx]{1,3}\b").unwrap(),
    ];

    static ref SUMMARY_PREFIXES: Regex =
        Regex::new(r"(?i)^(?:problem:|issue:|summary:|zusammenfassung:)\s*").unwrap();
    static ref BENCHMARK_PREFIXES: Regex =
        Regex::new(r"(?i)^(?:benchmark:|markt:|standard:)\s*").unwrap();
    static ref PERCENT: Regex = Regex::new(r"(\d{1,3})\s*%").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Per-stage counters for diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateStats {
    pub input: usize,
    pub repaired_categories: usize,
    pub dropped_placeholder: usize,
    pub dropped_short_text: usize,
    pub merged_duplicates: usize,
    pub dropped_missing_evidence: usize,
    pub output: usize,
}

/// The quality gate over the merged finding set.
#[derive(Debug, Default)]
pub struct QualityGate;

impl QualityGate {
    pub fn new() -> Self {
        Self
    }

    /// Apply all gate stages in order and return the surviving findings.
    pub fn apply(
        &self,
        findings: Vec<Finding>,
        type_info: &ContractTypeInfo,
    ) -> (Vec<Finding>, GateStats) {
        let mut stats = GateStats {
            input: findings.len(),
            ..GateStats::default()
        };

        let mut gated: Vec<Finding> = Vec::with_capacity(findings.len());
        for mut finding in findings {
            self.repair_category(&mut finding, &mut stats);

            if !self.sanitize(&mut finding, &mut stats) {
                continue;
            }

            self.correct_roles(&mut finding, type_info);
            gated.push(finding);
        }

        let mut deduped = self.dedup(gated, &mut stats);

        deduped.retain(|finding| {
            let has_evidence = finding.evidence.iter().any(|quote| !quote.trim().is_empty());
            if matches!(finding.origin, Origin::Ai | Origin::Topup) && !has_evidence {
                stats.dropped_missing_evidence += 1;
                false
            } else {
                true
            }
        });

        stats.output = deduped.len();
        tracing::debug!(
            input = stats.input,
            output = stats.output,
            merged = stats.merged_duplicates,
            dropped_evidence = stats.dropped_missing_evidence,
            "quality gate applied"
        );
        (deduped, stats)
    }

    /// Stage 1: map the tag through the normalization table; unresolvable
    /// tags (the parent tag was already inherited upstream) land in general.
    fn repair_category(&self, finding: &mut Finding, stats: &mut GateStats) {
        let resolved = canonical_category(&finding.category)
            .map(|def| def.tag.to_string())
            .unwrap_or_else(|| "general".to_string());
        if resolved != finding.category {
            stats.repaired_categories += 1;
            finding.category = resolved;
        }
    }

    /// Stages 2 and supplements: anti-fabrication scrubbing plus field
    /// cleanup and clamping. Returns false when the finding became vacuous.
    fn sanitize(&self, finding: &mut Finding, stats: &mut GateStats) -> bool {
        let had_placeholder = PLACEHOLDER_PATTERNS
            .iter()
            .any(|re| re.is_match(&finding.improved_text));

        finding.improved_text = clean_improved_text(&finding.improved_text);
        finding.legal_reasoning = clean_reasoning(&finding.legal_reasoning);
        finding.summary = clean_summary(&finding.summary);
        finding.benchmark = finding.benchmark.take().and_then(|b| clean_benchmark(&b));
        finding.risk = finding.risk.min(10);
        finding.impact = finding.impact.min(10);
        finding.confidence = finding.confidence.min(100);

        if finding.improved_text.len() < MIN_IMPROVED_TEXT_LEN {
            if had_placeholder {
                stats.dropped_placeholder += 1;
            } else {
                stats.dropped_short_text += 1;
            }
            return false;
        }
        true
    }

    /// Stage 3: rewrite generic role nouns to the type's party labels.
    fn correct_roles(&self, finding: &mut Finding, type_info: &ContractTypeInfo) {
        let (party_a, party_b) = roles(type_info.kind);
        for field in [
            &mut finding.summary,
            &mut finding.improved_text,
            &mut finding.legal_reasoning,
        ] {
            let mut text = field.clone();
            for (generic, replacement) in [
                ("Vertragspartei 1", party_a),
                ("Vertragspartei 2", party_b),
                ("Partei 1", party_a),
                ("Partei 2", party_b),
                ("Party A", party_a),
                ("Party B", party_b),
            ] {
                text = text.replace(generic, replacement);
            }
            *field = text;
        }
    }

    /// Stage 4: merge near-duplicates within the same category, keeping the
    /// higher-confidence finding and the union of evidence.
    fn dedup(&self, findings: Vec<Finding>, stats: &mut GateStats) -> Vec<Finding> {
        let mut kept: Vec<Finding> = Vec::with_capacity(findings.len());
        let mut index: HashMap<(String, &'static str, String), usize> = HashMap::new();

        for finding in findings {
            let keys = dedup_keys(&finding);
            let existing = keys
                .iter()
                .find_map(|key| index.get(key))
                .copied();

            match existing {
                Some(slot) => {
                    stats.merged_duplicates += 1;
                    let winner_is_new = finding.confidence > kept[slot].confidence;
                    if winner_is_new {
                        let mut merged = finding;
                        for quote in kept[slot].evidence.drain(..) {
                            if !merged.evidence.contains(&quote) {
                                merged.evidence.push(quote);
                            }
                        }
                        kept[slot] = merged;
                    } else {
                        for quote in finding.evidence {
                            if !kept[slot].evidence.contains(&quote) {
                                kept[slot].evidence.push(quote);
                            }
                        }
                    }
                    for key in dedup_keys(&kept[slot]) {
                        index.entry(key).or_insert(slot);
                    }
                }
                None => {
                    let slot = kept.len();
                    for key in keys {
                        index.insert(key, slot);
                    }
                    kept.push(finding);
                }
            }
        }
        kept
    }
}

/// Dedup keys: normalized summary always; normalized original text only when
/// it is a real quote (the shared missing-clause marker must not merge
/// unrelated findings).
fn dedup_keys(finding: &Finding) -> Vec<(String, &'static str, String)> {
    let mut keys = Vec::with_capacity(2);
    let summary_key = text_fingerprint(&finding.summary);
    if !summary_key.is_empty() {
        keys.push((finding.category.clone(), "summary", summary_key));
    }
    if !finding.is_missing_clause() {
        let original_key = text_fingerprint(&finding.original_text);
        if !original_key.is_empty() {
            keys.push((finding.category.clone(), "original", original_key));
        }
    }
    keys
}

/// Case- and punctuation-insensitive content hash.
fn text_fingerprint(text: &str) -> String {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();
    if normalized.is_empty() {
        return String::new();
    }
    blake3::hash(normalized.as_bytes()).to_hex().to_string()
}

fn clean_improved_text(text: &str) -> String {
    let mut cleaned = text.trim().to_string();

    for re in INSTRUCTION_PREFIXES.iter() {
        cleaned = re.replace(&cleaned, "").to_string();
    }
    for re in PLACEHOLDER_PATTERNS.iter() {
        cleaned = re.replace_all(&cleaned, "").to_string();
    }

    cleaned = WHITESPACE.replace_all(cleaned.trim(), " ").to_string();
    cleaned = capitalize_first(&cleaned);

    if cleaned.len() > MAX_IMPROVED_TEXT_LEN {
        cleaned = truncate_at_sentence(&cleaned, MAX_IMPROVED_TEXT_LEN);
    }
    cleaned
}

fn clean_reasoning(text: &str) -> String {
    let sentences: Vec<String> = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let mut unique: Vec<String> = Vec::new();
    for sentence in sentences {
        if !unique.contains(&sentence) {
            unique.push(sentence);
        }
    }
    unique.truncate(MAX_REASONING_SENTENCES);

    let mut cleaned = unique.join(". ");
    if !cleaned.is_empty() && !cleaned.ends_with('.') {
        cleaned.push('.');
    }
    if cleaned.len() > MAX_REASONING_LEN {
        cleaned = truncate_at_sentence(&cleaned, MAX_REASONING_LEN);
    }
    cleaned
}

fn clean_summary(text: &str) -> String {
    let mut cleaned = SUMMARY_PREFIXES.replace(text.trim(), "").trim().to_string();
    if cleaned.is_empty() {
        cleaned = "Optimierungspotential erkannt".to_string();
    }
    cleaned = capitalize_first(&cleaned);
    if cleaned.len() > MAX_SUMMARY_LEN {
        cleaned = truncate_chars(&cleaned, MAX_SUMMARY_LEN);
    }
    cleaned
}

/// Benchmarks quoting impossible percentages are toned down to 95%; too-short
/// benchmarks are dropped entirely.
fn clean_benchmark(text: &str) -> Option<String> {
    let mut cleaned = BENCHMARK_PREFIXES.replace(text.trim(), "").trim().to_string();

    if let Some(caps) = PERCENT.captures(&cleaned) {
        if let Ok(value) = caps[1].parse::<u32>() {
            if value > 100 {
                cleaned = PERCENT.replace(&cleaned, "95%").to_string();
            }
        }
    }

    if cleaned.len() > MIN_BENCHMARK_LEN {
        Some(cleaned)
    } else {
        None
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn truncate_at_sentence(text: &str, max_len: usize) -> String {
    let mut end = max_len.min(text.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    let head = &text[..end];
    match head.rfind('.') {
        Some(last) if last > max_len * 7 / 10 => head[..=last].to_string(),
        _ => format!("{}...", truncate_chars(head, max_len.saturating_sub(3))),
    }
}

fn truncate_chars(text: &str, max_len: usize) -> String {
    let mut end = max_len.min(text.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].trim_end().to_string()
}
