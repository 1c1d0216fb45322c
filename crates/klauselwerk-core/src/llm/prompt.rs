//! Versioned prompt templates for the analysis request
//!
//! Prompts are parameterized data rendered per contract type and document,
//! not hard-coded control flow. The version tag travels into diagnostics so
//! prompt changes are visible in recorded runs.

use crate::classifier::ContractTypeInfo;
use crate::document::{ContextHints, ContractDocument};
use crate::finding::Gap;
use crate::taxonomy::category_label;

/// Prompt template revision, reported in diagnostics.
pub const PROMPT_VERSION: &str = "v3";

/// Character budget for document text in the reduced (fallback) prompt.
const REDUCED_TEXT_BUDGET: usize = 12_000;

/// System prompt establishing role and output discipline.
pub fn system_prompt() -> String {
    "Du bist ein spezialisierter Vertragsanalyst für deutsches Recht. Du prüfst \
     Vertragstexte auf fehlende, schwache und riskante Klauseln und lieferst konkrete, \
     sofort verwendbare Ersatzformulierungen mit juristischer Begründung. Du antwortest \
     ausschließlich mit einem einzigen JSON-Objekt, das exakt dem vorgegebenen Schema \
     entspricht. Jedes gemeldete Problem muss mindestens ein wörtliches Zitat aus dem \
     Vertragstext als Beleg enthalten; erfinde niemals Zitate, Paragraphennummern oder \
     Vertragsinhalte."
        .to_string()
}

/// User prompt for the full analysis pass.
pub fn analysis_prompt(
    document: &ContractDocument,
    type_info: &ContractTypeInfo,
    gaps: &[Gap],
    hints: &ContextHints,
    category_tags: &[&str],
    reduced: bool,
) -> String {
    let mut prompt = String::with_capacity(document.text.len() + 2048);

    prompt.push_str(&format!(
        "Vertragstyp: {} (Konfidenz {}%)\n",
        type_info.kind.label(),
        type_info.confidence
    ));
    if type_info.is_amendment {
        prompt.push_str(
            "Das Dokument ist ein NACHTRAG zu einem bestehenden Vertrag. Prüfe nur \
             nachtragsspezifische Punkte und die konkret geänderten Themen; Regelungen des \
             Hauptvertrags sind nicht Prüfgegenstand.\n",
        );
        if let Some(indicator) = &type_info.amendment_indicator {
            prompt.push_str(&format!("Erkannter Nachtragshinweis: \"{}\"\n", indicator.phrase));
        }
    }
    if !type_info.frameworks.is_empty() {
        prompt.push_str(&format!(
            "Einschlägige Rechtsgrundlagen: {}\n",
            type_info.frameworks.join(", ")
        ));
    }

    if !gaps.is_empty() {
        prompt.push_str("\nDie deterministische Vorprüfung hat folgende Lücken erkannt:\n");
        for gap in gaps {
            prompt.push_str(&format!("- [{}] {}\n", gap.category, gap.title));
        }
        prompt.push_str(
            "Bestätige oder verwerfe diese Punkte anhand des Textes und ergänze, was die \
             Vorprüfung übersehen hat.\n",
        );
    }

    if let Some(summary) = &hints.prior_summary {
        prompt.push_str(&format!("\nKontext aus früherer Analyse (unverbindlich): {}\n", summary));
    }
    if let Some(risk) = hints.risk_hint {
        prompt.push_str(&format!("Risiko-Hinweis eines vorgelagerten Scorers: {}/100\n", risk));
    }

    prompt.push_str("\nZulässige Kategorien (tag - Bezeichnung):\n");
    for tag in category_tags {
        prompt.push_str(&format!("- {} - {}\n", tag, category_label(tag)));
    }

    if reduced {
        prompt.push_str(
            "\nLiefere eine kompakte Analyse: maximal zwei Probleme je Kategorie, nur die \
             wichtigsten Kategorien.\n",
        );
    } else {
        prompt.push_str(
            "\nLiefere eine vollständige Analyse über alle zulässigen Kategorien. Für jedes \
             Problem: summary, original_text (wörtliches Zitat oder der Hinweis, dass die \
             Klausel fehlt), improved_text (vollständige Ersatzklausel ohne Platzhalter), \
             legal_reasoning mit Rechtsgrundlage, risk, impact, confidence, difficulty, \
             classification und mindestens ein evidence-Zitat.\n",
        );
    }

    prompt.push_str("\n--- VERTRAGSTEXT ---\n");
    prompt.push_str(&bounded_text(&document.text, reduced));
    prompt.push_str("\n--- ENDE VERTRAGSTEXT ---\n");
    prompt
}

/// Prompt for the supplementary coverage pass, restricted to the categories
/// the main pass left unrepresented.
pub fn topup_prompt(
    document: &ContractDocument,
    type_info: &ContractTypeInfo,
    missing_tags: &[&str],
) -> String {
    let mut prompt = String::with_capacity(REDUCED_TEXT_BUDGET + 1024);
    prompt.push_str(&format!(
        "Vertragstyp: {}. Eine vorangegangene Analyse hat zu den folgenden Kategorien keine \
         Ergebnisse geliefert. Prüfe den Vertragstext gezielt NUR zu diesen Kategorien:\n",
        type_info.kind.label()
    ));
    for tag in missing_tags {
        prompt.push_str(&format!("- {} - {}\n", tag, category_label(tag)));
    }
    prompt.push_str(
        "Melde je Kategorie höchstens zwei Probleme. Gleiche Feldanforderungen wie bei der \
         Hauptanalyse; jedes Problem braucht mindestens ein wörtliches evidence-Zitat. Wenn \
         eine Kategorie keinen Befund hergibt, lasse sie weg.\n",
    );
    prompt.push_str("\n--- VERTRAGSTEXT ---\n");
    prompt.push_str(&bounded_text(&document.text, true));
    prompt.push_str("\n--- ENDE VERTRAGSTEXT ---\n");
    prompt
}

fn bounded_text(text: &str, reduced: bool) -> String {
    if !reduced || text.len() <= REDUCED_TEXT_BUDGET {
        return text.to_string();
    }
    let mut end = REDUCED_TEXT_BUDGET;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n[Text für die Kompaktanalyse gekürzt]", &text[..end])
}
