//! Declarative taxonomy tables
//!
//! The contract-type taxonomy, category taxonomy with synonym normalization,
//! jurisdiction/language normalization, and the amendment topic sets. All of
//! this is data consumed by generic matching functions, so the tables stay
//! independently testable and auditable.

use serde::{Deserialize, Serialize};

/// Contract-type taxonomy covering the supported German-law contract kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    /// Arbeitsvertrag
    Employment,
    /// Mietvertrag
    Lease,
    /// Geheimhaltungsvereinbarung
    Nda,
    /// SaaS-Vertrag
    Saas,
    /// Kaufvertrag
    Purchase,
    /// Dienstvertrag
    Service,
    /// Werkvertrag
    WorkContract,
    /// Allgemeine Geschäftsbedingungen
    Terms,
    /// Lizenzvertrag
    License,
    /// Darlehensvertrag
    Loan,
    /// Gesellschaftsvertrag
    Partnership,
    /// Franchisevertrag
    Franchise,
    /// Fallback when nothing scores above the floor
    Other,
}

impl ContractKind {
    /// Canonical tag, stable on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            ContractKind::Employment => "arbeitsvertrag",
            ContractKind::Lease => "mietvertrag",
            ContractKind::Nda => "nda",
            ContractKind::Saas => "saas_vertrag",
            ContractKind::Purchase => "kaufvertrag",
            ContractKind::Service => "dienstvertrag",
            ContractKind::WorkContract => "werkvertrag",
            ContractKind::Terms => "agb",
            ContractKind::License => "lizenzvertrag",
            ContractKind::Loan => "darlehensvertrag",
            ContractKind::Partnership => "gesellschaftsvertrag",
            ContractKind::Franchise => "franchise",
            ContractKind::Other => "sonstiges",
        }
    }

    /// Human label.
    pub fn label(&self) -> &'static str {
        match self {
            ContractKind::Employment => "Arbeitsvertrag",
            ContractKind::Lease => "Mietvertrag",
            ContractKind::Nda => "Geheimhaltungsvereinbarung",
            ContractKind::Saas => "SaaS-Vertrag",
            ContractKind::Purchase => "Kaufvertrag",
            ContractKind::Service => "Dienstvertrag",
            ContractKind::WorkContract => "Werkvertrag",
            ContractKind::Terms => "Allgemeine Geschäftsbedingungen",
            ContractKind::License => "Lizenzvertrag",
            ContractKind::Loan => "Darlehensvertrag",
            ContractKind::Partnership => "Gesellschaftsvertrag",
            ContractKind::Franchise => "Franchisevertrag",
            ContractKind::Other => "Sonstiger Vertrag",
        }
    }

    /// Resolve a tag back to a kind; unknown tags fall back to Other.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "arbeitsvertrag" => ContractKind::Employment,
            "mietvertrag" => ContractKind::Lease,
            "nda" => ContractKind::Nda,
            "saas_vertrag" => ContractKind::Saas,
            "kaufvertrag" => ContractKind::Purchase,
            "dienstvertrag" => ContractKind::Service,
            "werkvertrag" => ContractKind::WorkContract,
            "agb" => ContractKind::Terms,
            "lizenzvertrag" => ContractKind::License,
            "darlehensvertrag" => ContractKind::Loan,
            "gesellschaftsvertrag" => ContractKind::Partnership,
            "franchise" => ContractKind::Franchise,
            _ => ContractKind::Other,
        }
    }
}

/// Classification profile for one contract kind.
#[derive(Debug)]
pub struct TypeProfile {
    pub kind: ContractKind,
    /// Keywords scored by in-body frequency and filename match
    pub keywords: &'static [&'static str],
    /// Exact phrases carrying a scoring bonus
    pub phrases: &'static [&'static str],
    /// Applicable statutory framework references
    pub frameworks: &'static [&'static str],
    /// Canonical party-role labels (party A, party B)
    pub roles: (&'static str, &'static str),
    /// Whether the essentialia check (consideration, subject matter, duration) applies
    pub requires_essentialia: bool,
}

/// All classification profiles. `Other` has no profile; it is the floor fallback.
pub static TYPE_PROFILES: &[TypeProfile] = &[
    TypeProfile {
        kind: ContractKind::Employment,
        keywords: &[
            "arbeitsvertrag",
            "arbeitnehmer",
            "arbeitgeber",
            "arbeitszeit",
            "vergütung",
            "urlaub",
            "probezeit",
            "gehalt",
            "employment",
            "employee",
        ],
        phrases: &["anstellungsvertrag", "employment agreement"],
        frameworks: &["BGB §§ 611a ff.", "ArbZG", "BUrlG", "EntgFG", "KSchG"],
        roles: ("Arbeitgeber", "Arbeitnehmer"),
        requires_essentialia: true,
    },
    TypeProfile {
        kind: ContractKind::Lease,
        keywords: &[
            "mietvertrag",
            "mieter",
            "vermieter",
            "mietsache",
            "kaution",
            "nebenkosten",
            "wohnung",
            "miete",
        ],
        phrases: &["mietvertrag über wohnraum", "lease agreement"],
        frameworks: &["BGB §§ 535 ff.", "BetrKV"],
        roles: ("Vermieter", "Mieter"),
        requires_essentialia: true,
    },
    TypeProfile {
        kind: ContractKind::Nda,
        keywords: &[
            "geheimhaltung",
            "vertraulichkeit",
            "vertrauliche informationen",
            "non-disclosure",
            "confidential",
            "nda",
        ],
        phrases: &["geheimhaltungsvereinbarung", "non-disclosure agreement"],
        frameworks: &["GeschGehG", "BGB § 241 Abs. 2"],
        roles: ("Offenlegende Partei", "Empfangende Partei"),
        requires_essentialia: false,
    },
    TypeProfile {
        kind: ContractKind::Saas,
        keywords: &[
            "saas",
            "software-as-a-service",
            "cloud",
            "verfügbarkeit",
            "service level",
            "subscription",
            "hosting",
        ],
        phrases: &["software as a service", "saas-vertrag"],
        frameworks: &["BGB §§ 535, 611 ff.", "DSGVO Art. 28"],
        roles: ("Anbieter", "Kunde"),
        requires_essentialia: true,
    },
    TypeProfile {
        kind: ContractKind::Purchase,
        keywords: &[
            "kaufvertrag",
            "kaufpreis",
            "käufer",
            "verkäufer",
            "kaufsache",
            "gewährleistung",
            "lieferung",
        ],
        phrases: &["kaufvertrag über", "purchase agreement"],
        frameworks: &["BGB §§ 433 ff.", "HGB §§ 373 ff."],
        roles: ("Verkäufer", "Käufer"),
        requires_essentialia: true,
    },
    TypeProfile {
        kind: ContractKind::Service,
        keywords: &[
            "dienstvertrag",
            "dienstleistung",
            "auftragnehmer",
            "auftraggeber",
            "leistungsbeschreibung",
            "beratung",
            "service agreement",
        ],
        phrases: &["dienstleistungsvertrag", "service agreement"],
        frameworks: &["BGB §§ 611 ff."],
        roles: ("Auftraggeber", "Auftragnehmer"),
        requires_essentialia: true,
    },
    TypeProfile {
        kind: ContractKind::WorkContract,
        keywords: &[
            "werkvertrag",
            "werkleistung",
            "abnahme",
            "gewerk",
            "mängelrüge",
            "herstellung",
        ],
        phrases: &["werkvertrag über"],
        frameworks: &["BGB §§ 631 ff.", "VOB/B"],
        roles: ("Besteller", "Unternehmer"),
        requires_essentialia: true,
    },
    TypeProfile {
        kind: ContractKind::Terms,
        keywords: &[
            "allgemeine geschäftsbedingungen",
            "agb",
            "geltungsbereich",
            "einbeziehung",
        ],
        phrases: &["allgemeine geschäftsbedingungen"],
        frameworks: &["BGB §§ 305 ff."],
        roles: ("Verwender", "Vertragspartner"),
        requires_essentialia: false,
    },
    TypeProfile {
        kind: ContractKind::License,
        keywords: &[
            "lizenzvertrag",
            "lizenzgeber",
            "lizenznehmer",
            "nutzungsrechte",
            "lizenzgebühr",
            "license",
        ],
        phrases: &["lizenzvereinbarung", "license agreement"],
        frameworks: &["UrhG §§ 31 ff.", "PatG"],
        roles: ("Lizenzgeber", "Lizenznehmer"),
        requires_essentialia: true,
    },
    TypeProfile {
        kind: ContractKind::Loan,
        keywords: &[
            "darlehensvertrag",
            "darlehen",
            "darlehensgeber",
            "darlehensnehmer",
            "zinsen",
            "tilgung",
            "kredit",
        ],
        phrases: &["darlehensvertrag über"],
        frameworks: &["BGB §§ 488 ff."],
        roles: ("Darlehensgeber", "Darlehensnehmer"),
        requires_essentialia: true,
    },
    TypeProfile {
        kind: ContractKind::Partnership,
        keywords: &[
            "gesellschaftsvertrag",
            "gesellschafter",
            "geschäftsanteile",
            "stammkapital",
            "gesellschaft",
        ],
        phrases: &["gesellschaftsvertrag der"],
        frameworks: &["GmbHG", "HGB §§ 105 ff.", "BGB §§ 705 ff."],
        roles: ("Gesellschaft", "Gesellschafter"),
        requires_essentialia: false,
    },
    TypeProfile {
        kind: ContractKind::Franchise,
        keywords: &[
            "franchise",
            "franchisegeber",
            "franchisenehmer",
            "systemhandbuch",
            "franchisegebühr",
        ],
        phrases: &["franchisevertrag"],
        frameworks: &["BGB §§ 311, 241", "GWB"],
        roles: ("Franchisegeber", "Franchisenehmer"),
        requires_essentialia: true,
    },
];

/// Look up the profile for a kind; `Other` has none.
pub fn profile(kind: ContractKind) -> Option<&'static TypeProfile> {
    TYPE_PROFILES.iter().find(|p| p.kind == kind)
}

/// Party-role labels for a kind, falling back to the generic pair.
pub fn roles(kind: ContractKind) -> (&'static str, &'static str) {
    profile(kind)
        .map(|p| p.roles)
        .unwrap_or(("Auftraggeber", "Auftragnehmer"))
}

/// One entry of the canonical category taxonomy.
#[derive(Debug)]
pub struct CategoryDef {
    pub tag: &'static str,
    pub label: &'static str,
}

/// Canonical category taxonomy, in report ordering.
pub static CATEGORIES: &[CategoryDef] = &[
    CategoryDef { tag: "payment", label: "Zahlungskonditionen" },
    CategoryDef { tag: "compensation", label: "Vergütungsregelungen" },
    CategoryDef { tag: "term", label: "Laufzeit" },
    CategoryDef { tag: "termination", label: "Kündigungsregelungen" },
    CategoryDef { tag: "liability", label: "Haftungsbestimmungen" },
    CategoryDef { tag: "warranty", label: "Gewährleistung" },
    CategoryDef { tag: "subject_matter", label: "Vertragsgegenstand" },
    CategoryDef { tag: "delivery", label: "Lieferung & Leistung" },
    CategoryDef { tag: "service_levels", label: "Service Level" },
    CategoryDef { tag: "support", label: "Support & Wartung" },
    CategoryDef { tag: "working_hours", label: "Arbeitszeitregelungen" },
    CategoryDef { tag: "vacation", label: "Urlaub" },
    CategoryDef { tag: "probation", label: "Probezeit" },
    CategoryDef { tag: "sick_pay", label: "Entgeltfortzahlung" },
    CategoryDef { tag: "data_protection", label: "Datenschutzbestimmungen" },
    CategoryDef { tag: "compliance", label: "Compliance" },
    CategoryDef { tag: "confidentiality", label: "Geheimhaltung" },
    CategoryDef { tag: "non_compete", label: "Wettbewerbsverbot" },
    CategoryDef { tag: "ip", label: "Geistiges Eigentum" },
    CategoryDef { tag: "jurisdiction", label: "Gerichtsstand & Rechtswahl" },
    CategoryDef { tag: "form_requirements", label: "Schriftform & Änderungen" },
    CategoryDef { tag: "severability", label: "Salvatorische Klausel" },
    CategoryDef { tag: "parent_reference", label: "Bezug zum Hauptvertrag" },
    CategoryDef { tag: "effective_date", label: "Wirksamkeitsdatum" },
    CategoryDef { tag: "scope_of_change", label: "Änderungsumfang" },
    CategoryDef { tag: "signatures", label: "Unterschriften" },
    CategoryDef { tag: "clarity", label: "Vertragsklarstellungen" },
    CategoryDef { tag: "general", label: "Allgemeine Optimierungen" },
];

/// Synonym and localized-variant table, keyed by already-normalized tags.
static SYNONYMS: &[(&str, &str)] = &[
    ("kuendigung", "termination"),
    ("kuendigungsfristen", "termination"),
    ("kuendigungsregelungen", "termination"),
    ("vertragsbeendigung", "termination"),
    ("notice", "termination"),
    ("haftung", "liability"),
    ("haftungsbeschraenkung", "liability"),
    ("haftungsbestimmungen", "liability"),
    ("schadensersatz", "liability"),
    ("zahlung", "payment"),
    ("zahlungsbedingungen", "payment"),
    ("zahlungskonditionen", "payment"),
    ("preis", "payment"),
    ("verguetung", "compensation"),
    ("verguetungsregelungen", "compensation"),
    ("gehalt", "compensation"),
    ("salary", "compensation"),
    ("datenschutz", "data_protection"),
    ("dsgvo", "data_protection"),
    ("privacy", "data_protection"),
    ("datenschutzbestimmungen", "data_protection"),
    ("gerichtsstand", "jurisdiction"),
    ("rechtswahl", "jurisdiction"),
    ("anwendbares_recht", "jurisdiction"),
    ("governing_law", "jurisdiction"),
    ("arbeitszeit", "working_hours"),
    ("arbeitszeitregelungen", "working_hours"),
    ("geheimhaltung", "confidentiality"),
    ("vertraulichkeit", "confidentiality"),
    ("wettbewerbsverbot", "non_compete"),
    ("konkurrenzverbot", "non_compete"),
    ("urheberrecht", "ip"),
    ("nutzungsrechte", "ip"),
    ("intellectual_property", "ip"),
    ("gewaehrleistung", "warranty"),
    ("maengel", "warranty"),
    ("lieferung", "delivery"),
    ("leistung", "delivery"),
    ("sla", "service_levels"),
    ("verfuegbarkeit", "service_levels"),
    ("wartung", "support"),
    ("urlaub", "vacation"),
    ("urlaubsanspruch", "vacation"),
    ("probezeit", "probation"),
    ("entgeltfortzahlung", "sick_pay"),
    ("schriftform", "form_requirements"),
    ("schriftformerfordernis", "form_requirements"),
    ("salvatorische_klausel", "severability"),
    ("salvatorisch", "severability"),
    ("laufzeit", "term"),
    ("vertragslaufzeit", "term"),
    ("vertragsgegenstand", "subject_matter"),
    ("leistungsbeschreibung", "subject_matter"),
    ("klarheit", "clarity"),
    ("klarstellungen", "clarity"),
    ("vertragsklarstellungen", "clarity"),
    ("transparenz", "clarity"),
    ("risiko", "general"),
    ("risikomanagement", "general"),
    ("allgemein", "general"),
    ("sonstiges", "general"),
];

/// Normalize a raw tag: lowercase, transliterate umlauts, underscores for
/// whitespace, strip everything outside `[a-z0-9_]`, cap at 50 chars.
pub fn normalize_tag(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().to_lowercase().chars() {
        match ch {
            'ä' => out.push_str("ae"),
            'ö' => out.push_str("oe"),
            'ü' => out.push_str("ue"),
            'ß' => out.push_str("ss"),
            c if c.is_whitespace() || c == '-' => out.push('_'),
            c if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' => out.push(c),
            _ => {}
        }
    }
    out.truncate(50);
    out
}

/// Resolve a raw tag to a canonical taxonomy entry, if any.
pub fn canonical_category(raw: &str) -> Option<&'static CategoryDef> {
    let tag = normalize_tag(raw);
    if tag.is_empty() {
        return None;
    }
    if let Some(def) = CATEGORIES.iter().find(|c| c.tag == tag) {
        return Some(def);
    }
    SYNONYMS
        .iter()
        .find(|(syn, _)| *syn == tag)
        .and_then(|(_, target)| CATEGORIES.iter().find(|c| c.tag == *target))
}

/// Label for a canonical tag; unknown tags get a generic label.
pub fn category_label(tag: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|c| c.tag == tag)
        .map(|c| c.label)
        .unwrap_or("Allgemeine Optimierungen")
}

/// Position of a tag in the canonical report ordering.
pub fn category_rank(tag: &str) -> usize {
    CATEGORIES
        .iter()
        .position(|c| c.tag == tag)
        .unwrap_or(CATEGORIES.len())
}

/// Topics always in scope for any amendment document.
pub const AMENDMENT_CORE_TOPICS: &[&str] = &[
    "parent_reference",
    "effective_date",
    "scope_of_change",
    "severability",
    "signatures",
];

/// Topics that belong to the parent contract and must never be raised
/// against an amendment unless the amendment changes exactly that topic.
pub const AMENDMENT_FORBIDDEN_TOPICS: &[&str] = &[
    "termination",
    "data_protection",
    "liability",
    "jurisdiction",
    "form_requirements",
    "non_compete",
    "confidentiality",
    "ip",
    "probation",
    "vacation",
];

/// Normalized jurisdiction codes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Jurisdiction {
    #[serde(rename = "DE")]
    De,
    #[serde(rename = "AT")]
    At,
    #[serde(rename = "CH")]
    Ch,
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "UK")]
    Uk,
    #[serde(rename = "EU")]
    Eu,
    #[serde(rename = "INT")]
    Int,
}

impl Jurisdiction {
    /// Normalize a free-form hint; unknown or absent hints default to DE.
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint.unwrap_or("de").trim().to_lowercase().as_str() {
            "de" | "deutschland" | "germany" => Jurisdiction::De,
            "at" | "austria" | "österreich" | "oesterreich" => Jurisdiction::At,
            "ch" | "switzerland" | "schweiz" => Jurisdiction::Ch,
            "us" | "usa" => Jurisdiction::Us,
            "uk" | "gb" => Jurisdiction::Uk,
            "eu" => Jurisdiction::Eu,
            "int" | "international" => Jurisdiction::Int,
            _ => Jurisdiction::De,
        }
    }

    /// Wire code.
    pub fn code(&self) -> &'static str {
        match self {
            Jurisdiction::De => "DE",
            Jurisdiction::At => "AT",
            Jurisdiction::Ch => "CH",
            Jurisdiction::Us => "US",
            Jurisdiction::Uk => "UK",
            Jurisdiction::Eu => "EU",
            Jurisdiction::Int => "INT",
        }
    }
}

/// Normalized document languages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    De,
    En,
}

impl Language {
    /// Normalize a free-form hint; unknown or absent hints default to German.
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint.unwrap_or("de").trim().to_lowercase().as_str() {
            "en" | "english" | "englisch" => Language::En,
            _ => Language::De,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag_umlauts() {
        assert_eq!(normalize_tag("Kündigungsfristen"), "kuendigungsfristen");
        assert_eq!(normalize_tag("Service Level"), "service_level");
        assert_eq!(normalize_tag("Haftung & Risiko"), "haftung__risiko");
    }

    #[test]
    fn test_canonical_category_synonym() {
        assert_eq!(canonical_category("Kündigungsfristen").unwrap().tag, "termination");
        assert_eq!(canonical_category("Haftung").unwrap().tag, "liability");
        assert_eq!(canonical_category("DSGVO").unwrap().tag, "data_protection");
    }

    #[test]
    fn test_canonical_category_direct() {
        assert_eq!(canonical_category("payment").unwrap().tag, "payment");
        assert!(canonical_category("frei_erfunden").is_none());
    }

    #[test]
    fn test_synonyms_resolve_to_known_categories() {
        for (syn, target) in SYNONYMS {
            assert!(
                CATEGORIES.iter().any(|c| c.tag == *target),
                "synonym {} points at unknown category {}",
                syn,
                target
            );
        }
    }

    #[test]
    fn test_forbidden_and_core_topics_are_canonical() {
        for tag in AMENDMENT_CORE_TOPICS.iter().chain(AMENDMENT_FORBIDDEN_TOPICS) {
            assert!(
                CATEGORIES.iter().any(|c| c.tag == *tag),
                "topic {} missing from taxonomy",
                tag
            );
        }
    }

    #[test]
    fn test_kind_tag_round_trip() {
        for profile in TYPE_PROFILES {
            assert_eq!(ContractKind::from_tag(profile.kind.tag()), profile.kind);
        }
        assert_eq!(ContractKind::from_tag("unbekannt"), ContractKind::Other);
    }

    #[test]
    fn test_jurisdiction_normalization() {
        assert_eq!(Jurisdiction::from_hint(Some("Deutschland")), Jurisdiction::De);
        assert_eq!(Jurisdiction::from_hint(Some("schweiz")), Jurisdiction::Ch);
        assert_eq!(Jurisdiction::from_hint(Some("mars")), Jurisdiction::De);
        assert_eq!(Jurisdiction::from_hint(None), Jurisdiction::De);
    }
}
