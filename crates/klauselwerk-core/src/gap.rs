//! Deterministic rule engine for missing and weak clauses
//!
//! Required-clause checklists are declarative tables: each entry names the
//! clause, its category, severity, positive-evidence presence patterns, and
//! optional adequacy patterns. A clause is "missing" only when no presence
//! pattern matches anywhere in the text; present-but-inadequate clauses are
//! reported as weak. For amendment documents the Document Scope Gate swaps
//! in the amendment checklist - parent-contract clauses are never reported
//! missing against an amendment.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::classifier::ContractTypeInfo;
use crate::finding::{Gap, GapKind, Necessity, Severity};
use crate::taxonomy::ContractKind;

/// One entry of a required-clause checklist.
#[derive(Debug)]
pub struct ClauseRequirement {
    pub id: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub necessity: Necessity,
    /// Short title of the problem when the clause is missing or weak
    pub title: &'static str,
    /// Positive-evidence patterns; any match means the clause exists
    pub presence: &'static [&'static str],
    /// Adequacy patterns; all-empty means presence alone suffices
    pub adequacy: &'static [&'static str],
    pub rationale: &'static str,
    pub benchmark: &'static str,
}

/// Baseline checklist applying to every full contract.
static BASELINE_CHECKLIST: &[ClauseRequirement] = &[
    ClauseRequirement {
        id: "parties",
        category: "clarity",
        severity: Severity::High,
        necessity: Necessity::Mandatory,
        title: "Parteien unvollständig definiert",
        presence: &[r"(?i)parteien|vertragspartner|zwischen\s+.{1,80}\s+und"],
        adequacy: &[r"\d{5}\s+[A-ZÄÖÜ][a-zäöüß]+"],
        rationale: "Nach § 126 BGB müssen Vertragsparteien eindeutig bestimmbar sein. Ohne \
            vollständige Angaben mit Name und Anschrift kann der Vertrag im Streitfall \
            unwirksam sein.",
        benchmark: "100% aller professionellen Verträge enthalten vollständige Parteienangaben",
    },
    ClauseRequirement {
        id: "termination",
        category: "termination",
        severity: Severity::High,
        necessity: Necessity::RiskBased,
        title: "Kündigungsfristen fehlen oder sind unklar",
        presence: &[r"(?i)kündig|vertragsbeendigung|termination"],
        adequacy: &[
            r"(?i)\d+\s+(?:monat|woche|tag)e?n?\s+(?:zum|zur|vor|nach)",
            r"(?i)kündigungsfrist\s+von\s+\d+",
        ],
        rationale: "Ohne klare Kündigungsfristen droht Rechtsunsicherheit bei der \
            Vertragsbeendigung. Nach § 620 Abs. 2 BGB können unbefristete \
            Dauerschuldverhältnisse jederzeit gekündigt werden.",
        benchmark: "94% aller professionellen Verträge enthalten klare Kündigungsfristen",
    },
    ClauseRequirement {
        id: "liability",
        category: "liability",
        severity: Severity::Critical,
        necessity: Necessity::RiskBased,
        title: "Haftung unbegrenzt - hohes Schadensrisiko",
        presence: &[r"(?i)haftung|haftet|schadensersatz|liability"],
        adequacy: &[
            r"(?i)(?:begrenzt|beschränkt|maximal|höchstbetrag)",
            r"(?i)grobe\s+fahrlässigkeit|vorsatz|kardinalpflicht",
        ],
        rationale: "Ohne Haftungsbegrenzung drohen unbegrenzte Schadensersatzforderungen. Nach \
            § 276 BGB haftet jede Partei für Vorsatz und Fahrlässigkeit; ein Ausschluss für \
            leichte Fahrlässigkeit ist zulässig.",
        benchmark: "98% aller professionellen B2B-Verträge enthalten Haftungsbegrenzungen",
    },
    ClauseRequirement {
        id: "payment_terms",
        category: "payment",
        severity: Severity::Medium,
        necessity: Necessity::RiskBased,
        title: "Zahlungsfristen und -bedingungen unklar",
        presence: &[r"(?i)zahlung|vergütung|preis|entgelt|payment"],
        adequacy: &[r"(?i)\d+\s+tage|zahlungsziel|fällig|zahlbar|verzug"],
        rationale: "Unklare Zahlungsfristen führen zu Liquiditätsproblemen. Nach § 286 BGB \
            kommt der Schuldner ohne Mahnung in Verzug, wenn der Zahlungstermin kalendermäßig \
            bestimmt ist.",
        benchmark: "91% aller B2B-Verträge definieren klare Zahlungsfristen",
    },
    ClauseRequirement {
        id: "data_protection",
        category: "data_protection",
        severity: Severity::High,
        necessity: Necessity::Mandatory,
        title: "Datenschutz/DSGVO-Regelungen fehlen",
        presence: &[r"(?i)dsgvo|datenschutz|personenbezogen|datenverarbeitung|gdpr"],
        adequacy: &[r"(?i)art\.?\s*6|rechtsgrundlage"],
        rationale: "DSGVO-Verstöße können Bußgelder bis zu 20 Mio. EUR oder 4% des \
            Jahresumsatzes kosten (Art. 83 DSGVO). Art. 6 DSGVO fordert eine Rechtsgrundlage \
            für jede Verarbeitung.",
        benchmark: "100% DSGVO-konformer Verträge enthalten Datenschutzklauseln",
    },
    ClauseRequirement {
        id: "jurisdiction",
        category: "jurisdiction",
        severity: Severity::Medium,
        necessity: Necessity::BestPractice,
        title: "Gerichtsstand und Rechtswahl fehlen",
        presence: &[
            r"(?i)gerichtsstand|zuständiges?\s+gericht|erfüllungsort",
            r"(?i)deutsches\s+recht|anwendbares\s+recht|governing\s+law",
        ],
        adequacy: &[],
        rationale: "Ohne Gerichtsstandsvereinbarung droht eine Klage am Sitz der Gegenpartei. \
            Nach § 38 ZPO ist die Vereinbarung für Kaufleute zulässig; die Rechtswahl sichert \
            Rechtsklarheit.",
        benchmark: "89% aller überregionalen Verträge enthalten eine Gerichtsstandsvereinbarung",
    },
    ClauseRequirement {
        id: "severability",
        category: "severability",
        severity: Severity::High,
        necessity: Necessity::BestPractice,
        title: "Salvatorische Klausel fehlt - Risiko der Gesamtnichtigkeit",
        presence: &[
            r"(?i)salvatorisch",
            r"(?i)unwirksamkeit\s+.{0,40}bestimmung",
            r"(?i)unwirksam.{0,60}übrigen\s+bestimmungen",
        ],
        adequacy: &[],
        rationale: "Ohne salvatorische Klausel gilt § 139 BGB: Ist eine Klausel unwirksam, \
            wird im Zweifel der gesamte Vertrag nichtig.",
        benchmark: "98% aller professionellen Verträge enthalten eine salvatorische Klausel",
    },
    ClauseRequirement {
        id: "written_form",
        category: "form_requirements",
        severity: Severity::Medium,
        necessity: Necessity::BestPractice,
        title: "Schriftformerfordernis für Änderungen fehlt",
        presence: &[r"(?i)schriftform|§\s*126\s*bgb|schriftlich.{0,30}änderung"],
        adequacy: &[],
        rationale: "Ohne Schriftformklausel sind mündliche Änderungen wirksam, was zu \
            Beweisproblemen führt. § 126 BGB verlangt für die Schriftform die Unterschrift.",
        benchmark: "85% professioneller Verträge enthalten ein Schriftformerfordernis",
    },
];

/// Per-type checklist extras; an extra with the same category as a baseline
/// entry replaces that baseline entry for the type.
static TYPE_EXTRAS: &[(ContractKind, &[ClauseRequirement])] = &[
    (ContractKind::Employment, EMPLOYMENT_EXTRAS),
    (ContractKind::Lease, LEASE_EXTRAS),
    (ContractKind::Purchase, PURCHASE_EXTRAS),
    (ContractKind::Service, SERVICE_EXTRAS),
    (ContractKind::Saas, SAAS_EXTRAS),
    (ContractKind::Nda, NDA_EXTRAS),
    (ContractKind::WorkContract, WORK_EXTRAS),
    (ContractKind::License, LICENSE_EXTRAS),
    (ContractKind::Loan, LOAN_EXTRAS),
];

static EMPLOYMENT_EXTRAS: &[ClauseRequirement] = &[
    ClauseRequirement {
        id: "employment_compensation",
        category: "compensation",
        severity: Severity::Critical,
        necessity: Necessity::Mandatory,
        title: "Vergütungsregelung fehlt oder ist unvollständig",
        presence: &[r"(?i)vergütung|gehalt|entgelt|lohn|brutto"],
        adequacy: &[r"(?i)\d[\d.,]*\s*(?:euro|eur|€)"],
        rationale: "Die Vergütung ist essentialium des Arbeitsvertrags (§ 611a Abs. 2 BGB). \
            Ohne bezifferte Vergütung gilt nach § 612 BGB die übliche Vergütung als \
            vereinbart, was Streit vorprogrammiert.",
        benchmark: "100% wirksamer Arbeitsverträge beziffern die Vergütung",
    },
    ClauseRequirement {
        id: "employment_working_hours",
        category: "working_hours",
        severity: Severity::Medium,
        necessity: Necessity::RiskBased,
        title: "Arbeitszeitregelung fehlt",
        presence: &[r"(?i)arbeitszeit|wochenstunden|stunden\s+pro\s+woche|working\s+hours"],
        adequacy: &[r"(?i)\d{1,2}(?:,\d)?\s*(?:stunden|std)"],
        rationale: "Ohne vereinbarte Arbeitszeit gelten die Grenzen des ArbZG (§ 3: acht \
            Stunden werktäglich), der konkrete Umfang der Leistungspflicht bleibt aber offen.",
        benchmark: "96% der Arbeitsverträge regeln die Wochenarbeitszeit ausdrücklich",
    },
    ClauseRequirement {
        id: "employment_vacation",
        category: "vacation",
        severity: Severity::Medium,
        necessity: Necessity::Mandatory,
        title: "Urlaubsregelung fehlt",
        presence: &[r"(?i)urlaub|erholungsurlaub|vacation|urlaubsanspruch"],
        adequacy: &[r"(?i)\d{1,2}\s*(?:arbeitstage|werktage|tage)"],
        rationale: "Der gesetzliche Mindesturlaub von 24 Werktagen (§ 3 BUrlG) ist \
            unabdingbar. Fehlt eine Regelung, gilt das gesetzliche Minimum; übliche \
            vertragliche Ansprüche liegen darüber.",
        benchmark: "Üblich sind 25-30 Urlaubstage bei einer Fünftagewoche",
    },
    ClauseRequirement {
        id: "employment_term",
        category: "term",
        severity: Severity::High,
        necessity: Necessity::Mandatory,
        title: "Beginn oder Dauer des Arbeitsverhältnisses unklar",
        presence: &[r"(?i)beginn|tritt\s+.{0,30}(?:ein|an)|befristet|unbefristet|commencement"],
        adequacy: &[],
        rationale: "Eine Befristung bedarf nach § 14 Abs. 4 TzBfG der Schriftform; ohne klaren \
            Beginn ist der Vertragsstatus unklar.",
        benchmark: "99% der Arbeitsverträge nennen den Beginn ausdrücklich",
    },
];

static LEASE_EXTRAS: &[ClauseRequirement] = &[
    ClauseRequirement {
        id: "lease_rent",
        category: "payment",
        severity: Severity::Critical,
        necessity: Necessity::Mandatory,
        title: "Miethöhe fehlt oder ist unklar",
        presence: &[r"(?i)miete|mietzins|nettokaltmiete"],
        adequacy: &[r"(?i)\d[\d.,]*\s*(?:euro|eur|€)"],
        rationale: "Die Miethöhe ist essentialium des Mietvertrags (§ 535 Abs. 2 BGB). Ohne \
            bezifferte Miete ist der Vertrag unvollständig.",
        benchmark: "100% wirksamer Mietverträge beziffern die Miete",
    },
    ClauseRequirement {
        id: "lease_object",
        category: "subject_matter",
        severity: Severity::Critical,
        necessity: Necessity::Mandatory,
        title: "Mietsache nicht hinreichend bestimmt",
        presence: &[r"(?i)mietsache|mietobjekt|wohnung\s+in|räume\s+in"],
        adequacy: &[],
        rationale: "Die Mietsache muss bestimmbar bezeichnet sein (§ 535 BGB); andernfalls \
            fehlt der Vertragsgegenstand.",
        benchmark: "100% wirksamer Mietverträge bezeichnen die Mietsache genau",
    },
    ClauseRequirement {
        id: "lease_operating_costs",
        category: "payment",
        severity: Severity::Medium,
        necessity: Necessity::RiskBased,
        title: "Nebenkostenregelung fehlt",
        presence: &[r"(?i)nebenkosten|betriebskosten"],
        adequacy: &[],
        rationale: "Ohne Umlagevereinbarung nach § 556 BGB i.V.m. der BetrKV trägt der \
            Vermieter sämtliche Betriebskosten selbst.",
        benchmark: "97% der Wohnraummietverträge enthalten eine Betriebskostenregelung",
    },
];

static PURCHASE_EXTRAS: &[ClauseRequirement] = &[
    ClauseRequirement {
        id: "purchase_price",
        category: "payment",
        severity: Severity::Critical,
        necessity: Necessity::Mandatory,
        title: "Kaufpreis fehlt oder ist unbestimmt",
        presence: &[r"(?i)kaufpreis|purchase\s+price"],
        adequacy: &[r"(?i)\d[\d.,]*\s*(?:euro|eur|€|usd)"],
        rationale: "Der Kaufpreis ist essentialium des Kaufvertrags (§ 433 Abs. 2 BGB). Ohne \
            bestimmten oder bestimmbaren Preis kommt kein Vertrag zustande.",
        benchmark: "100% wirksamer Kaufverträge beziffern den Kaufpreis",
    },
    ClauseRequirement {
        id: "purchase_object",
        category: "subject_matter",
        severity: Severity::Critical,
        necessity: Necessity::Mandatory,
        title: "Kaufsache nicht hinreichend bestimmt",
        presence: &[r"(?i)kaufsache|kaufgegenstand|verkauft\s+.{0,60}"],
        adequacy: &[],
        rationale: "Die Kaufsache muss bestimmbar sein (§ 433 Abs. 1 BGB); andernfalls fehlt \
            der Vertragsgegenstand.",
        benchmark: "100% wirksamer Kaufverträge bezeichnen die Kaufsache genau",
    },
    ClauseRequirement {
        id: "purchase_warranty",
        category: "warranty",
        severity: Severity::High,
        necessity: Necessity::RiskBased,
        title: "Gewährleistungsregelung fehlt",
        presence: &[r"(?i)gewährleistung|mängel|sachmangel|warranty"],
        adequacy: &[],
        rationale: "Ohne Regelung gelten die gesetzlichen Mängelrechte der §§ 434 ff. BGB \
            uneingeschränkt, einschließlich zweijähriger Verjährung (§ 438 BGB).",
        benchmark: "92% der B2B-Kaufverträge modifizieren die gesetzliche Gewährleistung",
    },
    ClauseRequirement {
        id: "purchase_delivery",
        category: "delivery",
        severity: Severity::Medium,
        necessity: Necessity::RiskBased,
        title: "Liefertermin und Gefahrübergang unklar",
        presence: &[r"(?i)lieferung|liefertermin|übergabe|gefahrübergang|delivery"],
        adequacy: &[],
        rationale: "Ohne Lieferregelung gelten §§ 269, 446 BGB; Ort und Zeitpunkt des \
            Gefahrübergangs bleiben streitanfällig.",
        benchmark: "90% der Kaufverträge regeln Lieferung und Gefahrübergang",
    },
];

static SERVICE_EXTRAS: &[ClauseRequirement] = &[
    ClauseRequirement {
        id: "service_fee",
        category: "payment",
        severity: Severity::Critical,
        necessity: Necessity::Mandatory,
        title: "Vergütung der Dienstleistung fehlt",
        presence: &[r"(?i)vergütung|honorar|stundensatz|tagessatz|entgelt"],
        adequacy: &[r"(?i)\d[\d.,]*\s*(?:euro|eur|€)"],
        rationale: "Die Vergütung ist essentialium des Dienstvertrags (§ 611 BGB). Ohne \
            Beziffern gilt nach § 612 BGB die übliche Vergütung.",
        benchmark: "100% professioneller Dienstverträge beziffern die Vergütung",
    },
    ClauseRequirement {
        id: "service_scope",
        category: "subject_matter",
        severity: Severity::High,
        necessity: Necessity::Mandatory,
        title: "Leistungsbeschreibung fehlt oder ist zu vage",
        presence: &[r"(?i)leistungsbeschreibung|leistungsumfang|folgende\s+leistungen|scope\s+of\s+services"],
        adequacy: &[],
        rationale: "Ohne konkrete Leistungsbeschreibung ist der Umfang der Leistungspflicht \
            nach §§ 611, 241 BGB nicht bestimmbar; Mehrforderungen sind kaum abwehrbar.",
        benchmark: "95% der Dienstverträge enthalten eine detaillierte Leistungsbeschreibung",
    },
];

static SAAS_EXTRAS: &[ClauseRequirement] = &[
    ClauseRequirement {
        id: "saas_fee",
        category: "payment",
        severity: Severity::Critical,
        necessity: Necessity::Mandatory,
        title: "Subskriptionsentgelt fehlt",
        presence: &[r"(?i)entgelt|gebühr|subscription\s+fee|preis"],
        adequacy: &[r"(?i)\d[\d.,]*\s*(?:euro|eur|€|usd)"],
        rationale: "Das Entgelt ist essentialium des SaaS-Vertrags; ohne Beziffern ist die \
            Hauptleistungspflicht des Kunden unbestimmt.",
        benchmark: "100% der SaaS-Verträge beziffern das Entgelt",
    },
    ClauseRequirement {
        id: "saas_service_levels",
        category: "service_levels",
        severity: Severity::High,
        necessity: Necessity::RiskBased,
        title: "Verfügbarkeitszusagen (SLA) fehlen",
        presence: &[r"(?i)verfügbarkeit|service\s+level|sla|uptime"],
        adequacy: &[r"(?i)\d{2}(?:[.,]\d+)?\s*%"],
        rationale: "Ohne bezifferte Verfügbarkeit schuldet der Anbieter nur mittlere Art und \
            Güte (§ 243 BGB); Ausfälle sind kaum sanktionierbar.",
        benchmark: "Marktüblich sind 99,5% bis 99,9% Verfügbarkeit im Monatsmittel",
    },
    ClauseRequirement {
        id: "saas_support",
        category: "support",
        severity: Severity::Medium,
        necessity: Necessity::BestPractice,
        title: "Support- und Reaktionszeiten fehlen",
        presence: &[r"(?i)support|wartung|reaktionszeit|störung"],
        adequacy: &[],
        rationale: "Ohne Support-Regelung fehlen verbindliche Reaktionszeiten für \
            Störungsmeldungen.",
        benchmark: "88% der SaaS-Verträge definieren Supportzeiten und Reaktionsfristen",
    },
    ClauseRequirement {
        id: "saas_dpa",
        category: "data_protection",
        severity: Severity::Critical,
        necessity: Necessity::Mandatory,
        title: "Auftragsverarbeitungsvertrag fehlt",
        presence: &[r"(?i)auftragsverarbeitung|art\.?\s*28\s*dsgvo|data\s+processing\s+agreement|avv"],
        adequacy: &[],
        rationale: "Verarbeitet der Anbieter personenbezogene Daten im Auftrag, verlangt \
            Art. 28 Abs. 3 DSGVO zwingend einen Auftragsverarbeitungsvertrag.",
        benchmark: "100% DSGVO-konformer SaaS-Verträge referenzieren einen AVV",
    },
];

static NDA_EXTRAS: &[ClauseRequirement] = &[
    ClauseRequirement {
        id: "nda_definition",
        category: "confidentiality",
        severity: Severity::Critical,
        necessity: Necessity::Mandatory,
        title: "Vertrauliche Informationen nicht definiert",
        presence: &[r"(?i)vertrauliche\s+informationen|confidential\s+information|geheimhaltung"],
        adequacy: &[r"(?i)umfasst|gelten\s+insbesondere|bezeichnet|means"],
        rationale: "Ohne Definition des Schutzgegenstands läuft die Geheimhaltungspflicht \
            leer; nach dem GeschGehG sind nur angemessen geschützte Informationen \
            Geschäftsgeheimnisse (§ 2 Nr. 1 GeschGehG).",
        benchmark: "100% professioneller NDAs definieren die vertraulichen Informationen",
    },
    ClauseRequirement {
        id: "nda_term",
        category: "term",
        severity: Severity::High,
        necessity: Necessity::RiskBased,
        title: "Dauer der Geheimhaltungspflicht fehlt",
        presence: &[r"(?i)laufzeit|dauer|gilt\s+für|nach\s+beendigung|survive"],
        adequacy: &[r"(?i)\d+\s*(?:jahre|monate|years)"],
        rationale: "Ohne befristete Nachwirkung ist die Geheimhaltungspflicht zeitlich \
            unbegrenzt und läuft Gefahr, als unangemessene Benachteiligung unwirksam zu sein.",
        benchmark: "Üblich sind drei bis fünf Jahre Nachwirkung",
    },
];

static WORK_EXTRAS: &[ClauseRequirement] = &[
    ClauseRequirement {
        id: "work_remuneration",
        category: "payment",
        severity: Severity::Critical,
        necessity: Necessity::Mandatory,
        title: "Werklohn fehlt oder ist unbestimmt",
        presence: &[r"(?i)werklohn|vergütung|pauschalpreis|festpreis"],
        adequacy: &[r"(?i)\d[\d.,]*\s*(?:euro|eur|€)"],
        rationale: "Der Werklohn ist essentialium des Werkvertrags (§ 631 Abs. 1 BGB); ohne \
            Beziffern gilt § 632 BGB.",
        benchmark: "100% wirksamer Werkverträge beziffern den Werklohn",
    },
    ClauseRequirement {
        id: "work_acceptance",
        category: "warranty",
        severity: Severity::High,
        necessity: Necessity::RiskBased,
        title: "Abnahmeregelung fehlt",
        presence: &[r"(?i)abnahme|abgenommen"],
        adequacy: &[],
        rationale: "Die Abnahme (§ 640 BGB) löst Fälligkeit, Gefahrübergang und \
            Verjährungsbeginn aus; ohne Regelung drohen Streitigkeiten über den Zeitpunkt.",
        benchmark: "94% der Werkverträge regeln die Abnahme ausdrücklich",
    },
];

static LICENSE_EXTRAS: &[ClauseRequirement] = &[
    ClauseRequirement {
        id: "license_grant",
        category: "ip",
        severity: Severity::Critical,
        necessity: Necessity::Mandatory,
        title: "Umfang der Rechtseinräumung unklar",
        presence: &[r"(?i)nutzungsrecht|lizenz|rechtseinräumung|license\s+grant"],
        adequacy: &[r"(?i)einfach|ausschließlich|exklusiv|non-?exclusive|räumlich|zeitlich"],
        rationale: "Nach der Zweckübertragungslehre (§ 31 Abs. 5 UrhG) verbleiben im Zweifel \
            alle nicht ausdrücklich eingeräumten Nutzungsrechte beim Urheber.",
        benchmark: "100% professioneller Lizenzverträge spezifizieren Art und Umfang der Rechte",
    },
    ClauseRequirement {
        id: "license_fee",
        category: "payment",
        severity: Severity::High,
        necessity: Necessity::Mandatory,
        title: "Lizenzgebühr fehlt",
        presence: &[r"(?i)lizenzgebühr|royalty|vergütung"],
        adequacy: &[],
        rationale: "Ohne Gebührenregelung ist die Gegenleistung unbestimmt; bei \
            umsatzabhängigen Gebühren fehlen zudem Abrechnungspflichten.",
        benchmark: "97% der Lizenzverträge regeln die Gebühr ausdrücklich",
    },
];

static LOAN_EXTRAS: &[ClauseRequirement] = &[
    ClauseRequirement {
        id: "loan_interest",
        category: "payment",
        severity: Severity::Critical,
        necessity: Necessity::Mandatory,
        title: "Zins- und Tilgungsregelung fehlt",
        presence: &[r"(?i)zins|tilgung|rückzahlung"],
        adequacy: &[r"(?i)\d+(?:[.,]\d+)?\s*%"],
        rationale: "Zinssatz und Rückzahlungsmodalitäten sind essentialia des \
            Darlehensvertrags (§ 488 BGB).",
        benchmark: "100% wirksamer Darlehensverträge beziffern den Zinssatz",
    },
    ClauseRequirement {
        id: "loan_term",
        category: "term",
        severity: Severity::High,
        necessity: Necessity::Mandatory,
        title: "Laufzeit des Darlehens fehlt",
        presence: &[r"(?i)laufzeit|fällig\s+am|rückzahlbar"],
        adequacy: &[],
        rationale: "Ohne Laufzeit gilt die dreimonatige Kündigungsfrist des § 488 Abs. 3 BGB, \
            was selten dem Parteiwillen entspricht.",
        benchmark: "98% der Darlehensverträge nennen eine feste Laufzeit",
    },
];

/// Checklist for amendment documents - only the topics an amendment itself
/// must get right. Parent-contract clauses are deliberately absent.
static AMENDMENT_CHECKLIST: &[ClauseRequirement] = &[
    ClauseRequirement {
        id: "amendment_parent_reference",
        category: "parent_reference",
        severity: Severity::High,
        necessity: Necessity::Mandatory,
        title: "Bezug zum Hauptvertrag fehlt oder ist unklar",
        presence: &[
            r"(?i)vertrag\s+vom\s+\d{1,2}\.\d{1,2}\.\d{2,4}",
            r"(?i)hauptvertrag|ursprungsvertrag|ursprünglichen\s+vertrag",
            r"(?i)agreement\s+dated",
        ],
        adequacy: &[],
        rationale: "Ein Nachtrag ohne eindeutigen Bezug auf den geänderten Vertrag (Datum, \
            Parteien) lässt offen, welches Vertragsverhältnis geändert wird.",
        benchmark: "100% professioneller Nachträge referenzieren den Hauptvertrag mit Datum",
    },
    ClauseRequirement {
        id: "amendment_effective_date",
        category: "effective_date",
        severity: Severity::High,
        necessity: Necessity::Mandatory,
        title: "Wirksamkeitsdatum der Änderung fehlt",
        presence: &[
            r"(?i)mit\s+wirkung\s+(?:zum|ab)",
            r"(?i)wirksam\s+(?:ab|zum)",
            r"(?i)tritt\s+am\s+\d{1,2}\.\d{1,2}\.\d{2,4}",
            r"(?i)effective\s+(?:as\s+of|date|from)",
        ],
        adequacy: &[],
        rationale: "Ohne Wirksamkeitsdatum ist unklar, ab wann die geänderten Konditionen \
            gelten; bei Vergütungsänderungen drohen Rückrechnungsstreitigkeiten.",
        benchmark: "98% professioneller Nachträge nennen ein ausdrückliches Wirksamkeitsdatum",
    },
    ClauseRequirement {
        id: "amendment_scope",
        category: "scope_of_change",
        severity: Severity::Medium,
        necessity: Necessity::RiskBased,
        title: "Änderungsumfang nicht klar abgegrenzt",
        presence: &[
            r"(?i)wie\s+folgt\s+geändert",
            r"(?i)folgende\s+änderung",
            r"(?i)wird\s+ersetzt\s+durch|erhält\s+folgende\s+fassung",
            r"(?i)is\s+(?:hereby\s+)?amended",
        ],
        adequacy: &[],
        rationale: "Der Nachtrag muss klar benennen, welche Regelungen in welcher Fassung \
            geändert werden; pauschale Änderungsformeln erzeugen Auslegungsstreit.",
        benchmark: "95% professioneller Nachträge zitieren die geänderten Klauseln wörtlich",
    },
    ClauseRequirement {
        id: "amendment_continuation",
        category: "severability",
        severity: Severity::Medium,
        necessity: Necessity::BestPractice,
        title: "Fortgeltung der übrigen Regelungen nicht bestätigt",
        presence: &[
            r"(?i)übrigen\s+(?:regelungen|bestimmungen)\s+bleiben",
            r"(?i)im\s+übrigen\s+(?:gilt|bleibt)",
            r"(?i)unberührt",
            r"(?i)remain\s+in\s+full\s+force",
        ],
        adequacy: &[],
        rationale: "Die Klarstellung, dass alle nicht geänderten Regelungen fortgelten, \
            verhindert den Einwand einer konkludenten Gesamtänderung.",
        benchmark: "93% professioneller Nachträge enthalten eine Fortgeltungsklausel",
    },
    ClauseRequirement {
        id: "amendment_signatures",
        category: "signatures",
        severity: Severity::Medium,
        necessity: Necessity::Mandatory,
        title: "Unterschriftenblock fehlt",
        presence: &[r"(?i)unterschrift|unterzeichnet|signature|ort,?\s*datum"],
        adequacy: &[],
        rationale: "Unterliegt der Hauptvertrag der Schriftform, erfasst das \
            Formerfordernis nach § 126 BGB regelmäßig auch den Nachtrag.",
        benchmark: "100% wirksamer Nachträge tragen die Unterschriften beider Parteien",
    },
];

lazy_static! {
    /// Compiled presence/adequacy patterns per requirement id.
    static ref COMPILED: HashMap<&'static str, (Vec<Regex>, Vec<Regex>)> = {
        let mut map = HashMap::new();
        for req in all_requirements() {
            let presence = req
                .presence
                .iter()
                .map(|p| Regex::new(p).unwrap())
                .collect();
            let adequacy = req
                .adequacy
                .iter()
                .map(|p| Regex::new(p).unwrap())
                .collect();
            map.insert(req.id, (presence, adequacy));
        }
        map
    };
}

fn all_requirements() -> impl Iterator<Item = &'static ClauseRequirement> {
    BASELINE_CHECKLIST
        .iter()
        .chain(TYPE_EXTRAS.iter().flat_map(|(_, extras)| extras.iter()))
        .chain(AMENDMENT_CHECKLIST.iter())
}

/// Effective checklist for a full contract of the given kind.
pub fn type_checklist(kind: ContractKind) -> Vec<&'static ClauseRequirement> {
    let extras: &[ClauseRequirement] = TYPE_EXTRAS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, e)| *e)
        .unwrap_or(&[]);

    let mut checklist: Vec<&'static ClauseRequirement> = BASELINE_CHECKLIST
        .iter()
        .filter(|base| !extras.iter().any(|extra| extra.category == base.category))
        .collect();
    checklist.extend(extras.iter());
    checklist
}

/// Category tags with positive clause evidence in the text, for the
/// classifier's detected-clause list.
pub fn detect_clauses(text: &str, kind: ContractKind) -> Vec<String> {
    let mut tags = Vec::new();
    for req in type_checklist(kind) {
        if presence_match(text, req).is_some() && !tags.iter().any(|t: &String| t == req.category) {
            tags.push(req.category.to_string());
        }
    }
    tags
}

fn presence_match<'t>(text: &'t str, req: &ClauseRequirement) -> Option<regex::Match<'t>> {
    let (presence, _) = &COMPILED[req.id];
    presence.iter().find_map(|re| re.find(text))
}

fn adequacy_met(text: &str, req: &ClauseRequirement) -> bool {
    let (_, adequacy) = &COMPILED[req.id];
    adequacy.is_empty() || adequacy.iter().any(|re| re.is_match(text))
}

/// Deterministic rule engine over the declarative checklists.
#[derive(Debug, Default)]
pub struct GapAnalyzer;

impl GapAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Flag missing and weak clauses for the document.
    ///
    /// Amendments are checked only against the amendment checklist; the
    /// suppressed parent-contract categories are reported via
    /// [`Self::suppressed_categories`] for diagnostics.
    pub fn analyze(&self, text: &str, type_info: &ContractTypeInfo) -> Vec<Gap> {
        let checklist: Vec<&ClauseRequirement> = if type_info.is_amendment {
            AMENDMENT_CHECKLIST.iter().collect()
        } else {
            type_checklist(type_info.kind)
        };

        let mut gaps = Vec::new();
        for req in checklist {
            match presence_match(text, req) {
                None => gaps.push(Self::gap_from(req, GapKind::MissingClause, None)),
                Some(m) if !adequacy_met(text, req) => {
                    let excerpt = excerpt_around(text, m.start(), m.end());
                    gaps.push(Self::gap_from(req, GapKind::WeakClause, Some(excerpt)));
                }
                Some(_) => {}
            }
        }

        tracing::debug!(
            gaps = gaps.len(),
            amendment = type_info.is_amendment,
            kind = type_info.kind.tag(),
            "gap analysis complete"
        );
        gaps
    }

    /// Categories the Document Scope Gate suppressed for an amendment.
    pub fn suppressed_categories(&self, type_info: &ContractTypeInfo) -> Vec<&'static str> {
        if !type_info.is_amendment {
            return Vec::new();
        }
        type_checklist(type_info.kind)
            .iter()
            .map(|req| req.category)
            .filter(|cat| !AMENDMENT_CHECKLIST.iter().any(|a| a.category == *cat))
            .collect()
    }

    fn gap_from(req: &ClauseRequirement, kind: GapKind, excerpt: Option<String>) -> Gap {
        Gap {
            clause_id: req.id.to_string(),
            category: req.category.to_string(),
            severity: req.severity,
            kind,
            rationale: req.rationale.to_string(),
            title: req.title.to_string(),
            matched_excerpt: excerpt,
            necessity: req.necessity,
            benchmark: Some(req.benchmark.to_string()),
        }
    }
}

/// Verbatim excerpt around a match, extended to at most 160 chars on
/// character boundaries.
fn excerpt_around(text: &str, start: usize, end: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(40)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let mut to = end;
    let mut budget = 120usize;
    for (offset, ch) in text[end..].char_indices() {
        if budget == 0 {
            break;
        }
        to = end + offset + ch.len_utf8();
        budget -= 1;
    }
    text[from..to].trim().to_string()
}
