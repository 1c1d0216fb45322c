//! Clause synthesis from legal-language templates
//!
//! Renders a compliant replacement clause for each gap. Templates are
//! versioned, declarative data keyed by clause id; every rendered clause is
//! self-contained prose with its statutory basis and no placeholders, so it
//! can be adopted verbatim.

use std::collections::HashMap;

use crate::classifier::ContractTypeInfo;
use crate::finding::Gap;
use crate::taxonomy::{roles, Jurisdiction};

/// Template revision, reported in diagnostics.
pub const TEMPLATE_VERSION: &str = "2025-06";

/// One clause template.
#[derive(Debug)]
struct ClauseTemplate {
    clause_id: &'static str,
    text: &'static str,
}

static TEMPLATES: &[ClauseTemplate] = &[
    ClauseTemplate {
        clause_id: "parties",
        text: "Vertragsparteien: Dieser Vertrag wird geschlossen zwischen den im Rubrum mit \
            vollständigem Namen, Anschrift und gesetzlicher Vertretung bezeichneten Parteien. \
            Die Parteien werden im Folgenden einzeln als Partei und gemeinsam als Parteien \
            bezeichnet. Nach § 126 BGB und der Rechtsprechung des BGH müssen die \
            Vertragsparteien so bestimmt bezeichnet sein, dass eine Verwechslung \
            ausgeschlossen ist.",
    },
    ClauseTemplate {
        clause_id: "termination",
        text: "Ordentliche Kündigung: Beide Vertragsparteien können diesen Vertrag mit einer \
            Frist von drei Monaten zum Ende eines Kalendermonats ordentlich kündigen. Die \
            Kündigung bedarf zu ihrer Wirksamkeit der Schriftform gemäß § 126 BGB; die \
            elektronische Form ist ausgeschlossen. Das Recht zur außerordentlichen Kündigung \
            aus wichtigem Grund nach § 314 BGB bleibt unberührt.",
    },
    ClauseTemplate {
        clause_id: "liability",
        text: "Haftung: Die Haftung für leichte Fahrlässigkeit ist ausgeschlossen, soweit \
            keine wesentlichen Vertragspflichten verletzt werden. Bei leicht fahrlässiger \
            Verletzung wesentlicher Vertragspflichten ist die Haftung auf den \
            vertragstypischen, vorhersehbaren Schaden begrenzt. Diese Beschränkungen gelten \
            nicht für Schäden aus der Verletzung des Lebens, des Körpers oder der Gesundheit, \
            für Vorsatz und grobe Fahrlässigkeit sowie für Ansprüche nach dem \
            Produkthaftungsgesetz (§ 276 BGB, § 309 Nr. 7 BGB).",
    },
    ClauseTemplate {
        clause_id: "payment_terms",
        text: "Vergütung und Zahlungsbedingungen: Die vereinbarte Vergütung versteht sich \
            zuzüglich der gesetzlichen Umsatzsteuer und ist innerhalb von vierzehn Tagen nach \
            Zugang einer ordnungsgemäßen Rechnung ohne Abzug fällig. Bei Zahlungsverzug \
            werden Verzugszinsen in Höhe von neun Prozentpunkten über dem Basiszinssatz \
            gemäß § 288 Abs. 2 BGB berechnet. Die Aufrechnung ist nur mit unbestrittenen oder \
            rechtskräftig festgestellten Forderungen zulässig.",
    },
    ClauseTemplate {
        clause_id: "data_protection",
        text: "Datenschutz: Die Parteien verpflichten sich zur Einhaltung der \
            Datenschutz-Grundverordnung und des Bundesdatenschutzgesetzes. Personenbezogene \
            Daten werden ausschließlich zur Vertragserfüllung gemäß Art. 6 Abs. 1 lit. b \
            DSGVO verarbeitet. Jede Partei trifft geeignete technische und organisatorische \
            Maßnahmen nach Art. 32 DSGVO und informiert die andere Partei unverzüglich über \
            Datenschutzverletzungen nach Art. 33, 34 DSGVO. Bei Vertragsende sind \
            personenbezogene Daten zu löschen, soweit keine gesetzliche Aufbewahrungspflicht \
            besteht.",
    },
    ClauseTemplate {
        clause_id: "jurisdiction",
        text: "Gerichtsstand und anwendbares Recht: Auf diesen Vertrag findet ausschließlich \
            das Recht der Bundesrepublik Deutschland unter Ausschluss des UN-Kaufrechts \
            Anwendung. Ausschließlicher Gerichtsstand für alle Streitigkeiten aus oder im \
            Zusammenhang mit diesem Vertrag ist, soweit gesetzlich zulässig (§ 38 ZPO), der \
            Sitz der leistungserbringenden Partei; dieser ist zugleich Erfüllungsort.",
    },
    ClauseTemplate {
        clause_id: "severability",
        text: "Salvatorische Klausel: Sollten einzelne Bestimmungen dieses Vertrages \
            unwirksam oder undurchführbar sein oder werden, bleibt die Wirksamkeit der \
            übrigen Bestimmungen unberührt (§ 139 BGB). Die Parteien verpflichten sich, die \
            unwirksame Bestimmung durch eine wirksame Regelung zu ersetzen, die dem \
            wirtschaftlichen Zweck der unwirksamen Bestimmung am nächsten kommt; dasselbe \
            gilt für Regelungslücken.",
    },
    ClauseTemplate {
        clause_id: "written_form",
        text: "Schriftform: Änderungen und Ergänzungen dieses Vertrages bedürfen zu ihrer \
            Wirksamkeit der Schriftform gemäß § 126 BGB, soweit nicht gesetzlich eine \
            strengere Form vorgeschrieben ist. Dies gilt auch für die Aufhebung dieses \
            Schriftformerfordernisses selbst. Mündliche Nebenabreden bestehen nicht.",
    },
    ClauseTemplate {
        clause_id: "employment_compensation",
        text: "Vergütung: Die Arbeitnehmerseite erhält eine monatliche Bruttovergütung, die \
            betragsmäßig im Vertrag beziffert und jeweils zum Monatsende bargeldlos auf das \
            benannte Konto gezahlt wird (§ 611a Abs. 2 BGB). Überstunden werden gesondert \
            vergütet oder durch Freizeit ausgeglichen; eine pauschale Abgeltung ist auf \
            höchstens zehn Prozent der regelmäßigen Arbeitszeit begrenzt und transparent \
            auszuweisen.",
    },
    ClauseTemplate {
        clause_id: "employment_working_hours",
        text: "Arbeitszeit: Die regelmäßige Arbeitszeit beträgt vierzig Stunden pro Woche, \
            verteilt auf die Werktage Montag bis Freitag. Beginn und Ende der täglichen \
            Arbeitszeit richten sich nach den betrieblichen Regelungen. Die Grenzen des \
            Arbeitszeitgesetzes, insbesondere § 3 ArbZG mit acht Stunden werktäglicher \
            Höchstarbeitszeit, bleiben unberührt.",
    },
    ClauseTemplate {
        clause_id: "employment_vacation",
        text: "Urlaub: Der jährliche Erholungsurlaub beträgt dreißig Arbeitstage bei einer \
            Fünftagewoche und damit mehr als der gesetzliche Mindesturlaub von \
            vierundzwanzig Werktagen nach § 3 BUrlG. Der Urlaub ist im laufenden \
            Kalenderjahr zu nehmen; die Übertragung richtet sich nach § 7 Abs. 3 BUrlG.",
    },
    ClauseTemplate {
        clause_id: "employment_term",
        text: "Beginn und Dauer: Das Arbeitsverhältnis beginnt zu dem im Vertrag genannten \
            Kalendertag und wird auf unbestimmte Zeit geschlossen. Eine Befristung bedarf \
            nach § 14 Abs. 4 TzBfG der Schriftform und ist nur wirksam, wenn sie vor \
            Arbeitsaufnahme vereinbart wurde.",
    },
    ClauseTemplate {
        clause_id: "lease_rent",
        text: "Miete: Die monatliche Nettokaltmiete ist betragsmäßig im Vertrag beziffert \
            und zusammen mit den Betriebskostenvorauszahlungen bis zum dritten Werktag eines \
            Monats im Voraus zu entrichten (§ 556b BGB). Mieterhöhungen richten sich nach \
            den §§ 557 ff. BGB.",
    },
    ClauseTemplate {
        clause_id: "lease_object",
        text: "Mietsache: Vermietet werden die im Vertrag nach Anschrift, Geschoss und \
            Wohnfläche genau bezeichneten Räume einschließlich der mitvermieteten Neben- \
            und Kellerräume. Der Vermieter überlässt die Mietsache in einem zum \
            vertragsgemäßen Gebrauch geeigneten Zustand und erhält sie in diesem Zustand \
            (§ 535 Abs. 1 BGB).",
    },
    ClauseTemplate {
        clause_id: "lease_operating_costs",
        text: "Betriebskosten: Der Mieter trägt die Betriebskosten im Sinne des § 2 der \
            Betriebskostenverordnung, die als monatliche Vorauszahlung erhoben und jährlich \
            abgerechnet werden (§ 556 BGB). Die Abrechnung ist dem Mieter spätestens zwölf \
            Monate nach Ende des Abrechnungszeitraums mitzuteilen.",
    },
    ClauseTemplate {
        clause_id: "purchase_price",
        text: "Kaufpreis: Der Kaufpreis ist betragsmäßig im Vertrag beziffert und innerhalb \
            von vierzehn Tagen nach Übergabe der Kaufsache und Rechnungszugang zur Zahlung \
            fällig (§ 433 Abs. 2 BGB). Bis zur vollständigen Zahlung behält sich der \
            Verkäufer das Eigentum an der Kaufsache vor (§ 449 BGB).",
    },
    ClauseTemplate {
        clause_id: "purchase_object",
        text: "Kaufgegenstand: Verkauft wird die im Vertrag nach Art, Beschaffenheit und \
            gegebenenfalls Serien- oder Fahrgestellnummer genau bezeichnete Sache. Der \
            Verkäufer verschafft dem Käufer das Eigentum frei von Rechten Dritter (§ 433 \
            Abs. 1 BGB).",
    },
    ClauseTemplate {
        clause_id: "purchase_warranty",
        text: "Gewährleistung: Es gelten die gesetzlichen Mängelrechte der §§ 434 ff. BGB. \
            Unter Kaufleuten gelten die Untersuchungs- und Rügeobliegenheiten des § 377 HGB; \
            offensichtliche Mängel sind innerhalb von zehn Arbeitstagen nach Ablieferung \
            schriftlich zu rügen. Die Verjährung richtet sich nach § 438 BGB.",
    },
    ClauseTemplate {
        clause_id: "purchase_delivery",
        text: "Lieferung und Gefahrübergang: Die Lieferung erfolgt zu dem im Vertrag \
            vereinbarten Termin an die vereinbarte Lieferadresse. Die Gefahr des zufälligen \
            Untergangs geht mit Übergabe der Kaufsache auf den Käufer über (§ 446 BGB); beim \
            Versendungskauf gilt § 447 BGB nur, soweit ausdrücklich vereinbart.",
    },
    ClauseTemplate {
        clause_id: "service_fee",
        text: "Vergütung: Die Leistungen werden nach dem im Vertrag bezifferten Stundensatz \
            oder Pauschalhonorar vergütet (§ 611 BGB). Die Abrechnung erfolgt monatlich mit \
            prüffähigem Tätigkeitsnachweis; Rechnungen sind innerhalb von vierzehn Tagen \
            ohne Abzug zahlbar. Reisekosten werden nur nach vorheriger Abstimmung erstattet.",
    },
    ClauseTemplate {
        clause_id: "service_scope",
        text: "Leistungsumfang: Der Auftragnehmer erbringt die im Leistungsverzeichnis \
            abschließend beschriebenen Leistungen mit der Sorgfalt eines ordentlichen \
            Fachunternehmens (§§ 611, 241 Abs. 2 BGB). Leistungsänderungen und \
            Zusatzleistungen bedürfen einer vorherigen Vereinbarung in Textform unter \
            Anpassung von Vergütung und Terminen.",
    },
    ClauseTemplate {
        clause_id: "saas_fee",
        text: "Entgelt: Das monatliche Subskriptionsentgelt ist im Vertrag beziffert und \
            jeweils im Voraus zu Beginn des Abrechnungsmonats fällig. Preisanpassungen sind \
            mit einer Ankündigungsfrist von drei Monaten zum Laufzeitende zulässig und \
            berechtigen den Kunden zur Kündigung zum Wirksamwerden der Anpassung.",
    },
    ClauseTemplate {
        clause_id: "saas_service_levels",
        text: "Verfügbarkeit: Der Anbieter schuldet eine Verfügbarkeit des Dienstes von \
            99,5 Prozent im Monatsmittel am Übergabepunkt seines Rechenzentrums, geplante \
            und angekündigte Wartungsfenster ausgenommen. Unterschreitungen berechtigen den \
            Kunden zu einer anteiligen Minderung des Monatsentgelts; die Nachweisführung \
            erfolgt über das Monitoring des Anbieters.",
    },
    ClauseTemplate {
        clause_id: "saas_support",
        text: "Support: Der Anbieter stellt an Werktagen von neun bis siebzehn Uhr einen \
            Support bereit. Störungsmeldungen werden nach Schweregrad klassifiziert; bei \
            betriebsverhindernden Störungen beginnt die Entstörung innerhalb von vier \
            Stunden, bei sonstigen Störungen innerhalb eines Arbeitstages.",
    },
    ClauseTemplate {
        clause_id: "saas_dpa",
        text: "Auftragsverarbeitung: Soweit der Anbieter personenbezogene Daten im Auftrag \
            des Kunden verarbeitet, schließen die Parteien einen \
            Auftragsverarbeitungsvertrag nach Art. 28 Abs. 3 DSGVO, der Gegenstand, Dauer, \
            Art und Zweck der Verarbeitung, die Datenarten, die Betroffenenkategorien sowie \
            die technischen und organisatorischen Maßnahmen nach Art. 32 DSGVO festlegt. \
            Unterauftragsverhältnisse bedürfen der vorherigen Genehmigung.",
    },
    ClauseTemplate {
        clause_id: "nda_definition",
        text: "Vertrauliche Informationen: Vertraulich sind alle Informationen, die eine \
            Partei der anderen im Zusammenhang mit der Zusammenarbeit offenlegt und die als \
            vertraulich gekennzeichnet sind oder deren Vertraulichkeit sich aus den \
            Umständen ergibt, insbesondere Geschäftsgeheimnisse im Sinne des § 2 Nr. 1 \
            GeschGehG. Nicht erfasst sind Informationen, die öffentlich bekannt sind, \
            rechtmäßig von Dritten erlangt wurden oder nachweislich unabhängig entwickelt \
            worden sind.",
    },
    ClauseTemplate {
        clause_id: "nda_term",
        text: "Dauer der Geheimhaltung: Die Geheimhaltungspflichten gelten für die Dauer der \
            Zusammenarbeit und für einen Zeitraum von fünf Jahren nach deren Beendigung. \
            Für Geschäftsgeheimnisse im Sinne des GeschGehG gilt der gesetzliche Schutz \
            zeitlich unbegrenzt fort, solange die Geheimhaltungsvoraussetzungen vorliegen.",
    },
    ClauseTemplate {
        clause_id: "work_remuneration",
        text: "Werklohn: Der Werklohn ist als Festpreis im Vertrag beziffert und wird mit \
            der Abnahme des Werkes fällig (§ 641 BGB). Abschlagszahlungen können nach \
            Maßgabe des § 632a BGB für vertragsgemäß erbrachte Leistungen verlangt werden.",
    },
    ClauseTemplate {
        clause_id: "work_acceptance",
        text: "Abnahme: Der Besteller ist zur Abnahme des vertragsgemäß hergestellten Werkes \
            verpflichtet (§ 640 BGB). Die Abnahme erfolgt förmlich unter gemeinsamer \
            Begehung und Protokollierung; sie gilt als erfolgt, wenn der Besteller nicht \
            innerhalb von zwölf Werktagen nach Fertigstellungsanzeige und Aufforderung unter \
            Angabe mindestens eines Mangels die Abnahme verweigert.",
    },
    ClauseTemplate {
        clause_id: "license_grant",
        text: "Rechtseinräumung: Der Lizenzgeber räumt dem Lizenznehmer das einfache, nicht \
            ausschließliche, nicht übertragbare und nicht unterlizenzierbare Recht ein, den \
            Lizenzgegenstand für eigene Geschäftszwecke zu nutzen. Umfang, Gebiet und Dauer \
            der Nutzung sind im Vertrag abschließend beschrieben; nach der \
            Zweckübertragungslehre des § 31 Abs. 5 UrhG verbleiben nicht ausdrücklich \
            eingeräumte Rechte beim Lizenzgeber.",
    },
    ClauseTemplate {
        clause_id: "license_fee",
        text: "Lizenzgebühr: Die Lizenzgebühr ist im Vertrag beziffert und jährlich im \
            Voraus fällig. Bei umsatzabhängigen Gebühren legt der Lizenznehmer innerhalb von \
            dreißig Tagen nach Quartalsende eine prüffähige Abrechnung vor; dem Lizenzgeber \
            steht ein Buchprüfungsrecht durch einen zur Verschwiegenheit verpflichteten \
            Wirtschaftsprüfer zu.",
    },
    ClauseTemplate {
        clause_id: "loan_interest",
        text: "Zinsen und Tilgung: Das Darlehen wird mit dem im Vertrag bezifferten \
            Sollzinssatz pro Jahr verzinst (§ 488 Abs. 1 BGB). Zins und Tilgung sind in \
            gleichbleibenden monatlichen Raten jeweils zum Monatsletzten zu erbringen; \
            Sondertilgungen sind zum Ende eines Zinsjahres ohne Vorfälligkeitsentschädigung \
            zulässig.",
    },
    ClauseTemplate {
        clause_id: "loan_term",
        text: "Laufzeit: Das Darlehen hat die im Vertrag genannte feste Laufzeit und ist am \
            Laufzeitende zur Rückzahlung in einer Summe fällig, soweit es nicht durch \
            laufende Tilgung bereits zurückgeführt ist. Das ordentliche Kündigungsrecht des \
            Darlehensnehmers nach § 489 BGB bleibt unberührt.",
    },
    ClauseTemplate {
        clause_id: "amendment_parent_reference",
        text: "Bezug zum Hauptvertrag: Dieser Nachtrag ändert den zwischen den Parteien \
            geschlossenen Hauptvertrag, der im Rubrum dieses Nachtrags nach Datum und \
            Parteien eindeutig bezeichnet ist. Begriffe, die in diesem Nachtrag nicht \
            definiert sind, haben die ihnen im Hauptvertrag zugewiesene Bedeutung.",
    },
    ClauseTemplate {
        clause_id: "amendment_effective_date",
        text: "Wirksamwerden: Die in diesem Nachtrag vereinbarten Änderungen treten zu dem \
            im Nachtrag genannten Kalendertag in Kraft. Fehlt ein abweichender Stichtag, \
            werden die Änderungen mit Unterzeichnung durch beide Parteien wirksam.",
    },
    ClauseTemplate {
        clause_id: "amendment_scope",
        text: "Änderungsumfang: Dieser Nachtrag ändert ausschließlich die in ihm ausdrücklich \
            bezeichneten Regelungen des Hauptvertrags; die geänderten Bestimmungen werden \
            jeweils im Wortlaut wiedergegeben und durch die neue Fassung ersetzt. Weitere \
            Änderungen sind mit diesem Nachtrag nicht verbunden.",
    },
    ClauseTemplate {
        clause_id: "amendment_continuation",
        text: "Fortgeltung: Alle übrigen Regelungen des Hauptvertrags bleiben von diesem \
            Nachtrag unberührt und gelten unverändert fort. Bei Widersprüchen zwischen \
            diesem Nachtrag und dem Hauptvertrag gehen die Regelungen dieses Nachtrags vor.",
    },
    ClauseTemplate {
        clause_id: "amendment_signatures",
        text: "Unterschriften: Dieser Nachtrag wird von beiden Parteien unter Angabe von Ort \
            und Datum eigenhändig unterzeichnet. Unterliegt der Hauptvertrag einem \
            Formerfordernis, wahrt dieser Nachtrag dieselbe Form (§ 126 BGB).",
    },
];

/// Template engine over the declarative clause-template table.
#[derive(Debug, Default)]
pub struct ClauseSynthesizer;

impl ClauseSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Render replacement clause text for each gap, keyed by clause id.
    ///
    /// Gaps without a template fall back to a generated clause that restates
    /// the rationale, so every gap always yields usable text.
    pub fn synthesize(
        &self,
        type_info: &ContractTypeInfo,
        jurisdiction: Jurisdiction,
        gaps: &[Gap],
    ) -> HashMap<String, String> {
        let mut out = HashMap::with_capacity(gaps.len());
        for gap in gaps {
            let text = self
                .template_for(&gap.clause_id, jurisdiction)
                .map(|t| t.to_string())
                .unwrap_or_else(|| Self::generic_clause(type_info, gap));
            out.insert(gap.clause_id.clone(), text);
        }
        out
    }

    /// Look up the template for a clause id.
    ///
    /// Templates are currently maintained for German law; other
    /// jurisdictions fall back to the DE text until reviewed variants exist.
    pub fn template_for(&self, clause_id: &str, _jurisdiction: Jurisdiction) -> Option<&'static str> {
        TEMPLATES
            .iter()
            .find(|t| t.clause_id == clause_id)
            .map(|t| t.text)
    }

    fn generic_clause(type_info: &ContractTypeInfo, gap: &Gap) -> String {
        let (party_a, party_b) = roles(type_info.kind);
        format!(
            "Ergänzende Regelung: {party_a} und {party_b} vereinbaren eine ausdrückliche \
             vertragliche Regelung zu folgendem Punkt: {}. {}",
            gap.title, gap.rationale
        )
    }
}
