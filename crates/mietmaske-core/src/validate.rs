//! Per-step required-field rules for both wizards.
//!
//! A step is valid when its error map is empty. Messages are fixed German
//! strings shown next to the offending field.

use std::collections::BTreeMap;

use crate::intake::{ClientIntake, ContractType, PetPolicy};
use crate::lawyer::{Compensation, LawyerDecisions, RentAdjustment, RentLimit};

/// Field key → error message.
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

pub const CLIENT_STEPS: [&str; 8] = [
    "Rolle & Kontakt",
    "Mietobjekt",
    "Zustand & Schlüssel",
    "Mietzeit",
    "Miete & Kosten",
    "Nutzung & Tiere",
    "Kaution & Übergabe",
    "Zusammenfassung",
];

pub const LAWYER_STEPS: [&str; 8] = [
    "Mandantendaten",
    "Vertragsgestaltung",
    "Miete & BK",
    "Nutzung",
    "Instandhaltung",
    "Haftung",
    "Anlagen",
    "Zusammenfassung",
];

/// Accumulates errors for one step.
#[derive(Default)]
struct Rules {
    errors: FieldErrors,
}

impl Rules {
    fn text(&mut self, value: &str, key: &'static str, message: &'static str) {
        if value.trim().is_empty() {
            self.errors.insert(key, message);
        }
    }

    fn choice<T>(&mut self, value: &Option<T>, key: &'static str, message: &'static str) {
        if value.is_none() {
            self.errors.insert(key, message);
        }
    }

    fn list(&mut self, value: &[String], key: &'static str, message: &'static str) {
        if value.is_empty() {
            self.errors.insert(key, message);
        }
    }

    fn when(&mut self, condition: bool, key: &'static str, message: &'static str) {
        if condition {
            self.errors.insert(key, message);
        }
    }
}

// ── Client intake ──

/// Errors for one client step. Steps outside 0..=6 (the summary) have no
/// rules.
pub fn validate_client_step(step: usize, intake: &ClientIntake) -> FieldErrors {
    let mut r = Rules::default();
    match step {
        0 => {
            r.choice(&intake.role, "rolle", "Bitte wählen Sie Ihre Rolle.");
            r.text(&intake.own_name, "eigene_name", "Name ist erforderlich.");
            r.text(&intake.own_address, "eigene_anschrift", "Anschrift ist erforderlich.");
            r.text(&intake.own_email, "eigene_email", "E-Mail ist erforderlich.");
            r.text(&intake.own_phone, "eigene_telefon", "Telefon ist erforderlich.");
            r.text(&intake.own_iban, "eigene_iban", "IBAN ist erforderlich.");
            if intake.is_represented() {
                r.text(
                    &intake.representative,
                    "vertreten_durch",
                    "Bitte benennen Sie den Vertreter.",
                );
                r.choice(
                    &intake.power_of_attorney,
                    "vollmacht",
                    "Bitte wählen Sie eine Option zur Vollmacht.",
                );
            }
            r.choice(
                &intake.counterparty_known,
                "gegenpartei",
                "Bitte wählen Sie, ob die Gegenpartei bekannt ist.",
            );
            if intake.counterparty_is_known() {
                r.text(
                    &intake.counterparty_name,
                    "gegenpartei_name",
                    "Name der Gegenpartei ist erforderlich.",
                );
                r.text(
                    &intake.counterparty_address,
                    "gegenpartei_anschrift",
                    "Bitte geben Sie die Anschrift an.",
                );
                r.text(
                    &intake.counterparty_email,
                    "gegenpartei_email",
                    "Bitte geben Sie eine E-Mail an.",
                );
            }
        }
        1 => {
            r.text(&intake.property_address, "objektadresse", "Objektadresse ist erforderlich.");
            r.choice(&intake.unit_type, "wohnungsart", "Bitte wählen Sie die Wohnungsart.");
            r.text(&intake.floor_area, "wohnflaeche", "Wohnfläche ist erforderlich.");
            r.text(
                &intake.move_in_ready,
                "bezugsfertig",
                "Bitte wählen Sie das Bezugsfertig-Datum.",
            );
            r.choice(&intake.condo, "weg", "Bitte wählen Sie eine Option zur WEG.");
        }
        2 => {
            r.choice(&intake.condition, "zustand", "Bitte wählen Sie den Zustand.");
            r.choice(
                &intake.handover_protocol,
                "uebergabeprotokoll",
                "Bitte wählen Sie, ob ein Übergabeprotokoll geführt wird.",
            );
            r.choice(&intake.noise, "laerm", "Bitte wählen Sie die Lärmquelle aus.");
            r.list(
                &intake.key_types,
                "schluessel_arten",
                "Bitte wählen Sie mindestens eine Schlüsselart aus.",
            );
            r.text(
                &intake.key_count,
                "schluessel_anzahl",
                "Bitte geben Sie die Schlüsselanzahl an.",
            );
        }
        3 => {
            r.text(&intake.lease_start, "mietbeginn", "Mietbeginn ist erforderlich.");
            r.choice(&intake.contract_type, "vertragsart", "Bitte wählen Sie die Vertragsart.");
            if intake.contract_type == Some(ContractType::FixedTerm) {
                r.text(&intake.lease_end, "mietende", "Bitte geben Sie das Mietende an.");
                r.choice(
                    &intake.fixed_term_reason,
                    "befristungsgrund",
                    "Bitte wählen Sie den Befristungsgrund.",
                );
                r.text(
                    &intake.fixed_term_justification,
                    "befristungsgrund_text",
                    "Bitte begründen Sie die Befristung.",
                );
            }
        }
        4 => {
            r.text(&intake.base_rent, "grundmiete", "Grundmiete ist erforderlich.");
            r.choice(&intake.payment_method, "zahlungsart", "Bitte wählen Sie die Zahlungsart.");
            r.choice(
                &intake.operating_cost_model,
                "bk_modell",
                "Bitte wählen Sie das Betriebskostenmodell.",
            );
            r.choice(
                &intake.condo_cost_allocation,
                "bk_weg",
                "Bitte wählen Sie eine Option zur BK-Umlage.",
            );
            r.text(
                &intake.heating_prepayment,
                "vz_heizung",
                "Bitte geben Sie die Vorauszahlung Heizung/Warmwasser an.",
            );
            r.text(
                &intake.operating_cost_prepayment,
                "vz_bk",
                "Bitte geben Sie die Betriebskosten-Vorauszahlung an.",
            );
        }
        5 => {
            r.choice(&intake.usage, "nutzung", "Bitte wählen Sie die Nutzung.");
            r.choice(
                &intake.subletting,
                "unterverm",
                "Bitte geben Sie eine Angabe zur Untervermietung an.",
            );
            r.choice(&intake.pets, "tiere", "Bitte wählen Sie eine Option zur Tierhaltung.");
            if intake.pets == Some(PetPolicy::SpecialArrangement) {
                r.text(
                    &intake.pet_details,
                    "tiere_details",
                    "Bitte beschreiben Sie die Sondervereinbarung.",
                );
            }
        }
        6 => {
            r.text(&intake.deposit_months, "kaution", "Bitte geben Sie die Kautionshöhe an.");
            r.choice(
                &intake.deposit_schedule,
                "kaution_zahlweise",
                "Bitte wählen Sie die Zahlweise.",
            );
            r.choice(&intake.deposit_form, "kautionsform", "Bitte wählen Sie die Kautionsform.");
            r.text(
                &intake.handover_date,
                "uebergabedatum",
                "Bitte wählen Sie das Übergabedatum.",
            );
        }
        _ => {}
    }
    r.errors
}

/// Union of every client step's errors, checked before export.
pub fn validate_client_intake(intake: &ClientIntake) -> FieldErrors {
    (0..CLIENT_STEPS.len())
        .flat_map(|step| validate_client_step(step, intake))
        .collect()
}

// ── Lawyer decisions ──

/// Errors for one lawyer step. Step 0 (import) and the summary have no field
/// rules.
pub fn validate_lawyer_step(step: usize, d: &LawyerDecisions) -> FieldErrors {
    let mut r = Rules::default();
    match step {
        1 => {
            r.choice(
                &d.final_contract_type,
                "vertragsart_final",
                "Bitte wählen Sie die Vertragsart.",
            );
        }
        2 => {
            r.choice(
                &d.rent_adjustment,
                "mietanpassung_normalfall",
                "Bitte wählen Sie die Mietanpassung.",
            );
            if d.rent_adjustment == Some(RentAdjustment::Staggered) {
                r.text(
                    &d.staggered_schedule,
                    "staffelmiete_schedule",
                    "Bitte tragen Sie den Staffelmiete-Zeitplan ein.",
                );
            }
            let rc = &d.rent_control;
            if rc.limit == Some(RentLimit::Over) {
                r.when(
                    !rc.has_justification(),
                    "mpb_vormiete",
                    "Bitte wählen Sie mindestens einen MPB-Ausnahmetatbestand.",
                );
                if rc.prior_rent {
                    r.text(
                        &rc.prior_rent_text,
                        "mpb_vormiete_text",
                        "Bitte geben Sie die Vormiete an.",
                    );
                }
                if rc.modernisation {
                    r.text(
                        &rc.modernisation_text,
                        "mpb_modern_text",
                        "Bitte beschreiben Sie die Modernisierung.",
                    );
                }
                if rc.first_letting {
                    r.text(
                        &rc.first_letting_text,
                        "mpb_erstmiete_text",
                        "Bitte geben Sie die Details zur Erstmiete an.",
                    );
                }
            }
        }
        3 => {
            r.choice(
                &d.subletting_clause,
                "unterverm_klausel",
                "Bitte wählen Sie eine Regelung zur Untervermietung.",
            );
            r.choice(
                &d.pet_clause_tone,
                "tiere_ton",
                "Bitte wählen Sie den Klauselton zur Tierhaltung.",
            );
        }
        4 => {
            let sr = &d.renovation;
            r.choice(
                &sr.selected(),
                "sr_renoviert",
                "Bitte wählen Sie ein Schönheitsreparaturen-Modell.",
            );
            if sr.with_compensation {
                r.choice(
                    &sr.compensation,
                    "sr_ausgleich_option",
                    "Bitte wählen Sie eine Ausgleichsoption.",
                );
                match sr.compensation {
                    Some(Compensation::LumpSum) => r.text(
                        &sr.compensation_amount,
                        "sr_ausgleich_betrag",
                        "Bitte geben Sie den Zuschussbetrag ein.",
                    ),
                    Some(Compensation::RentFreeMonths) => r.text(
                        &sr.rent_free_months,
                        "sr_ausgleich_monate",
                        "Bitte geben Sie die Anzahl der mietfreien Monate an.",
                    ),
                    None => {}
                }
            }
            r.text(
                &d.repair_cap_per_incident,
                "kleinrep_je_vorgang",
                "Bitte wählen Sie die Kleinreparatur-Grenze je Vorgang.",
            );
            r.choice(
                &d.repair_cap_annual,
                "kleinrep_jahr",
                "Bitte wählen Sie die Jahresobergrenze für Kleinreparaturen.",
            );
            r.choice(
                &d.return_condition,
                "endrueckgabe",
                "Bitte wählen Sie die Regelung zur Endrückgabe.",
            );
        }
        5 => {
            r.choice(&d.landlord_liability, "haftung_536a", "Bitte wählen Sie die Haftungsregel.");
            r.choice(
                &d.ambient_noise,
                "umgebung_laerm",
                "Bitte wählen Sie die Option zu Umgebungslärm.",
            );
            r.choice(&d.set_off, "aufrechnung", "Bitte treffen Sie eine Aufrechnungsregel.");
            r.choice(&d.sale, "veraeusserung", "Bitte wählen Sie die Veräußerungsregel.");
        }
        6 => {
            r.choice(
                &d.energy_certificate,
                "energieausweis_einbindung",
                "Bitte wählen Sie die Option zum Energieausweis.",
            );
            r.choice(&d.gdpr_notice, "dsgvo_beiblatt", "Bitte wählen Sie die DSGVO-Angabe.");
            r.text(&d.case_handler, "bearbeiter", "Bitte tragen Sie den Bearbeiter ein.");
            r.choice(&d.approved, "freigabe", "Bitte wählen Sie die Freigabe.");
            r.list(&d.attachments, "anlagen", "Bitte wählen Sie die Anlagen aus.");
        }
        _ => {}
    }
    r.errors
}

/// Union of every lawyer step's errors, checked before generation.
pub fn validate_lawyer_decisions(d: &LawyerDecisions) -> FieldErrors {
    (0..LAWYER_STEPS.len())
        .flat_map(|step| validate_lawyer_step(step, d))
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    /// A client intake that passes every step.
    pub fn complete_intake() -> Value {
        json!({
            "rolle": "Vermieter",
            "eigene_name": "Vera Vermieterin",
            "eigene_anschrift": "Hauptstraße 5, 80331 München",
            "eigene_email": "vera@example.com",
            "eigene_telefon": "+49 89 123456",
            "eigene_iban": "DE02120300000000202051",
            "wird_vertreten": "nein",
            "gegenpartei": "Ja",
            "gegenpartei_name": "Tom Mieter",
            "gegenpartei_anschrift": "Altbauweg 2, 10115 Berlin",
            "gegenpartei_email": "tom@example.com",
            "gegenpartei_telefon": "+49 30 987654",
            "objektadresse": "Objektweg 3, 80333 München",
            "wohnung_bez": "3. OG rechts",
            "wohnungsart": "Eigentumswohnung in Mehrfamilienhaus",
            "wohnflaeche": "72",
            "bezugsfertig": "2010-05-01",
            "aussenbereich": ["Balkon"],
            "nebenraeume": ["Keller"],
            "weg": "Ja",
            "mea": "85/1000",
            "zustand": "Unrenoviert",
            "uebergabeprotokoll": true,
            "laerm": "keine besonderen Lärmquellen",
            "schluessel_arten": ["Haustür", "Wohnung"],
            "schluessel_anzahl": "4",
            "mietbeginn": "2025-03-01",
            "vertragsart": "Unbefristet",
            "grundmiete": "1200",
            "vz_heizung": "90",
            "vz_bk": "180",
            "zahlungsart": "Überweisung",
            "bk_modell": "vorauszahlung",
            "bk_weg": "Ja",
            "nutzung": "wohnen",
            "unterverm": "nein",
            "tiere": "kleintiere",
            "kaution": "3",
            "kaution_zahlweise": "In Raten",
            "kautionsform": "Barkaution",
            "uebergabedatum": "2025-02-28"
        })
    }

    /// Lawyer decisions that pass every step.
    pub fn complete_decisions() -> Value {
        json!({
            "vertragsart_final": "unbefristet",
            "kuendigungsverzicht": "2",
            "mietanpassung_normalfall": "index",
            "indexmiete": "Ja",
            "staffelmiete": "Nein",
            "faelligkeit": "spätestens 3. Werktag des Monats",
            "mpb_status": "bereits_vermietet",
            "mpb_vormiet": "nach_juni_2015",
            "mpb_grenze": "ja",
            "zusatz_bk": ["Dachrinnenreinigung"],
            "unterverm_klausel": "nur Zustimmung",
            "tiere_ton": "Standard",
            "sr_unrenoviert_ohne": true,
            "kleinrep_je_vorgang": "100",
            "kleinrep_jahr": "8fach",
            "endrueckgabe": "besenrein",
            "haftung_536a": "generisch",
            "umgebung_laerm": "hinweis",
            "aufrechnung": "nur_unbestritten",
            "veraeusserung": "weitergabe",
            "energieausweis_einbindung": "informativ",
            "dsgvo_beiblatt": "Ja",
            "anlagen": ["Energieausweis", "DSGVO-Informationsblatt"],
            "bearbeiter": "RA Dr. Schmidt",
            "freigabe": "Ja",
            "bearbeitungsdatum": "15.01.2025"
        })
    }
}
