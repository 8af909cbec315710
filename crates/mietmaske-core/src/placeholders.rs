//! Template substitution values derived from a finished intake and decision
//! pair.
//!
//! The mapping is a pure projection: the backend fills `[KEY]` markers in the
//! contract template with these strings.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::derive::{RENT_CONTROL_CUTOFF, format_amount_field, format_decimal_de, parse_form_date};
use crate::intake::{ClientIntake, Role};
use crate::lawyer::{LawyerDecisions, PriorTenancy, RentControl, RentControlStatus, RentLimit};
use crate::wire;

/// Flat placeholder name → substitution text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceholderMapping(pub BTreeMap<String, String>);

impl PlaceholderMapping {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }
}

/// One contracting party as it appears in the contract header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Party<'a> {
    pub name: &'a str,
    pub address: &'a str,
    pub iban: &'a str,
    pub vat_id: &'a str,
    pub tax_number: &'a str,
    pub representative: &'a str,
}

/// Landlord and tenant as seen from the intake's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parties<'a> {
    pub landlord: Party<'a>,
    pub tenant: Party<'a>,
}

/// Assign the intake's own and counterparty blocks to landlord and tenant.
///
/// A tenant client with no named counterparty keeps their own block on the
/// landlord side too, so the contract header is never blank. Without a
/// role the client is treated as the landlord.
pub fn derive_parties(intake: &ClientIntake) -> Parties<'_> {
    let own = Party {
        name: &intake.own_name,
        address: &intake.own_address,
        iban: &intake.own_iban,
        vat_id: &intake.vat_id,
        tax_number: &intake.tax_number,
        representative: if intake.is_represented() {
            &intake.representative
        } else {
            ""
        },
    };
    let counterparty = Party {
        name: &intake.counterparty_name,
        address: &intake.counterparty_address,
        iban: &intake.payer_iban,
        vat_id: "",
        tax_number: "",
        representative: &intake.counterparty_representative,
    };

    match intake.role {
        Some(Role::Tenant) => Parties {
            landlord: if counterparty.name.trim().is_empty() {
                own
            } else {
                counterparty
            },
            tenant: own,
        },
        Some(Role::Landlord) | None => Parties {
            landlord: own,
            tenant: counterparty,
        },
    }
}

/// The city part of a free-text address: its last non-empty comma segment.
pub fn extract_city(address: &str) -> &str {
    address
        .split(',')
        .map(str::trim)
        .rfind(|part| !part.is_empty())
        .unwrap_or_default()
}

/// Numbered annex list plus the 1-based positions of the GDPR notice and the
/// energy certificate (empty when not attached).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnexInfo {
    pub list: String,
    pub gdpr_position: String,
    pub energy_certificate_position: String,
}

pub fn annex_info(attachments: &[String]) -> AnnexInfo {
    let items: Vec<&str> = attachments
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    let list = items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("Anlage MV.{}: {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    let position = |needle: &str| {
        items
            .iter()
            .position(|item| item.to_lowercase().contains(needle))
            .map(|i| (i + 1).to_string())
            .unwrap_or_default()
    };

    AnnexInfo {
        gdpr_position: position("dsgvo"),
        energy_certificate_position: position("energieausweis"),
        list,
    }
}

/// Deposit amount: base rent times deposit months, e.g. `3.600,00 EUR`.
/// Empty when either input is missing or the product is zero.
pub fn deposit_text(intake: &ClientIntake) -> String {
    let amount = wire::amount_or_zero(&intake.base_rent) * wire::amount_or_zero(&intake.deposit_months);
    if amount == 0.0 || !amount.is_finite() {
        return String::new();
    }
    format!("{} EUR", format_decimal_de(amount))
}

pub const NO_EXTRA_COST_ITEMS: &str = "Es werden keine zusätzlichen Positionen vereinbart.";

fn extra_cost_items_text(items: &[String]) -> String {
    let items: Vec<&str> = items.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
    if items.is_empty() {
        return NO_EXTRA_COST_ITEMS.to_string();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

fn condition_text(condition: &str) -> String {
    match condition.trim().to_lowercase().as_str() {
        "renoviert" => "renoviert".into(),
        "neu erstellt" => "ist neu erstellt".into(),
        "gebraucht/vertragsgemäß" => "in gebrauchtem, vertragsgemäßem Zustand".into(),
        _ => condition.to_string(),
    }
}

fn housing_description(intake: &ClientIntake) -> String {
    let mut parts = Vec::new();
    if !intake.unit_label.trim().is_empty() {
        parts.push(intake.unit_label.clone());
    } else if let Some(unit_type) = intake.unit_type {
        parts.push(unit_type.as_wire().to_string());
    }

    let extras = intake
        .ancillary_rooms
        .iter()
        .chain(&intake.outdoor_areas)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if !extras.is_empty() {
        parts.push(extras);
    }
    parts.join("; ")
}

fn first_non_blank<'a>(candidates: impl IntoIterator<Item = &'a str>) -> &'a str {
    candidates
        .into_iter()
        .find(|s| !s.trim().is_empty())
        .unwrap_or_default()
}

// ── Rent-control clause ──

const EXEMPT_NEW_BUILD: &str = "Die Wohnung, die Gegenstand dieses Mietvertrages ist, wurde vor dem \
     1. Oktober 2014 weder genutzt noch vermietet. Eine Nutzung oder Vermietung erfolgte erst nach \
     dem 1. Oktober 2014 (§ 556f BGB).";
const PRIOR_TENANCY_BEFORE: &str = "Das Vormietverhältnis hat vor dem 1. Juni 2015 begonnen.";
const PRIOR_TENANCY_AFTER: &str = "Das Vormietverhältnis hat nach dem 1. Juni 2015 begonnen.";
const WITHIN_LIMIT: &str = "Die in diesem Mietvertrag geforderte Miete überschreitet die nach \
     § 556d BGB (sogenannte „Mietpreisbremse\") zulässige Miete (ortsübliche Miete + 10 %) nicht.";
const OVER_LIMIT: &str = "Die in diesem Mietvertrag geforderte Miete überschreitet die nach \
     § 556d BGB (sogenannte „Mietpreisbremse\") zulässige Miete (ortsübliche Miete + 10 %).";
const OVER_LIMIT_DECLARATION: &str = "Der Vermieter erklärt hiermit vor Mietvertragsabschluss, \
     dass die vereinbarte Miete auf folgender Ausnahme von § 556d BGB (zulässige Miethöhe bei \
     Mietbeginn) beruht:";
const MODERNISATION: &str = "In den letzten drei Jahren vor Beginn dieses Mietverhältnisses wurde \
     eine Modernisierung im Sinne des § 555b BGB durchgeführt, für die eine \
     Modernisierungsmieterhöhung zulässig gewesen wäre (§ 556e Abs. 2 BGB).";
const FIRST_LETTING: &str = "Bei diesem Mietvertragsabschluss handelt es sich um den ersten nach \
     umfassender Modernisierung (§ 556f BGB).";

/// The rent-control clause for the contract, or an empty string when the
/// answers are incomplete.
///
/// Properties ready on or after the cutoff, and new builds, get the § 556f
/// exemption. Otherwise the prior tenancy's start decides whether the limit
/// matters, and an over-limit rent must list at least one justification.
pub fn rent_control_clause(move_in_ready: &str, rc: &RentControl) -> String {
    let Some(ready) = parse_form_date(move_in_ready) else {
        return String::new();
    };
    if ready >= RENT_CONTROL_CUTOFF {
        return EXEMPT_NEW_BUILD.to_string();
    }

    match rc.status {
        Some(RentControlStatus::NewBuild) => return EXEMPT_NEW_BUILD.to_string(),
        Some(RentControlStatus::PreviouslyLet) => {}
        None => return String::new(),
    }

    match rc.prior_tenancy {
        Some(PriorTenancy::BeforeJune2015) => return PRIOR_TENANCY_BEFORE.to_string(),
        Some(PriorTenancy::AfterJune2015) => {}
        None => return String::new(),
    }

    let limit_sentence = match rc.limit {
        Some(RentLimit::Within) => return format!("{PRIOR_TENANCY_AFTER} {WITHIN_LIMIT}"),
        Some(RentLimit::Over) => OVER_LIMIT,
        None => return String::new(),
    };

    let mut lines = Vec::new();
    if rc.prior_rent {
        let amount = rc.prior_rent_text.trim();
        if amount.is_empty() {
            return String::new();
        }
        let amount = wire::parse_amount(amount)
            .map(format_decimal_de)
            .unwrap_or_else(|| amount.to_string());
        lines.push(format!(
            "Die Vormiete gemäß § 556e Abs. 1 BGB betrug {amount} Euro (Nettokaltmiete)."
        ));
    }
    if rc.modernisation {
        lines.push(MODERNISATION.to_string());
        if !rc.modernisation_text.trim().is_empty() {
            lines.push(format!("Details: {}", rc.modernisation_text.trim()));
        }
    }
    if rc.first_letting {
        lines.push(FIRST_LETTING.to_string());
        if !rc.first_letting_text.trim().is_empty() {
            lines.push(format!("Details: {}", rc.first_letting_text.trim()));
        }
    }
    if lines.is_empty() {
        return String::new();
    }

    let numbered = lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{PRIOR_TENANCY_AFTER} {limit_sentence} {OVER_LIMIT_DECLARATION} {numbered}")
}

// ── Mapping ──

/// Build the full placeholder mapping. `today` fills `DATUM` when no
/// processing date was entered.
pub fn build_placeholder_mapping(
    intake: &ClientIntake,
    decisions: &LawyerDecisions,
    today: NaiveDate,
) -> PlaceholderMapping {
    let parties = derive_parties(intake);
    let annexes = annex_info(&decisions.attachments);
    let rc = &decisions.rent_control;
    let enum_text = |value: Option<&'static str>| value.unwrap_or_default().to_string();

    let mut m = PlaceholderMapping::default();
    m.set("AMOUNT", rc.prior_rent_text.as_str());
    m.set("ANZAHL", first_non_blank([intake.key_count.as_str(), intake.deposit_months.as_str()]));
    m.set("ARTEN", intake.key_types.join(", "));
    m.set(
        "AUSSTATTUNG",
        first_non_blank([intake.fittings.as_str(), "keine"]),
    );
    m.set("BETRAG", deposit_text(intake));
    m.set("BETRAG_JE", decisions.repair_cap_per_incident.as_str());
    m.set("COMPLETE_ANNEX_LIST", annexes.list);
    m.set("CUSTOM_PET_TEXT", intake.pet_details.as_str());
    m.set(
        "CUSTOM_SUBLETTING_TEXT",
        enum_text(decisions.subletting_clause.map(|c| c.as_wire())),
    );
    m.set("DATE", intake.move_in_ready.as_str());
    let date = if decisions.processing_date.trim().is_empty() {
        today.format("%d.%m.%Y").to_string()
    } else {
        decisions.processing_date.clone()
    };
    m.set("DATUM", date);
    m.set("DETAILS", intake.pet_details.as_str());
    m.set(
        "ENDARBEITEN_LISTE",
        enum_text(decisions.return_condition.map(|c| c.as_wire())),
    );
    m.set("FLAECHE", format_amount_field(&intake.floor_area));
    m.set(
        "IBAN",
        first_non_blank([
            parties.landlord.iban,
            intake.own_iban.as_str(),
            intake.payer_iban.as_str(),
        ]),
    );
    let years = decisions.notice_waiver_years.trim();
    m.set(
        "JAHRE",
        if wire::amount_or_zero(years) > 0.0 { years } else { "" },
    );
    m.set("LANDLORD_ADDRESS", parties.landlord.address);
    m.set("LANDLORD_NAME", parties.landlord.name);
    m.set("LANDLORD_REPRESENTATIVE", parties.landlord.representative);
    m.set("MEA", intake.co_ownership_share.as_str());
    m.set("MIETBEGINN", intake.lease_start.as_str());
    m.set("MONATE", decisions.renovation.rent_free_months.as_str());
    m.set("MPB_CLAUSE", rent_control_clause(&intake.move_in_ready, rc));
    m.set(
        "OBERGRENZE",
        enum_text(decisions.repair_cap_annual.map(|c| c.as_wire())),
    );
    m.set("OBJEKTADRESSE", intake.property_address.as_str());
    let address = first_non_blank([
        intake.property_address.as_str(),
        decisions.snapshot.property_address.as_str(),
        parties.landlord.address,
        parties.tenant.address,
    ]);
    m.set("ORT", extract_city(address));
    m.set(
        "REPRESENTATIVE_NAME",
        first_non_blank([parties.landlord.representative, parties.tenant.representative]),
    );
    m.set("STAFFELMIETE_SCHEDULE", decisions.staggered_schedule.as_str());
    m.set("TAX_NUMBER", parties.landlord.tax_number);
    m.set("TENANT_ADDRESS", parties.tenant.address);
    m.set("TENANT_NAME", parties.tenant.name);
    m.set("TENANT_REPRESENTATIVE", parties.tenant.representative);
    m.set("VAT_ID", parties.landlord.vat_id);
    m.set("WEG_TEXT", decisions.condo_reference.as_str());
    m.set("WOHNUNG_BESCHREIBUNG", housing_description(intake));
    m.set("X", annexes.gdpr_position);
    m.set("Y", annexes.energy_certificate_position);
    m.set("ZUSATZ_BK", extra_cost_items_text(&decisions.extra_cost_items));
    m.set(
        "ZUSTAND",
        intake
            .condition
            .as_ref()
            .map(|c| condition_text(c.as_wire()))
            .unwrap_or_default(),
    );
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::fixtures::{complete_decisions, complete_intake};
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
    }

    #[test]
    fn landlord_client_maps_own_block_to_landlord() {
        let intake = ClientIntake::from_value(complete_intake()).unwrap();
        let parties = derive_parties(&intake);
        assert_eq!(parties.landlord.name, "Vera Vermieterin");
        assert_eq!(parties.tenant.name, "Tom Mieter");
    }

    #[test]
    fn tenant_client_swaps_blocks() {
        let intake = ClientIntake::from_value(json!({
            "rolle": "Mieter",
            "eigene_name": "Tom Mieter",
            "wird_vertreten": "Ja",
            "vertreten_durch": "Mieterverein e.V.",
            "gegenpartei_name": "Vera Vermieterin",
            "zahler_iban": "DE89370400440532013000"
        }))
        .unwrap();
        let parties = derive_parties(&intake);
        assert_eq!(parties.landlord.name, "Vera Vermieterin");
        assert_eq!(parties.landlord.iban, "DE89370400440532013000");
        assert_eq!(parties.tenant.name, "Tom Mieter");
        assert_eq!(parties.tenant.representative, "Mieterverein e.V.");
    }

    #[test]
    fn representative_ignored_unless_represented() {
        let intake = ClientIntake::from_value(json!({
            "rolle": "Vermieter",
            "wird_vertreten": "Nein",
            "vertreten_durch": "Alte Angabe"
        }))
        .unwrap();
        assert_eq!(derive_parties(&intake).landlord.representative, "");
    }

    #[test]
    fn city_is_last_segment() {
        assert_eq!(extract_city("Objektweg 3, 80333 München"), "80333 München");
        assert_eq!(extract_city("Objektweg 3, Berlin, "), "Berlin");
        assert_eq!(extract_city(""), "");
    }

    #[test]
    fn annex_positions_are_one_based() {
        let info = annex_info(&[
            "Hausordnung".into(),
            "DSGVO-Informationsblatt".into(),
            "Energieausweis".into(),
        ]);
        assert_eq!(
            info.list,
            "Anlage MV.1: Hausordnung\nAnlage MV.2: DSGVO-Informationsblatt\nAnlage MV.3: Energieausweis"
        );
        assert_eq!(info.gdpr_position, "2");
        assert_eq!(info.energy_certificate_position, "3");

        let none = annex_info(&["Hausordnung".into()]);
        assert_eq!(none.gdpr_position, "");
        assert_eq!(none.energy_certificate_position, "");
    }

    #[test]
    fn deposit_is_rent_times_months() {
        let intake = ClientIntake::from_value(json!({"grundmiete": "1200", "kaution": "3"})).unwrap();
        assert_eq!(deposit_text(&intake), "3.600,00 EUR");
        let no_rent = ClientIntake::from_value(json!({"kaution": "3"})).unwrap();
        assert_eq!(deposit_text(&no_rent), "");
    }

    #[test]
    fn full_mapping_from_complete_records() {
        let intake = ClientIntake::from_value(complete_intake()).unwrap();
        let decisions = LawyerDecisions::from_value(complete_decisions()).unwrap();
        let m = build_placeholder_mapping(&intake, &decisions, today());

        assert_eq!(m.len(), 39);
        assert_eq!(m.get("LANDLORD_NAME"), Some("Vera Vermieterin"));
        assert_eq!(m.get("TENANT_ADDRESS"), Some("Altbauweg 2, 10115 Berlin"));
        assert_eq!(m.get("ORT"), Some("80333 München"));
        assert_eq!(m.get("FLAECHE"), Some("72,00"));
        assert_eq!(m.get("BETRAG"), Some("3.600,00 EUR"));
        assert_eq!(m.get("ANZAHL"), Some("4"));
        assert_eq!(m.get("ARTEN"), Some("Haustür, Wohnung"));
        assert_eq!(m.get("AUSSTATTUNG"), Some("keine"));
        assert_eq!(m.get("JAHRE"), Some("2"));
        assert_eq!(m.get("X"), Some("2"));
        assert_eq!(m.get("Y"), Some("1"));
        assert_eq!(m.get("ZUSATZ_BK"), Some("1. Dachrinnenreinigung"));
        assert_eq!(m.get("ZUSTAND"), Some("Unrenoviert"));
        assert_eq!(m.get("WOHNUNG_BESCHREIBUNG"), Some("3. OG rechts; Keller, Balkon"));
        assert_eq!(m.get("DATUM"), Some("15.01.2025"));
        assert_eq!(m.get("OBERGRENZE"), Some("8fach"));
        assert_eq!(
            m.get("MPB_CLAUSE"),
            Some(format!("{PRIOR_TENANCY_AFTER} {WITHIN_LIMIT}").as_str())
        );
    }

    #[test]
    fn defaults_for_empty_records() {
        let m = build_placeholder_mapping(&ClientIntake::default(), &LawyerDecisions::blank(), today());
        assert_eq!(m.get("ZUSATZ_BK"), Some(NO_EXTRA_COST_ITEMS));
        assert_eq!(m.get("DATUM"), Some("20.01.2025"));
        assert_eq!(m.get("JAHRE"), Some(""));
        assert_eq!(m.get("MPB_CLAUSE"), Some(""));
        assert_eq!(m.get("ZUSTAND"), Some(""));
    }

    #[test]
    fn historical_condition_labels_get_contract_wording() {
        assert_eq!(condition_text("neu erstellt"), "ist neu erstellt");
        assert_eq!(
            condition_text("gebraucht/vertragsgemäß"),
            "in gebrauchtem, vertragsgemäßem Zustand"
        );
        assert_eq!(condition_text("Renoviert"), "renoviert");
    }

    #[test]
    fn clause_exempts_recent_properties() {
        let rc = RentControl::default();
        assert_eq!(rent_control_clause("2016-04-01", &rc), EXEMPT_NEW_BUILD);
        assert_eq!(rent_control_clause("", &rc), "");
    }

    #[test]
    fn clause_cascade_for_older_properties() {
        let mut rc = RentControl {
            status: Some(RentControlStatus::NewBuild),
            ..RentControl::default()
        };
        assert_eq!(rent_control_clause("2001-01-01", &rc), EXEMPT_NEW_BUILD);

        rc.status = Some(RentControlStatus::PreviouslyLet);
        assert_eq!(rent_control_clause("2001-01-01", &rc), "");

        rc.prior_tenancy = Some(PriorTenancy::BeforeJune2015);
        assert_eq!(rent_control_clause("2001-01-01", &rc), PRIOR_TENANCY_BEFORE);

        rc.prior_tenancy = Some(PriorTenancy::AfterJune2015);
        rc.limit = Some(RentLimit::Over);
        assert_eq!(rent_control_clause("2001-01-01", &rc), "");

        rc.prior_rent = true;
        rc.prior_rent_text = "1350".into();
        rc.modernisation = true;
        rc.modernisation_text = "Fenster 2022".into();
        let clause = rent_control_clause("2001-01-01", &rc);
        assert!(clause.starts_with(PRIOR_TENANCY_AFTER));
        assert!(clause.contains(OVER_LIMIT_DECLARATION));
        assert!(clause.contains("1. Die Vormiete gemäß § 556e Abs. 1 BGB betrug 1.350,00 Euro"));
        assert!(clause.contains("\n2. In den letzten drei Jahren"));
        assert!(clause.ends_with("3. Details: Fenster 2022"));
    }
}
