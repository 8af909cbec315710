//! Derivation rules: values that must stay consistent with other fields.
//!
//! Everything here is deterministic and depends only on the intake and the
//! decision record passed in.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::CoreError;
use crate::intake::{ClientIntake, ContractType, Role};
use crate::lawyer::{
    Compensation, FinalContractType, LawyerDecisions, ReadOnlySnapshot, RenovationVariant,
    RentAdjustment, RentControl,
};
use crate::wire::{self, YesNo};

/// Properties first ready for occupancy on or before this date fall under
/// the rent-control questionnaire.
pub const RENT_CONTROL_CUTOFF: NaiveDate = match NaiveDate::from_ymd_opt(2014, 10, 1) {
    Some(date) => date,
    None => panic!("invalid rent-control cutoff"),
};

// ── Rent adjustment ──

/// Switch the rent-adjustment mode, keeping the legacy flags in step.
pub fn set_rent_adjustment(decisions: &mut LawyerDecisions, mode: Option<RentAdjustment>) {
    decisions.rent_adjustment = mode;
    if mode.is_none() {
        decisions.indexed_rent = None;
        decisions.staggered_rent = None;
        decisions.staggered_schedule.clear();
        return;
    }
    enforce_rent_adjustment(decisions);
}

/// Make the indexed/staggered flags agree with the selected mode.
///
/// With no mode selected, the mode is inferred from the flags: indexed wins
/// over staggered, and two explicit "no" answers mean the statutory default.
/// The staggered schedule only survives while staggered rent is selected.
pub fn enforce_rent_adjustment(decisions: &mut LawyerDecisions) {
    if decisions.rent_adjustment.is_none() {
        decisions.rent_adjustment = match (decisions.indexed_rent, decisions.staggered_rent) {
            (Some(YesNo::Yes), _) => Some(RentAdjustment::Indexed),
            (_, Some(YesNo::Yes)) => Some(RentAdjustment::Staggered),
            (Some(YesNo::No), Some(YesNo::No)) => Some(RentAdjustment::Statutory),
            _ => None,
        };
    }

    let Some(mode) = decisions.rent_adjustment else {
        return;
    };
    decisions.indexed_rent = Some(YesNo::from_bool(mode == RentAdjustment::Indexed));
    decisions.staggered_rent = Some(YesNo::from_bool(mode == RentAdjustment::Staggered));
    if mode != RentAdjustment::Staggered {
        decisions.staggered_schedule.clear();
    }
}

// ── Renovation liability ──

/// Suggest a renovation-liability variant from the handover condition.
///
/// Case-insensitive substring match, checked in this order: `unrenoviert`,
/// `teilsaniert`, `renoviert`.
pub fn auto_select_renovation(condition: &str) -> Option<RenovationVariant> {
    let condition = condition.to_lowercase();
    if condition.contains("unrenoviert") {
        Some(RenovationVariant::NoObligation)
    } else if condition.contains("teilsaniert") {
        Some(RenovationVariant::ObligationWithCompensation)
    } else if condition.contains("renoviert") {
        Some(RenovationVariant::TenantObligation)
    } else {
        None
    }
}

/// Select one renovation variant and clear the other two.
///
/// Leaving the compensation variant discards its option, amount and months.
pub fn select_renovation(decisions: &mut LawyerDecisions, variant: RenovationVariant) {
    let renovation = &mut decisions.renovation;
    renovation.tenant_obligation = variant == RenovationVariant::TenantObligation;
    renovation.no_obligation = variant == RenovationVariant::NoObligation;
    renovation.with_compensation = variant == RenovationVariant::ObligationWithCompensation;
    if variant != RenovationVariant::ObligationWithCompensation {
        renovation.compensation = None;
        renovation.compensation_amount.clear();
        renovation.rent_free_months.clear();
    }
}

/// Choose how the landlord compensates; the untaken alternative's field is
/// cleared.
pub fn set_compensation(decisions: &mut LawyerDecisions, option: Option<Compensation>) {
    let renovation = &mut decisions.renovation;
    renovation.compensation = option;
    if option != Some(Compensation::LumpSum) {
        renovation.compensation_amount.clear();
    }
    if option != Some(Compensation::RentFreeMonths) {
        renovation.rent_free_months.clear();
    }
}

/// Pre-select a renovation variant from the intake's handover condition.
///
/// Does nothing when a variant is already chosen. Returns the variant that
/// was applied, if any.
pub fn apply_renovation_auto_selection(
    decisions: &mut LawyerDecisions,
    intake: &ClientIntake,
) -> Option<RenovationVariant> {
    if decisions.renovation.selected().is_some() {
        return None;
    }
    let condition = intake.condition.as_ref()?;
    let variant = auto_select_renovation(condition.as_wire())?;
    select_renovation(decisions, variant);
    debug!(?variant, condition = %condition, "auto-selected renovation liability");
    Some(variant)
}

/// Collapse several ticked renovation boxes to the one [`Renovation::selected`]
/// reports.
///
/// [`Renovation::selected`]: crate::lawyer::Renovation::selected
pub fn enforce_single_renovation(decisions: &mut LawyerDecisions) {
    if let Some(variant) = decisions.renovation.selected() {
        select_renovation(decisions, variant);
    }
}

// ── Contacts ──

/// Tenant contact as shown in the lawyer view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantContact {
    pub email: String,
    pub phone: String,
}

/// Work out the tenant's contact details from the intake.
///
/// A landlord client names the tenant as counterparty; a tenant client is
/// the tenant. With no role, the counterparty is preferred over the client's
/// own block. Blank values fall back to `fallback`.
pub fn derive_tenant_contact(intake: &ClientIntake, fallback: &TenantContact) -> TenantContact {
    let own = intake.own_contact();
    let counter = intake.counterparty_contact();
    let candidates = match intake.role {
        Some(Role::Landlord) => vec![(counter.email, counter.phone)],
        Some(Role::Tenant) => vec![(own.email, own.phone)],
        None => vec![(counter.email, counter.phone), (own.email, own.phone)],
    };

    let email = candidates
        .iter()
        .map(|(email, _)| *email)
        .chain([fallback.email.as_str()])
        .find(|s| !s.trim().is_empty())
        .unwrap_or_default();
    let phone = candidates
        .iter()
        .map(|(_, phone)| *phone)
        .chain([fallback.phone.as_str()])
        .find(|s| !s.trim().is_empty())
        .unwrap_or_default();

    TenantContact {
        email: email.to_string(),
        phone: phone.to_string(),
    }
}

/// Refresh the read-only intake mirror, keeping previous values where the
/// intake is blank.
pub fn derive_snapshot(intake: &ClientIntake, fallback: &ReadOnlySnapshot) -> ReadOnlySnapshot {
    fn pick(value: &str, fallback: &str) -> String {
        if value.trim().is_empty() {
            fallback.to_string()
        } else {
            value.to_string()
        }
    }

    let role = intake.role.map(Role::as_wire).unwrap_or_default();
    let unit = intake
        .unit_type
        .map(|t| t.as_wire().to_string())
        .unwrap_or_else(|| intake.unit_label.clone());

    ReadOnlySnapshot {
        role: pick(role, &fallback.role),
        name: pick(&intake.own_name, &fallback.name),
        email: pick(&intake.own_email, &fallback.email),
        phone: pick(&intake.own_phone, &fallback.phone),
        property_address: pick(&intake.property_address, &fallback.property_address),
        unit: pick(&unit, &fallback.unit),
        move_in_ready: pick(&intake.move_in_ready, &fallback.move_in_ready),
        lease_start: pick(&intake.lease_start, &fallback.lease_start),
        base_rent: pick(&intake.base_rent, &fallback.base_rent),
        total_rent: format_eur(total_rent(intake)),
        heating_prepayment: pick(&intake.heating_prepayment, &fallback.heating_prepayment),
    }
}

/// The final contract type suggested by the client's choice.
pub fn suggest_final_contract_type(intake: &ClientIntake) -> Option<FinalContractType> {
    intake.contract_type.map(|t| match t {
        ContractType::FixedTerm => FinalContractType::FixedTerm,
        ContractType::Unlimited | ContractType::Staggered => FinalContractType::Unlimited,
    })
}

/// Layer imported decisions over the current form and derive everything that
/// follows from a freshly imported intake.
///
/// Keys present in `imported` replace current values. Contact details and the
/// read-only mirror are re-derived from the intake, and the renovation
/// variant is auto-selected when none is chosen.
pub fn prefill_decisions(
    current: &LawyerDecisions,
    intake: &ClientIntake,
    imported: Map<String, Value>,
) -> Result<LawyerDecisions, CoreError> {
    let mut merged = current.to_map()?;
    let imported = crate::normalize::normalize_lawyer_decisions(imported);
    merged.extend(imported);
    let mut next = LawyerDecisions::from_map(merged)?;

    next.snapshot = derive_snapshot(intake, &current.snapshot);
    if next.final_contract_type.is_none() {
        next.final_contract_type = suggest_final_contract_type(intake);
    }
    if next.notice_waiver_years.trim().is_empty() {
        next.notice_waiver_years = "0".into();
    }

    let contact = derive_tenant_contact(
        intake,
        &TenantContact {
            email: next.tenant_email.clone(),
            phone: next.tenant_phone.clone(),
        },
    );
    next.tenant_email = contact.email;
    next.tenant_phone = contact.phone;

    enforce_rent_adjustment(&mut next);
    enforce_single_renovation(&mut next);
    apply_renovation_auto_selection(&mut next, intake);
    Ok(next)
}

// ── Rent ──

/// Monthly total: base rent, surcharges, both prepayments and parking rent.
///
/// Missing or non-numeric inputs count as zero, as do negative ones, so the
/// result is never negative.
pub fn total_rent(intake: &ClientIntake) -> f64 {
    [
        &intake.base_rent,
        &intake.furnishing_surcharge,
        &intake.commercial_surcharge,
        &intake.subletting_surcharge,
        &intake.heating_prepayment,
        &intake.operating_cost_prepayment,
        &intake.parking_rent,
    ]
    .into_iter()
    .map(|field| wire::amount_or_zero(field).max(0.0))
    .sum()
}

/// `1130.5` → `"1130,50 EUR"`.
pub fn format_eur(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    format!("{:.2} EUR", amount).replace('.', ",")
}

/// German number formatting with thousands separators: `1234.5` → `"1.234,50"`.
pub fn format_decimal_de(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped},{frac_part}")
}

/// Format a text amount field in German notation; blank or non-numeric
/// input gives an empty string.
pub fn format_amount_field(text: &str) -> String {
    wire::parse_amount(text)
        .map(format_decimal_de)
        .unwrap_or_default()
}

// ── Rent control ──

/// Parse a date typed into a form, with or without a time part.
///
/// Accepts `2014-10-01`, `2014-10-01T08:30:00`, `2014-10-01 08:30`,
/// RFC 3339 timestamps, and German `01.10.2014`.
pub fn parse_form_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(text, "%d.%m.%Y").ok()
}

/// Whether a property's move-in-ready date falls under rent control.
///
/// Unparseable or missing dates mean "not applicable".
pub fn rent_control_applies(move_in_ready: &str) -> bool {
    parse_form_date(move_in_ready).is_some_and(|date| date <= RENT_CONTROL_CUTOFF)
}

/// Whether the lawyer form shows the rent-control questionnaire.
///
/// Shown when the date rule applies, and also whenever answers already
/// exist so imported drafts stay visible.
pub fn show_rent_control(move_in_ready: &str, answers: &RentControl) -> bool {
    answers.is_started() || rent_control_applies(move_in_ready)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::Condition;
    use proptest::prelude::*;
    use serde_json::json;

    fn intake(value: Value) -> ClientIntake {
        ClientIntake::from_value(value).unwrap()
    }

    #[test]
    fn total_rent_coerces_junk_to_zero() {
        let i = intake(json!({"grundmiete": 1000, "vz_heizung": "130", "vz_bk": "abc"}));
        assert_eq!(total_rent(&i), 1130.0);
        assert_eq!(format_eur(total_rent(&i)), "1130,00 EUR");
        assert_eq!(format_eur(total_rent(&ClientIntake::default())), "0,00 EUR");
    }

    #[test]
    fn total_rent_sums_every_component() {
        let i = intake(json!({
            "grundmiete": "800",
            "zuschlag_moeblierung": "50",
            "zuschlag_teilgewerbe": "25.5",
            "zuschlag_unterverm": "10",
            "vz_heizung": "90",
            "vz_bk": "120",
            "stellplatzmiete": "60"
        }));
        assert_eq!(total_rent(&i), 1155.5);
    }

    #[test]
    fn total_rent_ignores_negative_components() {
        let i = intake(json!({"grundmiete": "500", "vz_bk": "-900"}));
        assert_eq!(total_rent(&i), 500.0);
    }

    #[test]
    fn german_decimal_format() {
        assert_eq!(format_decimal_de(1234.5), "1.234,50");
        assert_eq!(format_decimal_de(80.0), "80,00");
        assert_eq!(format_decimal_de(1_000_000.0), "1.000.000,00");
        assert_eq!(format_decimal_de(-1500.0), "-1.500,00");
        assert_eq!(format_amount_field("abc"), "");
        assert_eq!(format_amount_field("72,5"), "72,50");
    }

    #[test]
    fn cutoff_boundary_is_inclusive() {
        assert!(rent_control_applies("2014-10-01"));
        assert!(!rent_control_applies("2014-10-02"));
        assert!(rent_control_applies("1998-03-15"));
    }

    #[test]
    fn tolerant_date_formats() {
        assert!(rent_control_applies("2014-10-01T00:00:00"));
        assert!(rent_control_applies("2014-09-30T23:59:59Z"));
        assert!(rent_control_applies("2014-10-01 12:00"));
        assert!(rent_control_applies("01.10.2014"));
        assert!(!rent_control_applies("2020-01-01T00:00:00.000Z"));
    }

    #[test]
    fn unparseable_dates_do_not_apply() {
        assert!(!rent_control_applies(""));
        assert!(!rent_control_applies("10/2014"));
        assert!(!rent_control_applies("irgendwann"));
    }

    #[test]
    fn existing_answers_keep_questionnaire_visible() {
        let answers = RentControl {
            prior_rent: true,
            ..RentControl::default()
        };
        assert!(show_rent_control("2020-01-01", &answers));
        assert!(!show_rent_control("2020-01-01", &RentControl::default()));
    }

    #[test]
    fn auto_selection_by_condition() {
        assert_eq!(auto_select_renovation("Unrenoviert"), Some(RenovationVariant::NoObligation));
        assert_eq!(auto_select_renovation("UNRENOVIERT"), Some(RenovationVariant::NoObligation));
        assert_eq!(
            auto_select_renovation("teilSANIERT"),
            Some(RenovationVariant::ObligationWithCompensation)
        );
        assert_eq!(auto_select_renovation("Renoviert"), Some(RenovationVariant::TenantObligation));
        assert_eq!(auto_select_renovation("renoviert 2023"), Some(RenovationVariant::TenantObligation));
        assert_eq!(auto_select_renovation("neu erstellt"), None);
    }

    #[test]
    fn auto_selection_never_overrides_explicit_choice() {
        let i = ClientIntake {
            condition: Some(Condition::Unrenovated),
            ..ClientIntake::default()
        };
        let mut d = LawyerDecisions::blank();
        select_renovation(&mut d, RenovationVariant::TenantObligation);
        assert_eq!(apply_renovation_auto_selection(&mut d, &i), None);
        assert_eq!(d.renovation.selected(), Some(RenovationVariant::TenantObligation));

        let mut fresh = LawyerDecisions::blank();
        assert_eq!(
            apply_renovation_auto_selection(&mut fresh, &i),
            Some(RenovationVariant::NoObligation)
        );
        assert!(fresh.renovation.no_obligation);
    }

    #[test]
    fn leaving_compensation_variant_clears_its_fields() {
        let mut d = LawyerDecisions::blank();
        select_renovation(&mut d, RenovationVariant::ObligationWithCompensation);
        set_compensation(&mut d, Some(Compensation::LumpSum));
        d.renovation.compensation_amount = "2500".into();

        select_renovation(&mut d, RenovationVariant::NoObligation);
        assert_eq!(d.renovation.compensation, None);
        assert!(d.renovation.compensation_amount.is_empty());
        assert!(!d.renovation.with_compensation);
    }

    #[test]
    fn switching_compensation_clears_other_field() {
        let mut d = LawyerDecisions::blank();
        select_renovation(&mut d, RenovationVariant::ObligationWithCompensation);
        set_compensation(&mut d, Some(Compensation::LumpSum));
        d.renovation.compensation_amount = "2500".into();

        set_compensation(&mut d, Some(Compensation::RentFreeMonths));
        assert!(d.renovation.compensation_amount.is_empty());
        d.renovation.rent_free_months = "2".into();

        set_compensation(&mut d, Some(Compensation::RentFreeMonths));
        assert_eq!(d.renovation.rent_free_months, "2");
    }

    #[test]
    fn indexed_mode_sets_flags_and_drops_schedule() {
        let mut d = LawyerDecisions::blank();
        set_rent_adjustment(&mut d, Some(RentAdjustment::Staggered));
        d.staggered_schedule = "ab 2026: +50 EUR".into();
        assert_eq!(d.staggered_rent, Some(YesNo::Yes));

        set_rent_adjustment(&mut d, Some(RentAdjustment::Indexed));
        assert_eq!(d.indexed_rent, Some(YesNo::Yes));
        assert_eq!(d.staggered_rent, Some(YesNo::No));
        assert!(d.staggered_schedule.is_empty());
    }

    #[test]
    fn mode_is_inferred_from_legacy_flags() {
        let mut d = LawyerDecisions {
            indexed_rent: Some(YesNo::Yes),
            staggered_rent: Some(YesNo::Yes),
            ..LawyerDecisions::blank()
        };
        enforce_rent_adjustment(&mut d);
        assert_eq!(d.rent_adjustment, Some(RentAdjustment::Indexed));
        assert_eq!(d.staggered_rent, Some(YesNo::No));

        let mut both_no = LawyerDecisions {
            indexed_rent: Some(YesNo::No),
            staggered_rent: Some(YesNo::No),
            ..LawyerDecisions::blank()
        };
        enforce_rent_adjustment(&mut both_no);
        assert_eq!(both_no.rent_adjustment, Some(RentAdjustment::Statutory));

        let mut untouched = LawyerDecisions::blank();
        enforce_rent_adjustment(&mut untouched);
        assert_eq!(untouched.rent_adjustment, None);
        assert_eq!(untouched.indexed_rent, None);
    }

    #[test]
    fn contact_follows_role() {
        let base = json!({
            "eigene_email": "own@example.com",
            "eigene_telefon": "111",
            "gegenpartei_email": "counter@example.com",
            "gegenpartei_telefon": "222"
        });
        let mut landlord = base.clone();
        landlord["rolle"] = json!("Vermieter");
        let mut tenant = base.clone();
        tenant["rolle"] = json!("Mieter");

        let none = TenantContact::default();
        assert_eq!(derive_tenant_contact(&intake(landlord), &none).email, "counter@example.com");
        assert_eq!(derive_tenant_contact(&intake(tenant), &none).phone, "111");
        assert_eq!(derive_tenant_contact(&intake(base), &none).email, "counter@example.com");

        let own_only = intake(json!({"eigene_email": "own@example.com"}));
        assert_eq!(derive_tenant_contact(&own_only, &none).email, "own@example.com");
    }

    #[test]
    fn contact_falls_back_to_previous_values() {
        let landlord = intake(json!({"rolle": "Vermieter"}));
        let previous = TenantContact {
            email: "manual@example.com".into(),
            phone: "999".into(),
        };
        assert_eq!(derive_tenant_contact(&landlord, &previous), previous);
    }

    #[test]
    fn snapshot_mirrors_intake() {
        let i = intake(json!({
            "rolle": "Vermieter",
            "eigene_name": "Vera Vermieterin",
            "wohnung_bez": "2. OG links",
            "grundmiete": "900",
            "vz_heizung": "80"
        }));
        let previous = ReadOnlySnapshot {
            lease_start: "2025-01-01".into(),
            ..ReadOnlySnapshot::default()
        };
        let snap = derive_snapshot(&i, &previous);
        assert_eq!(snap.role, "Vermieter");
        assert_eq!(snap.unit, "2. OG links");
        assert_eq!(snap.lease_start, "2025-01-01");
        assert_eq!(snap.total_rent, "980,00 EUR");
    }

    #[test]
    fn prefill_keeps_imported_choices_and_derives_rest() {
        let i = intake(json!({
            "rolle": "Mieter",
            "eigene_email": "t@example.com",
            "vertragsart": "Befristet",
            "zustand": "Teilsaniert"
        }));
        let imported = match json!({
            "tierhaltung_ton": "restriktiver",
            "indexmiete": "Ja",
            "kuendigungsverzicht": "2"
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let d = prefill_decisions(&LawyerDecisions::blank(), &i, imported).unwrap();
        assert_eq!(d.tenant_email, "t@example.com");
        assert_eq!(d.final_contract_type, Some(FinalContractType::FixedTerm));
        assert_eq!(d.notice_waiver_years, "2");
        assert_eq!(d.rent_adjustment, Some(RentAdjustment::Indexed));
        assert_eq!(d.staggered_rent, Some(YesNo::No));
        assert_eq!(
            d.renovation.selected(),
            Some(RenovationVariant::ObligationWithCompensation)
        );
        assert_eq!(d.snapshot.email, "t@example.com");
        assert!(d.extra.is_empty());
    }

    fn arb_mode() -> impl Strategy<Value = Option<RentAdjustment>> {
        prop_oneof![
            Just(None),
            prop::sample::select(RentAdjustment::ALL.to_vec()).prop_map(Some),
        ]
    }

    fn arb_flag() -> impl Strategy<Value = Option<YesNo>> {
        prop_oneof![Just(None), Just(Some(YesNo::Yes)), Just(Some(YesNo::No))]
    }

    proptest! {
        #[test]
        fn never_two_modes_at_once(
            start in (arb_flag(), arb_flag()),
            updates in prop::collection::vec(arb_mode(), 0..8),
        ) {
            let mut d = LawyerDecisions {
                indexed_rent: start.0,
                staggered_rent: start.1,
                ..LawyerDecisions::blank()
            };
            enforce_rent_adjustment(&mut d);
            for mode in updates {
                set_rent_adjustment(&mut d, mode);
                let active = [d.indexed_rent, d.staggered_rent]
                    .into_iter()
                    .filter(|f| *f == Some(YesNo::Yes))
                    .count();
                prop_assert!(active <= 1);
                if d.rent_adjustment != Some(RentAdjustment::Staggered) {
                    prop_assert!(d.staggered_schedule.is_empty());
                }
            }
        }
    }
}
