//! Terminal rendering for the summary step and validation results.
//!
//! The client summary groups the intake by wizard section, one field per
//! line; blank fields are left out and empty sections are skipped.

use mietmaske_core::FieldErrors;
use mietmaske_core::intake::ClientIntake;
use mietmaske_core::wire::YesNo;

const LABEL_WIDTH: usize = 26;

// ── Public API ──

/// Print the client's summary card.
pub fn print_intake_card(intake: &ClientIntake, total_rent: &str) {
    let role = opt(intake.role);
    println!("=== Zusammenfassung ({}) ===", or_dash(&role));
    println!();

    print_section(
        "Kontaktdaten",
        &[
            ("Name", intake.own_name.clone()),
            ("Anschrift", intake.own_address.clone()),
            ("E-Mail", intake.own_email.clone()),
            ("Telefon", intake.own_phone.clone()),
            ("IBAN", intake.own_iban.clone()),
            ("Vertreten durch", represented_by(intake)),
        ],
    );
    print_section(
        "Gegenpartei",
        &[
            ("Bekannt", opt(intake.counterparty_known)),
            ("Name", intake.counterparty_name.clone()),
            ("Anschrift", intake.counterparty_address.clone()),
            ("E-Mail", intake.counterparty_email.clone()),
            ("Telefon", intake.counterparty_phone.clone()),
        ],
    );
    print_section(
        "Mietobjekt",
        &[
            ("Adresse", intake.property_address.clone()),
            ("Bezeichnung", intake.unit_label.clone()),
            ("Art", opt(intake.unit_type)),
            ("Wohnfläche (m²)", intake.floor_area.clone()),
            ("Bezugsfertig", intake.move_in_ready.clone()),
            ("Außenbereich", intake.outdoor_areas.join(", ")),
            ("Nebenräume", intake.ancillary_rooms.join(", ")),
            ("Stellplatz", opt(intake.parking)),
            ("Ausstattung", intake.fittings.clone()),
            ("WEG", opt(intake.condo)),
        ],
    );
    print_section(
        "Zustand & Schlüssel",
        &[
            (
                "Zustand",
                intake
                    .condition
                    .as_ref()
                    .map(|c| c.as_wire().to_string())
                    .unwrap_or_default(),
            ),
            ("Lärmquellen", opt(intake.noise)),
            ("Schlüsselarten", intake.key_types.join(", ")),
            ("Schlüsselanzahl", intake.key_count.clone()),
        ],
    );
    print_section(
        "Mietzeit",
        &[
            ("Mietbeginn", intake.lease_start.clone()),
            ("Mietende", intake.lease_end.clone()),
            ("Vertragsart", opt(intake.contract_type)),
            ("Befristungsgrund", opt(intake.fixed_term_reason)),
        ],
    );
    print_section(
        "Miete & Nebenkosten",
        &[
            ("Grundmiete", intake.base_rent.clone()),
            ("Vorauszahlung Heizung", intake.heating_prepayment.clone()),
            ("Vorauszahlung BK", intake.operating_cost_prepayment.clone()),
            ("Stellplatzmiete", intake.parking_rent.clone()),
            ("Gesamtmiete", total_rent.to_string()),
            ("Zahlungsart", opt(intake.payment_method)),
        ],
    );
    print_section(
        "Nutzung & Kaution",
        &[
            ("Nutzung", opt(intake.usage)),
            ("Untervermietung", opt(intake.subletting)),
            ("Tiere", opt(intake.pets)),
            ("Kaution (Monate)", intake.deposit_months.clone()),
            ("Kautionsform", opt(intake.deposit_form)),
            ("Übergabedatum", intake.handover_date.clone()),
        ],
    );
}

/// Print one step's open fields. Prints nothing for a complete step.
pub fn print_step_errors(step: usize, step_name: &str, errors: &FieldErrors) {
    if errors.is_empty() {
        return;
    }
    println!("Schritt {} – {step_name}", step + 1);
    for (field, message) in errors {
        println!("  {field:<LABEL_WIDTH$} {message}");
    }
    println!();
}

// ── Section rendering ──

fn print_section(header: &str, rows: &[(&str, String)]) {
    if rows.iter().all(|(_, value)| value.trim().is_empty()) {
        return;
    }

    println!("{header}");
    for (label, value) in rows {
        if value.trim().is_empty() {
            continue;
        }
        println!("  {label:<LABEL_WIDTH$} {value}");
    }
    println!();
}

// ── Helpers ──

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn or_dash(text: &str) -> &str {
    if text.is_empty() { "-" } else { text }
}

fn represented_by(intake: &ClientIntake) -> String {
    match intake.represented {
        Some(YesNo::Yes) => intake.representative.clone(),
        _ => String::new(),
    }
}
