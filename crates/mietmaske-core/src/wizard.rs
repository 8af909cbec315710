//! Step-by-step controllers for the client and lawyer forms.
//!
//! Each wizard owns its record and the error map of the step last checked.
//! Every edit goes through the normaliser and the derivation rules, so the
//! record stays consistent whatever order fields are filled in.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::api::{
    CombinedMasks, GenerateContractRequest, SaveIntakeRequest, intake_export_file_name,
};
use crate::derive::{self, format_eur, total_rent};
use crate::error::{CoreError, json_kind};
use crate::intake::ClientIntake;
use crate::lawyer::{LawyerDecisions, RenovationVariant};
use crate::placeholders::{PlaceholderMapping, build_placeholder_mapping};
use crate::validate::{
    CLIENT_STEPS, FieldErrors, LAWYER_STEPS, validate_client_intake, validate_client_step,
    validate_lawyer_decisions, validate_lawyer_step,
};
use crate::wire;

/// Shown when the backend copy of an intake could not be saved.
pub const SAVE_FAILED_NOTICE: &str = "Die Daten konnten nicht an den Server gesendet werden. \
     Die JSON-Datei wird trotzdem lokal gespeichert.";

fn patch_map(mut map: Map<String, Value>, key: &str, value: Value) -> Map<String, Value> {
    map.insert(key.to_string(), value);
    map
}

/// Edits must use a known label; imports may carry unknown ones.
fn reject_unknown_choice(key: &str, value: &Value, kept: &[String]) -> Result<(), CoreError> {
    if kept.iter().any(|k| k == key) {
        return Err(CoreError::UnknownChoice {
            key: key.to_string(),
            value: wire::to_text(value),
        });
    }
    Ok(())
}

// ── Client wizard ──

/// Everything produced by a successful client export.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeExport {
    pub file_name: String,
    pub request: SaveIntakeRequest,
    /// Pretty-printed request body, written to `file_name`.
    pub json: String,
}

#[derive(Debug, Clone)]
pub struct ClientWizard {
    intake: ClientIntake,
    step: usize,
    errors: FieldErrors,
}

impl Default for ClientWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientWizard {
    pub fn new() -> Self {
        Self::from_intake(ClientIntake::blank())
    }

    pub fn from_intake(intake: ClientIntake) -> Self {
        Self {
            intake,
            step: 0,
            errors: FieldErrors::new(),
        }
    }

    pub fn intake(&self) -> &ClientIntake {
        &self.intake
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn step_name(&self) -> &'static str {
        CLIENT_STEPS[self.step]
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_summary(&self) -> bool {
        self.step == CLIENT_STEPS.len() - 1
    }

    /// Formatted total rent for the rent step and summary.
    pub fn total_rent(&self) -> String {
        format_eur(total_rent(&self.intake))
    }

    /// Set one field by its wire key. The field's error is cleared.
    ///
    /// On a decode failure the intake is left as it was.
    pub fn set_field(&mut self, key: &str, value: Value) -> Result<(), CoreError> {
        let patched = patch_map(self.intake.to_map()?, key, value.clone());
        let (intake, kept) = ClientIntake::decode(Value::Object(patched))?;
        reject_unknown_choice(key, &value, &kept)?;
        self.intake = intake;
        self.errors.remove(key);
        Ok(())
    }

    /// Advance if the current step is complete. Returns whether it moved.
    pub fn next(&mut self) -> bool {
        self.errors = validate_client_step(self.step, &self.intake);
        if !self.errors.is_empty() {
            debug!(step = self.step, errors = self.errors.len(), "client step incomplete");
            return false;
        }
        self.step = (self.step + 1).min(CLIENT_STEPS.len() - 1);
        true
    }

    pub fn prev(&mut self) {
        self.step = self.step.saturating_sub(1);
    }

    /// Validate every step and produce the export bundle.
    pub fn export(&mut self, now: DateTime<Utc>) -> Result<IntakeExport, CoreError> {
        self.errors = validate_client_intake(&self.intake);
        if !self.errors.is_empty() {
            return Err(CoreError::Incomplete(self.errors.clone()));
        }

        let request = SaveIntakeRequest::new(self.intake.clone(), now);
        let json = serde_json::to_string_pretty(&request)?;
        let file_name = intake_export_file_name(now.date_naive());
        info!(file = %file_name, "client intake exported");
        Ok(IntakeExport {
            file_name,
            request,
            json,
        })
    }
}

// ── Lawyer wizard ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportStatus {
    #[default]
    Idle,
    Done,
    Error,
}

impl ImportStatus {
    pub fn message(self) -> &'static str {
        match self {
            ImportStatus::Idle => "Bitte laden Sie die JSON-Datei aus der Mandantenmaske.",
            ImportStatus::Done => "Mandantendaten erfolgreich geladen.",
            ImportStatus::Error => "Import fehlgeschlagen – bitte erneut versuchen.",
        }
    }
}

/// Result of the last contract generation attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GenerationOutcome {
    #[default]
    NotRequested,
    Ready(String),
    /// The backend answered with a non-success status.
    Rejected,
    NoDownloadUrl,
    Unreachable,
}

impl GenerationOutcome {
    /// User-facing message for a failed attempt.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            GenerationOutcome::NotRequested | GenerationOutcome::Ready(_) => None,
            GenerationOutcome::Rejected => {
                Some("Der Vertrag konnte nicht erstellt werden. Bitte später erneut versuchen.")
            }
            GenerationOutcome::NoDownloadUrl => {
                Some("Die Antwort des Servers enthält keinen Download-Link.")
            }
            GenerationOutcome::Unreachable => Some(
                "Es ist ein Verbindungsfehler aufgetreten. Bitte prüfen Sie die Server-Konfiguration.",
            ),
        }
    }

    pub fn download_url(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Ready(url) => Some(url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LawyerWizard {
    intake: Option<ClientIntake>,
    decisions: LawyerDecisions,
    step: usize,
    errors: FieldErrors,
    import_status: ImportStatus,
    generation: GenerationOutcome,
}

impl Default for LawyerWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl LawyerWizard {
    pub fn new() -> Self {
        Self {
            intake: None,
            decisions: LawyerDecisions::blank(),
            step: 0,
            errors: FieldErrors::new(),
            import_status: ImportStatus::Idle,
            generation: GenerationOutcome::NotRequested,
        }
    }

    pub fn intake(&self) -> Option<&ClientIntake> {
        self.intake.as_ref()
    }

    pub fn decisions(&self) -> &LawyerDecisions {
        &self.decisions
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn step_name(&self) -> &'static str {
        LAWYER_STEPS[self.step]
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn import_status(&self) -> ImportStatus {
        self.import_status
    }

    pub fn generation(&self) -> &GenerationOutcome {
        &self.generation
    }

    /// Load an exported intake file: either a bare intake object or a
    /// combined `{maskA, maskB}` file.
    ///
    /// On failure the status turns to [`ImportStatus::Error`] and everything
    /// else stays as it was.
    pub fn import_json(&mut self, text: &str) -> Result<(), CoreError> {
        match self.try_import(text) {
            Ok((intake, decisions)) => {
                info!(
                    role = intake.role.map(|r| r.as_wire()).unwrap_or("-"),
                    renovation = ?decisions.renovation.selected(),
                    "client intake imported"
                );
                self.intake = Some(intake);
                self.decisions = decisions;
                self.errors.clear();
                self.import_status = ImportStatus::Done;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "import failed");
                self.import_status = ImportStatus::Error;
                Err(err)
            }
        }
    }

    fn try_import(&self, text: &str) -> Result<(ClientIntake, LawyerDecisions), CoreError> {
        let mut root = match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => map,
            other => return Err(CoreError::NotAnObject(json_kind(&other))),
        };

        let (mask_a, mask_b) = if root.contains_key("maskA") {
            let a = root.remove("maskA").unwrap_or(Value::Null);
            let b = match root.remove("maskB") {
                None | Some(Value::Null) => Map::new(),
                Some(Value::Object(map)) => map,
                Some(other) => return Err(CoreError::NotAnObject(json_kind(&other))),
            };
            (a, b)
        } else {
            (Value::Object(root), Map::new())
        };

        let intake = ClientIntake::from_value(mask_a)?;
        let decisions = derive::prefill_decisions(&self.decisions, &intake, mask_b)?;
        Ok((intake, decisions))
    }

    /// Set one decision field by its wire key.
    ///
    /// Ticking a renovation variant unticks the others, changing the
    /// compensation option clears the other option's field, and the rent
    /// adjustment flags are re-synchronised after every edit.
    pub fn set_field(&mut self, key: &str, value: Value) -> Result<(), CoreError> {
        let checked = wire::truthy(&value);
        let patched = patch_map(self.decisions.to_map()?, key, value.clone());
        let (mut next, kept) = LawyerDecisions::decode(patched)?;
        reject_unknown_choice(key, &value, &kept)?;

        match key {
            "mietanpassung_normalfall" => {
                let mode = next.rent_adjustment;
                derive::set_rent_adjustment(&mut next, mode);
            }
            "indexmiete" | "staffelmiete" => next.rent_adjustment = None,
            "sr_ausgleich_option" => {
                let option = next.renovation.compensation;
                derive::set_compensation(&mut next, option);
            }
            _ => {
                // A ticked variant is only left by ticking another one.
                if let Some(variant) = RenovationVariant::from_wire_key(key)
                    && (checked || self.decisions.renovation.is_set(variant))
                {
                    derive::select_renovation(&mut next, variant);
                }
            }
        }
        derive::enforce_rent_adjustment(&mut next);

        self.decisions = next;
        self.errors.remove(key);
        Ok(())
    }

    /// Add `item` to a multi-select field, or remove it if present.
    pub fn toggle_list(&mut self, key: &str, item: &str) -> Result<(), CoreError> {
        let map = self.decisions.to_map()?;
        let mut items = map.get(key).map(wire::to_list).unwrap_or_default();
        if let Some(pos) = items.iter().position(|existing| existing == item) {
            items.remove(pos);
        } else {
            items.push(item.to_string());
        }
        let list = items.into_iter().map(Value::String).collect();
        self.set_field(key, Value::Array(list))
    }

    /// Whether the rent-control questionnaire is shown.
    ///
    /// The mirrored move-in-ready date is read first, then the intake's.
    pub fn show_rent_control(&self) -> bool {
        let mirrored = self.decisions.snapshot.move_in_ready.as_str();
        let move_in_ready = if mirrored.trim().is_empty() {
            self.intake
                .as_ref()
                .map(|i| i.move_in_ready.as_str())
                .unwrap_or_default()
        } else {
            mirrored
        };
        derive::show_rent_control(move_in_ready, &self.decisions.rent_control)
    }

    /// Advance if the current step is complete. The import step needs a
    /// loaded intake.
    pub fn next(&mut self) -> bool {
        if self.step == 0 && self.intake.is_none() {
            self.import_status = ImportStatus::Idle;
            return false;
        }
        self.errors = validate_lawyer_step(self.step, &self.decisions);
        if !self.errors.is_empty() {
            debug!(step = self.step, errors = self.errors.len(), "lawyer step incomplete");
            return false;
        }
        self.step = (self.step + 1).min(LAWYER_STEPS.len() - 1);
        true
    }

    pub fn prev(&mut self) {
        self.step = self.step.saturating_sub(1);
    }

    /// Pretty `{maskA, maskB}` JSON for download.
    pub fn combined_export(&self) -> Result<String, CoreError> {
        let intake = self.intake.as_ref().ok_or(CoreError::NoIntake)?;
        let combined = CombinedMasks {
            mask_a: intake.clone(),
            mask_b: self.decisions.clone(),
        };
        Ok(serde_json::to_string_pretty(&combined)?)
    }

    pub fn placeholder_mapping(&self, today: NaiveDate) -> Result<PlaceholderMapping, CoreError> {
        let intake = self.intake.as_ref().ok_or(CoreError::NoIntake)?;
        Ok(build_placeholder_mapping(intake, &self.decisions, today))
    }

    /// Validate every step and assemble the generation request.
    pub fn generation_request(
        &mut self,
        template_path: &str,
        today: NaiveDate,
    ) -> Result<GenerateContractRequest, CoreError> {
        let intake = self.intake.as_ref().ok_or(CoreError::NoIntake)?;
        self.errors = validate_lawyer_decisions(&self.decisions);
        if !self.errors.is_empty() {
            return Err(CoreError::Incomplete(self.errors.clone()));
        }

        Ok(GenerateContractRequest {
            mask_a: intake.clone(),
            mask_b: self.decisions.clone(),
            template_path: template_path.to_string(),
            placeholder_mapping: build_placeholder_mapping(intake, &self.decisions, today),
        })
    }

    /// Remember how the last generation attempt went.
    pub fn record_generation(&mut self, outcome: GenerationOutcome) {
        self.generation = outcome;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::Role;
    use crate::lawyer::{Compensation, RentAdjustment};
    use crate::validate::fixtures::{complete_decisions, complete_intake};
    use crate::wire::YesNo;
    use chrono::TimeZone;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
    }

    fn loaded_wizard() -> LawyerWizard {
        let mut wizard = LawyerWizard::new();
        let file = json!({"maskA": complete_intake(), "maskB": complete_decisions()});
        wizard.import_json(&file.to_string()).unwrap();
        wizard
    }

    #[test]
    fn client_wizard_blocks_on_incomplete_step() {
        let mut wizard = ClientWizard::new();
        assert!(!wizard.next());
        assert_eq!(wizard.step(), 0);
        assert!(wizard.errors().contains_key("rolle"));

        wizard.set_field("rolle", json!("Mieter")).unwrap();
        assert!(!wizard.errors().contains_key("rolle"));
        assert_eq!(wizard.intake().role, Some(Role::Tenant));
    }

    #[test]
    fn client_wizard_walks_through_complete_intake() {
        let intake = ClientIntake::from_value(complete_intake()).unwrap();
        let mut wizard = ClientWizard::from_intake(intake);
        while !wizard.is_summary() {
            assert!(wizard.next(), "stuck at {}", wizard.step_name());
        }
        assert_eq!(wizard.step_name(), "Zusammenfassung");
        assert_eq!(wizard.total_rent(), "1470,00 EUR");
        wizard.prev();
        assert_eq!(wizard.step(), 6);
    }

    #[test]
    fn client_field_update_rejects_unknown_choice() {
        let mut wizard = ClientWizard::new();
        wizard.set_field("rolle", json!("Vermieter")).unwrap();
        let err = wizard.set_field("rolle", json!("Hausmeister")).unwrap_err();
        assert!(matches!(err, CoreError::UnknownChoice { ref key, .. } if key == "rolle"));
        assert_eq!(wizard.intake().role, Some(Role::Landlord));
        assert!(wizard.intake().extra.get("rolle").is_none());
    }

    #[test]
    fn export_requires_every_step() {
        let mut wizard = ClientWizard::new();
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap();
        assert!(matches!(wizard.export(now), Err(CoreError::Incomplete(_))));

        let mut wizard = ClientWizard::from_intake(ClientIntake::from_value(complete_intake()).unwrap());
        let export = wizard.export(now).unwrap();
        assert_eq!(export.file_name, "mandantendaten_2025-02-01.json");
        let body: Value = serde_json::from_str(&export.json).unwrap();
        assert_eq!(body["timestamp"], json!("2025-02-01T12:00:00.000Z"));
        assert_eq!(body["gegenpartei"], json!("Ja"));
        assert!(body.get("gegenpartei_bekannt").is_none());
    }

    #[test]
    fn import_of_bare_intake_derives_tenant_contact() {
        let mut wizard = LawyerWizard::new();
        assert_eq!(wizard.import_status(), ImportStatus::Idle);
        wizard
            .import_json(r#"{"maskA": {"rolle": "Mieter", "eigene_email": "t@example.com"}, "maskB": {}}"#)
            .unwrap();
        assert_eq!(wizard.decisions().tenant_email, "t@example.com");
        assert_eq!(wizard.import_status(), ImportStatus::Done);
        assert_eq!(wizard.import_status().message(), "Mandantendaten erfolgreich geladen.");

        wizard
            .set_field("mietanpassung_normalfall", json!("staffel"))
            .unwrap();
        wizard
            .set_field("staffelmiete_schedule", json!("01.01.2026: 1.050 EUR"))
            .unwrap();
        wizard.set_field("mietanpassung_normalfall", json!("index")).unwrap();
        let d = wizard.decisions();
        assert_eq!(d.indexed_rent, Some(YesNo::Yes));
        assert_eq!(d.staggered_rent, Some(YesNo::No));
        assert!(d.staggered_schedule.is_empty());

        let map = d.to_map().unwrap();
        assert_eq!(map["indexmiete"], json!("Ja"));
        assert_eq!(map["staffelmiete"], json!("Nein"));
    }

    #[test]
    fn failed_import_leaves_state_untouched() {
        let mut wizard = loaded_wizard();
        let before = wizard.decisions().clone();

        assert!(wizard.import_json("{ kein json").is_err());
        assert_eq!(wizard.import_status(), ImportStatus::Error);
        assert!(wizard.import_json(r#"{"maskA": {"rolle": "Mieter"}, "maskB": [1]}"#).is_err());
        assert!(wizard.import_json("[1, 2]").is_err());

        assert_eq!(wizard.decisions(), &before);
        assert!(wizard.intake().is_some());
    }

    #[test]
    fn bare_intake_file_is_accepted() {
        let mut wizard = LawyerWizard::new();
        wizard.import_json(&complete_intake().to_string()).unwrap();
        let d = wizard.decisions();
        assert_eq!(d.tenant_email, "tom@example.com");
        assert_eq!(d.snapshot.name, "Vera Vermieterin");
        assert_eq!(d.renovation.selected(), Some(RenovationVariant::NoObligation));
    }

    #[test]
    fn ticking_a_renovation_variant_unticks_others() {
        let mut wizard = loaded_wizard();
        wizard.set_field("sr_unrenoviert_mit", json!(true)).unwrap();
        wizard.set_field("sr_ausgleich_option", json!("zuschuss")).unwrap();
        wizard.set_field("sr_ausgleich_betrag", json!("1500")).unwrap();

        let sr = &wizard.decisions().renovation;
        assert!(!sr.no_obligation);
        assert_eq!(sr.compensation, Some(Compensation::LumpSum));

        wizard.set_field("sr_ausgleich_option", json!("mietfrei")).unwrap();
        assert!(wizard.decisions().renovation.compensation_amount.is_empty());

        wizard.set_field("sr_renoviert", json!("on")).unwrap();
        let sr = &wizard.decisions().renovation;
        assert_eq!(sr.selected(), Some(RenovationVariant::TenantObligation));
        assert!(!sr.with_compensation);
        assert_eq!(sr.compensation, None);
    }

    #[test]
    fn unticking_the_selected_variant_keeps_it() {
        let mut wizard = loaded_wizard();
        wizard.set_field("sr_unrenoviert_mit", json!(true)).unwrap();
        wizard.set_field("sr_ausgleich_option", json!("zuschuss")).unwrap();
        wizard.set_field("sr_ausgleich_betrag", json!("1500")).unwrap();

        for falsy in [json!(false), json!(""), json!(null), json!("nein")] {
            wizard.set_field("sr_unrenoviert_mit", falsy).unwrap();
            let sr = &wizard.decisions().renovation;
            assert_eq!(sr.selected(), Some(RenovationVariant::ObligationWithCompensation));
            assert_eq!(sr.compensation_amount, "1500");
        }

        // Unticking a variant that is not selected changes nothing.
        wizard.set_field("sr_renoviert", json!(false)).unwrap();
        assert_eq!(
            wizard.decisions().renovation.selected(),
            Some(RenovationVariant::ObligationWithCompensation)
        );
        assert!(!wizard.errors().contains_key("sr_renoviert"));
    }

    #[test]
    fn backend_labels_import_and_edits_stay_strict() {
        let mut wizard = LawyerWizard::new();
        let file = json!({
            "maskA": {
                "rolle": "Mieter",
                "gegenpartei": "Ja",
                "wohnungsart": "Wohnung",
                "mietobjekt_adresse": "Teststraße 1, 10115 Berlin",
                "bezugsfertig": "2010-01-01",
                "vertragsart": "unbefristet",
            },
            "maskB": {
                "mpb_status": "Bereits vermietet",
                "mpb_vormiet": "vor dem 1. Juni 2015",
            },
        });
        wizard.import_json(&file.to_string()).unwrap();
        assert_eq!(wizard.import_status(), ImportStatus::Done);

        let intake = wizard.intake().unwrap();
        assert_eq!(intake.role, Some(Role::Tenant));
        assert_eq!(intake.extra["wohnungsart"], json!("Wohnung"));
        let combined: Value = serde_json::from_str(&wizard.combined_export().unwrap()).unwrap();
        assert_eq!(combined["maskA"]["wohnungsart"], json!("Wohnung"));
        assert_eq!(combined["maskB"]["mpb_vormiet"], json!("vor_juni_2015"));

        let before = wizard.decisions().clone();
        let err = wizard.set_field("mpb_vormiet", json!("irgendwann")).unwrap_err();
        assert!(matches!(err, CoreError::UnknownChoice { ref key, .. } if key == "mpb_vormiet"));
        assert_eq!(wizard.decisions(), &before);
    }

    #[test]
    fn legacy_flag_edit_resolves_mode() {
        let mut wizard = loaded_wizard();
        assert_eq!(wizard.decisions().rent_adjustment, Some(RentAdjustment::Indexed));
        wizard.set_field("indexmiete", json!("Nein")).unwrap();
        wizard.set_field("staffelmiete", json!("Ja")).unwrap();
        assert_eq!(wizard.decisions().rent_adjustment, Some(RentAdjustment::Staggered));
        assert_eq!(wizard.decisions().indexed_rent, Some(YesNo::No));
    }

    #[test]
    fn toggling_attachments() {
        let mut wizard = loaded_wizard();
        wizard.toggle_list("anlagen", "Hausordnung").unwrap();
        assert_eq!(wizard.decisions().attachments.len(), 3);
        wizard.toggle_list("anlagen", "Energieausweis").unwrap();
        assert_eq!(
            wizard.decisions().attachments,
            vec!["DSGVO-Informationsblatt", "Hausordnung"]
        );
    }

    #[test]
    fn import_step_needs_intake() {
        let mut wizard = LawyerWizard::new();
        assert!(!wizard.next());
        assert_eq!(wizard.step(), 0);
        assert!(matches!(wizard.combined_export(), Err(CoreError::NoIntake)));
        assert!(matches!(
            wizard.generation_request("t.html", today()),
            Err(CoreError::NoIntake)
        ));
    }

    #[test]
    fn rent_control_visibility_follows_intake_date() {
        let wizard = loaded_wizard();
        assert!(wizard.show_rent_control());

        let mut recent = LawyerWizard::new();
        recent
            .import_json(r#"{"bezugsfertig": "2019-06-01", "rolle": "Vermieter"}"#)
            .unwrap();
        assert!(!recent.show_rent_control());
    }

    #[test]
    fn rent_control_visibility_prefers_mirrored_date() {
        let mut wizard = LawyerWizard::new();
        wizard
            .import_json(r#"{"bezugsfertig": "2019-06-01", "rolle": "Vermieter"}"#)
            .unwrap();
        assert!(!wizard.show_rent_control());

        wizard.set_field("ro_bezugsfertig", json!("2010-01-01")).unwrap();
        assert!(wizard.show_rent_control());

        // A cleared mirror falls back to the intake's date.
        wizard.set_field("ro_bezugsfertig", json!("")).unwrap();
        assert!(!wizard.show_rent_control());
    }

    #[test]
    fn generation_request_carries_mapping() {
        let mut wizard = loaded_wizard();
        while wizard.step() < LAWYER_STEPS.len() - 1 {
            assert!(wizard.next(), "stuck at {}", wizard.step_name());
        }
        let request = wizard.generation_request("vorlage.html", today()).unwrap();
        assert_eq!(request.template_path, "vorlage.html");
        assert_eq!(request.placeholder_mapping.get("TENANT_NAME"), Some("Tom Mieter"));

        let combined: Value = serde_json::from_str(&wizard.combined_export().unwrap()).unwrap();
        assert_eq!(combined["maskA"]["rolle"], json!("Vermieter"));
        assert_eq!(combined["maskB"]["mietanpassung_normalfall"], json!("index"));

        wizard.record_generation(GenerationOutcome::NoDownloadUrl);
        assert_eq!(
            wizard.generation().message(),
            Some("Die Antwort des Servers enthält keinen Download-Link.")
        );
        wizard.record_generation(GenerationOutcome::Ready("https://files/v.docx".into()));
        assert_eq!(wizard.generation().download_url(), Some("https://files/v.docx"));
    }

    #[test]
    fn incomplete_decisions_block_generation() {
        let mut wizard = LawyerWizard::new();
        wizard.import_json(&complete_intake().to_string()).unwrap();
        match wizard.generation_request("t.html", today()) {
            Err(CoreError::Incomplete(errors)) => {
                assert!(errors.contains_key("bearbeiter"));
                assert_eq!(wizard.errors(), &errors);
            }
            other => panic!("expected incomplete form, got {other:?}"),
        }
    }
}
