//! Subcommand implementations.
//!
//! Each command loads a JSON file, drives the matching wizard, and prints
//! or writes the result. Backend failures during `intake` are reported
//! and then ignored; during `generate` they fail the command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::{Local, Utc};
use serde_json::{Map, Value};
use tracing::{info, warn};

use mietmaske_core::intake::ClientIntake;
use mietmaske_core::validate::{
    CLIENT_STEPS, LAWYER_STEPS, validate_client_step, validate_lawyer_step,
};
use mietmaske_core::wizard::{IntakeExport, SAVE_FAILED_NOTICE};
use mietmaske_core::{
    COMBINED_EXPORT_FILE_NAME, ClientWizard, CoreError, GenerationOutcome, LawyerWizard,
    normalize_client_intake, normalize_lawyer_decisions,
};
use mietmaske_sync::{BackendClient, BackendError};

use crate::display;

// ── Commands ──

pub fn normalize(file: &Path, lawyer: bool) -> anyhow::Result<()> {
    let map = read_object(file)?;
    let before = map.len();
    let normalized = if lawyer {
        normalize_lawyer_decisions(map)
    } else {
        normalize_client_intake(map)
    };
    info!(file = %file.display(), before, after = normalized.len(), "normalized");
    println!("{}", serde_json::to_string_pretty(&normalized)?);
    Ok(())
}

pub fn validate(file: &Path, lawyer: bool) -> anyhow::Result<()> {
    let open = if lawyer {
        let wizard = load_lawyer(file, &[])?;
        report_lawyer_errors(&wizard)
    } else {
        let intake = ClientIntake::from_value(read_json(file)?)
            .with_context(|| format!("decoding {}", file.display()))?;
        report_client_errors(&intake)
    };

    if open > 0 {
        bail!("{open} field(s) still need input");
    }
    println!("Alle Schritte vollständig.");
    Ok(())
}

/// Export the client form. The local file is written even when the
/// backend cannot be reached; `api_base` of `None` skips the backend.
pub async fn intake(
    file: &Path,
    sets: &[String],
    out_dir: &Path,
    api_base: Option<&str>,
) -> anyhow::Result<()> {
    let intake = ClientIntake::from_value(read_json(file)?)
        .with_context(|| format!("decoding {}", file.display()))?;
    let mut wizard = ClientWizard::from_intake(intake);
    for assignment in sets {
        let (key, value) = parse_assignment(assignment)?;
        wizard
            .set_field(&key, value)
            .with_context(|| format!("setting {key}"))?;
    }

    let export = match wizard.export(Utc::now()) {
        Ok(export) => export,
        Err(CoreError::Incomplete(_)) => {
            let open = report_client_errors(wizard.intake());
            bail!("client form incomplete: {open} field(s) still need input");
        }
        Err(err) => return Err(err.into()),
    };

    display::print_intake_card(wizard.intake(), &wizard.total_rent());
    let path = write_intake_export(out_dir, &export)?;
    println!("Gespeichert: {}", path.display());

    if let Some(api_base) = api_base {
        let client = BackendClient::new(api_base);
        if let Err(err) = client.save_client_intake(&export.request).await {
            warn!(error = %err, "backend save failed, local file kept");
            eprintln!("{SAVE_FAILED_NOTICE}");
        }
    }
    Ok(())
}

pub fn placeholders(file: &Path, sets: &[String]) -> anyhow::Result<()> {
    let wizard = load_lawyer(file, sets)?;
    let mapping = wizard.placeholder_mapping(Local::now().date_naive())?;
    println!("{}", serde_json::to_string_pretty(&mapping)?);
    Ok(())
}

/// Submit the lawyer form. Any failure leaves the input file untouched,
/// so the command can simply be run again.
pub async fn generate(
    file: &Path,
    sets: &[String],
    api_base: &str,
    template_path: &str,
) -> anyhow::Result<()> {
    let mut wizard = load_lawyer(file, sets)?;
    let request = match wizard.generation_request(template_path, Local::now().date_naive()) {
        Ok(request) => request,
        Err(CoreError::Incomplete(_)) => {
            let open = report_lawyer_errors(&wizard);
            bail!("lawyer form incomplete: {open} field(s) still need input");
        }
        Err(err) => return Err(err.into()),
    };

    let client = BackendClient::new(api_base);
    let outcome = match client.generate_contract(&request).await {
        Ok(url) => GenerationOutcome::Ready(url),
        Err(err) => {
            warn!(error = %err, "contract generation failed");
            outcome_for(&err)
        }
    };
    wizard.record_generation(outcome);

    match wizard.generation() {
        GenerationOutcome::Ready(url) => {
            println!("Vertrag erstellt: {url}");
            Ok(())
        }
        other => bail!("{}", other.message().unwrap_or("contract generation failed")),
    }
}

pub fn combine(file: &Path, sets: &[String], out_dir: &Path) -> anyhow::Result<()> {
    let wizard = load_lawyer(file, sets)?;
    let json = wizard.combined_export()?;
    let path = out_dir.join(COMBINED_EXPORT_FILE_NAME);
    write_file(&path, &json)?;
    println!("Gespeichert: {}", path.display());
    Ok(())
}

// ── Helpers ──

fn read_json(file: &Path) -> anyhow::Result<Value> {
    let text =
        fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", file.display()))
}

fn read_object(file: &Path) -> anyhow::Result<Map<String, Value>> {
    match read_json(file)? {
        Value::Object(map) => Ok(map),
        _ => bail!("{} does not contain a JSON object", file.display()),
    }
}

/// Import a client or combined file into a fresh lawyer wizard and apply
/// the `--set` assignments in order.
fn load_lawyer(file: &Path, sets: &[String]) -> anyhow::Result<LawyerWizard> {
    let text =
        fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let mut wizard = LawyerWizard::new();
    wizard
        .import_json(&text)
        .with_context(|| format!("{} ({})", wizard.import_status().message(), file.display()))?;

    for assignment in sets {
        let (key, value) = parse_assignment(assignment)?;
        wizard
            .set_field(&key, value)
            .with_context(|| format!("setting {key}"))?;
    }
    Ok(wizard)
}

/// Split `key=value`. The value is read as JSON when it parses, otherwise
/// taken as a plain string, so `--set anlagen='["Energieausweis"]'` and
/// `--set bearbeiter=RA Schmidt` both work.
fn parse_assignment(assignment: &str) -> anyhow::Result<(String, Value)> {
    let Some((key, raw)) = assignment.split_once('=') else {
        bail!("expected KEY=VALUE, got `{assignment}`");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in `{assignment}`");
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

fn write_intake_export(out_dir: &Path, export: &IntakeExport) -> anyhow::Result<PathBuf> {
    let path = out_dir.join(&export.file_name);
    write_file(&path, &export.json)?;
    Ok(path)
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), bytes = contents.len(), "file written");
    Ok(())
}

fn outcome_for(err: &BackendError) -> GenerationOutcome {
    match err {
        BackendError::Server { .. } | BackendError::Json(_) => GenerationOutcome::Rejected,
        BackendError::MissingDownloadUrl => GenerationOutcome::NoDownloadUrl,
        BackendError::Http(_) => GenerationOutcome::Unreachable,
    }
}

/// Print every incomplete client step. Returns the number of open fields.
fn report_client_errors(intake: &ClientIntake) -> usize {
    let mut open = 0;
    for (step, name) in CLIENT_STEPS.iter().enumerate() {
        let errors = validate_client_step(step, intake);
        display::print_step_errors(step, name, &errors);
        open += errors.len();
    }
    open
}

fn report_lawyer_errors(wizard: &LawyerWizard) -> usize {
    let mut open = 0;
    for (step, name) in LAWYER_STEPS.iter().enumerate() {
        let errors = validate_lawyer_step(step, wizard.decisions());
        display::print_step_errors(step, name, &errors);
        open += errors.len();
    }
    open
}
