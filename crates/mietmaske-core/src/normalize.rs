//! Field normalisation: migrate historical key names to canonical ones.
//!
//! Three app revisions wrote intake files with different key names and value
//! shapes. Each migration below maps one legacy key to its canonical
//! replacement. The rules for every entry:
//!
//! - the legacy value is copied only when the canonical key is absent
//!   (missing or `null`), so a canonical value always wins;
//! - the legacy key is removed whether or not a copy happened;
//! - keys not named in the table pass through untouched.
//!
//! Running a table twice is a no-op since no legacy keys survive the first
//! pass.

use serde_json::{Map, Value};
use tracing::debug;

use crate::wire;

/// How a legacy value is converted on its way to the canonical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coerce {
    /// Copy unchanged.
    Keep,
    /// Checkbox semantics: `"ja"`, `"yes"`, `"true"`, `"1"` → `true`.
    Flag,
    /// Array or comma-separated text → array of trimmed non-empty strings.
    List,
    /// Any scalar → string.
    Text,
    /// A truthy legacy flag becomes this constant; a falsy one is ignored.
    Constant(&'static str),
}

/// One entry of a migration table. `to: None` drops the key outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub from: &'static str,
    pub to: Option<&'static str>,
    pub coerce: Coerce,
}

const fn rename(from: &'static str, to: &'static str, coerce: Coerce) -> Migration {
    Migration {
        from,
        to: Some(to),
        coerce,
    }
}

const fn retire(from: &'static str) -> Migration {
    Migration {
        from,
        to: None,
        coerce: Coerce::Keep,
    }
}

pub const CLIENT_INTAKE_MIGRATIONS: &[Migration] = &[
    rename("vollmacht_vorhanden", "vollmacht", Coerce::Keep),
    rename("gegenpartei_bekannt", "gegenpartei", Coerce::Keep),
    rename("eigeneName", "eigene_name", Coerce::Text),
    rename("eigeneAnschrift", "eigene_anschrift", Coerce::Text),
    rename("eigeneEmail", "eigene_email", Coerce::Text),
    rename("eigeneTelefon", "eigene_telefon", Coerce::Text),
    rename("eigeneIban", "eigene_iban", Coerce::Text),
    retire("abrz"),
];

pub const LAWYER_DECISION_MIGRATIONS: &[Migration] = &[
    rename("indexmiete_557b", "indexmiete", Coerce::Keep),
    rename("mietanpassung", "mietanpassung_normalfall", Coerce::Keep),
    rename("bk_zusatz_positionen", "zusatz_bk", Coerce::List),
    rename("untervermietung_klausel", "unterverm_klausel", Coerce::Keep),
    rename("tierhaltung_ton", "tiere_ton", Coerce::Keep),
    rename("weg_verweis_schluessel", "weg_text", Coerce::Keep),
    rename("mpb_grund_vormiete", "mpb_vormiete", Coerce::Flag),
    rename("mpb_grund_modernisierung", "mpb_modern", Coerce::Flag),
    rename("mpb_grund_erstmiete", "mpb_erstmiete", Coerce::Flag),
    rename("mpb_vormiete_details", "mpb_vormiete_text", Coerce::Keep),
    rename("mpb_modern_details", "mpb_modern_text", Coerce::Keep),
    rename("mpb_erstmiete_details", "mpb_erstmiete_text", Coerce::Keep),
    rename("mpb_vormiete_betrag", "mpb_vormiete_text", Coerce::Text),
    rename("sr_zuschuss", "sr_ausgleich_option", Coerce::Constant("zuschuss")),
    rename("sr_mietfrei", "sr_ausgleich_option", Coerce::Constant("mietfrei")),
    rename("sr_zuschuss_betrag", "sr_ausgleich_betrag", Coerce::Text),
    rename("sr_mietfrei_monate", "sr_ausgleich_monate", Coerce::Text),
    rename("mieterEmail", "mieter_email", Coerce::Text),
    rename("tenantEmail", "mieter_email", Coerce::Text),
    rename("mieterTelefon", "mieter_telefon", Coerce::Text),
    rename("tenantPhone", "mieter_telefon", Coerce::Text),
    retire("sr_modell"),
];

/// Canonical multi-select keys of the client intake.
pub const CLIENT_LIST_FIELDS: &[&str] = &["aussenbereich", "nebenraeume", "schluessel_arten"];

/// Canonical keys that older revisions stored as a list but are now text.
pub const CLIENT_JOINED_FIELDS: &[&str] = &["ausstattung"];

/// Canonical multi-select keys of the lawyer decisions.
pub const LAWYER_LIST_FIELDS: &[&str] = &["zusatz_bk", "anlagen"];

/// Normalise a raw client intake object.
pub fn normalize_client_intake(raw: Map<String, Value>) -> Map<String, Value> {
    let mut map = apply_migrations(raw, CLIENT_INTAKE_MIGRATIONS);
    fix_list_shapes(&mut map, CLIENT_LIST_FIELDS);
    for key in CLIENT_JOINED_FIELDS {
        if let Some(value @ Value::Array(_)) = map.get(*key) {
            let joined = wire::to_text(value);
            map.insert((*key).to_string(), Value::String(joined));
        }
    }
    map
}

/// Normalise a raw lawyer decision object.
pub fn normalize_lawyer_decisions(raw: Map<String, Value>) -> Map<String, Value> {
    let mut map = apply_migrations(raw, LAWYER_DECISION_MIGRATIONS);
    fix_list_shapes(&mut map, LAWYER_LIST_FIELDS);
    map
}

/// Run one migration table over a raw object.
pub fn apply_migrations(mut map: Map<String, Value>, table: &[Migration]) -> Map<String, Value> {
    let mut migrated = 0usize;
    let mut removed = 0usize;

    for migration in table {
        let Some(legacy) = map.remove(migration.from) else {
            continue;
        };
        removed += 1;

        let Some(target) = migration.to else {
            continue;
        };
        if legacy.is_null() || !is_absent(&map, target) {
            continue;
        }
        if let Some(value) = coerce(&legacy, migration.coerce) {
            map.insert(target.to_string(), value);
            migrated += 1;
        }
    }

    if removed > 0 {
        debug!(removed, migrated, "normalised legacy keys");
    }
    map
}

fn is_absent(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).is_none_or(Value::is_null)
}

fn coerce(value: &Value, coerce: Coerce) -> Option<Value> {
    match coerce {
        Coerce::Keep => Some(value.clone()),
        Coerce::Flag => Some(Value::Bool(wire::truthy(value))),
        Coerce::List => Some(Value::Array(
            wire::to_list(value).into_iter().map(Value::String).collect(),
        )),
        Coerce::Text => Some(Value::String(wire::to_text(value))),
        Coerce::Constant(constant) => {
            wire::truthy(value).then(|| Value::String(constant.to_string()))
        }
    }
}

fn fix_list_shapes(map: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        if let Some(value @ Value::String(_)) = map.get(*key) {
            let list = wire::to_list(value).into_iter().map(Value::String).collect();
            map.insert((*key).to_string(), Value::Array(list));
        }
    }
}
