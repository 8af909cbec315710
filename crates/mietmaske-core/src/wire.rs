//! Wire-format helpers for form records.
//!
//! The JSON the forms exchange is loosely typed: amounts arrive as strings or
//! numbers, checkboxes as booleans or `"Ja"`/`"nein"`, sets as arrays or
//! comma-separated text. Everything here accepts those shapes and hands the
//! rest of the crate plain Rust values.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Declare a closed enumeration together with its exact wire strings.
///
/// The first literal is what gets serialised; `|`-separated aliases are only
/// accepted when parsing. Matching ignores case and surrounding whitespace.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $wire:literal $(| $alias:literal)*
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The string this value takes in exported JSON.
            pub fn as_wire(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim().to_lowercase();
                $(
                    if needle == $wire.to_lowercase()
                        $(|| needle == $alias.to_lowercase())*
                    {
                        return Ok($name::$variant);
                    }
                )+
                Err($crate::error::UnknownVariant {
                    kind: stringify!($name),
                    value: s.trim().to_string(),
                })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_wire())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_wire())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum! {
    /// A yes/no radio answer. Serialised as `Ja` / `Nein`.
    pub enum YesNo {
        Yes => "Ja" | "yes" | "true" | "1" | "on",
        No => "Nein" | "no" | "false" | "0" | "off",
    }
}

impl YesNo {
    pub fn is_yes(self) -> bool {
        self == YesNo::Yes
    }

    pub fn from_bool(value: bool) -> Self {
        if value { YesNo::Yes } else { YesNo::No }
    }
}

/// Interpret a form value as a checkbox state.
///
/// Accepts JSON booleans, non-zero numbers, and the strings `ja`, `yes`,
/// `true`, `1`, `on`, `checked` (any case).
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "ja" | "yes" | "true" | "1" | "on" | "checked"
        ),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Render a form value as text. `null` becomes the empty string and lists
/// are joined with `", "`.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(to_text)
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// Interpret a form value as a list of trimmed, non-empty strings.
///
/// Arrays are taken item by item; a string is split on commas.
pub fn to_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .map(|item| to_text(item).trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        other => {
            let text = to_text(other);
            if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![text.trim().to_string()]
            }
        }
    }
}

/// Parse the leading numeric part of an amount field.
///
/// Mirrors how browsers read number inputs: `"130"`, `"130.5"`, `"130 EUR"`
/// all parse, `"abc"` does not. A comma is read as the decimal separator when
/// the text has no dot, so `"12,50"` is 12.5.
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let normalised;
    let source = if trimmed.contains(',') && !trimmed.contains('.') {
        normalised = trimmed.replacen(',', ".", 1);
        normalised.as_str()
    } else {
        trimmed
    };

    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in source.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    source[..end]
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Like [`parse_amount`], with missing or non-numeric input read as zero.
pub fn amount_or_zero(text: &str) -> f64 {
    parse_amount(text).unwrap_or(0.0)
}

// ── serde field adapters ──

/// `deserialize_with` adapter for free-text fields.
pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(to_text(&Value::deserialize(deserializer)?))
}

/// `deserialize_with` adapter for multi-select fields.
pub fn list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(to_list(&Value::deserialize(deserializer)?))
}

/// `deserialize_with` adapter for checkboxes.
pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(truthy(&Value::deserialize(deserializer)?))
}

/// `deserialize_with` adapter for checkboxes that may still be unanswered.
pub fn opt_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if is_blank(&value) {
        return Ok(None);
    }
    Ok(Some(truthy(&value)))
}

/// `deserialize_with` adapter for single-choice fields. Blank means unset.
///
/// A label outside the enumeration also decodes as unset; the record's
/// decoder keeps the raw label with [`keep_unknown_choices`].
pub fn opt_enum<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = Value::deserialize(deserializer)?;
    if is_blank(&value) {
        return Ok(None);
    }
    match to_text(&value).parse() {
        Ok(choice) => Ok(Some(choice)),
        Err(err) => {
            debug!(error = %err, "unrecognised choice left unset");
            Ok(None)
        }
    }
}

/// Copy every key that was given in `raw` but is missing or `null` once the
/// record is re-serialised (`decoded`) into `extra`, so unrecognised choice
/// labels survive re-export verbatim. Returns the keys that were kept.
pub(crate) fn keep_unknown_choices(
    raw: &Map<String, Value>,
    decoded: &Map<String, Value>,
    extra: &mut Map<String, Value>,
) -> Vec<String> {
    let mut kept = Vec::new();
    for (key, value) in raw {
        if is_blank(value) || !decoded.get(key).is_none_or(Value::is_null) {
            continue;
        }
        warn!(key = %key, value = %to_text(value), "unknown choice kept verbatim");
        extra.insert(key.clone(), value.clone());
        kept.push(key.clone());
    }
    kept
}

/// `null`, or a string holding only whitespace.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
