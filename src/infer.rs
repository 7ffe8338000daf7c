//! Type validation and inference for desired values.
//!
//! With an explicit tag the raw value is checked against it and normalized
//! (numeric strings become numbers, text becomes a raw node, a lone
//! array_element becomes a one-element list). Without one, the tag is taken
//! from the value's shape.

use crate::error::SettingError;
use crate::parse::parse_text;
use crate::path::SettingIdentifier;
use crate::types::TypeTag;
use crate::value::ConfigValue;

/// Validate `raw` against `explicit`, or infer a tag when none is given.
/// Returns the tag together with the normalized value.
pub fn infer_and_validate(
    id: &SettingIdentifier,
    raw: &ConfigValue,
    explicit: Option<TypeTag>,
) -> Result<(TypeTag, ConfigValue), SettingError> {
    match explicit {
        Some(tag) => validate(id, raw, tag).map(|value| (tag, value)),
        None => infer(id, raw),
    }
}

fn validate(id: &SettingIdentifier, raw: &ConfigValue, tag: TypeTag) -> Result<ConfigValue, SettingError> {
    let normalized = match (tag, raw) {
        (TypeTag::Boolean, ConfigValue::Boolean(_)) => Some(raw.clone()),
        (TypeTag::String, ConfigValue::String(s) | ConfigValue::Raw(s)) => {
            Some(ConfigValue::String(s.clone()))
        }
        (TypeTag::Text, ConfigValue::String(s) | ConfigValue::Raw(s)) => {
            return readable_text(id, s);
        }
        (TypeTag::Number, ConfigValue::Integer(_)) => Some(raw.clone()),
        (TypeTag::Number, ConfigValue::Float(x)) if x.is_finite() => Some(raw.clone()),
        (TypeTag::Number, ConfigValue::String(s)) => parse_number(s),
        (TypeTag::Array, ConfigValue::Array(_)) => Some(raw.clone()),
        (TypeTag::Hash, ConfigValue::Object(_)) => Some(raw.clone()),
        (TypeTag::ArrayElement, ConfigValue::Array(_)) => Some(raw.clone()),
        (TypeTag::ArrayElement, other) => Some(ConfigValue::Array(vec![other.clone()])),
        _ => None,
    };
    normalized.ok_or_else(|| mismatch(id, expected_for(tag), raw))
}

fn infer(id: &SettingIdentifier, raw: &ConfigValue) -> Result<(TypeTag, ConfigValue), SettingError> {
    let tag = match raw {
        ConfigValue::Boolean(_) => TypeTag::Boolean,
        ConfigValue::Integer(_) | ConfigValue::Float(_) => TypeTag::Number,
        ConfigValue::String(_) => TypeTag::String,
        ConfigValue::Raw(text) => return readable_text(id, text).map(|v| (TypeTag::Text, v)),
        ConfigValue::Object(_) => TypeTag::Hash,
        ConfigValue::Array(items) if items.len() == 1 => {
            return Err(SettingError::AmbiguousType {
                setting: id.to_string(),
            });
        }
        ConfigValue::Array(_) => TypeTag::Array,
        ConfigValue::Null => return Err(mismatch(id, "a value", raw)),
    };
    Ok((tag, raw.clone()))
}

/// Text is written into the file verbatim, so it must be something the reader
/// accepts back.
fn readable_text(id: &SettingIdentifier, text: &str) -> Result<ConfigValue, SettingError> {
    match parse_text(text) {
        Ok(_) => Ok(ConfigValue::Raw(text.to_string())),
        Err(SettingError::Parse { message, .. }) => Err(SettingError::TypeMismatch {
            setting: id.to_string(),
            expected: "readable HOCON text".to_string(),
            actual: format!("text '{text}' ({message})"),
        }),
        Err(other) => Err(other),
    }
}

/// A trimmed string that fully parses as an integer, else as a finite float.
pub(crate) fn parse_number(s: &str) -> Option<ConfigValue> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(ConfigValue::Integer(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(ConfigValue::Float)
}

fn expected_for(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::Boolean => "boolean",
        TypeTag::Number => "number or numeric string",
        TypeTag::String | TypeTag::Text => "string",
        TypeTag::Array => "array",
        TypeTag::Hash => "hash",
        TypeTag::ArrayElement => "array element",
    }
}

fn mismatch(id: &SettingIdentifier, expected: &str, raw: &ConfigValue) -> SettingError {
    SettingError::TypeMismatch {
        setting: id.to_string(),
        expected: expected.to_string(),
        actual: describe(raw),
    }
}

fn describe(value: &ConfigValue) -> String {
    match value {
        ConfigValue::Null | ConfigValue::Array(_) | ConfigValue::Object(_) => {
            value.kind_name().to_string()
        }
        scalar => format!("{} '{scalar}'", scalar.kind_name()),
    }
}
