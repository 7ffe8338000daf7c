use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SettingError;

/// Semantic type of a setting's value. Drives both validation and comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Boolean,
    Number,
    String,
    /// Raw HOCON text, injected verbatim.
    Text,
    /// Whole-array replacement.
    Array,
    /// Additive membership in an existing array.
    ArrayElement,
    Hash,
}

impl TypeTag {
    pub const ALL: [TypeTag; 7] = [
        TypeTag::Boolean,
        TypeTag::Number,
        TypeTag::String,
        TypeTag::Text,
        TypeTag::Array,
        TypeTag::ArrayElement,
        TypeTag::Hash,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Boolean => "boolean",
            TypeTag::Number => "number",
            TypeTag::String => "string",
            TypeTag::Text => "text",
            TypeTag::Array => "array",
            TypeTag::ArrayElement => "array_element",
            TypeTag::Hash => "hash",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = SettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| SettingError::InvalidType(s.to_string()))
    }
}

/// Whether the setting should exist in the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ensure::Present => f.write_str("present"),
            Ensure::Absent => f.write_str("absent"),
        }
    }
}
