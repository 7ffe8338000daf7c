//! Change descriptions and convergence outcomes returned to the host for
//! display.

use std::fmt;

use crate::value::ConfigValue;

/// What a sync did to a single setting.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeDescription {
    /// The node did not exist and was created.
    Created { value: ConfigValue },
    /// An existing node was replaced.
    Changed { from: ConfigValue, to: ConfigValue },
    /// The node was deleted.
    Removed { previous: ConfigValue },
    /// Elements were appended to an array. `after` is the deduplicated union.
    ElementsAdded {
        before: Vec<ConfigValue>,
        after: Vec<ConfigValue>,
    },
    /// Elements were taken out of an array.
    ElementsRemoved {
        before: Vec<ConfigValue>,
        after: Vec<ConfigValue>,
    },
    /// Nothing needed doing.
    Unchanged,
}

impl ChangeDescription {
    pub fn is_change(&self) -> bool {
        !matches!(self, ChangeDescription::Unchanged)
    }
}

impl fmt::Display for ChangeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeDescription::Created { value } => write!(f, "created with value '{value}'"),
            ChangeDescription::Changed { from, to } => {
                write!(f, "value changed '{from}' to '{to}'")
            }
            ChangeDescription::Removed { previous } => write!(f, "removed value '{previous}'"),
            ChangeDescription::ElementsAdded { before, after }
            | ChangeDescription::ElementsRemoved { before, after } => {
                write!(f, "value changed {} to {}", list(before), list(after))
            }
            ChangeDescription::Unchanged => f.write_str("already in sync"),
        }
    }
}

fn list(items: &[ConfigValue]) -> ConfigValue {
    ConfigValue::Array(items.to_vec())
}

/// Result of converging one setting.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    InSync { setting: String },
    Changed {
        setting: String,
        change: ChangeDescription,
    },
}

impl Outcome {
    pub fn changed(&self) -> bool {
        matches!(self, Outcome::Changed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::InSync { setting } => write!(f, "{setting}: in sync"),
            Outcome::Changed { setting, change } => write!(f, "{setting}: {change}"),
        }
    }
}
