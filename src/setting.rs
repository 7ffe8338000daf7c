//! Desired settings as a host declares them, and their validated form.
//!
//! A [`DesiredSetting`] is loose on purpose: every field except the title is
//! optional and the type is a plain name. [`DesiredSetting::validate`] turns it
//! into a [`ResolvedSetting`], reporting every missing field at once before any
//! type checks run. The convergence engine only accepts resolved settings.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SettingError;
use crate::infer::infer_and_validate;
use crate::path::SettingIdentifier;
use crate::types::{Ensure, TypeTag};
use crate::value::ConfigValue;

/// One setting as declared by a host, e.g. from a JSON manifest:
///
/// ```json
/// { "title": "foo.bar", "path": "/etc/app.conf", "value": "BAR!" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DesiredSetting {
    /// Name of the declaration. Used as the setting identifier unless
    /// `setting` is given.
    pub title: String,
    /// File the setting lives in.
    pub path: Option<PathBuf>,
    /// Dotted setting identifier, overriding the title.
    pub setting: Option<String>,
    pub ensure: Ensure,
    /// Type name (`boolean`, `number`, `string`, `text`, `array`,
    /// `array_element`, `hash`). Inferred from the value when omitted.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub value: Option<ConfigValue>,
}

impl DesiredSetting {
    pub fn from_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_setting(mut self, setting: impl Into<String>) -> Self {
        self.setting = Some(setting.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<ConfigValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_type(mut self, tag: TypeTag) -> Self {
        self.kind = Some(tag.as_str().to_string());
        self
    }

    /// Set the type by name; unknown names fail later with `InvalidType`.
    pub fn with_type_name(mut self, name: impl Into<String>) -> Self {
        self.kind = Some(name.into());
        self
    }

    pub fn with_ensure(mut self, ensure: Ensure) -> Self {
        self.ensure = ensure;
        self
    }

    pub fn absent(self) -> Self {
        self.with_ensure(Ensure::Absent)
    }

    /// The setting identifier text: `setting` if given, else the title.
    pub fn effective_setting(&self) -> Option<&str> {
        match self.setting.as_deref() {
            Some(s) => Some(s),
            None if !self.title.is_empty() => Some(&self.title),
            None => None,
        }
    }

    /// Validate for use against an in-memory tree; `path` is not required.
    pub fn resolve(&self) -> Result<ResolvedSetting, SettingError> {
        self.check_required(false)?;
        self.resolve_checked()
    }

    /// Validate for use against a file. Fails with one aggregated
    /// [`SettingError::MissingRequiredFields`] naming every missing field
    /// (path, setting, and value unless absent), then with type errors.
    pub fn validate(&self) -> Result<(&Path, ResolvedSetting), SettingError> {
        self.check_required(true)?;
        let resolved = self.resolve_checked()?;
        match self.path.as_deref() {
            Some(path) => Ok((path, resolved)),
            None => Err(SettingError::MissingRequiredFields(vec!["path"])),
        }
    }

    fn requires_value(&self) -> bool {
        match self.ensure {
            Ensure::Present => true,
            Ensure::Absent => self.kind.as_deref() == Some(TypeTag::ArrayElement.as_str()),
        }
    }

    fn check_required(&self, require_path: bool) -> Result<(), SettingError> {
        let mut missing = Vec::new();
        if require_path && self.path.is_none() {
            missing.push("path");
        }
        if self.effective_setting().is_none() {
            missing.push("setting");
        }
        if self.requires_value() && self.value.is_none() {
            missing.push("value");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SettingError::MissingRequiredFields(missing))
        }
    }

    fn resolve_checked(&self) -> Result<ResolvedSetting, SettingError> {
        let explicit = self
            .kind
            .as_deref()
            .map(str::parse::<TypeTag>)
            .transpose()?;
        let identifier = SettingIdentifier::parse(self.effective_setting().unwrap_or_default())?;

        let state = match (self.ensure, explicit, &self.value) {
            (Ensure::Absent, Some(TypeTag::ArrayElement), Some(raw)) => {
                match infer_and_validate(&identifier, raw, Some(TypeTag::ArrayElement))? {
                    (_, ConfigValue::Array(items)) => DesiredState::AbsentElements(items),
                    (_, other) => DesiredState::AbsentElements(vec![other]),
                }
            }
            (Ensure::Absent, _, _) => DesiredState::Absent,
            (Ensure::Present, explicit, Some(raw)) => {
                let (tag, value) = infer_and_validate(&identifier, raw, explicit)?;
                DesiredState::Present { tag, value }
            }
            (Ensure::Present, _, None) => {
                return Err(SettingError::MissingRequiredFields(vec!["value"]));
            }
        };
        Ok(ResolvedSetting { identifier, state })
    }
}

/// A validated setting, ready for the convergence engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSetting {
    pub identifier: SettingIdentifier,
    pub state: DesiredState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DesiredState {
    /// The node must exist and match `value` under `tag`'s comparison rules.
    Present { tag: TypeTag, value: ConfigValue },
    /// The node must not exist.
    Absent,
    /// None of these elements may remain in the array at the path.
    AbsentElements(Vec<ConfigValue>),
}

impl ResolvedSetting {
    pub fn present(identifier: SettingIdentifier, tag: TypeTag, value: ConfigValue) -> Self {
        Self {
            identifier,
            state: DesiredState::Present { tag, value },
        }
    }

    pub fn absent(identifier: SettingIdentifier) -> Self {
        Self {
            identifier,
            state: DesiredState::Absent,
        }
    }
}
