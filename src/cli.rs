//! Clap adapter for hoconset.
//!
//! Compiled only with the `clap` Cargo feature (on by default). [`SettingArgs`]
//! is a derive struct to flatten into a host's own command line; the only
//! bridge to the core is [`SettingArgs::into_desired()`], which produces a
//! [`DesiredSetting`]. Hosts with a different parser build `DesiredSetting`
//! directly.

use std::path::PathBuf;

use clap::Args;

use crate::setting::DesiredSetting;
use crate::types::{Ensure, TypeTag};
use crate::value::ConfigValue;

/// One desired setting on the command line.
///
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(flatten)]
///     setting: SettingArgs,
/// }
/// ```
#[derive(Debug, Args)]
pub struct SettingArgs {
    /// Declaration title; used as the setting when --setting is not given.
    pub title: Option<String>,

    /// HOCON file to manage.
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Dotted setting identifier (e.g. "server.port").
    #[arg(long)]
    pub setting: Option<String>,

    /// Desired value. Read as JSON when it parses (`8080`, `true`, `[1, 2]`,
    /// `{"a": 1}`), otherwise as a plain string.
    #[arg(long)]
    pub value: Option<String>,

    /// Value type: boolean, number, string, text, array, array_element, hash.
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: Option<String>,

    /// Whether the setting should exist.
    #[arg(long, value_enum, default_value_t = Ensure::Present)]
    pub ensure: Ensure,
}

impl SettingArgs {
    /// Convert parsed args into a [`DesiredSetting`]. Type names are checked
    /// later, during validation.
    pub fn into_desired(self) -> DesiredSetting {
        let value = self
            .value
            .map(|raw| parse_cli_value(&raw, self.kind.as_deref()));
        DesiredSetting {
            title: self.title.unwrap_or_default(),
            path: self.path,
            setting: self.setting,
            ensure: self.ensure,
            kind: self.kind,
            value,
        }
    }
}

/// String-typed values are taken verbatim so `--type string --value 42` stays
/// the string "42".
fn parse_cli_value(raw: &str, kind: Option<&str>) -> ConfigValue {
    let verbatim = [TypeTag::String.as_str(), TypeTag::Text.as_str()];
    if kind.is_some_and(|k| verbatim.contains(&k)) {
        return ConfigValue::String(raw.to_string());
    }
    serde_json::from_str::<serde_json::Value>(raw)
        .map(ConfigValue::from)
        .unwrap_or_else(|_| ConfigValue::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        setting: SettingArgs,
    }

    fn parse(args: &[&str]) -> DesiredSetting {
        TestCli::try_parse_from(args).unwrap().setting.into_desired()
    }

    #[test]
    fn title_only() {
        let desired = parse(&["test", "foo.bar", "--value", "BAR!"]);
        assert_eq!(desired.title, "foo.bar");
        assert_eq!(desired.effective_setting(), Some("foo.bar"));
        assert_eq!(desired.value, Some(ConfigValue::from("BAR!")));
        assert_eq!(desired.ensure, Ensure::Present);
    }

    #[test]
    fn all_flags() {
        let desired = parse(&[
            "test",
            "decl",
            "--path",
            "/etc/app.conf",
            "--setting",
            "arr",
            "--type",
            "array_element",
            "--value",
            "2",
        ]);
        assert_eq!(desired.path, Some(PathBuf::from("/etc/app.conf")));
        assert_eq!(desired.effective_setting(), Some("arr"));
        assert_eq!(desired.kind.as_deref(), Some("array_element"));
        assert_eq!(desired.value, Some(ConfigValue::Integer(2)));
    }

    #[test]
    fn json_values_are_typed() {
        let desired = parse(&["test", "k", "--value", "[1, 2]"]);
        assert_eq!(desired.value, Some(ConfigValue::from(vec![1, 2])));

        let desired = parse(&["test", "k", "--value", "true"]);
        assert_eq!(desired.value, Some(ConfigValue::Boolean(true)));

        let desired = parse(&["test", "k", "--value", r#"{"a": 1}"#]);
        assert!(matches!(desired.value, Some(ConfigValue::Object(_))));
    }

    #[test]
    fn string_type_keeps_value_verbatim() {
        let desired = parse(&["test", "k", "--type", "string", "--value", "42"]);
        assert_eq!(desired.value, Some(ConfigValue::from("42")));

        let desired = parse(&["test", "k", "--type", "text", "--value", "[1, 2]"]);
        assert_eq!(desired.value, Some(ConfigValue::from("[1, 2]")));
    }

    #[test]
    fn ensure_absent() {
        let desired = parse(&["test", "k", "--ensure", "absent"]);
        assert_eq!(desired.ensure, Ensure::Absent);
        assert!(desired.value.is_none());
    }

    #[test]
    fn invalid_ensure_rejected() {
        assert!(TestCli::try_parse_from(["test", "k", "--ensure", "maybe"]).is_err());
    }

    #[test]
    fn unknown_type_fails_at_validation() {
        let desired = parse(&["test", "k", "--type", "float", "--value", "1"]);
        assert!(matches!(
            desired.resolve(),
            Err(crate::error::SettingError::InvalidType(_))
        ));
    }
}
