//! Options controlling how documents are written and how missing files are
//! handled.
//!
//! Layered the confique way: compiled defaults, then a TOML options file, then
//! `HOCONSET_*` environment variables.
//!
//! ```toml
//! create_missing = true
//!
//! [render]
//! indent = 2
//! separator = "colon"
//! ```

use std::path::{Path, PathBuf};

use confique::Config;
use serde::{Deserialize, Serialize};

use crate::error::SettingError;

/// File name looked up in the platform config directory.
pub const OPTIONS_FILE_NAME: &str = "hoconset.toml";

#[derive(Config, Debug, Clone, PartialEq)]
pub struct Options {
    /// Create the target file when a present setting is applied and the file
    /// does not exist yet.
    #[config(default = true, env = "HOCONSET_CREATE_MISSING")]
    pub create_missing: bool,

    /// How documents are written back.
    #[config(nested)]
    pub render: RenderOptions,
}

#[derive(Config, Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Spaces per nesting level.
    #[config(default = 4, env = "HOCONSET_INDENT")]
    pub indent: usize,

    /// Separator written between keys and scalar values.
    #[config(default = "equals")]
    pub separator: Separator,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Separator {
    /// `key = value`
    #[default]
    Equals,
    /// `key: value`
    Colon,
}

impl Separator {
    pub fn token(self) -> &'static str {
        match self {
            Separator::Equals => " = ",
            Separator::Colon => ": ",
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent: 4,
            separator: Separator::Equals,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            create_missing: true,
            render: RenderOptions::default(),
        }
    }
}

impl Options {
    /// Load options from defaults, `file` (or the platform options file when
    /// `None`), and the environment. Missing files are skipped.
    pub fn load(file: Option<&Path>) -> Result<Self, SettingError> {
        let file = file.map(Path::to_path_buf).or_else(default_options_path);
        let mut builder = Options::builder().env();
        if let Some(file) = file {
            tracing::debug!(file = %file.display(), "loading options");
            builder = builder.file(file);
        }
        Ok(builder.load()?)
    }
}

/// `{platform config dir}/hoconset/hoconset.toml`, when a home directory exists.
pub fn default_options_path() -> Option<PathBuf> {
    let proj = directories::ProjectDirs::from("", "", "hoconset")?;
    Some(proj.config_dir().join(OPTIONS_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn builder_defaults_match_default_impl() {
        let loaded = Options::builder().load().unwrap();
        assert_eq!(loaded, Options::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(OPTIONS_FILE_NAME);
        fs::write(
            &path,
            "create_missing = false\n[render]\nindent = 2\nseparator = \"colon\"\n",
        )
        .unwrap();

        let options = Options::builder().file(&path).load().unwrap();
        assert!(!options.create_missing);
        assert_eq!(options.render.indent, 2);
        assert_eq!(options.render.separator, Separator::Colon);
    }

    #[test]
    fn sparse_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(OPTIONS_FILE_NAME);
        fs::write(&path, "[render]\nindent = 8\n").unwrap();

        let options = Options::builder().file(&path).load().unwrap();
        assert!(options.create_missing);
        assert_eq!(options.render.indent, 8);
        assert_eq!(options.render.separator, Separator::Equals);
    }

    #[test]
    fn missing_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let options = Options::builder()
            .file(dir.path().join("absent.toml"))
            .load()
            .unwrap();
        assert_eq!(options, Options::default());
    }

    #[test]
    fn invalid_separator_is_options_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(OPTIONS_FILE_NAME);
        fs::write(&path, "[render]\nseparator = \"arrow\"\n").unwrap();

        let result = Options::load(Some(&path));
        assert!(matches!(result, Err(SettingError::Options(_))));
    }

    #[test]
    fn separator_tokens() {
        assert_eq!(Separator::Equals.token(), " = ");
        assert_eq!(Separator::Colon.token(), ": ");
    }

    #[test]
    fn default_path_ends_with_file_name() {
        if let Some(path) = default_options_path() {
            assert!(path.ends_with(OPTIONS_FILE_NAME));
        }
    }
}
