use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingError {
    #[error("Type mismatch for '{setting}': expected {expected}, got {actual}")]
    TypeMismatch {
        setting: String,
        expected: String,
        actual: String,
    },

    #[error(
        "Cannot infer a type for '{setting}' from a single-element array; pass type 'array' or 'array_element' explicitly"
    )]
    AmbiguousType { setting: String },

    #[error(
        "Invalid type '{0}': expected one of boolean, number, string, text, array, array_element, hash"
    )]
    InvalidType(String),

    #[error("Cannot set '{setting}': '{segment}' already exists and is not an object")]
    PathConflict { setting: String, segment: String },

    #[error("No array exists at '{setting}'; array_element only adds to an existing array")]
    MissingArray { setting: String },

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<&'static str>),

    #[error("Invalid setting '{setting}': {reason}")]
    InvalidSetting { setting: String, reason: String },

    #[error("Failed to parse {origin} (line {line}, column {column}): {message}")]
    Parse {
        origin: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("File {0} does not exist and create_missing is off")]
    MissingFile(PathBuf),

    #[error("Options error: {0}")]
    Options(#[from] confique::Error),
}

impl SettingError {
    /// Attach a file path to a parse error raised against an in-memory string.
    pub(crate) fn in_file(self, path: &std::path::Path) -> Self {
        match self {
            SettingError::Parse {
                line,
                column,
                message,
                ..
            } => SettingError::Parse {
                origin: path.display().to_string(),
                line,
                column,
                message,
            },
            other => other,
        }
    }
}
