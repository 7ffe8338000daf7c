//! File-level convergence: read a HOCON file, converge one setting, and write
//! the result back.
//!
//! The pure [`converge_document`] does all the work on strings; the I/O
//! wrappers read the file (a missing file is an empty document), call it, and
//! only write when something changed. Parent directories are created as
//! needed.

use std::path::Path;

use crate::change::Outcome;
use crate::converge::{converge, in_sync};
use crate::error::SettingError;
use crate::options::{Options, RenderOptions};
use crate::setting::{DesiredSetting, ResolvedSetting};
use crate::tree::{ConfigTree, Document};

/// Pure function: converge `resolved` against document text.
///
/// `content` is `None` when the file does not exist yet. Returns the outcome
/// and, when the document changed, its new text.
pub fn converge_document(
    content: Option<&str>,
    resolved: &ResolvedSetting,
    render: &RenderOptions,
) -> Result<(Outcome, Option<String>), SettingError> {
    let mut doc = load_document(content)?.with_render_options(render.clone());
    let outcome = converge(&mut doc, resolved)?;
    let text = outcome.changed().then(|| doc.render());
    Ok((outcome, text))
}

/// Whether the file named by `desired` already holds the desired setting.
pub fn check_file(desired: &DesiredSetting) -> Result<bool, SettingError> {
    let (path, resolved) = desired.validate()?;
    let content = read_existing(path)?;
    let doc = load_document(content.as_deref()).map_err(|e| e.in_file(path))?;
    Ok(in_sync(&doc, &resolved))
}

/// Converge the file named by `desired`, writing it only when it changed.
pub fn apply_file(desired: &DesiredSetting, options: &Options) -> Result<Outcome, SettingError> {
    let (path, resolved) = desired.validate()?;
    let content = read_existing(path)?;
    let (outcome, text) = converge_document(content.as_deref(), &resolved, &options.render)
        .map_err(|e| e.in_file(path))?;

    if let Some(text) = text {
        if content.is_none() && !options.create_missing {
            return Err(SettingError::MissingFile(path.to_path_buf()));
        }
        write_file(path, &text)?;
        tracing::info!(file = %path.display(), "wrote configuration file");
    }
    Ok(outcome)
}

fn load_document(content: Option<&str>) -> Result<Document, SettingError> {
    match content {
        Some(text) => Document::parse(text),
        None => Ok(Document::new()),
    }
}

/// Read a file, mapping "not found" to `None`.
fn read_existing(path: &Path) -> Result<Option<String>, SettingError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(file = %path.display(), "file does not exist yet");
            Ok(None)
        }
        Err(e) => Err(SettingError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn write_file(path: &Path, text: &str) -> Result<(), SettingError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| SettingError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, text).map_err(|e| SettingError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
