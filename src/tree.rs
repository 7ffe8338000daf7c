//! The document contract the convergence engine works against, and the
//! crate's own in-memory implementation of it.

use crate::edit::{splice_append, splice_delete, splice_set};
use crate::error::SettingError;
use crate::options::RenderOptions;
use crate::parse::{parse_document, parse_text};
use crate::path::{SettingIdentifier, ensure_path, parent_mut, resolve, resolve_mut};
use crate::render::render_document;
use crate::value::{ConfigValue, Object};

/// A mutable configuration tree addressed by dotted setting identifiers.
///
/// The engine borrows an implementation for a single pass and only ever calls
/// these methods, so any HOCON backend can sit behind it.
pub trait ConfigTree {
    /// The node at `id`, if every segment exists.
    fn get(&self, id: &SettingIdentifier) -> Option<&ConfigValue>;

    /// Set or replace the node at `id`, creating intermediate objects.
    fn set(&mut self, id: &SettingIdentifier, value: ConfigValue) -> Result<(), SettingError>;

    /// Remove the node at `id`, returning what was there.
    fn delete(&mut self, id: &SettingIdentifier) -> Option<ConfigValue>;

    /// Push `element` onto the existing array at `id`. Never creates the array.
    fn append_to_array(
        &mut self,
        id: &SettingIdentifier,
        element: ConfigValue,
    ) -> Result<(), SettingError>;

    /// Serialize the tree back to file text.
    fn render(&self) -> String;
}

/// A parsed HOCON document: the object tree plus the source text it came
/// from.
///
/// Edits are spliced into the source text, so comments and formatting
/// outside the changed field survive. A splice is kept only if the new text
/// reads back as the edited tree; otherwise the whole tree is rendered
/// afresh with the document's [`RenderOptions`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: Object,
    text: String,
    render: RenderOptions,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self, SettingError> {
        Ok(Self {
            root: parse_document(text)?,
            text: text.to_string(),
            render: RenderOptions::default(),
        })
    }

    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    pub fn root(&self) -> &Object {
        &self.root
    }

    fn commit(&mut self, edited: Option<String>) {
        self.text = match edited {
            Some(text) if reads_back_as(&text, &self.root) => text,
            _ => {
                tracing::debug!("rendering the whole document");
                render_document(&self.root, &self.render)
            }
        };
    }
}

impl From<Object> for Document {
    fn from(root: Object) -> Self {
        let render = RenderOptions::default();
        Self {
            text: render_document(&root, &render),
            root,
            render,
        }
    }
}

impl ConfigTree for Document {
    fn get(&self, id: &SettingIdentifier) -> Option<&ConfigValue> {
        resolve(&self.root, id)
    }

    fn set(&mut self, id: &SettingIdentifier, value: ConfigValue) -> Result<(), SettingError> {
        let (parent, leaf) = ensure_path(&mut self.root, id)?;
        let edited = splice_set(&self.text, id, &value, &self.render);
        parent.insert(leaf.to_string(), value);
        self.commit(edited);
        Ok(())
    }

    fn delete(&mut self, id: &SettingIdentifier) -> Option<ConfigValue> {
        let previous = parent_mut(&mut self.root, id)?.shift_remove(id.leaf())?;
        let edited = splice_delete(&self.text, id);
        self.commit(edited);
        Some(previous)
    }

    fn append_to_array(
        &mut self,
        id: &SettingIdentifier,
        element: ConfigValue,
    ) -> Result<(), SettingError> {
        let Some(items) = resolve_mut(&mut self.root, id).and_then(ConfigValue::as_array_mut)
        else {
            return Err(SettingError::MissingArray {
                setting: id.to_string(),
            });
        };
        let edited = splice_append(&self.text, id, &element, &self.render);
        items.push(element);
        self.commit(edited);
        Ok(())
    }

    fn render(&self) -> String {
        self.text.clone()
    }
}

/// Whether `text` parses to `root`, with raw text nodes compared by what
/// they parse to.
fn reads_back_as(text: &str, root: &Object) -> bool {
    let Ok(parsed) = parse_document(text) else {
        return false;
    };
    settled(root).is_some_and(|expected| expected == parsed)
}

fn settled(object: &Object) -> Option<Object> {
    object
        .iter()
        .map(|(key, value)| Some((key.clone(), settle(value)?)))
        .collect()
}

fn settle(value: &ConfigValue) -> Option<ConfigValue> {
    match value {
        ConfigValue::Raw(text) => parse_text(text).ok(),
        ConfigValue::Array(items) => items
            .iter()
            .map(settle)
            .collect::<Option<Vec<_>>>()
            .map(ConfigValue::Array),
        ConfigValue::Object(map) => settled(map).map(ConfigValue::Object),
        other => Some(other.clone()),
    }
}
