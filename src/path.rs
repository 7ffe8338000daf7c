//! Dotted setting identifiers and navigation of the node tree by identifier.
//!
//! Reads never mutate. [`ensure_path`] is the only place intermediate objects
//! get created, and it refuses to walk through a non-object node.

use std::fmt;
use std::str::FromStr;

use crate::error::SettingError;
use crate::value::{ConfigValue, Object};

/// A parsed `a.b.c` setting path. Always at least one segment, none empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettingIdentifier {
    segments: Vec<String>,
}

impl SettingIdentifier {
    pub fn parse(setting: &str) -> Result<Self, SettingError> {
        if setting.is_empty() {
            return Err(SettingError::InvalidSetting {
                setting: setting.into(),
                reason: "setting is empty".into(),
            });
        }
        let segments: Vec<String> = setting.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(SettingError::InvalidSetting {
                setting: setting.into(),
                reason: "path segments must not be empty".into(),
            });
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Segments leading to the final key (empty for a top-level setting).
    pub fn parents(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    pub fn leaf(&self) -> &str {
        // Non-empty by construction.
        &self.segments[self.segments.len() - 1]
    }
}

impl FromStr for SettingIdentifier {
    type Err = SettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SettingIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Look up the node at `id`, or `None` if any segment is missing or a parent
/// is not an object.
pub fn resolve<'a>(root: &'a Object, id: &SettingIdentifier) -> Option<&'a ConfigValue> {
    let mut current = root;
    for segment in id.parents() {
        current = current.get(segment)?.as_object()?;
    }
    current.get(id.leaf())
}

/// Mutable lookup of the node at `id`. Never creates anything.
pub fn resolve_mut<'a>(root: &'a mut Object, id: &SettingIdentifier) -> Option<&'a mut ConfigValue> {
    parent_mut(root, id)?.get_mut(id.leaf())
}

/// The object that holds (or would hold) `id`'s final segment, if every parent
/// already exists as an object.
pub fn parent_mut<'a>(root: &'a mut Object, id: &SettingIdentifier) -> Option<&'a mut Object> {
    let mut current = root;
    for segment in id.parents() {
        current = current.get_mut(segment)?.as_object_mut()?;
    }
    Some(current)
}

/// Walk to the parent object of `id`, creating empty objects for missing
/// intermediate segments. Returns the parent and the final key.
///
/// Fails with [`SettingError::PathConflict`] when an intermediate segment
/// exists but holds something other than an object (e.g. `foo.bar` while
/// `foo` is a string).
pub fn ensure_path<'a, 'b>(
    root: &'a mut Object,
    id: &'b SettingIdentifier,
) -> Result<(&'a mut Object, &'b str), SettingError> {
    let mut current = root;
    for segment in id.parents() {
        current = match current
            .entry(segment.clone())
            .or_insert_with(|| ConfigValue::Object(Object::new()))
        {
            ConfigValue::Object(map) => map,
            _ => {
                return Err(SettingError::PathConflict {
                    setting: id.to_string(),
                    segment: segment.clone(),
                });
            }
        };
    }
    Ok((current, id.leaf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::object;

    fn id(s: &str) -> SettingIdentifier {
        SettingIdentifier::parse(s).unwrap()
    }

    #[test]
    fn parse_splits_on_dots() {
        let parsed = id("database.pool.size");
        assert_eq!(parsed.segments(), ["database", "pool", "size"]);
        assert_eq!(parsed.leaf(), "size");
        assert_eq!(parsed.parents(), ["database", "pool"]);
        assert_eq!(parsed.to_string(), "database.pool.size");
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(matches!(
            SettingIdentifier::parse(""),
            Err(SettingError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn parse_rejects_empty_segment() {
        for bad in ["a..b", ".a", "a."] {
            assert!(
                SettingIdentifier::parse(bad).is_err(),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn resolve_flat_and_nested() {
        let root = object(r#"{"port": 8080, "db": {"url": "pg://"}}"#);
        assert_eq!(resolve(&root, &id("port")), Some(&ConfigValue::Integer(8080)));
        assert_eq!(resolve(&root, &id("db.url")), Some(&ConfigValue::from("pg://")));
    }

    #[test]
    fn resolve_missing_is_none() {
        let root = object(r#"{"db": {"url": "pg://"}}"#);
        assert!(resolve(&root, &id("db.pool")).is_none());
        assert!(resolve(&root, &id("nope.deeper")).is_none());
    }

    #[test]
    fn resolve_through_scalar_is_none() {
        let root = object(r#"{"foo": "scalar"}"#);
        assert!(resolve(&root, &id("foo.bar")).is_none());
    }

    #[test]
    fn ensure_path_creates_intermediates() {
        let mut root = Object::new();
        let target = id("a.b.c");
        let (parent, leaf) = ensure_path(&mut root, &target).unwrap();
        assert!(parent.is_empty());
        parent.insert(leaf.to_string(), ConfigValue::Integer(1));
        assert_eq!(resolve(&root, &target), Some(&ConfigValue::Integer(1)));
    }

    #[test]
    fn ensure_path_reuses_existing_objects() {
        let mut root = object(r#"{"a": {"keep": true}}"#);
        let target = id("a.new");
        let (parent, _) = ensure_path(&mut root, &target).unwrap();
        assert!(parent.contains_key("keep"));
    }

    #[test]
    fn ensure_path_conflict_on_scalar_parent() {
        let mut root = object(r#"{"foo": "scalar"}"#);
        let err = ensure_path(&mut root, &id("foo.bar")).unwrap_err();
        match err {
            SettingError::PathConflict { setting, segment } => {
                assert_eq!(setting, "foo.bar");
                assert_eq!(segment, "foo");
            }
            other => panic!("Expected PathConflict, got {other:?}"),
        }
    }

    #[test]
    fn parent_mut_never_creates() {
        let mut root = Object::new();
        assert!(parent_mut(&mut root, &id("a.b")).is_none());
        assert!(root.is_empty());
    }
}
