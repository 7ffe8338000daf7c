//! The convergence engine: compare one resolved setting against a tree and
//! apply the smallest edit that brings the tree in line.
//!
//! Comparison policy by tag:
//!
//! | tag | in sync when |
//! |-----|--------------|
//! | `array_element` | every desired element is an item, or a flattened leaf, of the current array |
//! | `array` | current array equals desired, element for element, in order |
//! | `text` | current node equals the raw text, or both parse to equal values |
//! | others | current node deep-equals the normalized value |
//!
//! An absent setting is in sync when the node does not exist. An absent
//! `array_element` setting is in sync when none of its elements remain.

use crate::change::{ChangeDescription, Outcome};
use crate::error::SettingError;
use crate::parse::parse_text;
use crate::setting::{DesiredState, ResolvedSetting};
use crate::tree::ConfigTree;
use crate::types::TypeTag;
use crate::value::ConfigValue;

/// Whether `tree` already matches `setting`.
pub fn in_sync<T: ConfigTree + ?Sized>(tree: &T, setting: &ResolvedSetting) -> bool {
    let current = tree.get(&setting.identifier);
    match &setting.state {
        DesiredState::Absent => current.is_none(),
        DesiredState::AbsentElements(unwanted) => match current {
            Some(ConfigValue::Array(items)) => !unwanted.iter().any(|u| items.contains(u)),
            _ => true,
        },
        DesiredState::Present { tag, value } => {
            current.is_some_and(|current| matches_desired(*tag, current, value))
        }
    }
}

fn matches_desired(tag: TypeTag, current: &ConfigValue, desired: &ConfigValue) -> bool {
    match tag {
        TypeTag::ArrayElement => current
            .as_array()
            .is_some_and(|items| wanted(desired).iter().all(|w| holds(items, w))),
        TypeTag::Array => current.as_array().is_some() && current == desired,
        TypeTag::Text => {
            current == desired
                || matches!(
                    (structural(current), structural(desired)),
                    (Some(a), Some(b)) if a == b
                )
        }
        TypeTag::Boolean | TypeTag::Number | TypeTag::String | TypeTag::Hash => current == desired,
    }
}

/// Raw text compared by what it parses to; unparseable text only matches
/// itself.
fn structural(value: &ConfigValue) -> Option<ConfigValue> {
    match value {
        ConfigValue::Raw(text) => parse_text(text).ok(),
        other => Some(other.clone()),
    }
}

/// An element is present when it is a direct item of the array or one of its
/// flattened leaves.
fn holds(items: &[ConfigValue], element: &ConfigValue) -> bool {
    items.contains(element)
        || items
            .iter()
            .flat_map(ConfigValue::flattened)
            .any(|leaf| leaf == element)
}

fn wanted(desired: &ConfigValue) -> &[ConfigValue] {
    match desired {
        ConfigValue::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

/// Bring `tree` in line with `setting`, returning what changed.
///
/// Fails with [`SettingError::PathConflict`] when a parent segment is not an
/// object, and with [`SettingError::MissingArray`] when `array_element` has no
/// array to add to. Mutations made before a failure are not rolled back.
pub fn sync<T: ConfigTree + ?Sized>(
    tree: &mut T,
    setting: &ResolvedSetting,
) -> Result<ChangeDescription, SettingError> {
    if in_sync(&*tree, setting) {
        return Ok(ChangeDescription::Unchanged);
    }
    let id = &setting.identifier;

    match &setting.state {
        DesiredState::Absent => Ok(match tree.delete(id) {
            Some(previous) => ChangeDescription::Removed { previous },
            None => ChangeDescription::Unchanged,
        }),
        DesiredState::AbsentElements(unwanted) => {
            let Some(before) = tree.get(id).and_then(ConfigValue::as_array).cloned() else {
                return Ok(ChangeDescription::Unchanged);
            };
            let after: Vec<ConfigValue> = before
                .iter()
                .filter(|item| !unwanted.contains(item))
                .cloned()
                .collect();
            tree.set(id, ConfigValue::Array(after.clone()))?;
            Ok(ChangeDescription::ElementsRemoved { before, after })
        }
        DesiredState::Present {
            tag: TypeTag::ArrayElement,
            value,
        } => {
            let Some(before) = tree.get(id).and_then(ConfigValue::as_array).cloned() else {
                return Err(SettingError::MissingArray {
                    setting: id.to_string(),
                });
            };
            let mut added: Vec<ConfigValue> = Vec::new();
            for element in wanted(value) {
                if holds(&before, element) || added.contains(element) {
                    continue;
                }
                added.push(element.clone());
            }
            for element in &added {
                tree.append_to_array(id, element.clone())?;
            }

            let mut after: Vec<ConfigValue> = Vec::with_capacity(before.len() + added.len());
            for item in before.iter().chain(&added) {
                if !after.contains(item) {
                    after.push(item.clone());
                }
            }
            Ok(ChangeDescription::ElementsAdded { before, after })
        }
        DesiredState::Present { value, .. } => {
            let previous = tree.get(id).cloned();
            tree.set(id, value.clone())?;
            Ok(match previous {
                Some(from) => ChangeDescription::Changed {
                    from,
                    to: value.clone(),
                },
                None => ChangeDescription::Created {
                    value: value.clone(),
                },
            })
        }
    }
}

/// Check, and sync only if needed.
pub fn converge<T: ConfigTree + ?Sized>(
    tree: &mut T,
    setting: &ResolvedSetting,
) -> Result<Outcome, SettingError> {
    let name = setting.identifier.to_string();
    if in_sync(&*tree, setting) {
        tracing::debug!(setting = %name, "already in sync");
        return Ok(Outcome::InSync { setting: name });
    }
    let change = sync(tree, setting)?;
    tracing::info!(setting = %name, %change, "setting changed");
    Ok(Outcome::Changed {
        setting: name,
        change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::object;
    use crate::setting::DesiredSetting;
    use crate::tree::Document;
    use serde_json::json;

    fn doc(text: &str) -> Document {
        Document::parse(text).unwrap()
    }

    fn present(setting: &str, value: serde_json::Value, tag: Option<TypeTag>) -> ResolvedSetting {
        let mut desired = DesiredSetting::from_title(setting).with_value(value);
        if let Some(tag) = tag {
            desired = desired.with_type(tag);
        }
        desired.resolve().unwrap()
    }

    fn absent(setting: &str) -> ResolvedSetting {
        DesiredSetting::from_title(setting).absent().resolve().unwrap()
    }

    fn assert_round_trip(tree: &mut Document, setting: &ResolvedSetting) {
        sync(tree, setting).unwrap();
        assert!(in_sync(&*tree, setting), "not in sync after sync: {setting:?}");
        assert_eq!(sync(tree, setting).unwrap(), ChangeDescription::Unchanged);
    }

    // -- basic scenarios ----------------------------------------------------

    #[test]
    fn creates_nested_setting_in_empty_tree() {
        let mut tree = Document::new();
        let setting = present("foo.bar", json!("BAR!"), None);
        assert!(!in_sync(&tree, &setting));

        let change = sync(&mut tree, &setting).unwrap();
        assert_eq!(change.to_string(), "created with value 'BAR!'");
        assert_eq!(tree.root(), &object(r#"{"foo": {"bar": "BAR!"}}"#));
        assert!(in_sync(&tree, &setting));
    }

    #[test]
    fn array_element_appends_and_reports_union() {
        let mut tree = doc("arr = [1]");
        let setting = present("arr", json!(2), Some(TypeTag::ArrayElement));

        let change = sync(&mut tree, &setting).unwrap();
        assert_eq!(change.to_string(), "value changed [1] to [1, 2]");
        assert_eq!(tree.render(), "arr = [1, 2]");
        assert!(in_sync(&tree, &setting));
    }

    #[test]
    fn array_element_already_present_is_noop() {
        let mut tree = doc("arr = [1, 2]");
        let setting = present("arr", json!(2), Some(TypeTag::ArrayElement));
        assert!(in_sync(&tree, &setting));
        assert_eq!(sync(&mut tree, &setting).unwrap(), ChangeDescription::Unchanged);
        assert_eq!(tree.render(), "arr = [1, 2]");
    }

    #[test]
    fn explicit_single_element_array() {
        let mut tree = Document::new();
        let setting = present("k", json!([1]), Some(TypeTag::Array));
        sync(&mut tree, &setting).unwrap();
        assert_eq!(tree.render(), "k = [1]\n");
    }

    // -- array semantics ----------------------------------------------------

    #[test]
    fn array_in_sync_only_in_same_order() {
        let setting = present("k", json!([1, 2]), None);
        assert!(in_sync(&doc("k = [1, 2]"), &setting));
        assert!(!in_sync(&doc("k = [2, 1]"), &setting));
        assert!(!in_sync(&doc("k = [1, 2, 3]"), &setting));
    }

    #[test]
    fn array_replaces_whole_array() {
        let mut tree = doc("k = [3, 2, 1]");
        let setting = present("k", json!([1, 2]), None);
        let change = sync(&mut tree, &setting).unwrap();
        assert_eq!(change.to_string(), "value changed '[3, 2, 1]' to '[1, 2]'");
        assert_eq!(tree.render(), "k = [1, 2]");
    }

    #[test]
    fn array_element_tolerates_extra_current_elements() {
        let setting = present("arr", json!([3, 1]), Some(TypeTag::ArrayElement));
        assert!(in_sync(&doc("arr = [1, 2, 3, 4]"), &setting));
    }

    #[test]
    fn array_element_matches_nested_arrays() {
        let setting = present("arr", json!(3), Some(TypeTag::ArrayElement));
        assert!(in_sync(&doc("arr = [1, [2, [3]]]"), &setting));
    }

    #[test]
    fn array_element_finds_nested_array_items() {
        let mut tree = doc("arr = [1]");
        let setting = present("arr", json!([[1, 2]]), Some(TypeTag::ArrayElement));
        assert!(!in_sync(&tree, &setting));

        let change = sync(&mut tree, &setting).unwrap();
        assert_eq!(change.to_string(), "value changed [1] to [1, [1, 2]]");
        assert!(in_sync(&tree, &setting));
        assert_eq!(sync(&mut tree, &setting).unwrap(), ChangeDescription::Unchanged);
        assert_eq!(tree.get(&setting.identifier), Some(&ConfigValue::from(json!([1, [1, 2]]))));
    }

    #[test]
    fn array_element_appends_several_without_duplicates() {
        let mut tree = doc("arr = [1]");
        let setting = present("arr", json!([1, 2, 2, 3]), Some(TypeTag::ArrayElement));
        let change = sync(&mut tree, &setting).unwrap();
        assert_eq!(change.to_string(), "value changed [1] to [1, 2, 3]");
        assert_eq!(tree.render(), "arr = [1, 2, 3]");
    }

    #[test]
    fn array_element_union_drops_existing_duplicates() {
        let mut tree = doc("arr = [1, 1]");
        let setting = present("arr", json!(2), Some(TypeTag::ArrayElement));
        let change = sync(&mut tree, &setting).unwrap();
        assert_eq!(change.to_string(), "value changed [1, 1] to [1, 2]");
        assert_eq!(tree.render(), "arr = [1, 1, 2]");
    }

    #[test]
    fn array_element_twice_is_idempotent() {
        let mut tree = doc("arr = [1]");
        let setting = present("arr", json!(2), Some(TypeTag::ArrayElement));
        sync(&mut tree, &setting).unwrap();
        let after_first = tree.render();
        assert_eq!(sync(&mut tree, &setting).unwrap(), ChangeDescription::Unchanged);
        assert_eq!(tree.render(), after_first);
    }

    #[test]
    fn array_element_requires_existing_array() {
        let setting = present("arr", json!(2), Some(TypeTag::ArrayElement));
        for text in ["", "arr = 1", "arr { x = 1 }"] {
            let mut tree = doc(text);
            assert!(!in_sync(&tree, &setting));
            let err = sync(&mut tree, &setting).unwrap_err();
            assert!(matches!(err, SettingError::MissingArray { .. }), "{text}");
            assert_eq!(tree, doc(text));
        }
    }

    // -- scalars and hashes -------------------------------------------------

    #[test]
    fn number_matches_across_int_and_float() {
        let setting = present("rate", json!("2"), Some(TypeTag::Number));
        assert!(in_sync(&doc("rate = 2.0"), &setting));
        assert!(!in_sync(&doc("rate = \"2\""), &setting));
    }

    #[test]
    fn string_does_not_match_number() {
        let setting = present("port", json!("8080"), None);
        assert!(!in_sync(&doc("port = 8080"), &setting));
    }

    #[test]
    fn changing_a_scalar_reports_both_values() {
        let mut tree = doc("port = 80");
        let setting = present("port", json!(8080), None);
        let change = sync(&mut tree, &setting).unwrap();
        assert_eq!(
            change,
            ChangeDescription::Changed {
                from: 80.into(),
                to: 8080.into()
            }
        );
    }

    #[test]
    fn hash_compares_deeply_ignoring_key_order() {
        let setting = present("db", json!({"url": "pg://", "pool": 5}), None);
        assert!(in_sync(&doc("db { pool = 5, url = \"pg://\" }"), &setting));
        assert!(!in_sync(&doc("db { pool = 5 }"), &setting));
    }

    #[test]
    fn hash_replaces_whole_object() {
        let mut tree = doc("db { pool = 5, extra = true }");
        let setting = present("db", json!({"pool": 10}), None);
        sync(&mut tree, &setting).unwrap();
        assert_eq!(tree.root(), &object(r#"{"db": {"pool": 10}}"#));
    }

    #[test]
    fn path_conflict_propagates() {
        let mut tree = doc("foo = scalar");
        let setting = present("foo.bar", json!(1), None);
        let err = sync(&mut tree, &setting).unwrap_err();
        assert!(matches!(err, SettingError::PathConflict { .. }));
    }

    #[test]
    fn sibling_keys_survive_set() {
        let mut tree = doc("a { keep = 1 }\nb = 2");
        sync(&mut tree, &present("a.new", json!("x"), None)).unwrap();
        assert_eq!(
            tree.root(),
            &object(r#"{"a": {"keep": 1, "new": "x"}, "b": 2}"#)
        );
    }

    // -- text ---------------------------------------------------------------

    #[test]
    fn text_is_injected_verbatim() {
        let mut tree = Document::new();
        let raw = "{\n  # tuned by hand\n  size = 10\n}";
        let setting = present("cache", json!(raw), Some(TypeTag::Text));
        sync(&mut tree, &setting).unwrap();
        assert_eq!(tree.render(), format!("cache = {raw}\n"));
        assert!(in_sync(&tree, &setting));
    }

    #[test]
    fn text_in_sync_after_reparse() {
        let setting = present("cache", json!("{ size = 10 }"), Some(TypeTag::Text));
        assert!(in_sync(&doc("cache {\n    size = 10\n}\n"), &setting));
        assert!(!in_sync(&doc("cache { size = 11 }"), &setting));
    }

    #[test]
    fn text_scalar_compares_parsed_value() {
        let setting = present("level", json!("\"debug\""), Some(TypeTag::Text));
        assert!(in_sync(&doc("level = debug"), &setting));
    }

    #[test]
    fn distinct_unreadable_texts_are_not_in_sync() {
        let id = crate::path::SettingIdentifier::parse("t").unwrap();
        let mut tree = Document::new();
        tree.set(&id, ConfigValue::Raw("{ a = ".into())).unwrap();
        let setting =
            ResolvedSetting::present(id.clone(), TypeTag::Text, ConfigValue::Raw("{ b = ".into()));
        assert!(!in_sync(&tree, &setting));

        let change = sync(&mut tree, &setting).unwrap();
        assert!(change.is_change());
        assert_eq!(tree.get(&id), Some(&ConfigValue::Raw("{ b = ".into())));
        assert!(in_sync(&tree, &setting));
    }

    // -- absent -------------------------------------------------------------

    #[test]
    fn absent_deletes_node() {
        let mut tree = doc("a { b = 1, c = 2 }");
        let setting = absent("a.b");
        assert!(!in_sync(&tree, &setting));
        let change = sync(&mut tree, &setting).unwrap();
        assert_eq!(change, ChangeDescription::Removed { previous: 1.into() });
        assert_eq!(tree.root(), &object(r#"{"a": {"c": 2}}"#));
        assert!(in_sync(&tree, &setting));
    }

    #[test]
    fn absent_on_absent_is_noop() {
        let mut tree = doc("a = 1");
        let setting = absent("x.y");
        assert!(in_sync(&tree, &setting));
        assert_eq!(sync(&mut tree, &setting).unwrap(), ChangeDescription::Unchanged);
        assert_eq!(tree.render(), "a = 1");
    }

    #[test]
    fn absent_array_element_removes_only_listed() {
        let mut tree = doc("arr = [1, 2, 3, 2]");
        let setting = DesiredSetting::from_title("arr")
            .with_type(TypeTag::ArrayElement)
            .with_value(2)
            .absent()
            .resolve()
            .unwrap();
        assert!(!in_sync(&tree, &setting));
        let change = sync(&mut tree, &setting).unwrap();
        assert_eq!(change.to_string(), "value changed [1, 2, 3, 2] to [1, 3]");
        assert_eq!(tree.render(), "arr = [1, 3]");
        assert!(in_sync(&tree, &setting));
    }

    #[test]
    fn absent_array_element_without_array_is_in_sync() {
        let setting = DesiredSetting::from_title("arr")
            .with_type(TypeTag::ArrayElement)
            .with_value(2)
            .absent()
            .resolve()
            .unwrap();
        assert!(in_sync(&Document::new(), &setting));
        assert!(in_sync(&doc("arr = 2"), &setting));
    }

    // -- properties ---------------------------------------------------------

    #[test]
    fn sync_then_in_sync_for_every_tag() {
        let cases = [
            ("b", json!(true), TypeTag::Boolean),
            ("n", json!("12"), TypeTag::Number),
            ("s", json!("hello"), TypeTag::String),
            ("t", json!("[1, 2]"), TypeTag::Text),
            ("a", json!([1, 2]), TypeTag::Array),
            ("arr", json!(["y"]), TypeTag::ArrayElement),
            ("h", json!({"k": {"deep": 1}}), TypeTag::Hash),
        ];
        for (name, value, tag) in cases {
            let mut tree = doc("arr = [x]\nb = false\nn = 1\ns = bye\nh { k = 0 }");
            assert_round_trip(&mut tree, &present(name, value, Some(tag)));
        }
    }

    #[test]
    fn round_trip_survives_render_and_reparse() {
        let cases = [
            present("x.y", json!("8080"), None),
            present("x.z", json!(1.5), None),
            present("x.t", json!("{ a = [1, 2] }"), Some(TypeTag::Text)),
            present("x.h", json!({"a": "with space"}), None),
        ];
        for setting in cases {
            let mut tree = Document::new();
            sync(&mut tree, &setting).unwrap();
            let reread = doc(&tree.render());
            assert!(in_sync(&reread, &setting), "{setting:?}");
        }
    }

    #[test]
    fn converge_reports_outcome() {
        let mut tree = Document::new();
        let setting = present("foo", json!(1), None);
        let first = converge(&mut tree, &setting).unwrap();
        assert_eq!(first.to_string(), "foo: created with value '1'");
        let second = converge(&mut tree, &setting).unwrap();
        assert_eq!(second, Outcome::InSync { setting: "foo".into() });
    }

    #[test]
    fn engine_works_through_trait_objects() {
        let mut tree = Document::new();
        let dyn_tree: &mut dyn ConfigTree = &mut tree;
        let setting = present("k", json!(true), None);
        sync(dyn_tree, &setting).unwrap();
        assert!(in_sync(&*dyn_tree, &setting));
    }
}
