//! Writer for documents produced by [`parse`](crate::parse) or built in memory.
//!
//! The root object is written without braces. Nested objects use the
//! `key { ... }` form, scalar arrays stay on one line, and strings are always
//! quoted so they read back as strings. Raw text nodes are copied verbatim.

use crate::options::RenderOptions;
use crate::value::{ConfigValue, Object};

pub fn render_document(root: &Object, options: &RenderOptions) -> String {
    let mut out = String::new();
    write_fields(&mut out, root, 0, options);
    out
}

/// A single value as written after a separator, laid out at the top level.
pub(crate) fn render_value(value: &ConfigValue, options: &RenderOptions) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0, options);
    out
}

fn write_fields(out: &mut String, object: &Object, depth: usize, options: &RenderOptions) {
    let pad = " ".repeat(depth * options.indent);
    for (key, value) in object {
        out.push_str(&pad);
        out.push_str(&render_key(key));
        match value {
            ConfigValue::Object(map) if map.is_empty() => out.push_str(" {}"),
            ConfigValue::Object(map) => {
                out.push_str(" {\n");
                write_fields(out, map, depth + 1, options);
                out.push_str(&pad);
                out.push('}');
            }
            other => {
                out.push_str(options.separator.token());
                write_value(out, other, depth, options);
            }
        }
        out.push('\n');
    }
}

fn write_value(out: &mut String, value: &ConfigValue, depth: usize, options: &RenderOptions) {
    match value {
        ConfigValue::Null => out.push_str("null"),
        ConfigValue::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        ConfigValue::Integer(i) => out.push_str(&i.to_string()),
        ConfigValue::Float(x) => out.push_str(&format!("{x:?}")),
        ConfigValue::String(s) => out.push_str(&quote(s)),
        ConfigValue::Raw(text) => out.push_str(text),
        ConfigValue::Array(items) if items.iter().any(is_nested) => {
            let pad = " ".repeat(depth * options.indent);
            let item_pad = " ".repeat((depth + 1) * options.indent);
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                out.push_str(&item_pad);
                write_value(out, item, depth + 1, options);
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&pad);
            out.push(']');
        }
        ConfigValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, depth, options);
            }
            out.push(']');
        }
        ConfigValue::Object(map) if map.is_empty() => out.push_str("{}"),
        ConfigValue::Object(map) => {
            out.push_str("{\n");
            write_fields(out, map, depth + 1, options);
            out.push_str(&" ".repeat(depth * options.indent));
            out.push('}');
        }
    }
}

fn is_nested(value: &ConfigValue) -> bool {
    match value {
        ConfigValue::Object(map) => !map.is_empty(),
        ConfigValue::Array(items) => items.iter().any(is_nested),
        ConfigValue::Raw(text) => text.contains('\n'),
        _ => false,
    }
}

/// Keys made of letters, digits, `_` and `-` are written bare; anything else
/// (including keys containing dots) is quoted.
fn render_key(key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    if bare { key.to_string() } else { quote(key) }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
