//! In-place edits of HOCON source text.
//!
//! Each edit locates the affected definition through the parser's
//! [`Layout`] and splices new text over just that span, so comments,
//! blank lines and the formatting of every other field stay as written.
//! New fields go at the end of the innermost object block that already
//! exists for their parent path.
//!
//! These functions return `None` when the text gives no safe place for the
//! edit (unreadable text, a `+=` definition, a block closed on the same line
//! as its last field). Callers then fall back to rendering the whole tree.

use std::ops::Range;

use crate::options::RenderOptions;
use crate::parse::{BlockSpan, FieldSpan, Layout, parse_layout};
use crate::path::SettingIdentifier;
use crate::render::{render_document, render_value};
use crate::value::{ConfigValue, Object};

/// Replace the last definition of `id`, or add a new one.
pub(crate) fn splice_set(
    text: &str,
    id: &SettingIdentifier,
    value: &ConfigValue,
    options: &RenderOptions,
) -> Option<String> {
    let layout = parse_layout(text).ok()?;
    let segments = id.segments();
    let target = layout
        .fields
        .iter()
        .rev()
        .find(|f| f.path == segments && !f.append);

    let Some(field) = target else {
        return splice_insert(text, &layout, segments, value, options);
    };
    let pad = indentation(text, field.start);
    let rendered = continue_lines(&render_value(value, options), continuation_pad(value, pad));
    let (from, replacement) = match value {
        ConfigValue::Object(_) => (field.value_start, rendered),
        _ if field.braced => (
            field.key_end,
            format!("{}{rendered}", options.separator.token()),
        ),
        _ => (field.value_start, rendered),
    };
    Some(splice(text, from..field.value_end, &replacement))
}

/// Remove every definition at or below `id`, with its separator and, when
/// the field has its line to itself, the whole line.
pub(crate) fn splice_delete(text: &str, id: &SettingIdentifier) -> Option<String> {
    let layout = parse_layout(text).ok()?;
    let mut targets: Vec<&FieldSpan> = layout
        .fields
        .iter()
        .filter(|f| f.path.starts_with(id.segments()))
        .collect();
    targets.sort_by_key(|f| f.start);

    let mut spans: Vec<Range<usize>> = Vec::new();
    let mut covered = 0;
    for field in targets {
        if field.start < covered {
            continue;
        }
        covered = field.value_end;
        let span = removal_span(text, field);
        match spans.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => spans.push(span),
        }
    }
    if spans.is_empty() {
        return None;
    }

    let mut out = text.to_string();
    for span in spans.iter().rev() {
        out.replace_range(span.clone(), "");
    }
    Some(out)
}

/// Add `element` before the closing `]` of the array literal defining `id`.
pub(crate) fn splice_append(
    text: &str,
    id: &SettingIdentifier,
    element: &ConfigValue,
    options: &RenderOptions,
) -> Option<String> {
    let layout = parse_layout(text).ok()?;
    let field = layout.fields.iter().rev().find(|f| f.path == id.segments())?;
    let literal = &text[field.value_start..field.value_end];
    if field.append || !literal.starts_with('[') || !literal.ends_with(']') {
        return None;
    }

    let inner = field.value_start + 1..field.value_end - 1;
    let kept = text[inner.clone()].trim_end();
    let item = render_value(element, options);
    if kept.trim().is_empty() {
        return Some(splice(text, inner, &item));
    }
    let at = inner.start + kept.len();
    let comma = if kept.ends_with(',') { "" } else { "," };
    let insertion = if text[inner].contains('\n') {
        format!("{comma}\n{}{item}", indentation(text, at))
    } else {
        format!("{comma} {item}")
    };
    Some(splice(text, at..at, &insertion))
}

fn splice_insert(
    text: &str,
    layout: &Layout,
    segments: &[String],
    value: &ConfigValue,
    options: &RenderOptions,
) -> Option<String> {
    let (parents, _) = segments.split_at(segments.len().checked_sub(1)?);
    let (index, block) = layout
        .blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| parents.starts_with(&b.path))
        .max_by_key(|(_, b)| b.path.len())?;

    let rest = &segments[block.path.len()..];
    let (first, nested_keys) = rest.split_first()?;
    let nested = nested_keys.iter().rev().fold(value.clone(), |inner, key| {
        ConfigValue::Object(Object::from([(key.clone(), inner)]))
    });
    let fragment = render_document(&Object::from([(first.clone(), nested)]), options);

    if !block.braced {
        let mut out = text.to_string();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&fragment);
        return Some(out);
    }
    if text[block.open..block.close].contains('\n') {
        insert_multiline(text, layout, index, block, &fragment, value, options)
    } else {
        insert_inline(text, block, &fragment)
    }
}

/// `a { x = 1 }` becomes `a { x = 1, y = 2 }`.
fn insert_inline(text: &str, block: &BlockSpan, fragment: &str) -> Option<String> {
    let line = fragment.trim_end();
    if line.contains('\n') {
        return None;
    }
    let body = &text[block.open..block.close];
    let kept = body.trim_end();
    if kept.trim().is_empty() {
        return Some(splice(text, block.open..block.close, &format!(" {line} ")));
    }
    let at = block.open + kept.len();
    let comma = if kept.ends_with(',') { "" } else { "," };
    Some(splice(text, at..at, &format!("{comma} {line}")))
}

/// New field on its own line just above the block's closing brace, indented
/// like the block's last field.
fn insert_multiline(
    text: &str,
    layout: &Layout,
    index: usize,
    block: &BlockSpan,
    fragment: &str,
    value: &ConfigValue,
    options: &RenderOptions,
) -> Option<String> {
    let close_line = line_start(text, block.close);
    let before_close = &text[close_line..block.close];
    if !before_close.trim().is_empty() {
        return None;
    }
    let last = layout
        .fields
        .iter()
        .filter(|f| f.block == index)
        .max_by_key(|f| f.start);
    let pad = match last {
        Some(last) => indentation(text, last.start).to_string(),
        None => format!("{before_close}{}", " ".repeat(options.indent)),
    };
    let lines = continue_lines(fragment, continuation_pad(value, &pad));
    Some(splice(text, close_line..close_line, &format!("{pad}{lines}")))
}

/// What to cut for one field: the field itself plus a following comma, or a
/// preceding one when it was the last item on a shared line.
fn removal_span(text: &str, field: &FieldSpan) -> Range<usize> {
    let mut end = skip_inline(text, field.value_end);
    let comma = text[end..].starts_with(',');
    if comma {
        end = skip_inline(text, end + 1);
    }

    let start_line = line_start(text, field.start);
    if text[start_line..field.start].trim().is_empty() {
        let mut line_end = end;
        let rest = &text[line_end..];
        if rest.starts_with('#') || rest.starts_with("//") {
            line_end += rest.find('\n').unwrap_or(rest.len());
        }
        let rest = &text[line_end..];
        if rest.is_empty() {
            return start_line..line_end;
        }
        if rest.starts_with("\r\n") {
            return start_line..line_end + 2;
        }
        if rest.starts_with('\n') {
            return start_line..line_end + 1;
        }
    }

    if comma {
        return field.start..end;
    }
    let before = text[..field.start].trim_end_matches([' ', '\t']);
    match before.strip_suffix(',') {
        Some(kept) => kept.len()..field.value_end,
        None => field.start..field.value_end,
    }
}

fn splice(text: &str, range: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..range.start]);
    out.push_str(replacement);
    out.push_str(&text[range.end..]);
    out
}

fn skip_inline(text: &str, from: usize) -> usize {
    from + text[from..].len() - text[from..].trim_start_matches([' ', '\t']).len()
}

fn line_start(text: &str, at: usize) -> usize {
    text[..at].rfind('\n').map_or(0, |i| i + 1)
}

/// Leading spaces and tabs of the line containing `at`.
fn indentation(text: &str, at: usize) -> &str {
    let start = line_start(text, at);
    let line = &text[start..];
    &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
}

/// Raw text keeps its own layout.
fn continuation_pad<'a>(value: &ConfigValue, pad: &'a str) -> &'a str {
    if matches!(value, ConfigValue::Raw(_)) { "" } else { pad }
}

/// Prefix every line after the first with `pad`.
fn continue_lines(text: &str, pad: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split_inclusive('\n').enumerate() {
        if i > 0 && !line.trim().is_empty() {
            out.push_str(pad);
        }
        out.push_str(line);
    }
    out
}
