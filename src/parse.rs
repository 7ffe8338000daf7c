//! Reader for the subset of HOCON this crate edits.
//!
//! Supported: optional root braces, `key = value`, `key : value`, `key { ... }`,
//! dotted keys (`a.b.c = 1`), `+=` appends, `#` and `//` comments, quoted and
//! triple-quoted strings, unquoted strings, numbers, booleans, `null`, arrays
//! and objects separated by commas or newlines.
//!
//! Duplicate keys follow HOCON rules: two objects merge key-by-key, anything
//! else is replaced by the later value. `include` directives and `${...}`
//! substitutions are rejected.

use crate::error::SettingError;
use crate::value::{ConfigValue, Object};

/// Parse a whole document into its root object.
pub fn parse_document(text: &str) -> Result<Object, SettingError> {
    read_document(text).map(|(root, _)| root)
}

/// Parse a document and report where each field and object block sits in
/// `text`, for in-place edits.
pub(crate) fn parse_layout(text: &str) -> Result<Layout, SettingError> {
    read_document(text).map(|(_, layout)| layout)
}

fn read_document(text: &str) -> Result<(Object, Layout), SettingError> {
    let root_path: &[String] = &[];
    let mut parser = Parser::new(text);
    parser.skip_blank();
    let root = if parser.peek() == Some('{') {
        parser.pos += 1;
        let root = parser.parse_fields(Some('}'), Some(root_path))?;
        parser.skip_blank();
        root
    } else {
        parser.parse_fields(None, Some(root_path))?
    };
    if !parser.at_end() {
        return Err(parser.error("unexpected content after the root object"));
    }
    Ok((root, parser.layout))
}

/// Parse a standalone value, as written on the right-hand side of `=`.
pub fn parse_value(text: &str) -> Result<ConfigValue, SettingError> {
    let mut parser = Parser::new(text);
    parser.skip_blank();
    let value = parser.parse_value(None)?;
    parser.skip_blank();
    if !parser.at_end() {
        return Err(parser.error("unexpected content after value"));
    }
    Ok(value)
}

/// Parse raw HOCON text of a `text` setting: a single value, or failing that,
/// a braceless list of fields.
pub fn parse_text(text: &str) -> Result<ConfigValue, SettingError> {
    parse_value(text).or_else(|_| parse_document(text).map(ConfigValue::Object))
}

/// Deep-merge `overlay` into `base`. Objects on both sides recurse; otherwise
/// the overlay value wins. Existing keys keep their position.
pub(crate) fn merge_objects(base: &mut Object, overlay: Object) {
    for (key, overlay_val) in overlay {
        match overlay_val {
            ConfigValue::Object(overlay_obj) => match base.get_mut(&key) {
                Some(ConfigValue::Object(base_obj)) => merge_objects(base_obj, overlay_obj),
                _ => {
                    base.insert(key, ConfigValue::Object(overlay_obj));
                }
            },
            other => {
                base.insert(key, other);
            }
        }
    }
}

/// Byte positions of the fields and object blocks of a document. Only fields
/// reachable through objects are recorded; objects inside arrays are not.
#[derive(Debug, Default)]
pub(crate) struct Layout {
    pub(crate) fields: Vec<FieldSpan>,
    pub(crate) blocks: Vec<BlockSpan>,
}

/// One `key = value`, `key += value` or `key { ... }` definition.
#[derive(Debug)]
pub(crate) struct FieldSpan {
    /// Full path from the root, dotted key segments expanded.
    pub(crate) path: Vec<String>,
    /// Index into [`Layout::blocks`] of the object the field is written in.
    pub(crate) block: usize,
    pub(crate) start: usize,
    pub(crate) key_end: usize,
    pub(crate) value_start: usize,
    /// End of the value, trailing whitespace excluded.
    pub(crate) value_end: usize,
    pub(crate) append: bool,
    /// `key { ... }`, written without a separator.
    pub(crate) braced: bool,
}

/// The inside of an object: from just after `{` to the closing `}`. For a
/// braceless root it spans the whole text.
#[derive(Debug)]
pub(crate) struct BlockSpan {
    pub(crate) path: Vec<String>,
    pub(crate) open: usize,
    pub(crate) close: usize,
    pub(crate) braced: bool,
}

/// Characters that end an unquoted key segment.
const KEY_STOP: &[char] = &['.', '=', ':', '{', '}', '[', ']', ',', '#', '+', '"', '$'];

struct Parser {
    chars: Vec<char>,
    /// Byte offset in the source text of every char, plus the text length.
    offsets: Vec<usize>,
    pos: usize,
    layout: Layout,
}

impl Parser {
    fn new(text: &str) -> Self {
        let (base, body) = match text.strip_prefix('\u{feff}') {
            Some(rest) => (text.len() - rest.len(), rest),
            None => (0, text),
        };
        let mut chars = Vec::with_capacity(body.len());
        let mut offsets = Vec::with_capacity(body.len() + 1);
        for (i, c) in body.char_indices() {
            chars.push(c);
            offsets.push(base + i);
        }
        offsets.push(text.len());
        Self {
            chars,
            offsets,
            pos: 0,
            layout: Layout::default(),
        }
    }

    fn offset(&self, pos: usize) -> usize {
        self.offsets
            .get(pos)
            .or(self.offsets.last())
            .copied()
            .unwrap_or_default()
    }

    /// Byte offset just past the last non-whitespace char before the cursor,
    /// but not before `floor`.
    fn trimmed_offset(&self, floor: usize) -> usize {
        let mut end = self.pos;
        while end > floor && self.chars[end - 1].is_whitespace() {
            end -= 1;
        }
        self.offset(end)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn error(&self, message: impl Into<String>) -> SettingError {
        let mut line = 1;
        let mut column = 1;
        for c in &self.chars[..self.pos.min(self.chars.len())] {
            if *c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        SettingError::Parse {
            origin: "<string>".into(),
            line,
            column,
            message: message.into(),
        }
    }

    fn at_comment(&self) -> bool {
        self.peek() == Some('#') || self.starts_with("//")
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    /// Spaces and tabs only; stops at newlines.
    fn skip_inline(&mut self) {
        while matches!(self.peek(), Some(c) if c != '\n' && c.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// Whitespace including newlines, and comments.
    fn skip_blank(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.pos += 1,
                _ if self.at_comment() => self.skip_comment(),
                _ => break,
            }
        }
    }

    fn skip_separators(&mut self) {
        loop {
            self.skip_blank();
            if self.peek() == Some(',') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Where an unquoted value stops.
    fn at_value_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some('\n' | ',' | '}' | ']' | '{' | '[') => true,
            _ => self.at_comment(),
        }
    }

    /// After a field or array element: a newline, comma, comment, the closing
    /// delimiter or end of input must follow.
    fn expect_item_end(&mut self, close: Option<char>) -> Result<(), SettingError> {
        self.skip_inline();
        match self.peek() {
            None | Some('\n' | ',') => Ok(()),
            Some(c) if Some(c) == close => Ok(()),
            _ if self.at_comment() => Ok(()),
            Some(c) => Err(self.error(format!("expected a newline or ',' but found '{c}'"))),
        }
    }

    /// Fields up to `close` (or end of input). `prefix` is the object's path
    /// from the root, or `None` where positions are not tracked.
    fn parse_fields(
        &mut self,
        close: Option<char>,
        prefix: Option<&[String]>,
    ) -> Result<Object, SettingError> {
        let mut block = None;
        if let Some(path) = prefix {
            let open = self.offset(self.pos);
            block = Some(self.layout.blocks.len());
            self.layout.blocks.push(BlockSpan {
                path: path.to_vec(),
                open,
                close: open,
                braced: close.is_some(),
            });
        }
        let mut object = Object::new();
        loop {
            self.skip_separators();
            match self.peek() {
                None => {
                    return match close {
                        Some(c) => Err(self.error(format!("expected '{c}' before end of input"))),
                        None => {
                            self.close_block(block);
                            Ok(object)
                        }
                    };
                }
                Some(c) if Some(c) == close => {
                    self.close_block(block);
                    self.pos += 1;
                    return Ok(object);
                }
                _ => {}
            }

            let start = self.pos;
            let path = self.parse_key()?;
            let key_end = self.pos;
            self.skip_inline();
            if path.len() == 1
                && path[0] == "include"
                && !matches!(self.peek(), Some('=' | ':' | '{' | '+'))
            {
                return Err(self.error("include directives are not supported"));
            }

            let full_path: Option<Vec<String>> =
                prefix.map(|p| p.iter().chain(&path).cloned().collect());
            let braced = self.peek() == Some('{');
            let append = match self.peek() {
                Some('{') => false,
                Some('=' | ':') => {
                    self.pos += 1;
                    self.skip_blank();
                    false
                }
                Some('+') if self.peek_at(1) == Some('=') => {
                    self.pos += 2;
                    self.skip_blank();
                    true
                }
                _ => {
                    return Err(self.error(format!(
                        "expected '=', ':' or '{{' after key '{}'",
                        path.join(".")
                    )));
                }
            };
            let value_start = self.pos;
            let nested = if append { None } else { full_path.as_deref() };
            let value = self.parse_value(nested)?;

            if let (Some(block), Some(full_path)) = (block, full_path) {
                let span = FieldSpan {
                    path: full_path,
                    block,
                    start: self.offset(start),
                    key_end: self.offset(key_end),
                    value_start: self.offset(value_start),
                    value_end: self.trimmed_offset(value_start),
                    append,
                    braced,
                };
                self.layout.fields.push(span);
            }
            insert_at(&mut object, &path, value, append);
            self.expect_item_end(close)?;
        }
    }

    fn close_block(&mut self, block: Option<usize>) {
        let at = self.offset(self.pos);
        if let Some(span) = block.and_then(|i| self.layout.blocks.get_mut(i)) {
            span.close = at;
        }
    }

    fn parse_key(&mut self) -> Result<Vec<String>, SettingError> {
        let mut segments = Vec::new();
        loop {
            let segment = if self.peek() == Some('"') {
                self.parse_quoted()?
            } else {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || KEY_STOP.contains(&c) || self.starts_with("//") {
                        break;
                    }
                    self.pos += 1;
                }
                if self.pos == start {
                    return Err(self.error("expected a key"));
                }
                self.chars[start..self.pos].iter().collect()
            };
            segments.push(segment);
            if self.peek() == Some('.') {
                self.pos += 1;
            } else {
                return Ok(segments);
            }
        }
    }

    fn parse_value(&mut self, prefix: Option<&[String]>) -> Result<ConfigValue, SettingError> {
        match self.peek() {
            Some('{') => {
                self.pos += 1;
                Ok(ConfigValue::Object(self.parse_fields(Some('}'), prefix)?))
            }
            Some('[') => {
                self.pos += 1;
                self.parse_array()
            }
            _ => self.parse_scalar(),
        }
    }

    fn parse_array(&mut self) -> Result<ConfigValue, SettingError> {
        let mut items = Vec::new();
        loop {
            self.skip_separators();
            match self.peek() {
                None => return Err(self.error("expected ']' before end of input")),
                Some(']') => {
                    self.pos += 1;
                    return Ok(ConfigValue::Array(items));
                }
                _ => {}
            }
            items.push(self.parse_value(None)?);
            self.expect_item_end(Some(']'))?;
        }
    }

    /// A scalar, possibly a concatenation of quoted and unquoted pieces on one
    /// line (`"a" b` is the string `a b`). A lone unquoted piece is typed.
    fn parse_scalar(&mut self) -> Result<ConfigValue, SettingError> {
        let mut text = String::new();
        let mut pieces = 0;
        let mut any_quoted = false;
        let mut last_quoted = false;

        loop {
            match self.peek() {
                Some('"') => {
                    let piece = if self.starts_with("\"\"\"") {
                        self.parse_triple_quoted()?
                    } else {
                        self.parse_quoted()?
                    };
                    text.push_str(&piece);
                    any_quoted = true;
                    last_quoted = true;
                }
                Some('$') if self.peek_at(1) == Some('{') => {
                    return Err(self.error("substitutions are not supported"));
                }
                _ if self.at_value_end() => break,
                _ => {
                    while let Some(c) = self.peek() {
                        if c == '"' || self.at_value_end() || (c == '$' && self.peek_at(1) == Some('{'))
                        {
                            break;
                        }
                        text.push(c);
                        self.pos += 1;
                    }
                    last_quoted = false;
                }
            }
            pieces += 1;
        }

        if pieces == 0 {
            return Err(self.error("expected a value"));
        }
        if !last_quoted {
            text.truncate(text.trim_end().len());
        }
        if any_quoted {
            Ok(ConfigValue::String(text))
        } else {
            Ok(classify(&text))
        }
    }

    fn parse_quoted(&mut self) -> Result<String, SettingError> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => {
                    let escaped = self
                        .bump()
                        .ok_or_else(|| self.error("unterminated escape sequence"))?;
                    let c = match escaped {
                        '"' => '"',
                        '\\' => '\\',
                        '/' => '/',
                        'b' => '\u{8}',
                        'f' => '\u{c}',
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        'u' => self.parse_unicode_escape()?,
                        other => return Err(self.error(format!("invalid escape '\\{other}'"))),
                    };
                    out.push(c);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> Result<char, SettingError> {
        let end = self.pos + 4;
        if end > self.chars.len() {
            return Err(self.error("truncated unicode escape"));
        }
        let hex: String = self.chars[self.pos..end].iter().collect();
        self.pos = end;
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(format!("invalid unicode escape '\\u{hex}'")))
    }

    fn parse_triple_quoted(&mut self) -> Result<String, SettingError> {
        self.pos += 3;
        let start = self.pos;
        while !self.at_end() {
            if self.starts_with("\"\"\"") {
                let content = self.chars[start..self.pos].iter().collect();
                self.pos += 3;
                return Ok(content);
            }
            self.pos += 1;
        }
        Err(self.error("unterminated triple-quoted string"))
    }
}

/// Type a lone unquoted token: boolean, null, integer, finite float, else
/// string. Out-of-range numbers like `1e999` stay strings.
fn classify(token: &str) -> ConfigValue {
    match token {
        "true" => return ConfigValue::Boolean(true),
        "false" => return ConfigValue::Boolean(false),
        "null" => return ConfigValue::Null,
        _ => {}
    }
    if let Ok(i) = token.parse::<i64>() {
        return ConfigValue::Integer(i);
    }
    let numeric = token.chars().any(|c| c.is_ascii_digit())
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'));
    if numeric
        && let Ok(f) = token.parse::<f64>()
        && f.is_finite()
    {
        return ConfigValue::Float(f);
    }
    ConfigValue::String(token.to_string())
}

/// Insert `value` at a dotted key path inside `object`, applying HOCON
/// duplicate-key rules. Non-object intermediates are replaced by objects.
fn insert_at(object: &mut Object, path: &[String], value: ConfigValue, append: bool) {
    let Some((leaf, parents)) = path.split_last() else {
        return;
    };
    let mut current = object;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| ConfigValue::Object(Object::new()));
        if slot.as_object().is_none() {
            *slot = ConfigValue::Object(Object::new());
        }
        let Some(map) = slot.as_object_mut() else {
            return;
        };
        current = map;
    }

    match value {
        value if append => match current.get_mut(leaf) {
            Some(ConfigValue::Array(items)) => items.push(value),
            _ => {
                current.insert(leaf.clone(), ConfigValue::Array(vec![value]));
            }
        },
        ConfigValue::Object(overlay) => match current.get_mut(leaf) {
            Some(ConfigValue::Object(existing)) => merge_objects(existing, overlay),
            _ => {
                current.insert(leaf.clone(), ConfigValue::Object(overlay));
            }
        },
        value => {
            current.insert(leaf.clone(), value);
        }
    }
}
