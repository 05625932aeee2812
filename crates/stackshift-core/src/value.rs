//! HCL value model
//!
//! Every value produced during conversion is one of a closed set of variants.
//! Each variant knows how to render itself as a syntactically valid HCL
//! fragment at any indentation depth. Indentation is expressed in spaces and
//! grows by [`INDENT`] per nesting level.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::fmt;

/// Number of spaces added per nesting level
pub const INDENT: usize = 2;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid identifier regex"));

/// An emittable configuration value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A quoted string
    Str(String),
    /// A number, kept in its source representation
    Num(serde_json::Number),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Null,
    /// An ordered list of values
    List(Vec<Value>),
    /// An ordered map with unique keys
    Map(IndexMap<String, Value>),
    /// Already-valid HCL expression text, emitted verbatim
    Literal(String),
    /// A non-executable annotation, emitted as `//` lines
    Comment(String),
}

impl Value {
    /// Create a string value
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// Create a literal expression
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Create a comment
    pub fn comment(value: impl Into<String>) -> Self {
        Self::Comment(value.into())
    }

    /// Create an integer number
    pub fn int(value: i64) -> Self {
        Self::Num(value.into())
    }

    /// Convert a raw source tree into a plain value, with no function resolution
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => Self::Num(n.clone()),
            JsonValue::String(s) => Self::Str(s.clone()),
            JsonValue::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            JsonValue::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Back to a raw tree, for annotations. Expressions become `${...}`
    /// strings, as they would be written in a template.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Str(s) | Self::Comment(s) => JsonValue::String(s.clone()),
            Self::Num(n) => JsonValue::Number(n.clone()),
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Null => JsonValue::Null,
            Self::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Literal(expr) => JsonValue::String(format!("${{{expr}}}")),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Num(n) => n.as_i64(),
            Self::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Self::Comment(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Render this value starting at `indent` spaces.
    ///
    /// The first line is not prefixed with indentation (the caller has
    /// already written `name = `); continuation lines and the closing bracket
    /// are aligned relative to `indent`. Comments are the exception: they
    /// always stand on their own lines and carry their own indentation.
    pub fn render(&self, indent: usize) -> String {
        match self {
            Self::Str(s) => quote(s),
            Self::Num(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Null => "null".to_string(),
            Self::Literal(text) => text.clone(),
            Self::Comment(text) => render_comment(text, indent),
            Self::List(items) => render_list(items, indent),
            Self::Map(map) => render_map(map, indent),
        }
    }

    /// Render on a single line, for use inside function-call arguments
    pub fn render_inline(&self) -> String {
        match self {
            Self::List(items) => {
                let rendered: Vec<String> = items.iter().map(Value::render_inline).collect();
                format!("[{}]", rendered.join(", "))
            }
            Self::Map(map) if map.is_empty() => "{}".to_string(),
            Self::Map(map) => {
                let rendered: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{} = {}", render_key(k), v.render_inline()))
                    .collect();
                format!("{{ {} }}", rendered.join(", "))
            }
            Self::Comment(text) => format!("/* {} */", text.replace("*/", "* /")),
            other => other.render(0),
        }
    }

    /// Strip the surrounding quotes a rendered string would carry.
    ///
    /// Used when splicing a value into an HCL template (`"...${x}..."`):
    /// strings are inlined as text, everything else as an interpolation.
    pub fn to_template_part(&self) -> String {
        match self {
            Self::Str(s) => escape_template(s),
            Self::Literal(expr) => format!("${{{}}}", expr),
            other => format!("${{{}}}", other.render_inline()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(0))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Num(value.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

// =============================================================================
// RENDERING HELPERS
// =============================================================================

/// Quote a string as an HCL string literal
pub fn quote(s: &str) -> String {
    format!("\"{}\"", escape_template(s))
}

/// Escape text for inclusion inside an HCL quoted template.
///
/// Besides the usual backslash escapes, the template introducers `${` and
/// `%{` are doubled so they are emitted literally.
pub fn escape_template(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Render a map key, bare when it is a valid identifier
pub fn render_key(key: &str) -> String {
    if IDENTIFIER.is_match(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

fn render_comment(text: &str, indent: usize) -> String {
    let spacing = " ".repeat(indent);
    text.split('\n')
        .map(|line| format!("{spacing}// {line}").trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_list(items: &[Value], indent: usize) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }

    let rear = " ".repeat(indent);
    let inner = indent + INDENT;
    let spacing = " ".repeat(inner);

    // Commas separate values only; comments carry none.
    let last_value = items.iter().rposition(|item| !item.is_comment());

    let mut result = String::from("[\n");
    for (idx, item) in items.iter().enumerate() {
        if item.is_comment() {
            result.push_str(&item.render(inner));
        } else {
            let comma = if Some(idx) == last_value { "" } else { "," };
            result.push_str(&format!("{spacing}{}{comma}", item.render(inner)));
        }
        result.push('\n');
    }
    result.push_str(&format!("{rear}]"));
    result
}

fn render_map(map: &IndexMap<String, Value>, indent: usize) -> String {
    if map.is_empty() {
        return "{}".to_string();
    }

    let rear = " ".repeat(indent);
    let inner = indent + INDENT;
    let spacing = " ".repeat(inner);

    let mut result = String::from("{");
    for (key, value) in map {
        result.push('\n');
        if value.is_comment() {
            result.push_str(&value.render(inner));
        } else {
            result.push_str(&format!(
                "{spacing}{} = {}",
                render_key(key),
                value.render(inner)
            ));
        }
    }
    result.push_str(&format!("\n{rear}}}"));
    result
}
