//! Tolerant reader for JSON pack rule documents.
//!
//! Reading never fails: a file that is not JSON at all yields an inert
//! document, a file that looks like JSON but cannot be decoded is flagged with
//! `format_error`, and wrongly typed fields are skipped one by one with a
//! diagnostic in `errors`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Number of leading bytes inspected by [`looks_like_json`].
pub const SNIFF_WINDOW: usize = 512;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub const KEY_ATLAS_NAME: &str = "AtlasName";
pub const KEY_INCLUDE_IN_BUILD: &str = "IncludeInBuild";
pub const KEY_PADDING: &str = "Padding";
pub const KEY_ENABLE_ROTATION: &str = "EnableRotation";
pub const KEY_ENABLE_TIGHT_PACKING: &str = "EnableTightPacking";
pub const KEY_ENABLE_ALPHA_DILATION: &str = "EnableAlphaDilation";
pub const KEY_MAX_SIZE: &str = "MaxSize";
pub const KEY_FILES: &str = "Files";
pub const KEY_FOLDERS: &str = "Folders";

/// One parsed rule document. Every field is independently optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleDocument {
    pub atlas_name: Option<String>,
    pub include_in_build: Option<bool>,
    pub padding: Option<i32>,
    pub enable_rotation: Option<bool>,
    pub enable_tight_packing: Option<bool>,
    pub enable_alpha_dilation: Option<bool>,
    pub max_size: Option<i32>,
    pub files: Option<Vec<String>>,
    pub folders: Option<Vec<String>>,
    /// The document could not be read or decoded at all.
    pub format_error: bool,
    /// Diagnostics in the order they were found.
    pub errors: Vec<String>,
}

impl RuleDocument {
    /// True when the document names no atlas and must be skipped.
    pub fn is_empty(&self) -> bool {
        self.atlas_name.as_deref().is_none_or(str::is_empty)
    }

    pub fn has_format_error(&self) -> bool {
        self.format_error
    }

    /// All diagnostics joined by newlines.
    pub fn error_message(&self) -> String {
        self.errors.join("\n")
    }

    fn structural_error(message: impl Into<String>) -> Self {
        Self {
            format_error: true,
            errors: vec![message.into()],
            ..Default::default()
        }
    }
}

/// Cheap pre-filter deciding whether `content` is worth a full JSON parse.
///
/// The first non-whitespace byte must open an object or array; after that,
/// brackets and commas are skipped and the next byte must start a string.
/// Running out of the window after the opening bracket counts as a match.
pub fn looks_like_json(content: &[u8]) -> bool {
    let window = &content[..content.len().min(SNIFF_WINDOW)];
    let window = window.strip_prefix(UTF8_BOM).unwrap_or(window);
    let mut opening_found = false;
    for &b in window {
        if b.is_ascii_whitespace() {
            continue;
        }
        if !opening_found {
            if b == b'{' || b == b'[' {
                opening_found = true;
            } else {
                return false;
            }
        } else if matches!(b, b'{' | b'[' | b']' | b'}' | b',') {
            continue;
        } else {
            return b == b'"';
        }
    }
    opening_found
}

/// Parse raw bytes into a rule document.
pub fn parse(raw: &[u8]) -> RuleDocument {
    if !looks_like_json(raw) {
        return RuleDocument::default();
    }
    let body = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    let text = match std::str::from_utf8(body) {
        Ok(t) => t,
        Err(e) => return RuleDocument::structural_error(e.to_string()),
    };
    let root: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => return RuleDocument::structural_error(e.to_string()),
    };
    match root.as_object() {
        Some(obj) if obj.contains_key(KEY_ATLAS_NAME) => read_fields(obj),
        _ => RuleDocument::default(),
    }
}

/// Read and parse the rule document at `path`.
pub fn read_rule_file(path: impl AsRef<Path>) -> RuleDocument {
    let path = path.as_ref();
    if !path.is_file() {
        return RuleDocument::structural_error(format!(
            "Could not find rule file at {}",
            path.display()
        ));
    }
    match std::fs::read(path) {
        Ok(bytes) => parse(&bytes),
        Err(e) => RuleDocument::structural_error(format!("{}: {}", path.display(), e)),
    }
}

fn read_fields(obj: &Map<String, Value>) -> RuleDocument {
    let mut doc = RuleDocument::default();
    let errors = &mut doc.errors;
    doc.atlas_name = read_field(obj, KEY_ATLAS_NAME, "string", as_string, errors);
    doc.include_in_build = read_field(obj, KEY_INCLUDE_IN_BUILD, "boolean", as_bool, errors);
    doc.padding = read_field(obj, KEY_PADDING, "int", as_int, errors);
    doc.enable_rotation = read_field(obj, KEY_ENABLE_ROTATION, "boolean", as_bool, errors);
    doc.enable_tight_packing =
        read_field(obj, KEY_ENABLE_TIGHT_PACKING, "boolean", as_bool, errors);
    doc.enable_alpha_dilation =
        read_field(obj, KEY_ENABLE_ALPHA_DILATION, "boolean", as_bool, errors);
    doc.max_size = read_field(obj, KEY_MAX_SIZE, "int", as_int, errors);
    doc.files = obj.get(KEY_FILES).map(as_string_list);
    doc.folders = obj.get(KEY_FOLDERS).map(as_string_list);
    doc
}

fn read_field<T>(
    obj: &Map<String, Value>,
    key: &str,
    kind: &str,
    coerce: fn(&Value) -> Option<T>,
    errors: &mut Vec<String>,
) -> Option<T> {
    let value = obj.get(key)?;
    let out = coerce(value);
    if out.is_none() {
        errors.push(format!("{key} is not a valid {kind} value."));
    }
    out
}

/// Booleans as-is; numbers count as true when `>= 1`.
pub fn as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|x| x >= 1.0),
        _ => None,
    }
}

/// Numbers truncated toward zero and saturated to `i32`; booleans as 0/1.
pub fn as_int(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
            } else {
                // `as` saturates and truncates floats
                n.as_f64().map(|f| f as i32)
            }
        }
        Value::Bool(b) => Some(i32::from(*b)),
        _ => None,
    }
}

pub fn as_string(v: &Value) -> Option<String> {
    v.as_str().map(str::to_owned)
}

/// Arrays become their scalar elements' string values; anything else is an
/// empty list.
pub fn as_string_list(v: &Value) -> Vec<String> {
    let Some(items) = v.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect()
}
