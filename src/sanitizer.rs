// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Input sanitization for contact form fields.
//!
//! - HTML escaping of the five characters with markup meaning
//! - Permissive email syntax check
//! - Presence test for loosely-typed JSON values

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// `local@domain.tld`, where no part contains whitespace or `@`.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Escape `& < > " '` and trim surrounding whitespace.
///
/// `&` is replaced first so the entities produced by the later
/// replacements are not escaped a second time.
pub fn sanitize_str(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
        .trim_matches(is_js_whitespace)
        .to_string()
}

/// The whitespace and line terminators stripped by JavaScript's `trim`.
///
/// Differs from [`char::is_whitespace`]: U+FEFF is included, U+0085 is not.
fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'
            | '\u{000A}'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{000D}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Sanitize a JSON value. Anything other than a string becomes empty.
pub fn sanitize(value: &Value) -> String {
    match value {
        Value::String(s) => sanitize_str(s),
        _ => String::new(),
    }
}

/// String form of a JSON value as JavaScript's `String()` would give it.
///
/// Arrays join their elements with `,` (nulls become empty) and objects
/// become `[object Object]`.
pub fn js_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => js_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Syntactic email check. Not RFC 5322; consecutive dots and similar
/// oddities pass.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Whether a field counts as provided.
///
/// `null`, `false`, zero and the empty string are treated as missing.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Upper-case the first character, leaving the rest untouched.
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
