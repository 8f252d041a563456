//! Key/value text resource in the Java `.properties` format.
//!
//! Blob attribute and metrics objects are stored in this format so that
//! existing tooling can read them. Parsing follows the `Properties.load`
//! rules (comments, separators, line continuations, `\uXXXX` escapes) and
//! rendering produces output that `Properties.load` reads back unchanged.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for `key`, or `default` when absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse properties text. Later duplicates of a key win.
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let mut entries = BTreeMap::new();
        let mut lines = text.lines().enumerate();

        while let Some((index, raw)) = lines.next() {
            let line = raw.trim_start_matches(is_blank);
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let mut logical = line.to_string();
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some((_, next)) => logical.push_str(next.trim_start_matches(is_blank)),
                    None => break,
                }
            }

            let (key, value) = split_entry(&logical);
            let malformed = |reason| DomainError::MalformedProperties {
                line: index + 1,
                reason,
            };
            let key = unescape(key).map_err(malformed)?;
            let value = unescape(value).map_err(malformed)?;
            entries.insert(key, value);
        }

        Ok(Self(entries))
    }

    /// Render as properties text, headed by a timestamp comment.
    pub fn render(&self, written_at: DateTime<Utc>) -> String {
        let mut out = String::new();
        out.push('#');
        out.push_str(&written_at.to_rfc2822());
        out.push('\n');

        for (key, value) in &self.0 {
            escape_into(&mut out, key, true);
            out.push('=');
            escape_into(&mut out, value, false);
            out.push('\n');
        }

        out
    }
}

impl FromIterator<(String, String)> for Properties {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{000c}')
}

/// An odd number of trailing backslashes joins the next line.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    let mut explicit_separator = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                explicit_separator = true;
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = &line[key_end..];
    if explicit_separator {
        rest = rest[1..].trim_start_matches(is_blank);
    } else {
        rest = rest.trim_start_matches(is_blank);
        if let Some(stripped) = rest.strip_prefix(|c| c == '=' || c == ':') {
            rest = stripped.trim_start_matches(is_blank);
        }
    }

    (key, rest)
}

fn unescape(input: &str) -> Result<String, String> {
    let mut units: Vec<u16> = Vec::with_capacity(input.len());
    let mut buf = [0u16; 2];
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            units.extend_from_slice(c.encode_utf16(&mut buf));
            continue;
        }

        let decoded = match chars.next() {
            // A dangling backslash at the very end is dropped.
            None => break,
            Some('t') => '\t',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('f') => '\u{000c}',
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.chars().count() != 4 || !hex.chars().all(|h| h.is_ascii_hexdigit()) {
                    return Err(format!("malformed \\uXXXX escape `\\u{}`", hex));
                }
                let unit = u16::from_str_radix(&hex, 16)
                    .map_err(|e| format!("malformed \\uXXXX escape: {}", e))?;
                units.push(unit);
                continue;
            }
            Some(other) => other,
        };
        units.extend_from_slice(decoded.encode_utf16(&mut buf));
    }

    String::from_utf16(&units).map_err(|_| "unpaired UTF-16 surrogate in \\u escape".to_string())
}

fn escape_into(out: &mut String, text: &str, is_key: bool) {
    let mut buf = [0u16; 2];
    for (i, c) in text.chars().enumerate() {
        match c {
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{000c}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || (c as u32) > 0x7e => {
                for unit in c.encode_utf16(&mut buf) {
                    let _ = write!(out, "\\u{:04X}", unit);
                }
            }
            c => out.push(c),
        }
    }
}
