//! Dedup key derivation
//!
//! Maps a parsed record to the canonical byte string used for exact-key
//! duplicate detection. Everything in here is pure: no I/O, no state.

use bstr::{BString, ByteVec};
use clap::ValueEnum;
use serde_json::Value;

/// Normalized text shorter than this (in bytes) gets the URL appended.
pub const DEFAULT_SHORT_TEXT_THRESHOLD: usize = 80;

/// Record fields inspected during key derivation, in default priority order.
pub const DEFAULT_PRIORITY: [KeyField; 4] =
    [KeyField::Text, KeyField::Title, KeyField::Url, KeyField::Id];

const URL_JOIN: &[u8] = b"|url|";
const URL_PREFIX: &[u8] = b"url|";
const ID_PREFIX: &[u8] = b"id|";

/// A record field that can provide a dedup key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum KeyField {
    Text,
    Title,
    Url,
    Id,
}

impl KeyField {
    /// JSON member name of this field
    pub fn name(self) -> &'static str {
        match self {
            KeyField::Text => "text",
            KeyField::Title => "title",
            KeyField::Url => "url",
            KeyField::Id => "id",
        }
    }
}

/// Tunable heuristics for key derivation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConfig {
    /// Text keys shorter than this are disambiguated with the URL.
    pub short_text_threshold: usize,
    /// Rules are tried in this order; the first one that yields a key wins.
    pub priority: Vec<KeyField>,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            short_text_threshold: DEFAULT_SHORT_TEXT_THRESHOLD,
            priority: DEFAULT_PRIORITY.to_vec(),
        }
    }
}

/// Whitespace as the C locale defines it (includes vertical tab).
#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

/// Normalize free text or a title
///
/// Collapses whitespace runs to a single space, lowercases ASCII letters and
/// trims the ends. Non-ASCII bytes pass through unchanged.
pub fn normalize_text(input: &[u8]) -> BString {
    let mut out = Vec::with_capacity(input.len());
    let mut in_space = false;

    for &b in input {
        if is_space(b) {
            if !in_space {
                out.push(b' ');
                in_space = true;
            }
            continue;
        }
        in_space = false;
        out.push(b.to_ascii_lowercase());
    }

    // Runs are already collapsed, so at most one space sits at either end.
    if out.last() == Some(&b' ') {
        out.pop();
    }
    if out.first() == Some(&b' ') {
        out.remove(0);
    }
    BString::from(out)
}

/// Normalize a URL: lowercase ASCII and strip every trailing `/`
pub fn normalize_url(input: &[u8]) -> BString {
    let mut out = input.to_ascii_lowercase();
    while out.last() == Some(&b'/') {
        out.pop();
    }
    BString::from(out)
}

#[inline]
fn string_field<'a>(record: &'a Value, field: KeyField) -> Option<&'a str> {
    record.get(field.name()).and_then(Value::as_str)
}

fn concat(parts: &[&[u8]]) -> BString {
    let mut key = BString::from(Vec::with_capacity(parts.iter().map(|p| p.len()).sum()));
    for part in parts {
        key.push_str(part);
    }
    key
}

/// Derive the dedup key for a record
///
/// Returns `None` when no rule in `config.priority` yields a key; the caller
/// is expected to fall back to [`fallback_key`]. Non-object records and
/// non-string fields never yield a key.
pub fn derive_key(record: &Value, config: &KeyConfig) -> Option<BString> {
    let url = string_field(record, KeyField::Url)
        .map(|u| normalize_url(u.as_bytes()))
        .filter(|u| !u.is_empty());

    for field in &config.priority {
        let key = match field {
            KeyField::Text => string_field(record, KeyField::Text)
                .map(|t| normalize_text(t.as_bytes()))
                .filter(|t| !t.is_empty())
                .map(|text| match &url {
                    Some(url) if text.len() < config.short_text_threshold => {
                        concat(&[text.as_slice(), URL_JOIN, url.as_slice()])
                    }
                    _ => text,
                }),
            KeyField::Title => string_field(record, KeyField::Title)
                .map(|t| normalize_text(t.as_bytes()))
                .filter(|t| !t.is_empty())
                .map(|title| match &url {
                    Some(url) => concat(&[title.as_slice(), URL_JOIN, url.as_slice()]),
                    None => title,
                }),
            KeyField::Url => url.as_ref().map(|url| concat(&[URL_PREFIX, url.as_slice()])),
            KeyField::Id => string_field(record, KeyField::Id)
                .filter(|id| !id.is_empty())
                .map(|id| concat(&[ID_PREFIX, id.as_bytes()])),
        };
        if key.is_some() {
            return key;
        }
    }
    None
}

/// Positional key for records without usable identity fields
#[inline]
pub fn fallback_key(line_number: u64) -> BString {
    BString::from(format!("line|{line_number}"))
}

/// [`derive_key`], falling back to the 1-based line number
pub fn record_key(record: &Value, line_number: u64, config: &KeyConfig) -> BString {
    derive_key(record, config).unwrap_or_else(|| fallback_key(line_number))
}
