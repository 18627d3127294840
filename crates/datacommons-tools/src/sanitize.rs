//! Helpers for turning free text into identifiers and file fields the
//! Data Commons loader accepts.
//!
//! Also strips directories from paths before they enter tracing span
//! attributes.

use regex::Regex;
use std::path::{Component, Path};
use std::sync::LazyLock;

static RE_DCID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(dcid:)?[A-Za-z_][A-Za-z0-9_./\-]*$").unwrap());

/// Normalises a free-text label into a node identifier.
///
/// `:` and `,` become `_`, every other character outside `[A-Za-z0-9_]`
/// separates words. Several words are joined in lowerCamelCase; a single
/// word only has its first character lower-cased, and is left alone when it
/// has no lowercase letters at all (acronyms such as `ODA`).
///
/// The result only contains `[A-Za-z0-9_]`, so normalising twice is the same
/// as normalising once.
pub fn normalize_identifier(label: &str) -> String {
    let replaced: String = label
        .trim()
        .chars()
        .map(|c| match c {
            ':' | ',' => '_',
            c if c.is_ascii_alphanumeric() || c == '_' => c,
            _ => ' ',
        })
        .collect();

    let words: Vec<&str> = replaced.split_whitespace().collect();
    match words.as_slice() {
        [] => String::new(),
        [word] => normalize_single_word(word),
        [first, rest @ ..] => {
            let mut out = first.to_ascii_lowercase();
            for word in rest {
                out.push_str(&capitalize(word));
            }
            out
        }
    }
}

fn normalize_single_word(word: &str) -> String {
    if !word.chars().any(|c| c.is_ascii_lowercase()) {
        return word.to_string();
    }
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Checks a string against the DCID grammar: an optional `dcid:` prefix, a
/// letter or underscore, then letters, digits and `_ . / -`.
pub fn is_valid_dcid(id: &str) -> bool {
    RE_DCID.is_match(id)
}

/// Collapses line breaks to single spaces and trims surrounding whitespace.
///
/// Stray newlines inside an MCF value start a new line in the output file and
/// silently corrupt the block that follows.
pub fn sanitize_field(value: &str) -> String {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a data file path places the file below a subdirectory.
pub fn has_subdirectory(path: &str) -> bool {
    path.contains('/') || path.contains('\\')
}

/// Returns why a data file path cannot be used, if it cannot.
pub fn data_path_problem(path: &str) -> Option<&'static str> {
    if path.trim().is_empty() {
        return Some("path is empty");
    }
    if Path::new(path).is_absolute() || path.starts_with('/') || path.starts_with('\\') {
        return Some("path must be relative to the input directory");
    }
    let traverses = Path::new(path)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
        || path.split(&['/', '\\'][..]).any(|segment| segment == "..");
    if traverses {
        return Some("path must not leave the input directory");
    }
    if path.split(&['/', '\\'][..]).any(|segment| segment.is_empty()) {
        return Some("path contains an empty segment");
    }
    None
}

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}
