use regex::Regex;

use crate::document::lines::opening_marker;
use crate::models::ReferenceKind;

/// Placeholder MLT writes for a resource with no backing file.
pub const EMPTY_RESOURCE_SENTINEL: &str = "0";

fn reference_ignores() -> &'static [Regex] {
    use std::sync::OnceLock;

    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            vec![
                Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("invalid URL scheme regex"),
                Regex::new(r"^#(?:[0-9A-Fa-f]{6}|[0-9A-Fa-f]{8})$").expect("invalid colour regex"),
                Regex::new(r"[<>]").expect("invalid markup regex"),
            ]
        })
        .as_slice()
}

/// Determine whether a tag token should be left untouched instead of collected.
///
/// Empty tokens, the empty-resource sentinel, URLs, colour producers and stray markup do not
/// name a file on disk, so there is nothing to copy or rewrite.
pub fn should_ignore_reference(token: &str) -> bool {
    token.is_empty()
        || token == EMPTY_RESOURCE_SENTINEL
        || reference_ignores()
            .iter()
            .any(|pattern| pattern.is_match(token))
}

/// Whether `line` is exactly the empty-resource template, ignoring indentation and the line
/// terminator.
pub fn is_empty_resource_line(line: &[u8]) -> bool {
    let template = format!(
        "{}{}</property>",
        opening_marker(ReferenceKind::Resource),
        EMPTY_RESOURCE_SENTINEL
    );
    line.trim_ascii() == template.as_bytes()
}
