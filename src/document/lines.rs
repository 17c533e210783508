use std::ops::Range;

use crate::models::ReferenceKind;

/// A project line carrying one of the known reference tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedLine<'a> {
    /// Kind of the matched tag.
    pub kind: ReferenceKind,
    /// Byte range of the path token within the line, empty when no token is present.
    pub token_range: Range<usize>,
    /// Path token between the tag's `>` and the last `<` of the line.
    pub token: &'a str,
}

/// Opening marker of the property tag for `kind`.
pub(crate) fn opening_marker(kind: ReferenceKind) -> String {
    format!("<property name=\"{}\">", kind.tag_name())
}

/// Match `line` against the known tags, first match wins.
///
/// Returns `None` when no tag is present. A tag without a well formed token yields an empty
/// token so callers can still treat the line as recognised.
pub fn match_tagged_line(line: &str) -> Option<TaggedLine<'_>> {
    let (kind, token_range) = locate_tagged_token(line.as_bytes())?;
    Some(TaggedLine {
        kind,
        token: &line[token_range.clone()],
        token_range,
    })
}

/// Byte-level form of [`match_tagged_line`] for lines that are not valid UTF-8.
///
/// Markers and the closing `<` are ASCII, so the returned range always falls on character
/// boundaries when `line` is valid UTF-8.
pub fn locate_tagged_token(line: &[u8]) -> Option<(ReferenceKind, Range<usize>)> {
    ReferenceKind::ALL.into_iter().find_map(|kind| {
        let marker = opening_marker(kind);
        let position = find_bytes(line, marker.as_bytes())?;
        let start = position + marker.len();
        let token_range = match line.iter().rposition(|&byte| byte == b'<') {
            Some(end) if end > start => start..end,
            _ => start..start,
        };

        Some((kind, token_range))
    })
}

pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
