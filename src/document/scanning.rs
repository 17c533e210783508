use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::document::filters::should_ignore_reference;
use crate::error::{CollectorError, Result};
use crate::models::{ReferenceKind, ScannedReference};

fn property_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let tags = ReferenceKind::ALL
            .iter()
            .map(|kind| regex::escape(kind.tag_name()))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r#"<property name="({tags})">([^<]*)</property>"#))
            .expect("invalid property regex")
    })
}

fn kind_for_tag(tag: &str) -> Option<ReferenceKind> {
    ReferenceKind::ALL
        .into_iter()
        .find(|kind| kind.tag_name() == tag)
}

/// Collect the file references of a project document in document order.
///
/// Each path is reported once, under the kind of its first occurrence.
pub fn scan_references(text: &str) -> Vec<ScannedReference> {
    let mut seen = BTreeSet::new();
    let mut references = Vec::new();

    for captures in property_pattern().captures_iter(text) {
        let (Some(tag), Some(value)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        let Some(kind) = kind_for_tag(tag.as_str()) else {
            continue;
        };

        let path = value.as_str();
        if should_ignore_reference(path) || !seen.insert(path.to_string()) {
            continue;
        }

        references.push(ScannedReference {
            kind,
            path: path.to_string(),
        });
    }

    references
}

/// Read a project file and collect its references.
pub fn read_project_references(path: &Path) -> Result<Vec<ScannedReference>> {
    let text = fs::read(path).map_err(|source| CollectorError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(scan_references(&String::from_utf8_lossy(&text)))
}
