use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::models::{FileReference, MappingTable};

/// Final path segment of `path`, or the whole string when it holds no separator.
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(position) => &path[position + 1..],
        None => path,
    }
}

/// Build the mapping table for every referenced path.
///
/// References sharing a basename ("cousins") are given the shortest trailing run of their
/// own directory components that no other cousin's directory ends with. Everything else
/// keeps its bare basename.
pub fn build_file_mappings<I, S>(references: I) -> MappingTable
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries: Vec<FileReference> = references
        .into_iter()
        .map(|reference| {
            let original_path = reference.as_ref().to_string();
            FileReference {
                basename: basename(&original_path).to_string(),
                relative_path: String::new(),
                original_path,
                is_collision: false,
            }
        })
        .collect();

    let mut occurrences: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in &entries {
        *occurrences.entry(entry.basename.as_str()).or_default() += 1;
    }
    let colliding: Vec<bool> = entries
        .iter()
        .map(|entry| occurrences[entry.basename.as_str()] > 1)
        .collect();

    for (entry, is_collision) in entries.iter_mut().zip(&colliding) {
        entry.is_collision = *is_collision;
    }

    let cousin_directories: Vec<(usize, Vec<&str>)> = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.is_collision)
        .map(|(position, entry)| (position, directory_components(&entry.original_path)))
        .collect();

    let relative_paths: Vec<String> = entries
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            if entry.is_collision {
                climb_unique_directory(position, entry, &cousin_directories)
            } else {
                entry.basename.clone()
            }
        })
        .collect();

    for (entry, relative_path) in entries.iter_mut().zip(relative_paths) {
        if entry.is_collision {
            debug!(
                "cousin {} placed under {}",
                entry.original_path,
                if relative_path.is_empty() { "." } else { relative_path.as_str() }
            );
        }
        entry.relative_path = relative_path;
    }

    MappingTable::from_entries(entries)
}

/// Directory segment standing in for `..`, so parent steps never leave the asset root.
pub const PARENT_SEGMENT: &str = "_parent_";

/// Climb the directory of `entry` one component at a time until no other cousin's directory
/// ends with the candidate.
fn climb_unique_directory(
    position: usize,
    entry: &FileReference,
    cousin_directories: &[(usize, Vec<&str>)],
) -> String {
    let components = directory_components(&entry.original_path);

    for depth in 1..=components.len() {
        let candidate = &components[components.len() - depth..];
        let conflict = cousin_directories
            .iter()
            .any(|(other, directory)| *other != position && directory.ends_with(candidate));

        if !conflict {
            return candidate.join("/");
        }
    }

    let fallback = components.join("/");
    warn!(
        "no unique directory for {}; it shares {}/{} with another reference",
        entry.original_path,
        if fallback.is_empty() { "." } else { fallback.as_str() },
        entry.basename
    );
    fallback
}

/// Directory components of `path`, innermost last.
///
/// Empty and `.` segments are dropped and `..` becomes [`PARENT_SEGMENT`].
fn directory_components(path: &str) -> Vec<&str> {
    let directory = match path.rfind('/') {
        Some(position) => &path[..position],
        None => "",
    };

    directory
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .map(|segment| if segment == ".." { PARENT_SEGMENT } else { segment })
        .collect()
}
