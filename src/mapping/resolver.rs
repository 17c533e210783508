use std::path::{Path, PathBuf};

use crate::mapping::builder::basename;
use crate::models::MappingTable;

/// Destination of `source` under `asset_root`.
///
/// Cousins are placed under their disambiguating directory, every other path lands directly
/// in the asset root. Paths the table does not know fall back to their own basename. The
/// result depends only on the arguments, so repeated calls always agree.
pub fn resolve_destination(source: &str, asset_root: &Path, table: &MappingTable) -> PathBuf {
    match table.lookup(source) {
        Some(entry) if entry.is_collision => {
            let mut destination = asset_root.to_path_buf();
            if !entry.relative_path.is_empty() {
                destination.push(&entry.relative_path);
            }
            destination.push(&entry.basename);
            destination
        }
        Some(entry) => asset_root.join(&entry.basename),
        None => asset_root.join(basename(source)),
    }
}

/// Path of `destination` as written into the project document.
///
/// The prefix up to the directory that holds the asset root is removed, so the result starts
/// with the asset root's own name and always uses forward slashes.
pub fn document_relative_path(destination: &Path, asset_root: &Path) -> Option<String> {
    let document_dir = asset_root.parent().unwrap_or_else(|| Path::new(""));
    let relative = destination.strip_prefix(document_dir).ok()?;
    if !relative.starts_with(asset_root.file_name()?) {
        return None;
    }

    Some(relative.to_string_lossy().replace('\\', "/"))
}
