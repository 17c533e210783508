//! Data structures produced while collecting a project's assets.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::project::CollectorLayout;

/// Category of a project document reference, bound to a fixed destination directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
  /// General media (video, audio, images).
  Resource,
  /// Colour lookup table used by the LUT filter.
  LutFile,
  /// Stabilizer analysis data.
  StabilizerFile,
  /// Image used by alpha/mask transitions.
  AlphaTransition,
}

impl ReferenceKind {
  /// Every kind, in the order lines are matched against them.
  pub const ALL: [ReferenceKind; 4] = [
    ReferenceKind::Resource,
    ReferenceKind::LutFile,
    ReferenceKind::StabilizerFile,
    ReferenceKind::AlphaTransition,
  ];

  /// Property name carrying the path inside the project document.
  pub fn tag_name(self) -> &'static str {
    match self {
      ReferenceKind::Resource => "resource",
      ReferenceKind::LutFile => "av.file",
      ReferenceKind::StabilizerFile => "filename",
      ReferenceKind::AlphaTransition => "filter.resource",
    }
  }

  /// Subdirectory under the asset root, `None` for the asset root itself.
  pub fn subdirectory(self, layout: &CollectorLayout) -> Option<&str> {
    match self {
      ReferenceKind::Resource => None,
      ReferenceKind::LutFile => Some(&layout.lut_dir),
      ReferenceKind::StabilizerFile => Some(&layout.stabilization_dir),
      ReferenceKind::AlphaTransition => Some(&layout.alpha_transition_dir),
    }
  }
}

/// One entry per resource mention found in the project document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReference {
  /// Final path segment of the original path.
  pub basename: String,
  /// Path exactly as it appeared in the document.
  pub original_path: String,
  /// Disambiguating directory path for cousins, the basename otherwise.
  pub relative_path: String,
  /// True when another reference shares the basename.
  pub is_collision: bool,
}

/// Read-only table produced by [`crate::mapping::build_file_mappings`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct MappingTable {
  entries: Vec<FileReference>,
  #[serde(skip)]
  index: BTreeMap<String, usize>,
}

impl MappingTable {
  pub(crate) fn from_entries(entries: Vec<FileReference>) -> Self {
    let mut index = BTreeMap::new();
    for (position, entry) in entries.iter().enumerate() {
      index.entry(entry.original_path.clone()).or_insert(position);
    }
    Self { entries, index }
  }

  /// Entry whose original path matches `original_path` exactly.
  pub fn lookup(&self, original_path: &str) -> Option<&FileReference> {
    self
      .index
      .get(original_path)
      .map(|&position| &self.entries[position])
  }

  /// Entries in input order.
  pub fn entries(&self) -> &[FileReference] {
    &self.entries
  }

  /// Number of entries.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Returns `true` when the table holds no entries.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Number of entries flagged as cousins.
  pub fn collision_count(&self) -> usize {
    self.entries.iter().filter(|entry| entry.is_collision).count()
  }
}

/// A raw reference found while scanning the project document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedReference {
  /// Tag kind the value was found under.
  pub kind: ReferenceKind,
  /// Raw path token.
  pub path: String,
}

/// Asset that could not be installed while rewriting.
#[derive(Debug, Clone, Serialize)]
pub struct FailedAsset {
  /// One-based line number of the reference.
  pub line_number: usize,
  /// Raw token from the document.
  pub original_path: String,
  /// Destination the file should have been copied to.
  pub destination: PathBuf,
  /// Human readable failure description.
  pub reason: String,
}

/// Per-run counters gathered by the rewriter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RewriteReport {
  /// Total lines read.
  pub lines: usize,
  /// Lines whose reference was replaced.
  pub rewritten: usize,
  /// Lines with a recognised tag but a token that is not a file reference.
  pub passed_through: usize,
  /// Files copied into the asset tree.
  pub copied: usize,
  /// Files skipped because the destination already existed.
  pub already_present: usize,
  /// Files that could not be copied.
  pub failed: Vec<FailedAsset>,
}

/// Serializable summary written next to the rewritten project.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
  /// Rewritten project file.
  pub project_file: PathBuf,
  /// Root of the collected asset tree.
  pub asset_root: PathBuf,
  /// Mapping table used for every destination.
  pub mappings: MappingTable,
  /// References sharing a destination with an earlier one, and so not collected separately.
  pub duplicate_destinations: usize,
  /// Results of the rewrite pass.
  pub report: RewriteReport,
}
