//! Layout description shared by the collector, resolver and rewriter.

use std::path::{Path, PathBuf};

use crate::models::ReferenceKind;

/// Owned description of the names used in the collected output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorLayout {
  /// Name of the asset root under the output directory.
  pub assets_dir: String,
  /// Subdirectory for colour lookup tables.
  pub lut_dir: String,
  /// Subdirectory for stabilizer data.
  pub stabilization_dir: String,
  /// Subdirectory for alpha transition images.
  pub alpha_transition_dir: String,
  /// Extension enforced on the rewritten project file.
  pub project_extension: String,
  /// Log file written into the output directory.
  pub log_file: String,
  /// JSON summary written into the output directory.
  pub manifest_file: String,
}

impl Default for CollectorLayout {
  fn default() -> Self {
    crate::config::CollectorConfig::default().into_layout()
  }
}

impl CollectorLayout {
  /// Asset root for an output directory.
  pub fn asset_root(&self, output_dir: &Path) -> PathBuf {
    output_dir.join(&self.assets_dir)
  }

  /// Directory files of `kind` are collected into.
  pub fn kind_root(&self, asset_root: &Path, kind: ReferenceKind) -> PathBuf {
    match kind.subdirectory(self) {
      Some(subdirectory) => asset_root.join(subdirectory),
      None => asset_root.to_path_buf(),
    }
  }

  /// Output project file name, appending the configured extension when missing.
  pub fn project_file_name(&self, input_name: &str) -> String {
    let suffix = format!(".{}", self.project_extension.trim_start_matches('.'));
    if input_name.ends_with(&suffix) {
      input_name.to_string()
    } else {
      format!("{input_name}{suffix}")
    }
  }
}
