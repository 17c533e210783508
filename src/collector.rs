//! Collection orchestrator: scan the project, plan destinations, rewrite and copy.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use same_file::is_same_file;
use tracing::{info, warn};

use crate::document::read_project_references;
use crate::error::{CollectorError, Result};
use crate::install::{AssetInstaller, FsInstaller, create_dir_idempotent};
use crate::mapping::{build_file_mappings, resolve_destination};
use crate::models::{CollectionSummary, MappingTable, ReferenceKind, ScannedReference};
use crate::project::CollectorLayout;
use crate::rewrite::Rewriter;

/// High-level helper collecting one project into an output directory.
pub struct ProjectCollector {
  layout: CollectorLayout,
  input: PathBuf,
  output_dir: PathBuf,
}

impl ProjectCollector {
  /// Create a collector for the project at `input`, writing into `output_dir`.
  pub fn new(layout: CollectorLayout, input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
    Self {
      layout,
      input: input.into(),
      output_dir: output_dir.into(),
    }
  }

  /// Layout used for the output tree.
  pub fn layout(&self) -> &CollectorLayout {
    &self.layout
  }

  /// Directory holding the input project; relative references are resolved against it.
  pub fn project_root(&self) -> Result<&Path> {
    match self.input.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => Ok(parent),
      Some(_) => Ok(Path::new(".")),
      None => Err(CollectorError::InvalidInputPath {
        path: self.input.clone(),
      }),
    }
  }

  /// Path of the rewritten project inside the output directory.
  pub fn output_project_path(&self) -> Result<PathBuf> {
    let name = self
      .input
      .file_name()
      .ok_or_else(|| CollectorError::InvalidInputPath {
        path: self.input.clone(),
      })?;
    Ok(
      self
        .output_dir
        .join(self.layout.project_file_name(&name.to_string_lossy())),
    )
  }

  /// Check the input path and that the output directory is not the project directory.
  pub fn validate(&self) -> Result<()> {
    self.output_project_path()?;
    ensure_distinct_directories(self.project_root()?, &self.output_dir)
  }

  /// Collect every referenced file and write the rewritten project.
  pub fn collect(&self) -> Result<CollectionSummary> {
    self.collect_with(FsInstaller)
  }

  /// Collect using a custom installer.
  pub fn collect_with<I: AssetInstaller>(&self, installer: I) -> Result<CollectionSummary> {
    self.validate()?;
    let project_root = self.project_root()?;
    let project_file = self.output_project_path()?;

    let references = read_project_references(&self.input)?;
    let table = build_file_mappings(references.iter().map(|reference| reference.path.as_str()));
    info!(
      "found {} referenced files, {} sharing a name",
      table.len(),
      table.collision_count()
    );

    let asset_root = self.layout.asset_root(&self.output_dir);
    self.prepare_output_tree(&asset_root)?;
    let duplicate_destinations =
      warn_duplicate_destinations(&self.layout, &asset_root, &references, &table);

    let mut rewriter = Rewriter::new(&self.layout, &table, &asset_root, project_root, installer);
    let report = rewriter.rewrite_file(&self.input, &project_file)?;
    info!(
      "rewrote {} references: {} copied, {} already present, {} failed",
      report.rewritten,
      report.copied,
      report.already_present,
      report.failed.len()
    );

    let summary = CollectionSummary {
      project_file,
      asset_root,
      mappings: table,
      duplicate_destinations,
      report,
    };
    self.write_manifest(&summary)?;
    Ok(summary)
  }

  fn prepare_output_tree(&self, asset_root: &Path) -> Result<()> {
    let mut directories = vec![self.output_dir.clone(), asset_root.to_path_buf()];
    directories.extend(
      ReferenceKind::ALL
        .into_iter()
        .filter(|kind| kind.subdirectory(&self.layout).is_some())
        .map(|kind| self.layout.kind_root(asset_root, kind)),
    );

    for directory in directories {
      create_dir_idempotent(&directory).map_err(|source| CollectorError::CreateDirectory {
        path: directory.clone(),
        source,
      })?;
    }

    Ok(())
  }

  fn write_manifest(&self, summary: &CollectionSummary) -> Result<()> {
    let path = self.output_dir.join(&self.layout.manifest_file);
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(&path, json).map_err(|source| CollectorError::WriteFile { path, source })
  }
}

fn ensure_distinct_directories(project_root: &Path, output_dir: &Path) -> Result<()> {
  let same = project_root.components().eq(output_dir.components())
    || is_same_file(project_root, output_dir).unwrap_or(false);

  if same {
    return Err(CollectorError::SameDirectory {
      path: output_dir.to_path_buf(),
    });
  }

  Ok(())
}

/// Report references whose destinations could not be kept apart.
///
/// The installer skips existing destinations, so only the first of each group is collected.
fn warn_duplicate_destinations(
  layout: &CollectorLayout,
  asset_root: &Path,
  references: &[ScannedReference],
  table: &MappingTable,
) -> usize {
  let mut claimed: BTreeMap<PathBuf, &str> = BTreeMap::new();
  let mut duplicates = 0;

  for reference in references {
    let kind_root = layout.kind_root(asset_root, reference.kind);
    let destination = resolve_destination(&reference.path, &kind_root, table);
    if let Some(first) = claimed.get(&destination) {
      warn!(
        "{} and {} both map to {}; only the first is collected",
        first,
        reference.path,
        destination.display()
      );
      duplicates += 1;
    } else {
      claimed.insert(destination, &reference.path);
    }
  }

  duplicates
}
