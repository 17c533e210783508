//! Collector configuration loader describing the output layout.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::project::CollectorLayout;

/// File name searched for next to the input project.
pub const DEFAULT_CONFIG_FILE: &str = "mlt-collector.json";

/// Discoverable configuration describing directory and file names in the output tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Asset root directory name under the output directory.
    pub assets_dir: String,
    /// Subdirectory receiving colour lookup tables.
    pub lut_dir: String,
    /// Subdirectory receiving stabilizer data.
    pub stabilization_dir: String,
    /// Subdirectory receiving alpha transition images.
    pub alpha_transition_dir: String,
    /// Extension enforced on the rewritten project.
    pub project_extension: String,
    /// Log file name written into the output directory.
    pub log_file: String,
    /// Summary JSON file name written into the output directory.
    pub manifest_file: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            assets_dir: "assets".into(),
            lut_dir: "LUT".into(),
            stabilization_dir: "stabilization_data".into(),
            alpha_transition_dir: "alpha_transition".into(),
            project_extension: "mlt".into(),
            log_file: "project_collector.log".into(),
            manifest_file: "collection_manifest.json".into(),
        }
    }
}

impl CollectorConfig {
    /// Load configuration from the project directory, falling back to defaults.
    ///
    /// A missing file is the common case. A file that fails to parse is reported and
    /// ignored so a stray config never blocks archiving.
    pub fn discover(project_dir: &Path) -> Self {
        let candidate = project_dir.join(DEFAULT_CONFIG_FILE);
        if !candidate.exists() {
            return Self::default();
        }

        match Self::from_path(&candidate) {
            Ok(config) => config,
            Err(err) => {
                warn!("ignoring {}: {err:#}", candidate.display());
                Self::default()
            }
        }
    }

    /// Read configuration from a specific JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Convert the configuration into an owned layout description.
    pub fn into_layout(self) -> CollectorLayout {
        CollectorLayout {
            assets_dir: self.assets_dir,
            lut_dir: self.lut_dir,
            stabilization_dir: self.stabilization_dir,
            alpha_transition_dir: self.alpha_transition_dir,
            project_extension: self.project_extension,
            log_file: self.log_file,
            manifest_file: self.manifest_file,
        }
    }
}
