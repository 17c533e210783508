//! Error types for collecting and rewriting a project.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that stop the whole collection run.
#[derive(Debug, Error)]
pub enum CollectorError {
  /// The input project could not be opened or read.
  #[error("failed to open input project {}", path.display())]
  OpenInput {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: io::Error,
  },

  /// The rewritten project could not be created.
  #[error("failed to open output project {}", path.display())]
  OpenOutput {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: io::Error,
  },

  /// Reading a line of the input project failed midway.
  #[error("failed to read project line {line_number}")]
  Read {
    /// One-based line that could not be read.
    line_number: usize,
    /// Source I/O error.
    #[source]
    source: io::Error,
  },

  /// Writing the rewritten project failed.
  #[error("failed to write rewritten project")]
  Write(#[source] io::Error),

  /// A whole-line empty resource marker was found.
  #[error("empty resource on line {line_number}: {line}")]
  EmptyResource {
    /// One-based line number of the marker.
    line_number: usize,
    /// Offending line without surrounding whitespace.
    line: String,
  },

  /// The input path does not name a file.
  #[error("invalid input project path {}", path.display())]
  InvalidInputPath {
    /// Path that caused the error.
    path: PathBuf,
  },

  /// The output directory is the directory holding the input project.
  #[error("input project directory and output directory are the same: {}", path.display())]
  SameDirectory {
    /// Output directory that was rejected.
    path: PathBuf,
  },

  /// A directory of the output tree could not be created.
  #[error("failed to create directory {}", path.display())]
  CreateDirectory {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: io::Error,
  },

  /// A supporting output file could not be written.
  #[error("failed to write {}", path.display())]
  WriteFile {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: io::Error,
  },

  /// The collection summary could not be serialised.
  #[error("failed to serialise collection manifest")]
  Manifest(#[from] serde_json::Error),
}

/// Result type alias for fatal collector errors.
pub type Result<T> = std::result::Result<T, CollectorError>;

/// Recoverable failure while installing a single asset.
#[derive(Debug, Error)]
pub enum InstallError {
  /// The referenced file could not be opened.
  #[error("failed to open source {}", path.display())]
  OpenSource {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: io::Error,
  },

  /// The destination's directory could not be created.
  #[error("failed to create directory {}", path.display())]
  CreateParent {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: io::Error,
  },

  /// The destination file could not be created.
  #[error("failed to create destination {}", path.display())]
  CreateDestination {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: io::Error,
  },

  /// Copying bytes into the destination failed.
  #[error("failed to copy into {}", path.display())]
  Copy {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: io::Error,
  },
}
