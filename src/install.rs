//! Copying referenced files into the collected asset tree.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::InstallError;

/// Result of a successful install request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
  /// The file was copied, carrying the number of bytes written.
  Copied(u64),
  /// The destination already existed and was left untouched.
  AlreadyPresent,
}

/// Places a source file at a destination inside the asset tree.
pub trait AssetInstaller {
  /// Install `source` at `destination`, skipping when the destination already exists.
  fn install(&mut self, source: &Path, destination: &Path) -> Result<InstallOutcome, InstallError>;
}

/// Installer that streams bytes between files on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsInstaller;

impl AssetInstaller for FsInstaller {
  fn install(&mut self, source: &Path, destination: &Path) -> Result<InstallOutcome, InstallError> {
    if destination.exists() {
      debug!("{} already collected", destination.display());
      return Ok(InstallOutcome::AlreadyPresent);
    }

    let mut reader = File::open(source).map_err(|err| InstallError::OpenSource {
      path: source.to_path_buf(),
      source: err,
    })?;

    if let Some(parent) = destination.parent() {
      create_dir_idempotent(parent).map_err(|err| InstallError::CreateParent {
        path: parent.to_path_buf(),
        source: err,
      })?;
    }

    let mut writer = File::create(destination).map_err(|err| InstallError::CreateDestination {
      path: destination.to_path_buf(),
      source: err,
    })?;

    let bytes = io::copy(&mut reader, &mut writer).map_err(|err| InstallError::Copy {
      path: destination.to_path_buf(),
      source: err,
    })?;

    info!("copied {} to {}", source.display(), destination.display());
    Ok(InstallOutcome::Copied(bytes))
  }
}

/// Create `path` and its parents, treating an existing directory as success.
pub fn create_dir_idempotent(path: &Path) -> io::Result<()> {
  match fs::create_dir_all(path) {
    Ok(()) => Ok(()),
    Err(err) if err.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
    Err(err) => Err(err),
  }
}

/// Absolute source location of a raw document token.
///
/// Relative tokens are interpreted against the directory holding the project file. On unix the
/// token bytes name the file as-is, so paths that are not valid UTF-8 still resolve.
pub fn source_path(token: &[u8], project_root: &Path) -> PathBuf {
  let path = token_path(token);
  if path.is_absolute() {
    path
  } else {
    project_root.join(path)
  }
}

#[cfg(unix)]
fn token_path(token: &[u8]) -> PathBuf {
  use std::ffi::OsStr;
  use std::os::unix::ffi::OsStrExt;

  PathBuf::from(OsStr::from_bytes(token))
}

#[cfg(not(unix))]
fn token_path(token: &[u8]) -> PathBuf {
  PathBuf::from(String::from_utf8_lossy(token).into_owned())
}
