//! Line-by-line rewrite of a project document onto the collected asset tree.

use std::borrow::Cow;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::document::{find_bytes, is_empty_resource_line, locate_tagged_token, should_ignore_reference};
use crate::error::{CollectorError, Result};
use crate::install::{AssetInstaller, InstallOutcome, source_path};
use crate::mapping::{document_relative_path, resolve_destination};
use crate::models::{FailedAsset, MappingTable, RewriteReport};
use crate::project::CollectorLayout;

/// Streams a project document, installing each referenced file and pointing the document at it.
pub struct Rewriter<'a, I: AssetInstaller> {
  layout: &'a CollectorLayout,
  table: &'a MappingTable,
  asset_root: &'a Path,
  project_root: &'a Path,
  installer: I,
}

impl<'a, I: AssetInstaller> Rewriter<'a, I> {
  /// Create a rewriter targeting `asset_root`, resolving relative tokens against `project_root`.
  pub fn new(
    layout: &'a CollectorLayout,
    table: &'a MappingTable,
    asset_root: &'a Path,
    project_root: &'a Path,
    installer: I,
  ) -> Self {
    Self {
      layout,
      table,
      asset_root,
      project_root,
      installer,
    }
  }

  /// Consume the rewriter, returning its installer.
  pub fn into_installer(self) -> I {
    self.installer
  }

  /// Rewrite the project at `input` into `output`.
  ///
  /// The document is written to a sibling `.partial` file and moved into place once every
  /// line has been rewritten, so a fatal error never leaves a truncated project behind.
  pub fn rewrite_file(&mut self, input: &Path, output: &Path) -> Result<RewriteReport> {
    let reader = File::open(input).map_err(|source| CollectorError::OpenInput {
      path: input.to_path_buf(),
      source,
    })?;
    let staging = staging_path(output);
    let writer = File::create(&staging).map_err(|source| CollectorError::OpenOutput {
      path: output.to_path_buf(),
      source,
    })?;

    match self.rewrite(BufReader::new(reader), BufWriter::new(writer)) {
      Ok(report) => {
        fs::rename(&staging, output).map_err(|source| CollectorError::WriteFile {
          path: output.to_path_buf(),
          source,
        })?;
        Ok(report)
      }
      Err(err) => {
        if let Err(cleanup) = fs::remove_file(&staging) {
          warn!("failed to remove {}: {cleanup}", staging.display());
        }
        Err(err)
      }
    }
  }

  /// Rewrite every line of `input` into `output`, preserving order and line terminators.
  ///
  /// Lines without a known tag are written back byte for byte, whatever their encoding. A
  /// token that is not valid UTF-8 is copied from its raw path and installed under its
  /// lossily decoded name. Only I/O failures on the document itself and the empty-resource
  /// template abort.
  pub fn rewrite<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> Result<RewriteReport> {
    let mut report = RewriteReport::default();
    let mut buffer = Vec::new();

    loop {
      buffer.clear();
      let read = input
        .read_until(b'\n', &mut buffer)
        .map_err(|source| CollectorError::Read {
          line_number: report.lines + 1,
          source,
        })?;
      if read == 0 {
        break;
      }

      report.lines += 1;
      let line_number = report.lines;
      let line = self.rewrite_line(&buffer, line_number, &mut report)?;
      output.write_all(&line).map_err(CollectorError::Write)?;
    }

    output.flush().map_err(CollectorError::Write)?;
    Ok(report)
  }

  fn rewrite_line<'l>(
    &mut self,
    line: &'l [u8],
    line_number: usize,
    report: &mut RewriteReport,
  ) -> Result<Cow<'l, [u8]>> {
    let Some((kind, token_range)) = locate_tagged_token(line) else {
      return Ok(Cow::Borrowed(line));
    };
    let raw_token = &line[token_range];
    let token = String::from_utf8_lossy(raw_token);

    if should_ignore_reference(&token) {
      if is_empty_resource_line(line) {
        error!("line {line_number}: resource has no file behind it");
        return Err(CollectorError::EmptyResource {
          line_number,
          line: String::from_utf8_lossy(line.trim_ascii()).into_owned(),
        });
      }

      debug!("line {line_number}: leaving {token:?} untouched");
      report.passed_through += 1;
      return Ok(Cow::Borrowed(line));
    }

    if let Cow::Owned(decoded) = &token {
      warn!("line {line_number}: {decoded:?} is not valid UTF-8; collecting it under that name");
    }

    let kind_root = self.layout.kind_root(self.asset_root, kind);
    let destination = resolve_destination(&token, &kind_root, self.table);
    let Some(replacement) = document_relative_path(&destination, self.asset_root) else {
      warn!(
        "line {line_number}: destination {} is outside {}",
        destination.display(),
        self.asset_root.display()
      );
      report.passed_through += 1;
      return Ok(Cow::Borrowed(line));
    };

    let source = source_path(raw_token, self.project_root);
    match self.installer.install(&source, &destination) {
      Ok(InstallOutcome::Copied(_)) => report.copied += 1,
      Ok(InstallOutcome::AlreadyPresent) => report.already_present += 1,
      Err(err) => {
        let reason = format!("{:#}", anyhow::Error::from(err));
        warn!("line {line_number}: {reason}");
        report.failed.push(FailedAsset {
          line_number,
          original_path: token.to_string(),
          destination: destination.clone(),
          reason,
        });
      }
    }

    report.rewritten += 1;
    Ok(Cow::Owned(replace_all(line, raw_token, replacement.as_bytes())))
  }
}

/// Sibling of `output` receiving the document until it is complete.
fn staging_path(output: &Path) -> PathBuf {
  let mut name = output.file_name().map(OsString::from).unwrap_or_default();
  name.push(".partial");
  output.with_file_name(name)
}

/// Replace every occurrence of `from` in `line`.
fn replace_all(line: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
  if from.is_empty() {
    return line.to_vec();
  }

  let mut replaced = Vec::with_capacity(line.len() + to.len());
  let mut rest = line;
  while let Some(position) = find_bytes(rest, from) {
    replaced.extend_from_slice(&rest[..position]);
    replaced.extend_from_slice(to);
    rest = &rest[position + from.len()..];
  }
  replaced.extend_from_slice(rest);
  replaced
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::BTreeSet;
  use std::fs;
  use std::io::Cursor;
  use std::path::PathBuf;

  use tempfile::tempdir;

  use crate::error::InstallError;
  use crate::install::FsInstaller;
  use crate::mapping::build_file_mappings;

  #[derive(Default)]
  struct RecordingInstaller {
    installs: Vec<(PathBuf, PathBuf)>,
    present: BTreeSet<PathBuf>,
    missing: BTreeSet<PathBuf>,
  }

  impl AssetInstaller for RecordingInstaller {
    fn install(
      &mut self,
      source: &Path,
      destination: &Path,
    ) -> std::result::Result<InstallOutcome, InstallError> {
      if self.missing.contains(source) {
        return Err(InstallError::OpenSource {
          path: source.to_path_buf(),
          source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
      }
      if !self.present.insert(destination.to_path_buf()) {
        return Ok(InstallOutcome::AlreadyPresent);
      }
      self
        .installs
        .push((source.to_path_buf(), destination.to_path_buf()));
      Ok(InstallOutcome::Copied(0))
    }
  }

  fn run_bytes(
    document: &[u8],
    table: &MappingTable,
    installer: RecordingInstaller,
  ) -> (Result<RewriteReport>, Vec<u8>, RecordingInstaller) {
    let layout = CollectorLayout::default();
    let mut output = Vec::new();
    let mut rewriter = Rewriter::new(
      &layout,
      table,
      Path::new("/out/assets"),
      Path::new("/projects/film"),
      installer,
    );
    let result = rewriter.rewrite(Cursor::new(document), &mut output);
    (result, output, rewriter.into_installer())
  }

  fn run(
    document: &str,
    table: &MappingTable,
    installer: RecordingInstaller,
  ) -> (Result<RewriteReport>, String, RecordingInstaller) {
    let (result, output, installer) = run_bytes(document.as_bytes(), table, installer);
    (result, String::from_utf8(output).unwrap(), installer)
  }

  #[test]
  fn rewrites_resource_lines_and_copies_the_file() {
    let table = build_file_mappings(["/x/video.webm"]);
    let (result, output, installer) = run(
      "<property name=\"resource\">/x/video.webm</property>\n",
      &table,
      RecordingInstaller::default(),
    );

    let report = result.unwrap();
    assert_eq!(output, "<property name=\"resource\">assets/video.webm</property>\n");
    assert_eq!(installer.installs, vec![(
      PathBuf::from("/x/video.webm"),
      PathBuf::from("/out/assets/video.webm")
    )]);
    assert_eq!(report.rewritten, 1);
    assert_eq!(report.copied, 1);
  }

  #[test]
  fn lut_files_go_to_their_subdirectory() {
    let table = build_file_mappings(["/luts/warm.cube"]);
    let (result, output, installer) = run(
      "  <property name=\"av.file\">/luts/warm.cube</property>\n",
      &table,
      RecordingInstaller::default(),
    );

    result.unwrap();
    assert_eq!(output, "  <property name=\"av.file\">assets/LUT/warm.cube</property>\n");
    assert_eq!(installer.installs[0].1, PathBuf::from("/out/assets/LUT/warm.cube"));
  }

  #[test]
  fn stabilizer_and_alpha_files_use_fixed_subdirectories() {
    let table = build_file_mappings(["/s/take.trf", "/m/wipe.png"]);
    let (result, output, _) = run(
      concat!(
        "<property name=\"filename\">/s/take.trf</property>\n",
        "<property name=\"filter.resource\">/m/wipe.png</property>\n",
      ),
      &table,
      RecordingInstaller::default(),
    );

    result.unwrap();
    assert_eq!(
      output,
      concat!(
        "<property name=\"filename\">assets/stabilization_data/take.trf</property>\n",
        "<property name=\"filter.resource\">assets/alpha_transition/wipe.png</property>\n",
      )
    );
  }

  #[test]
  fn cousins_are_copied_and_referenced_at_distinct_paths() {
    let table = build_file_mappings(["/A/clips/intro.mp4", "/B/clips/intro.mp4"]);
    let (result, output, installer) = run(
      concat!(
        "<property name=\"resource\">/A/clips/intro.mp4</property>\n",
        "<property name=\"resource\">/B/clips/intro.mp4</property>\n",
      ),
      &table,
      RecordingInstaller::default(),
    );

    assert_eq!(result.unwrap().copied, 2);
    assert_eq!(
      output,
      concat!(
        "<property name=\"resource\">assets/A/clips/intro.mp4</property>\n",
        "<property name=\"resource\">assets/B/clips/intro.mp4</property>\n",
      )
    );
    assert_ne!(installer.installs[0].1, installer.installs[1].1);
  }

  #[test]
  fn untagged_lines_pass_through_byte_for_byte() {
    let document = "<?xml version=\"1.0\"?>\r\n  <property name=\"length\">250</property>\n\tplain";
    let (result, output, installer) = run(document, &MappingTable::default(), RecordingInstaller::default());

    assert_eq!(result.unwrap().lines, 3);
    assert_eq!(output, document);
    assert!(installer.installs.is_empty());
  }

  #[test]
  fn invalid_tokens_pass_through() {
    let document = concat!(
      "<property name=\"resource\">#ff000000</property>\n",
      "<property name=\"av.file\"></property>\n",
      "<property name=\"resource\">0</property><!-- placeholder -->\n",
    );
    let (result, output, installer) = run(document, &MappingTable::default(), RecordingInstaller::default());

    assert_eq!(result.unwrap().passed_through, 3);
    assert_eq!(output, document);
    assert!(installer.installs.is_empty());
  }

  #[test]
  fn empty_resource_template_is_fatal() {
    let document = concat!(
      "<mlt>\n",
      "    <property name=\"resource\">0</property>\n",
      "<property name=\"resource\">/x/a.mp4</property>\n",
    );
    let (result, _, installer) = run(document, &MappingTable::default(), RecordingInstaller::default());

    let err = result.unwrap_err();
    assert!(matches!(err, CollectorError::EmptyResource { line_number: 2, .. }));
    assert!(installer.installs.is_empty());
  }

  #[test]
  fn missing_sources_are_reported_and_rewriting_continues() {
    let table = build_file_mappings(["/gone/a.mp4", "/here/b.mp4"]);
    let mut installer = RecordingInstaller::default();
    installer.missing.insert(PathBuf::from("/gone/a.mp4"));

    let (result, output, installer) = run(
      concat!(
        "<property name=\"resource\">/gone/a.mp4</property>\n",
        "<property name=\"resource\">/here/b.mp4</property>\n",
      ),
      &table,
      installer,
    );

    let report = result.unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].line_number, 1);
    assert!(report.failed[0].reason.contains("failed to open source"));
    assert_eq!(report.copied, 1);
    assert!(output.contains("assets/a.mp4"));
    assert!(output.contains("assets/b.mp4"));
    assert_eq!(installer.installs.len(), 1);
  }

  #[test]
  fn relative_tokens_copy_from_the_project_directory() {
    let table = build_file_mappings(["media/a.mp4"]);
    let (result, output, installer) = run(
      "<property name=\"resource\">media/a.mp4</property>\n",
      &table,
      RecordingInstaller::default(),
    );

    result.unwrap();
    assert_eq!(output, "<property name=\"resource\">assets/a.mp4</property>\n");
    assert_eq!(installer.installs[0].0, PathBuf::from("/projects/film/media/a.mp4"));
  }

  #[test]
  fn repeated_references_are_installed_once() {
    let table = build_file_mappings(["/x/a.mp4"]);
    let (result, _, installer) = run(
      concat!(
        "<property name=\"resource\">/x/a.mp4</property>\n",
        "<property name=\"resource\">/x/a.mp4</property>\n",
      ),
      &table,
      RecordingInstaller::default(),
    );

    let report = result.unwrap();
    assert_eq!(report.copied, 1);
    assert_eq!(report.already_present, 1);
    assert_eq!(report.rewritten, 2);
    assert_eq!(installer.installs.len(), 1);
  }

  #[test]
  fn rewrite_file_fails_when_output_cannot_be_opened() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("in.mlt");
    fs::write(&input, "<mlt/>\n").unwrap();
    let layout = CollectorLayout::default();
    let table = MappingTable::default();
    let asset_root = temp.path().join("assets");

    let mut rewriter = Rewriter::new(&layout, &table, &asset_root, temp.path(), FsInstaller);
    let err = rewriter
      .rewrite_file(&input, &temp.path().join("missing/dir/out.mlt"))
      .unwrap_err();

    assert!(matches!(err, CollectorError::OpenOutput { .. }));
  }

  #[test]
  fn non_utf8_lines_without_tags_pass_through_byte_for_byte() {
    let document: &[u8] = b"<!-- caf\xe9 cr\xe8me -->\n<property name=\"length\">250</property>\n";
    let (result, output, installer) =
      run_bytes(document, &MappingTable::default(), RecordingInstaller::default());

    assert_eq!(result.unwrap().lines, 2);
    assert_eq!(output, document);
    assert!(installer.installs.is_empty());
  }

  #[cfg(unix)]
  #[test]
  fn latin1_tokens_are_collected_and_rewritten() {
    use std::os::unix::ffi::OsStrExt;

    let raw: &[u8] = b"/media/caf\xe9.mp4";
    let table = build_file_mappings([String::from_utf8_lossy(raw)]);
    let (result, output, installer) = run_bytes(
      b"  <property name=\"resource\">/media/caf\xe9.mp4</property>\n",
      &table,
      RecordingInstaller::default(),
    );

    let report = result.unwrap();
    assert_eq!(report.rewritten, 1);
    assert_eq!(report.copied, 1);
    assert!(report.failed.is_empty());
    assert_eq!(
      String::from_utf8(output).unwrap(),
      "  <property name=\"resource\">assets/caf\u{FFFD}.mp4</property>\n"
    );
    assert_eq!(installer.installs[0].1, PathBuf::from("/out/assets/caf\u{FFFD}.mp4"));
    assert_eq!(installer.installs[0].0.as_os_str().as_bytes(), raw);
  }

  #[test]
  fn every_occurrence_of_the_token_is_replaced() {
    let table = build_file_mappings(["/x/a.mp4"]);
    let (result, output, _) = run(
      "<property name=\"resource\">/x/a.mp4</property><!-- /x/a.mp4 -->\n",
      &table,
      RecordingInstaller::default(),
    );

    result.unwrap();
    assert_eq!(
      output,
      "<property name=\"resource\">assets/a.mp4</property><!-- assets/a.mp4 -->\n"
    );
  }

  #[test]
  fn fatal_errors_leave_no_partial_project() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("in.mlt");
    fs::write(
      &input,
      "<mlt>\n<property name=\"resource\">/x/a.mp4</property>\n<property name=\"resource\">0</property>\n",
    )
    .unwrap();
    let output = temp.path().join("out.mlt");
    fs::write(&output, "previous run").unwrap();
    let layout = CollectorLayout::default();
    let table = build_file_mappings(["/x/a.mp4"]);
    let asset_root = temp.path().join("assets");

    let mut rewriter = Rewriter::new(
      &layout,
      &table,
      &asset_root,
      temp.path(),
      RecordingInstaller::default(),
    );
    let err = rewriter.rewrite_file(&input, &output).unwrap_err();

    assert!(matches!(err, CollectorError::EmptyResource { line_number: 3, .. }));
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous run");
    assert!(!staging_path(&output).exists());
  }

  #[test]
  fn rewrite_file_moves_the_finished_project_into_place() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("in.mlt");
    fs::write(&input, "<property name=\"resource\">/x/a.mp4</property>\n").unwrap();
    let output = temp.path().join("out.mlt");
    let layout = CollectorLayout::default();
    let table = build_file_mappings(["/x/a.mp4"]);
    let asset_root = temp.path().join("assets");

    let mut rewriter = Rewriter::new(
      &layout,
      &table,
      &asset_root,
      temp.path(),
      RecordingInstaller::default(),
    );
    rewriter.rewrite_file(&input, &output).unwrap();

    assert_eq!(
      fs::read_to_string(&output).unwrap(),
      "<property name=\"resource\">assets/a.mp4</property>\n"
    );
    assert_eq!(staging_path(&output), temp.path().join("out.mlt.partial"));
    assert!(!staging_path(&output).exists());
  }
}
