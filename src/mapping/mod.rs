//! Destination planning for referenced files.
//!
//! The builder decides, once per run, which references share a basename and how deep into
//! their original directory each of them must reach to stay unique. The resolver turns that
//! decision into concrete destinations and is called by every consumer so the copy step and
//! the rewritten document always agree.

mod builder;
mod resolver;

pub use builder::{PARENT_SEGMENT, basename, build_file_mappings};
pub use resolver::{document_relative_path, resolve_destination};
