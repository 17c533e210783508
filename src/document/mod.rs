//! Reading references out of MLT project documents.
//!
//! Line matching and token extraction are shared between the scanner, which feeds the
//! mapping builder, and the rewriter, which replaces the tokens it finds.

mod filters;
mod lines;
mod scanning;

pub use filters::{EMPTY_RESOURCE_SENTINEL, is_empty_resource_line, should_ignore_reference};
pub(crate) use lines::find_bytes;
pub use lines::{TaggedLine, locate_tagged_token, match_tagged_line};
pub use scanning::{read_project_references, scan_references};
