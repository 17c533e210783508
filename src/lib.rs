#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod collector;
pub mod config;
pub mod document;
pub mod error;
pub mod install;
pub mod logging;
pub mod mapping;
pub mod models;
pub mod project;
pub mod rewrite;

pub use collector::ProjectCollector;
pub use config::CollectorConfig;
pub use error::{CollectorError, InstallError};
pub use mapping::{build_file_mappings, resolve_destination};
pub use models::{CollectionSummary, FileReference, MappingTable, ReferenceKind, RewriteReport};
pub use project::CollectorLayout;
pub use rewrite::Rewriter;
