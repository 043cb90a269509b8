// src/output/mod.rs
//! Output sinks: where converted pages end up.
//!
//! Every sink goes through the same lifecycle: `initialize` once, then
//! `save_page` for each page, then `close`, which runs even when some
//! pages failed. Saving the same page twice never duplicates it.

mod files;
pub mod paths;
mod search;
mod store;
mod types;

pub use files::{FileSink, FileSinkOptions};
pub use search::SearchIndexSink;
pub use store::StoreSink;
pub use types::{ExportReport, PageFailure, ScopeFailure};

use crate::api::ConfluenceRepository;
use crate::error::AppError;
use crate::model::ExportedPage;
use crate::types::ValidationError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Destination for exported pages.
#[async_trait::async_trait]
pub trait PageSink: Send {
    fn kind(&self) -> SinkKind;

    /// Variant-specific setup; safe to call more than once.
    async fn initialize(&mut self) -> Result<(), AppError>;

    /// Persists one page under `scope_key` (a space key or tree root title).
    async fn save_page(&mut self, page: &ExportedPage, scope_key: &str) -> Result<(), AppError>;

    /// Flushes and releases everything the sink holds.
    async fn close(&mut self) -> Result<(), AppError>;
}

/// The available sink variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// One Markdown file per page in a directory tree
    Files,
    /// Rows in an embedded SQLite database
    Store,
    /// A single JSON document ready for a search engine
    SearchIndex,
}

impl FromStr for SinkKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" | "files" | "markdown" => Ok(SinkKind::Files),
            "sqlite" | "duckdb" | "database" | "db" => Ok(SinkKind::Store),
            "meilisearch" | "search" => Ok(SinkKind::SearchIndex),
            _ => Err(ValidationError::UnknownOutputType(value.to_string())),
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SinkKind::Files => "file",
            SinkKind::Store => "sqlite",
            SinkKind::SearchIndex => "meilisearch",
        };
        f.write_str(name)
    }
}

/// What every sink needs to know about where output goes.
#[derive(Debug, Clone)]
pub struct SinkSettings {
    pub output_dir: PathBuf,
    pub include_front_matter: bool,
    pub include_attachments: bool,
}

/// Builds the sink for `kind`.
///
/// The repository is only used by the file sink, to fetch attachments.
pub fn build_sink(
    kind: SinkKind,
    settings: &SinkSettings,
    repository: Arc<dyn ConfluenceRepository>,
) -> Box<dyn PageSink> {
    log::debug!(
        "Building {} sink in {}",
        kind,
        settings.output_dir.display()
    );
    match kind {
        SinkKind::Files => Box::new(FileSink::new(
            settings.output_dir.clone(),
            FileSinkOptions {
                include_front_matter: settings.include_front_matter,
                include_attachments: settings.include_attachments,
            },
            Some(repository),
        )),
        SinkKind::Store => Box::new(StoreSink::in_dir(&settings.output_dir)),
        SinkKind::SearchIndex => Box::new(SearchIndexSink::in_dir(&settings.output_dir)),
    }
}
