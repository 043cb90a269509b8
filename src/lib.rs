// src/lib.rs
//! confluence-export library: exports Confluence spaces and page trees as
//! Markdown files, SQLite rows or a search-index payload.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ErrorKind`, `ValidationError`
//! - **Configuration**: `CommandLineInput`, `ConfigFile`, `PipelineConfig`
//! - **Domain model**: `Space`, `Page`, `Attachment`, `ConvertedPage`
//! - **API client**: `ConfluenceRepository`, `ConfluenceHttpClient`, `TreeResolver`
//! - **Formatting**: `convert`, `convert_with`, `ConvertOptions`
//! - **Output**: `PageSink` and its file, store and search-index variants
//! - **Pipeline**: `ExportPipeline`, `ExportScope`, `ExportReport`

#[cfg(feature = "bench")]
pub mod api;
#[cfg(not(feature = "bench"))]
mod api;

mod config;
mod constants;
mod error;

#[cfg(feature = "bench")]
pub mod formatting;
#[cfg(not(feature = "bench"))]
mod formatting;

mod logging;

#[cfg(feature = "bench")]
pub mod model;
#[cfg(not(feature = "bench"))]
mod model;

mod output;
mod pipeline;

#[cfg(feature = "bench")]
pub mod types;
#[cfg(not(feature = "bench"))]
mod types;

// --- Error Handling ---
pub use crate::error::{AppError, ErrorKind};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{effective_concurrency, CommandLineInput, ConfigFile, PipelineConfig};
pub use crate::constants::{CONFLUENCE_API_PAGE_SIZE, MARKUP_MAX_DEPTH};

// --- Logging ---
pub use crate::logging::{parse_level, setup_logging, RunLogger};

// --- Domain Model ---
pub use crate::model::{page_uid, Attachment, ConvertedPage, ExportedPage, Page, Space};

// --- Domain Types ---
pub use crate::types::{ApiToken, AttachmentId, Credentials, PageId, SpaceKey, ValidatedUrl};

// --- API Client ---
pub use crate::api::{
    collect_all,
    parser::{
        parse_api_response, parse_attachment_listing, parse_content_listing,
        parse_page_response, parse_space_listing,
    },
    ApiResponse, ConfluenceHttpClient, ConfluenceRepository, PaginationResult,
    TransportSettings, TreeResolver,
};

// --- Formatting ---
pub use crate::formatting::{convert, convert_with, ConvertOptions};

// --- Output ---
pub use crate::output::paths::{attachment_link_dir, page_file_name, safe_file_name};
pub use crate::output::{
    build_sink, ExportReport, FileSink, FileSinkOptions, PageFailure, PageSink, ScopeFailure,
    SearchIndexSink, SinkKind, SinkSettings, StoreSink,
};

// --- Pipeline ---
pub use crate::pipeline::{
    DiscoveredScope, ExportPipeline, ExportScope, ExportSettings, PageComposer, PageDiscovery,
};
