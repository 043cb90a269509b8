// src/constants.rs
//! Domain constants that define the operational boundaries of the exporter.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role. Reading these constants should tell you how the exporter
//! talks to Confluence, how far it recurses, and where it puts things.

// ---------------------------------------------------------------------------
// Confluence API boundaries
// ---------------------------------------------------------------------------

/// How many records the exporter asks for per listing request.
///
/// Confluence Cloud caps most listings well above this; 25 matches the
/// page size the REST API documents as its default.
pub const CONFLUENCE_API_PAGE_SIZE: usize = 25;

/// Per-request timeout for every Transport call, including attachment downloads.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Upper bound on simultaneous in-flight requests, whatever the configuration says.
pub const MAX_CONCURRENT_REQUESTS: usize = 32;

/// Fan-out used when the configuration asks for "auto" (0).
pub const AUTO_CONCURRENCY_CAP: usize = 8;

/// Expansions requested for page listings.
pub const PAGE_LISTING_EXPAND: &str = "body.storage,version,space";

/// Expansions requested for a single page lookup; `ancestors` yields the parent.
pub const PAGE_LOOKUP_EXPAND: &str = "body.storage,version,space,ancestors";

// ---------------------------------------------------------------------------
// Conversion boundaries
// ---------------------------------------------------------------------------

/// Maximum element nesting the converter will render.
///
/// Storage-format bodies deeper than this are treated as malformed rather
/// than risking the renderer's stack.
pub const MARKUP_MAX_DEPTH: usize = 256;

// ---------------------------------------------------------------------------
// Output layout
// ---------------------------------------------------------------------------

/// Directory (under a scope directory) holding per-page attachment folders.
pub const ATTACHMENTS_DIR: &str = "attachments";

/// File name of the embedded store inside the output directory.
pub const STORE_FILE_NAME: &str = "confluence.db";

/// File name of the search-index payload inside the output directory.
pub const SEARCH_EXPORT_FILE_NAME: &str = "meilisearch.json";

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
