// src/output/paths.rs
//! Pure functions for path calculations and filename generation.
//!
//! Every name here is a pure function of its input, so re-exporting the
//! same page always lands on the same path.

use crate::constants::ATTACHMENTS_DIR;
use std::path::{Path, PathBuf};

const FALLBACK_NAME: &str = "untitled";

/// Makes a title safe to use as a single path component.
///
/// Path-hostile characters (`/ \ : * ? " < > |`) become `-`, spaces become
/// `_`; everything else is kept as is.
pub fn safe_file_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            ' ' => '_',
            c => c,
        })
        .collect();

    // "." and ".." would escape the directory
    if safe.is_empty() || safe.chars().all(|c| c == '.') {
        FALLBACK_NAME.to_string()
    } else {
        safe
    }
}

/// File name of a page's Markdown document.
pub fn page_file_name(title: &str) -> String {
    format!("{}.md", safe_file_name(title))
}

/// Attachment directory for a page, relative to the page's own file.
///
/// Uses `/` regardless of platform since it doubles as a Markdown link prefix.
pub fn attachment_link_dir(title: &str) -> String {
    format!("{}/{}", ATTACHMENTS_DIR, safe_file_name(title))
}

/// Directory a scope's documents are written to.
pub fn scope_dir(output_dir: &Path, scope_key: &str) -> PathBuf {
    output_dir.join(safe_file_name(scope_key))
}

/// Where an attachment of `title` lands inside `scope_dir`.
pub fn attachment_path(scope_dir: &Path, title: &str, file_name: &str) -> PathBuf {
    scope_dir
        .join(ATTACHMENTS_DIR)
        .join(safe_file_name(title))
        .join(safe_file_name(file_name))
}
