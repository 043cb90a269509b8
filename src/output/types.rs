// src/output/types.rs
//! Type definitions for export outcomes.
//!
//! Reports are built up immutably with `with_*` calls as the pipeline
//! moves through scopes and pages.

use crate::error::{AppError, ErrorKind};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Outcome of one export run.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub started_at: DateTime<Utc>,
    /// Scope keys that were discovered and fed to the sink
    pub scopes: Vec<String>,
    /// Pages discovered across all scopes
    pub pages_discovered: usize,
    /// Pages the sink accepted
    pub pages_processed: usize,
    pub page_failures: Vec<PageFailure>,
    /// Scopes whose discovery failed; none of their pages were exported
    pub scope_failures: Vec<ScopeFailure>,
    pub elapsed: Duration,
}

impl Default for ExportReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            scopes: Vec::new(),
            pages_discovered: 0,
            pages_processed: 0,
            page_failures: Vec::new(),
            scope_failures: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_scope(mut self, scope_key: impl Into<String>, pages: usize) -> Self {
        self.scopes.push(scope_key.into());
        self.pages_discovered += pages;
        self
    }

    pub fn with_processed(mut self) -> Self {
        self.pages_processed += 1;
        self
    }

    pub fn with_page_failure(mut self, failure: PageFailure) -> Self {
        self.page_failures.push(failure);
        self
    }

    pub fn with_scope_failure(mut self, failure: ScopeFailure) -> Self {
        self.scope_failures.push(failure);
        self
    }

    pub fn finished(mut self) -> Self {
        self.elapsed = (Utc::now() - self.started_at).to_std().unwrap_or_default();
        self
    }

    pub fn pages_failed(&self) -> usize {
        self.page_failures.len()
    }

    /// True when every scope was discovered; page failures don't count.
    pub fn is_success(&self) -> bool {
        self.scope_failures.is_empty()
    }
}

/// A page that could not be converted, saved or given its attachments.
#[derive(Debug, Clone)]
pub struct PageFailure {
    pub title: String,
    pub page_id: String,
    pub scope: String,
    pub kind: ErrorKind,
    pub error: String,
}

impl PageFailure {
    pub fn new(title: &str, page_id: &str, scope: &str, error: &AppError) -> Self {
        Self {
            title: title.to_string(),
            page_id: page_id.to_string(),
            scope: scope.to_string(),
            kind: error.kind(),
            error: error.to_string(),
        }
    }
}

/// A scope whose page discovery failed.
#[derive(Debug, Clone)]
pub struct ScopeFailure {
    pub scope: String,
    pub kind: ErrorKind,
    pub error: String,
}

impl ScopeFailure {
    pub fn new(scope: &str, error: &AppError) -> Self {
        Self {
            scope: scope.to_string(),
            kind: error.kind(),
            error: error.to_string(),
        }
    }
}
