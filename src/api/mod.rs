// src/api/mod.rs
//! Confluence API interaction: the ability to retrieve content from a site.
//!
//! Business logic depends on [`ConfluenceRepository`], never on HTTP
//! details. [`ConfluenceHttpClient`] is the production implementation;
//! tests substitute in-memory fakes.

pub mod client;
pub mod pagination;
pub mod parser;
mod responses;
pub mod tree;

use crate::error::AppError;
use crate::model::{Attachment, Page, Space};
use crate::types::{PageId, SpaceKey};
use std::path::Path;

pub use client::{ApiResponse, ConfluenceHttpClient, TransportSettings};
pub use pagination::{collect_all, PaginationResult};
pub use tree::TreeResolver;

/// The ability to retrieve content from a Confluence site.
#[async_trait::async_trait]
pub trait ConfluenceRepository: Send + Sync {
    /// Every space visible to the credentials.
    async fn list_spaces(&self) -> Result<Vec<Space>, AppError>;

    /// Every page in a space, bodies included.
    async fn list_space_pages(&self, space: &SpaceKey) -> Result<Vec<Page>, AppError>;

    /// One page with its body and ancestry.
    async fn get_page(&self, id: &PageId) -> Result<Page, AppError>;

    /// Direct children of a page, each with `parent_id` set to `parent`.
    async fn list_child_pages(&self, parent: &PageId) -> Result<Vec<Page>, AppError>;

    /// Metadata for every file attached to a page.
    async fn list_attachments(&self, page: &PageId) -> Result<Vec<Attachment>, AppError>;

    /// Streams an attachment's bytes to `destination`, returning the byte count.
    async fn download_attachment(
        &self,
        attachment: &Attachment,
        destination: &Path,
    ) -> Result<u64, AppError>;
}
