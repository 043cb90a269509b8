// src/model/mod.rs
//! Domain model for exported Confluence content.
//!
//! Pages, spaces and attachments are decoded from API responses and never
//! mutated afterwards. [`ConvertedPage`] is the portable form every sink
//! persists; its `uid` is the idempotence key.

use crate::types::{AttachmentId, PageId, SpaceKey, ValidatedUrl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named partition of the content repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    pub key: SpaceKey,
    pub name: Option<String>,
}

impl Space {
    pub fn new(key: SpaceKey) -> Self {
        Self { key, name: None }
    }
}

/// A single Confluence page with its storage-format body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    pub space_key: SpaceKey,
    pub parent_id: Option<PageId>,
    pub version: u32,
    /// Storage-format (XHTML) markup
    pub raw_body: String,
    /// Web UI path relative to the base URL
    pub url: String,
}

impl Page {
    /// Deterministic identifier derived from page identity.
    ///
    /// UUIDv5 in the URL namespace over `"{space_key}/{id}"`, hyphenated.
    /// The same page always yields the same uid, across runs and machines.
    pub fn uid(&self) -> String {
        page_uid(&self.space_key, &self.id)
    }

    /// Absolute link to the page in the Confluence web UI.
    pub fn link(&self, base_url: &ValidatedUrl) -> String {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            return self.url.clone();
        }
        if self.url.is_empty() {
            return base_url.join_path(&format!("/pages/viewpage.action?pageId={}", self.id));
        }
        base_url.join_path(&self.url)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Computes the uid for a page identity without needing the full page.
pub fn page_uid(space_key: &SpaceKey, id: &PageId) -> String {
    let name = format!("{}/{}", space_key.as_str(), id.as_str());
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
        .hyphenated()
        .to_string()
}

/// A file attached to a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: AttachmentId,
    pub title: String,
    pub file_name: String,
    pub media_type: Option<String>,
    pub file_size: Option<u64>,
    /// Download link as returned by the API; usually relative to the base URL
    pub download_url: String,
}

/// The portable record every sink persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedPage {
    pub uid: String,
    pub title: String,
    pub body: String,
    pub link: String,
}

impl ConvertedPage {
    pub fn from_page(page: &Page, body: String, base_url: &ValidatedUrl) -> Self {
        Self {
            uid: page.uid(),
            title: page.title.clone(),
            body,
            link: page.link(base_url),
        }
    }
}

/// A resolved, converted page on its way to a sink.
#[derive(Debug, Clone)]
pub struct ExportedPage {
    pub page: Page,
    pub converted: ConvertedPage,
    /// Empty unless attachment export is enabled
    pub attachments: Vec<Attachment>,
}
