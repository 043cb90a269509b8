//! Shared fixtures: an in-memory Confluence and a capturing logger.
#![allow(dead_code)]

use confluence_export::{
    AppError, Attachment, AttachmentId, ConfluenceRepository, Page, PageId, Space, SpaceKey,
};
use log::{Level, Log, Metadata, Record};
use reqwest::StatusCode;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn page(id: &str, title: &str, space: &str, body: &str) -> Page {
    Page {
        id: PageId::parse(id).unwrap(),
        title: title.to_string(),
        space_key: SpaceKey::new(space).unwrap(),
        parent_id: None,
        version: 1,
        raw_body: body.to_string(),
        url: format!("/spaces/{}/pages/{}", space, id),
    }
}

pub fn attachment(id: &str, file_name: &str, page_id: &str) -> Attachment {
    Attachment {
        id: AttachmentId::parse(id).unwrap(),
        title: file_name.to_string(),
        file_name: file_name.to_string(),
        media_type: Some("application/octet-stream".to_string()),
        file_size: None,
        download_url: format!("/download/attachments/{}/{}", page_id, file_name),
    }
}

fn not_found(what: &str) -> AppError {
    AppError::http(StatusCode::NOT_FOUND, format!("fake://{}", what), "not found")
}

/// An in-memory site with configurable failures.
#[derive(Default)]
pub struct FakeRepository {
    spaces: Vec<Space>,
    space_pages: HashMap<String, Vec<String>>,
    pages: HashMap<String, Page>,
    children: HashMap<String, Vec<String>>,
    attachments: HashMap<String, Vec<Attachment>>,
    failing_listings: HashSet<String>,
    failing_downloads: HashSet<String>,
    pub child_listings: AtomicUsize,
    pub downloads: Mutex<Vec<PathBuf>>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page to `space` and to its space listing.
    pub fn with_page(mut self, id: &str, title: &str, space: &str, body: &str) -> Self {
        if !self.spaces.iter().any(|s| s.key.as_str() == space) {
            self.spaces.push(Space::new(SpaceKey::new(space).unwrap()));
        }
        self.space_pages
            .entry(space.to_string())
            .or_default()
            .push(id.to_string());
        self.pages.insert(id.to_string(), page(id, title, space, body));
        self
    }

    pub fn with_space(mut self, space: &str) -> Self {
        self.spaces.push(Space::new(SpaceKey::new(space).unwrap()));
        self.space_pages.entry(space.to_string()).or_default();
        self
    }

    pub fn with_child(mut self, parent: &str, child: &str) -> Self {
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(child.to_string());
        self
    }

    pub fn with_attachment(mut self, page_id: &str, attachment: Attachment) -> Self {
        self.attachments
            .entry(page_id.to_string())
            .or_default()
            .push(attachment);
        self
    }

    /// Makes every listing keyed by `key` (a space key or page id) fail.
    pub fn failing_listing(mut self, key: &str) -> Self {
        self.failing_listings.insert(key.to_string());
        self
    }

    pub fn failing_download(mut self, file_name: &str) -> Self {
        self.failing_downloads.insert(file_name.to_string());
        self
    }

    fn lookup(&self, id: &str) -> Result<Page, AppError> {
        self.pages
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(&format!("page/{}", id)))
    }
}

#[async_trait::async_trait]
impl ConfluenceRepository for FakeRepository {
    async fn list_spaces(&self) -> Result<Vec<Space>, AppError> {
        if self.failing_listings.contains("*") {
            return Err(not_found("space"));
        }
        Ok(self.spaces.clone())
    }

    async fn list_space_pages(&self, space: &SpaceKey) -> Result<Vec<Page>, AppError> {
        if self.failing_listings.contains(space.as_str()) {
            return Err(not_found(&format!("space/{}", space)));
        }
        let ids = self
            .space_pages
            .get(space.as_str())
            .ok_or_else(|| not_found(&format!("space/{}", space)))?;
        ids.iter().map(|id| self.lookup(id)).collect()
    }

    async fn get_page(&self, id: &PageId) -> Result<Page, AppError> {
        self.lookup(id.as_str())
    }

    async fn list_child_pages(&self, parent: &PageId) -> Result<Vec<Page>, AppError> {
        self.child_listings.fetch_add(1, Ordering::SeqCst);
        if self.failing_listings.contains(parent.as_str()) {
            return Err(not_found(&format!("page/{}/child/page", parent)));
        }
        let ids = self.children.get(parent.as_str()).cloned().unwrap_or_default();
        ids.iter()
            .map(|id| {
                let mut child = self.lookup(id)?;
                child.parent_id = Some(parent.clone());
                Ok(child)
            })
            .collect()
    }

    async fn list_attachments(&self, page: &PageId) -> Result<Vec<Attachment>, AppError> {
        if self.failing_listings.contains(&format!("attachments:{}", page)) {
            return Err(not_found(&format!("page/{}/child/attachment", page)));
        }
        Ok(self.attachments.get(page.as_str()).cloned().unwrap_or_default())
    }

    async fn download_attachment(
        &self,
        attachment: &Attachment,
        destination: &Path,
    ) -> Result<u64, AppError> {
        if self.failing_downloads.contains(&attachment.file_name) {
            return Err(not_found(&attachment.download_url));
        }
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = format!("contents of {}", attachment.file_name);
        tokio::fs::write(destination, &bytes).await?;
        self.downloads
            .lock()
            .unwrap()
            .push(destination.to_path_buf());
        Ok(bytes.len() as u64)
    }
}

/// Records every message at or above `Debug`.
#[derive(Default)]
pub struct CaptureLog {
    lines: Mutex<Vec<(Level, String)>>,
}

impl CaptureLog {
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn at(&self, level: Level) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line)
            .collect()
    }
}

impl Log for CaptureLog {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record<'_>) {
        self.lines
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}
