// src/output/files.rs
//! Markdown file tree sink.
//!
//! Layout: `<output_dir>/<scope>/<title>.md`, with attachments under
//! `<output_dir>/<scope>/attachments/<title>/`. Paths are pure functions
//! of scope and title, so a rerun overwrites rather than duplicates.

use super::paths::{attachment_path, page_file_name, scope_dir};
use super::{PageSink, SinkKind};
use crate::api::ConfluenceRepository;
use crate::error::AppError;
use crate::model::ExportedPage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct FileSinkOptions {
    pub include_front_matter: bool,
    pub include_attachments: bool,
}

pub struct FileSink {
    output_dir: PathBuf,
    options: FileSinkOptions,
    repository: Option<Arc<dyn ConfluenceRepository>>,
    files_written: usize,
}

impl FileSink {
    pub fn new(
        output_dir: PathBuf,
        options: FileSinkOptions,
        repository: Option<Arc<dyn ConfluenceRepository>>,
    ) -> Self {
        Self {
            output_dir,
            options,
            repository,
            files_written: 0,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where `page` is written for `scope_key`.
    pub fn document_path(&self, page: &ExportedPage, scope_key: &str) -> PathBuf {
        scope_dir(&self.output_dir, scope_key).join(page_file_name(&page.page.title))
    }

    fn render_document(&self, page: &ExportedPage) -> String {
        if !self.options.include_front_matter {
            return page.converted.body.clone();
        }
        let mut document = front_matter(page);
        document.push_str(&page.converted.body);
        document
    }

    async fn download_attachments(
        &self,
        page: &ExportedPage,
        scope_key: &str,
    ) -> Result<(), AppError> {
        let Some(repository) = &self.repository else {
            log::warn!(
                "Skipping {} attachment(s) of '{}': no repository to fetch from",
                page.attachments.len(),
                page.page.title
            );
            return Ok(());
        };

        let dir = scope_dir(&self.output_dir, scope_key);
        let mut details = Vec::new();
        for attachment in &page.attachments {
            let destination = attachment_path(&dir, &page.page.title, &attachment.file_name);
            match repository.download_attachment(attachment, &destination).await {
                Ok(bytes) => log::debug!(
                    "Saved attachment {} ({} bytes)",
                    destination.display(),
                    bytes
                ),
                Err(e) => {
                    log::warn!(
                        "Attachment '{}' of '{}' failed: {}",
                        attachment.file_name,
                        page.page.title,
                        e
                    );
                    details.push(format!("{}: {}", attachment.file_name, e));
                }
            }
        }

        if details.is_empty() {
            Ok(())
        } else {
            Err(AppError::AttachmentDownload {
                failed: details.len(),
                total: page.attachments.len(),
                details,
            })
        }
    }
}

/// YAML front matter; string values are JSON-quoted, which YAML accepts.
fn front_matter(page: &ExportedPage) -> String {
    let quote = |value: &str| serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "---\ntitle: {}\nid: {}\nspace: {}\nversion: {}\nuid: {}\nlink: {}\n---\n\n",
        quote(&page.page.title),
        quote(page.page.id.as_str()),
        quote(page.page.space_key.as_str()),
        page.page.version,
        quote(&page.converted.uid),
        quote(&page.converted.link),
    )
}

#[async_trait::async_trait]
impl PageSink for FileSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Files
    }

    async fn initialize(&mut self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        log::info!("Writing Markdown files to {}", self.output_dir.display());
        Ok(())
    }

    async fn save_page(&mut self, page: &ExportedPage, scope_key: &str) -> Result<(), AppError> {
        let path = self.document_path(page, scope_key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let document = self.render_document(page);
        log::debug!("Writing {} bytes to {}", document.len(), path.display());
        tokio::fs::write(&path, document).await?;
        self.files_written += 1;

        if self.options.include_attachments && !page.attachments.is_empty() {
            self.download_attachments(page, scope_key).await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), AppError> {
        log::info!(
            "Wrote {} page file(s) under {}",
            self.files_written,
            self.output_dir.display()
        );
        Ok(())
    }
}
