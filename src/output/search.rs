// src/output/search.rs
//! Search index sink: one JSON array of documents written on close.
//!
//! Documents are keyed by uid, so a page saved twice appears once with
//! its latest content. Insertion order is kept for a stable file.

use super::{PageSink, SinkKind};
use crate::constants::SEARCH_EXPORT_FILE_NAME;
use crate::error::AppError;
use crate::model::{ConvertedPage, ExportedPage};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

pub struct SearchIndexSink {
    path: PathBuf,
    documents: IndexMap<String, ConvertedPage>,
}

impl SearchIndexSink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            documents: IndexMap::new(),
        }
    }

    /// A sink writing `meilisearch.json` inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(SEARCH_EXPORT_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait::async_trait]
impl PageSink for SearchIndexSink {
    fn kind(&self) -> SinkKind {
        SinkKind::SearchIndex
    }

    async fn initialize(&mut self) -> Result<(), AppError> {
        self.documents.clear();
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn save_page(&mut self, page: &ExportedPage, _scope_key: &str) -> Result<(), AppError> {
        let document = page.converted.clone();
        if document.uid.is_empty() {
            return Err(AppError::InternalError {
                message: format!("page '{}' has no uid", document.title),
                source: None,
            });
        }
        self.documents.insert(document.uid.clone(), document);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), AppError> {
        let documents: Vec<&ConvertedPage> = self.documents.values().collect();
        let json = serde_json::to_string_pretty(&documents).map_err(|e| {
            AppError::InternalError {
                message: "failed to serialize search documents".to_string(),
                source: Some(Box::new(e)),
            }
        })?;
        tokio::fs::write(&self.path, json).await?;
        log::info!(
            "Wrote {} search document(s) to {}",
            documents.len(),
            self.path.display()
        );
        Ok(())
    }
}
