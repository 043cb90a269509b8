// src/pipeline.rs
//! The export pipeline: discover → compose → deliver, once per scope.
//!
//! Discovery failures abort their scope and are recorded in the report;
//! failures while composing or saving one page are logged with the page
//! title and the run moves on. Pages are prepared with a bounded fan-out
//! but handed to the sink one at a time.

use crate::api::{ConfluenceRepository, TreeResolver};
use crate::error::AppError;
use crate::formatting::{convert_with, ConvertOptions};
use crate::logging::RunLogger;
use crate::model::{ConvertedPage, ExportedPage, Page};
use crate::output::paths::attachment_link_dir;
use crate::output::{ExportReport, PageFailure, PageSink, ScopeFailure};
use crate::types::{PageId, SpaceKey, ValidatedUrl};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;

/// One unit of export: a whole space or a page subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportScope {
    Space(SpaceKey),
    Tree { root: PageId, recursive: bool },
}

impl fmt::Display for ExportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportScope::Space(key) => write!(f, "space {}", key),
            ExportScope::Tree {
                root,
                recursive: true,
            } => write!(f, "page tree {}", root),
            ExportScope::Tree {
                root,
                recursive: false,
            } => write!(f, "page {}", root),
        }
    }
}

/// Pages found for a scope, with the key the sink files them under.
#[derive(Debug, Clone)]
pub struct DiscoveredScope {
    /// The space key, or the root page title for trees
    pub key: String,
    pub pages: Vec<Page>,
}

/// Settings that shape a run, independent of where output goes.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub base_url: ValidatedUrl,
    /// Pages prepared at once
    pub concurrency: usize,
    pub include_attachments: bool,
    pub convert: ConvertOptions,
}

/// Finds the pages belonging to a scope.
#[async_trait::async_trait]
pub trait PageDiscovery {
    async fn discover(&self, scope: &ExportScope) -> Result<DiscoveredScope, AppError>;
}

/// Turns a raw page into its portable form.
pub trait PageComposer {
    fn compose(&self, page: &Page) -> Result<ConvertedPage, AppError>;
}

/// Drives discovery, conversion and delivery for a list of scopes.
pub struct ExportPipeline {
    repository: Arc<dyn ConfluenceRepository>,
    settings: ExportSettings,
    logger: RunLogger,
}

impl ExportPipeline {
    pub fn new(repository: Arc<dyn ConfluenceRepository>, settings: ExportSettings) -> Self {
        Self {
            repository,
            settings,
            logger: RunLogger::global(),
        }
    }

    pub fn with_logger(mut self, logger: RunLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Decides which scopes to export.
    ///
    /// A page id selects one tree, otherwise a space key selects one space,
    /// otherwise every space the credentials can see is exported.
    pub async fn plan_scopes(
        &self,
        space_key: Option<&SpaceKey>,
        page_id: Option<&PageId>,
        recursive: bool,
    ) -> Result<Vec<ExportScope>, AppError> {
        if let Some(root) = page_id {
            return Ok(vec![ExportScope::Tree {
                root: root.clone(),
                recursive,
            }]);
        }
        if let Some(key) = space_key {
            return Ok(vec![ExportScope::Space(key.clone())]);
        }

        self.logger.info(format_args!(
            "No space key or page id given; listing every accessible space"
        ));
        let spaces = self.repository.list_spaces().await?;
        self.logger
            .info(format_args!("Found {} space(s) to export", spaces.len()));
        Ok(spaces
            .into_iter()
            .map(|space| ExportScope::Space(space.key))
            .collect())
    }

    /// Exports every scope into `sink`.
    ///
    /// The sink is initialized first and closed last, even when scopes or
    /// pages failed. Only sink setup and teardown errors are returned;
    /// everything else lands in the report.
    pub async fn run(
        &self,
        scopes: &[ExportScope],
        sink: &mut dyn PageSink,
    ) -> Result<ExportReport, AppError> {
        sink.initialize().await?;
        self.logger.info(format_args!(
            "Exporting {} scope(s) to the {} sink",
            scopes.len(),
            sink.kind()
        ));

        let mut report = ExportReport::new();
        for scope in scopes {
            report = self.export_scope(scope, sink, report).await;
        }

        sink.close().await?;
        Ok(report.finished())
    }

    async fn export_scope(
        &self,
        scope: &ExportScope,
        sink: &mut dyn PageSink,
        report: ExportReport,
    ) -> ExportReport {
        self.logger.info(format_args!("Discovering {}", scope));
        let discovered = match self.discover(scope).await {
            Ok(discovered) => discovered,
            Err(e) => {
                self.logger
                    .error(format_args!("Failed to discover {}: {}", scope, e));
                return report.with_scope_failure(ScopeFailure::new(&scope.to_string(), &e));
            }
        };

        let key = discovered.key;
        let total = discovered.pages.len();
        self.logger
            .info(format_args!("Found {} page(s) in {}", total, key));
        let mut report = report.with_scope(key.clone(), total);

        let mut prepared = stream::iter(discovered.pages)
            .map(|page| async move {
                let title = page.title.clone();
                let id = page.id.clone();
                (title, id, self.prepare_page(page).await)
            })
            .buffer_unordered(self.settings.concurrency.max(1));

        while let Some((title, id, prepared_page)) = prepared.next().await {
            let outcome = match prepared_page {
                Ok(page) => sink.save_page(&page, &key).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => {
                    self.logger
                        .debug(format_args!("Exported '{}' ({})", title, id));
                    report = report.with_processed();
                }
                Err(e) => {
                    self.logger
                        .warn(format_args!("Failed to export page '{}': {}", title, e));
                    report = report.with_page_failure(PageFailure::new(
                        &title,
                        id.as_str(),
                        &key,
                        &e,
                    ));
                }
            }
        }

        report
    }

    /// Converts a page and, when enabled, lists its attachments.
    async fn prepare_page(&self, page: Page) -> Result<ExportedPage, AppError> {
        let converted = self.compose(&page)?;
        let attachments = if self.settings.include_attachments {
            self.repository.list_attachments(&page.id).await?
        } else {
            Vec::new()
        };
        Ok(ExportedPage {
            page,
            converted,
            attachments,
        })
    }
}

#[async_trait::async_trait]
impl PageDiscovery for ExportPipeline {
    async fn discover(&self, scope: &ExportScope) -> Result<DiscoveredScope, AppError> {
        match scope {
            ExportScope::Space(key) => {
                let pages = self.repository.list_space_pages(key).await?;
                Ok(DiscoveredScope {
                    key: key.to_string(),
                    pages,
                })
            }
            ExportScope::Tree { root, recursive } => {
                let resolver = TreeResolver::new(self.repository.as_ref(), self.logger.clone());
                let pages = resolver.resolve(root, *recursive).await?;
                let key = pages
                    .first()
                    .map(|page| page.title.clone())
                    .unwrap_or_else(|| root.to_string());
                Ok(DiscoveredScope { key, pages })
            }
        }
    }
}

impl PageComposer for ExportPipeline {
    fn compose(&self, page: &Page) -> Result<ConvertedPage, AppError> {
        let options = if self.settings.include_attachments {
            self.settings
                .convert
                .clone()
                .with_attachment_dir(attachment_link_dir(&page.title))
        } else {
            self.settings.convert.clone()
        };
        let body = convert_with(&page.raw_body, &options)?;
        Ok(ConvertedPage::from_page(page, body, &self.settings.base_url))
    }
}
