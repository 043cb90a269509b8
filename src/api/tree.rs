// src/api/tree.rs
//! Page tree resolution from a root page.

use super::ConfluenceRepository;
use crate::error::AppError;
use crate::logging::RunLogger;
use crate::model::Page;
use crate::types::PageId;
use std::collections::HashSet;

/// Expands a root page into the ordered list of pages beneath it.
pub struct TreeResolver<'a> {
    repository: &'a dyn ConfluenceRepository,
    logger: RunLogger,
}

impl<'a> TreeResolver<'a> {
    pub fn new(repository: &'a dyn ConfluenceRepository, logger: RunLogger) -> Self {
        Self { repository, logger }
    }

    /// Fetches `root` and, when `recursive`, every descendant.
    ///
    /// Output is depth-first pre-order with siblings in listing order; the
    /// root always comes first. Each page id appears at most once even if
    /// the listing reports a cycle or the same child under two parents.
    /// Any lookup failure aborts the whole resolution.
    pub async fn resolve(&self, root: &PageId, recursive: bool) -> Result<Vec<Page>, AppError> {
        let root_page = self.repository.get_page(root).await?;
        if !recursive {
            return Ok(vec![root_page]);
        }

        let mut visited: HashSet<PageId> = HashSet::new();
        let mut ordered = Vec::new();
        let mut stack = vec![root_page];

        while let Some(page) = stack.pop() {
            if !visited.insert(page.id.clone()) {
                self.logger.warn(format_args!(
                    "Page {} ('{}') reached twice; skipping repeat",
                    page.id, page.title
                ));
                continue;
            }

            let children = self.repository.list_child_pages(&page.id).await?;
            self.logger.debug(format_args!(
                "Page {} has {} child page(s)",
                page.id,
                children.len()
            ));

            // Reversed so the first child is popped next.
            stack.extend(
                children
                    .into_iter()
                    .rev()
                    .filter(|child| !visited.contains(&child.id)),
            );
            ordered.push(page);
        }

        Ok(ordered)
    }
}
