// src/formatting/mod.rs
//! Converts Confluence storage format (XHTML) into portable Markdown.
//!
//! Conversion is pure and deterministic. Input that carries no markup
//! outside of Markdown code is taken to be Markdown already and passes
//! through with only its surrounding blank space normalized, which makes
//! `convert(convert(x)) == convert(x)`.

pub mod block_renderer;
mod inline;
mod macros;
mod storage;
mod tables;

pub use self::block_renderer::MarkdownRenderer;
#[cfg(feature = "bench")]
pub use self::inline::escape_inline;

use crate::error::AppError;
use scraper::Html;

/// Options that change how links and images are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Emit hyperlinks; when off only the link text is kept
    pub preserve_links: bool,
    /// Directory attachment links point into, relative to the document
    pub attachment_dir: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            preserve_links: true,
            attachment_dir: None,
        }
    }
}

impl ConvertOptions {
    pub fn with_attachment_dir(mut self, dir: impl Into<String>) -> Self {
        self.attachment_dir = Some(dir.into());
        self
    }
}

/// Converts storage markup to Markdown with default options.
pub fn convert(markup: &str) -> Result<String, AppError> {
    convert_with(markup, &ConvertOptions::default())
}

/// Converts storage markup to Markdown.
///
/// Unknown macros and elements degrade to their text. Only structurally
/// broken input, such as an unterminated CDATA section or nesting beyond
/// the supported depth, is an [`AppError::Conversion`].
pub fn convert_with(markup: &str, options: &ConvertOptions) -> Result<String, AppError> {
    if !storage::looks_like_markup(markup) {
        return Ok(storage::passthrough(markup));
    }

    let prepared = storage::prepare(markup)?;
    let fragment = Html::parse_fragment(&prepared);
    let renderer = MarkdownRenderer::new(options);
    let markdown = renderer.render_document(fragment.root_element())?;

    log::trace!(
        "Converted {} bytes of markup into {} bytes of Markdown",
        markup.len(),
        markdown.len()
    );
    Ok(markdown)
}
