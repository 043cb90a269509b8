// src/formatting/tables.rs
//! Table rendering as GitHub-flavored Markdown pipe tables.

use super::block_renderer::MarkdownRenderer;
use super::inline::InlineBuffer;
use crate::error::AppError;
use scraper::ElementRef;

impl MarkdownRenderer<'_> {
    /// Renders `table` with its first row as the header.
    ///
    /// N source rows produce N + 1 lines (header, separator, body rows) and
    /// every line has as many columns as the widest source row.
    pub(super) fn render_table(
        &self,
        table: ElementRef<'_>,
        depth: usize,
    ) -> Result<Option<String>, AppError> {
        let mut rows: Vec<Vec<String>> = Vec::new();
        for row in table_rows(table) {
            let mut cells = Vec::new();
            for cell in row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
            {
                cells.push(self.render_cell(cell, depth + 1)?);
            }
            rows.push(cells);
        }

        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if rows.is_empty() || columns == 0 {
            return Ok(None);
        }

        let mut lines = Vec::with_capacity(rows.len() + 1);
        for (i, mut cells) in rows.into_iter().enumerate() {
            cells.resize(columns, String::new());
            lines.push(table_line(&cells));
            if i == 0 {
                lines.push(table_line(&vec!["---".to_string(); columns]));
            }
        }
        Ok(Some(lines.join("\n")))
    }

    /// A cell's content on one line, with pipes escaped.
    fn render_cell(&self, cell: ElementRef<'_>, depth: usize) -> Result<String, AppError> {
        let mut buffer = InlineBuffer::single_line();
        self.render_inline_children(*cell, &mut buffer, depth)?;
        Ok(buffer.finish().replace('|', "\\|"))
    }
}

/// Rows of `table` itself, looking through `thead`/`tbody`/`tfoot` but not
/// into nested tables.
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|row| row.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

fn table_line(cells: &[String]) -> String {
    let mut line = String::from("|");
    for cell in cells {
        line.push(' ');
        line.push_str(cell);
        line.push_str(" |");
    }
    line
}
