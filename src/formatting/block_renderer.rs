// src/formatting/block_renderer.rs
//! Block rendering engine: walks parsed storage markup and emits Markdown.
//!
//! Content is rendered as a flow: runs of inline nodes collect into an
//! [`InlineBuffer`] and become a paragraph, block elements produce their
//! own blocks. The document is the blocks joined by blank lines.

use super::inline::{longest_backtick_run, InlineBuffer};
use super::ConvertOptions;
use crate::constants::MARKUP_MAX_DEPTH;
use crate::error::AppError;
use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::ElementRef;

/// Elements rendered within a line of text.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "b", "bdi", "bdo", "big", "br", "cite", "code", "del", "dfn", "em",
    "font", "i", "img", "ins", "kbd", "mark", "q", "s", "samp", "small", "span", "strike",
    "strong", "sub", "sup", "time", "tt", "u", "var", "wbr", "ac:link", "ac:image",
    "ac:emoticon", "ac:placeholder", "ac:inline-comment-marker", "ac:parameter",
];

/// Converts parsed storage markup into Markdown blocks.
pub struct MarkdownRenderer<'o> {
    pub(super) options: &'o ConvertOptions,
}

impl<'o> MarkdownRenderer<'o> {
    pub fn new(options: &'o ConvertOptions) -> Self {
        Self { options }
    }

    /// Renders the children of `root` as a complete document.
    pub fn render_document(&self, root: ElementRef<'_>) -> Result<String, AppError> {
        let blocks = self.render_flow(*root, 0)?;
        Ok(join_document(blocks))
    }

    /// Renders mixed inline and block children into a list of blocks.
    pub(super) fn render_flow(
        &self,
        parent: NodeRef<'_, Node>,
        depth: usize,
    ) -> Result<Vec<String>, AppError> {
        check_depth(depth)?;
        let mut blocks = Vec::new();
        let mut paragraph = InlineBuffer::new();

        for child in parent.children() {
            match child.value() {
                Node::Text(text) => paragraph.push_text(text),
                Node::Element(_) => {
                    let Some(element) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if self.is_inline(element) {
                        self.render_inline(child, &mut paragraph, depth + 1)?;
                    } else {
                        flush_paragraph(&mut paragraph, &mut blocks);
                        self.render_block(element, &mut blocks, depth + 1)?;
                    }
                }
                _ => {}
            }
        }

        flush_paragraph(&mut paragraph, &mut blocks);
        Ok(blocks)
    }

    fn is_inline(&self, element: ElementRef<'_>) -> bool {
        let name = element.value().name();
        if INLINE_TAGS.contains(&name) || name.starts_with("ri:") {
            return true;
        }
        if name == "ac:structured-macro" || name == "ac:macro" {
            return super::macros::is_inline_macro(element);
        }
        false
    }

    fn render_block(
        &self,
        element: ElementRef<'_>,
        blocks: &mut Vec<String>,
        depth: usize,
    ) -> Result<(), AppError> {
        check_depth(depth)?;
        let name = element.value().name();
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                let mut text = InlineBuffer::single_line();
                self.render_inline_children(*element, &mut text, depth)?;
                let text = text.finish();
                if !text.is_empty() {
                    blocks.push(format!("{} {}", "#".repeat(level), text));
                }
            }
            "ul" | "ol" => {
                if let Some(list) = self.render_list(element, name == "ol", depth)? {
                    blocks.push(list);
                }
            }
            "ac:task-list" => {
                if let Some(list) = self.render_task_list(element, depth)? {
                    blocks.push(list);
                }
            }
            "table" => {
                if let Some(table) = self.render_table(element, depth)? {
                    blocks.push(table);
                }
            }
            "blockquote" => {
                let inner = self.render_flow(*element, depth)?;
                if !inner.is_empty() {
                    blocks.push(quote(&inner.join("\n\n")));
                }
            }
            "pre" => {
                let language = code_language(element);
                let code: String = element.text().collect();
                blocks.push(fenced_code(&code, language.as_deref()));
            }
            "hr" => blocks.push("---".to_string()),
            "ac:structured-macro" | "ac:macro" => {
                self.render_block_macro(element, blocks, depth)?;
            }
            "script" | "style" | "head" | "title" | "template" => {}
            _ => blocks.extend(self.render_flow(*element, depth)?),
        }
        Ok(())
    }

    fn render_list(
        &self,
        list: ElementRef<'_>,
        ordered: bool,
        depth: usize,
    ) -> Result<Option<String>, AppError> {
        let mut number = list
            .value()
            .attr("start")
            .and_then(|start| start.trim().parse::<u64>().ok())
            .unwrap_or(1);
        let mut items: Vec<(String, Vec<String>)> = Vec::new();

        for child in list.children() {
            let Some(element) = ElementRef::wrap(child) else {
                continue;
            };
            match element.value().name() {
                "li" => {
                    let marker = if ordered {
                        let marker = format!("{}. ", number);
                        number += 1;
                        marker
                    } else {
                        "- ".to_string()
                    };
                    items.push((marker, self.render_flow(child, depth + 1)?));
                }
                // Lists nested directly in a list belong to the previous item.
                nested @ ("ul" | "ol") => {
                    let Some(block) = self.render_list(element, nested == "ol", depth + 1)? else {
                        continue;
                    };
                    match items.last_mut() {
                        Some((_, blocks)) => blocks.push(block),
                        None => items.push(("- ".to_string(), vec![block])),
                    }
                }
                _ => {
                    let blocks = self.render_flow(child, depth + 1)?;
                    if let Some((_, item)) = items.last_mut() {
                        item.extend(blocks);
                    }
                }
            }
        }

        if items.is_empty() {
            return Ok(None);
        }
        let rendered: Vec<String> = items
            .iter()
            .map(|(marker, blocks)| list_item(marker, blocks))
            .collect();
        Ok(Some(rendered.join("\n")))
    }

    pub(super) fn render_inline_children(
        &self,
        parent: NodeRef<'_, Node>,
        buffer: &mut InlineBuffer,
        depth: usize,
    ) -> Result<(), AppError> {
        for child in parent.children() {
            self.render_inline(child, buffer, depth + 1)?;
        }
        Ok(())
    }

    /// Renders one node as inline content; block elements flatten to text.
    pub(super) fn render_inline(
        &self,
        node: NodeRef<'_, Node>,
        buffer: &mut InlineBuffer,
        depth: usize,
    ) -> Result<(), AppError> {
        check_depth(depth)?;
        let element = match node.value() {
            Node::Text(text) => {
                buffer.push_text(text);
                return Ok(());
            }
            Node::Element(_) => match ElementRef::wrap(node) {
                Some(element) => element,
                None => return Ok(()),
            },
            _ => return Ok(()),
        };

        match element.value().name() {
            "br" => buffer.hard_break(),
            "strong" | "b" => self.render_wrapped("**", node, buffer, depth)?,
            "em" | "i" | "cite" | "dfn" | "var" => self.render_wrapped("*", node, buffer, depth)?,
            "del" | "s" | "strike" => self.render_wrapped("~~", node, buffer, depth)?,
            "code" | "tt" | "kbd" | "samp" | "pre" => {
                let code: String = element.text().collect();
                buffer.push_code(&code);
            }
            "a" => {
                let mut text = buffer.child();
                self.render_inline_children(node, &mut text, depth)?;
                match element.value().attr("href").map(str::trim) {
                    Some(href) if self.options.preserve_links && !href.is_empty() => {
                        buffer.push_link(text, href);
                    }
                    _ => buffer.push_buffer(text),
                }
            }
            "img" => {
                let src = element.value().attr("src").unwrap_or_default().trim();
                let alt = element.value().attr("alt").unwrap_or_default();
                buffer.push_image(alt, src);
            }
            "time" => match element.value().attr("datetime") {
                Some(datetime) => buffer.push_text(datetime),
                None => self.render_inline_children(node, buffer, depth)?,
            },
            "ac:link" => self.render_confluence_link(element, buffer, depth)?,
            "ac:image" => self.render_confluence_image(element, buffer),
            "ac:emoticon" => {
                if let Some(name) = element.value().attr("ac:name") {
                    buffer.push_text(&format!(":{}:", name));
                }
            }
            "ri:user" => self.render_user(element, buffer),
            "ac:structured-macro" | "ac:macro" => {
                self.render_inline_macro(element, buffer, depth)?;
            }
            "ac:parameter" | "ac:placeholder" | "script" | "style" => {}
            name if name.starts_with("ri:") => {}
            name if self.is_inline(element) || name.starts_with("ac:") => {
                self.render_inline_children(node, buffer, depth)?;
            }
            _ => {
                // A block element inside a line keeps its words apart.
                buffer.push_space();
                self.render_inline_children(node, buffer, depth)?;
                buffer.push_space();
            }
        }
        Ok(())
    }

    fn render_wrapped(
        &self,
        marker: &str,
        node: NodeRef<'_, Node>,
        buffer: &mut InlineBuffer,
        depth: usize,
    ) -> Result<(), AppError> {
        let mut inner = buffer.child();
        self.render_inline_children(node, &mut inner, depth)?;
        buffer.push_wrapped(marker, inner);
        Ok(())
    }
}

fn check_depth(depth: usize) -> Result<(), AppError> {
    if depth > MARKUP_MAX_DEPTH {
        return Err(AppError::Conversion(format!(
            "markup is nested more than {} levels deep",
            MARKUP_MAX_DEPTH
        )));
    }
    Ok(())
}

fn flush_paragraph(paragraph: &mut InlineBuffer, blocks: &mut Vec<String>) {
    let text = std::mem::take(paragraph).finish();
    if !text.is_empty() {
        blocks.push(text);
    }
}

/// Joins blocks with blank lines and ends the document with one newline.
pub(super) fn join_document(blocks: Vec<String>) -> String {
    let blocks: Vec<&str> = blocks
        .iter()
        .map(|block| block.trim_start_matches('\n').trim_end())
        .filter(|block| !block.is_empty())
        .collect();
    if blocks.is_empty() {
        return String::new();
    }
    let mut document = blocks.join("\n\n");
    document.push('\n');
    document
}

/// A list block starts with a bullet, task or number marker.
fn is_list_block(block: &str) -> bool {
    if block.starts_with("- ") {
        return true;
    }
    let digits = block.chars().take_while(char::is_ascii_digit).count();
    digits > 0 && block[digits..].starts_with(". ")
}

/// Formats one list item, indenting continuation lines under the marker.
pub(super) fn list_item(marker: &str, blocks: &[String]) -> String {
    let mut body = String::new();
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            body.push_str(if is_list_block(block) { "\n" } else { "\n\n" });
        }
        body.push_str(block);
    }

    if body.is_empty() {
        return marker.trim_end().to_string();
    }

    let indent = " ".repeat(marker.chars().count());
    let mut item = String::with_capacity(body.len() + marker.len());
    for (i, line) in body.lines().enumerate() {
        if i == 0 {
            item.push_str(marker);
        } else {
            item.push('\n');
            if !line.is_empty() {
                item.push_str(&indent);
            }
        }
        item.push_str(line);
    }
    item
}

/// Prefixes every line with a block quote marker.
pub(super) fn quote(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A fenced code block whose fence outgrows any backtick run inside.
pub(super) fn fenced_code(code: &str, language: Option<&str>) -> String {
    let code = code
        .strip_suffix("\r\n")
        .or_else(|| code.strip_suffix('\n'))
        .unwrap_or(code);
    let fence = "`".repeat(longest_backtick_run(code).max(2) + 1);
    let language = language.map(str::trim).unwrap_or_default();
    if code.is_empty() {
        format!("{fence}{language}\n{fence}")
    } else {
        format!("{fence}{language}\n{code}\n{fence}")
    }
}

/// Language from a `language-x` or `lang-x` class on `pre` or its `code` child.
fn code_language(pre: ElementRef<'_>) -> Option<String> {
    let from_classes = |element: ElementRef<'_>| {
        element.value().classes().find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .map(str::to_string)
        })
    };
    from_classes(pre).or_else(|| {
        pre.children()
            .filter_map(ElementRef::wrap)
            .find(|child| child.value().name() == "code")
            .and_then(from_classes)
    })
}
