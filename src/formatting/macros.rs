// src/formatting/macros.rs
//! Confluence-specific elements: structured macros, links, images, tasks.
//!
//! Unknown macros never fail a conversion. They degrade to their rich-text
//! body when they have one, otherwise to their visible text.

use super::block_renderer::{fenced_code, list_item, quote, MarkdownRenderer};
use super::inline::InlineBuffer;
use crate::error::AppError;
use crate::output::paths::{page_file_name, safe_file_name};
use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::ElementRef;

/// Macros that live inside a line of text.
const INLINE_MACROS: &[&str] = &["status", "anchor", "jira", "mention", "emoticon"];

/// Macros that render nothing.
const SILENT_MACROS: &[&str] = &[
    "toc",
    "toc-zone",
    "anchor",
    "children",
    "pagetree",
    "pagetreesearch",
    "recently-updated",
    "livesearch",
    "contributors",
];

/// Callout macros rendered as a titled block quote.
const CALLOUT_MACROS: &[(&str, Option<&str>)] = &[
    ("info", Some("Info")),
    ("note", Some("Note")),
    ("warning", Some("Warning")),
    ("tip", Some("Tip")),
    ("panel", None),
];

pub(super) fn is_inline_macro(element: ElementRef<'_>) -> bool {
    INLINE_MACROS.contains(&macro_name(element).as_str())
}

fn macro_name(element: ElementRef<'_>) -> String {
    element
        .value()
        .attr("ac:name")
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Direct child element named `name`.
fn child_element<'a>(element: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == name)
}

/// Value of the macro parameter `name`, trimmed; `None` when absent or blank.
fn parameter(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "ac:parameter")
        .find(|child| {
            child
                .value()
                .attr("ac:name")
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
        .map(|child| child.text().collect::<String>().trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Text of `node` and its descendants, leaving out macro parameters.
fn visible_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) if element.name() == "ac:parameter" => {}
            Node::Element(_) => {
                out.push(' ');
                visible_text(child, out);
                out.push(' ');
            }
            _ => {}
        }
    }
}

fn bold_line(text: &str) -> String {
    let mut line = InlineBuffer::single_line();
    let mut inner = line.child();
    inner.push_text(text);
    line.push_wrapped("**", inner);
    line.finish()
}

impl MarkdownRenderer<'_> {
    pub(super) fn render_block_macro(
        &self,
        element: ElementRef<'_>,
        blocks: &mut Vec<String>,
        depth: usize,
    ) -> Result<(), AppError> {
        let name = macro_name(element);

        if SILENT_MACROS.contains(&name.as_str()) {
            return Ok(());
        }

        match name.as_str() {
            "code" | "noformat" => {
                if let Some(title) = parameter(element, "title") {
                    blocks.push(bold_line(&title));
                }
                let language = if name == "code" {
                    parameter(element, "language")
                } else {
                    None
                };
                let code = child_element(element, "ac:plain-text-body")
                    .map(|body| body.text().collect::<String>())
                    .unwrap_or_default();
                blocks.push(fenced_code(&code, language.as_deref()));
            }
            "expand" => {
                let title = parameter(element, "title").unwrap_or_else(|| "Details".to_string());
                blocks.push(bold_line(&title));
                blocks.extend(self.macro_body(element, depth)?);
            }
            _ => {
                if let Some((_, default_title)) =
                    CALLOUT_MACROS.iter().find(|(callout, _)| *callout == name)
                {
                    let title = parameter(element, "title")
                        .or_else(|| default_title.map(str::to_string));
                    let mut inner: Vec<String> = title.iter().map(|t| bold_line(t)).collect();
                    inner.extend(self.macro_body(element, depth)?);
                    if !inner.is_empty() {
                        blocks.push(quote(&inner.join("\n\n")));
                    }
                } else {
                    log::debug!("Rendering unknown macro '{}' as its content", name);
                    blocks.extend(self.macro_body(element, depth)?);
                }
            }
        }
        Ok(())
    }

    /// Body blocks of a macro: rich text, plain text, or visible text.
    fn macro_body(&self, element: ElementRef<'_>, depth: usize) -> Result<Vec<String>, AppError> {
        if let Some(body) = child_element(element, "ac:rich-text-body") {
            return self.render_flow(*body, depth + 1);
        }

        let mut text = String::new();
        match child_element(element, "ac:plain-text-body") {
            Some(body) => text.extend(body.text()),
            None => visible_text(*element, &mut text),
        }
        let mut paragraph = InlineBuffer::new();
        paragraph.push_text(&text);
        let paragraph = paragraph.finish();
        Ok(if paragraph.is_empty() {
            Vec::new()
        } else {
            vec![paragraph]
        })
    }

    pub(super) fn render_inline_macro(
        &self,
        element: ElementRef<'_>,
        buffer: &mut InlineBuffer,
        depth: usize,
    ) -> Result<(), AppError> {
        let name = macro_name(element);
        match name.as_str() {
            "status" => {
                if let Some(title) = parameter(element, "title").or_else(|| parameter(element, "colour")) {
                    buffer.push_text(&format!("[{}]", title.to_uppercase()));
                }
            }
            "jira" => {
                if let Some(key) = parameter(element, "key") {
                    buffer.push_text(&key);
                }
            }
            _ if SILENT_MACROS.contains(&name.as_str()) => {}
            "code" | "noformat" => {
                if let Some(body) = child_element(element, "ac:plain-text-body") {
                    let code: String = body.text().collect();
                    buffer.push_code(&code);
                }
            }
            _ => match child_element(element, "ac:rich-text-body") {
                Some(body) => {
                    buffer.push_space();
                    self.render_inline_children(*body, buffer, depth)?;
                    buffer.push_space();
                }
                None => {
                    let mut text = String::new();
                    visible_text(*element, &mut text);
                    buffer.push_text(&text);
                }
            },
        }
        Ok(())
    }

    /// `ac:link` pointing at a page, attachment, user, URL or anchor.
    pub(super) fn render_confluence_link(
        &self,
        element: ElementRef<'_>,
        buffer: &mut InlineBuffer,
        depth: usize,
    ) -> Result<(), AppError> {
        let anchor = element
            .value()
            .attr("ac:anchor")
            .map(str::trim)
            .filter(|a| !a.is_empty());
        let resource = element
            .children()
            .filter_map(ElementRef::wrap)
            .find(|child| child.value().name().starts_with("ri:"));

        let (destination, fallback) = match resource {
            Some(resource) => {
                let attrs = resource.value();
                match attrs.name() {
                    "ri:page" | "ri:blog-post" => {
                        let title = attrs.attr("ri:content-title").unwrap_or_default();
                        let mut destination = page_file_name(title);
                        if let Some(anchor) = anchor {
                            destination.push('#');
                            destination.push_str(anchor);
                        }
                        (Some(destination), title.to_string())
                    }
                    "ri:attachment" => {
                        let file = attrs.attr("ri:filename").unwrap_or_default();
                        (Some(self.attachment_destination(file)), file.to_string())
                    }
                    "ri:url" => {
                        let url = attrs.attr("ri:value").unwrap_or_default();
                        (Some(url.to_string()), url.to_string())
                    }
                    "ri:user" => {
                        self.render_user(resource, buffer);
                        return Ok(());
                    }
                    "ri:space" => (None, attrs.attr("ri:space-key").unwrap_or_default().to_string()),
                    _ => (None, String::new()),
                }
            }
            None => match anchor {
                Some(anchor) => (Some(format!("#{}", anchor)), anchor.to_string()),
                None => (None, String::new()),
            },
        };

        let mut label = buffer.child();
        if let Some(body) = child_element(element, "ac:plain-text-link-body") {
            label.push_text(&body.text().collect::<String>());
        } else if let Some(body) = child_element(element, "ac:link-body") {
            self.render_inline_children(*body, &mut label, depth)?;
        }
        if label.is_blank() {
            label = buffer.child();
            label.push_text(&fallback);
        }

        match destination {
            Some(destination) if self.options.preserve_links && !destination.is_empty() => {
                buffer.push_link(label, &destination);
            }
            _ => buffer.push_buffer(label),
        }
        Ok(())
    }

    /// `ac:image` backed by an attachment or an external URL.
    pub(super) fn render_confluence_image(&self, element: ElementRef<'_>, buffer: &mut InlineBuffer) {
        let Some(resource) = element
            .children()
            .filter_map(ElementRef::wrap)
            .find(|child| child.value().name().starts_with("ri:"))
        else {
            return;
        };

        let (destination, name) = match resource.value().name() {
            "ri:attachment" => {
                let file = resource.value().attr("ri:filename").unwrap_or_default();
                (self.attachment_destination(file), file)
            }
            "ri:url" => {
                let url = resource.value().attr("ri:value").unwrap_or_default();
                (url.to_string(), "")
            }
            _ => return,
        };
        let alt = element
            .value()
            .attr("ac:alt")
            .or_else(|| element.value().attr("ac:title"))
            .unwrap_or(name);
        buffer.push_image(alt, &destination);
    }

    pub(super) fn render_user(&self, user: ElementRef<'_>, buffer: &mut InlineBuffer) {
        let attrs = user.value();
        let name = attrs
            .attr("ri:username")
            .or_else(|| attrs.attr("ri:userkey"))
            .or_else(|| attrs.attr("ri:account-id"))
            .unwrap_or_default()
            .trim();
        if !name.is_empty() {
            buffer.push_text(&format!("@{}", name));
        }
    }

    /// `ac:task-list` as a GitHub-style checklist.
    pub(super) fn render_task_list(
        &self,
        list: ElementRef<'_>,
        depth: usize,
    ) -> Result<Option<String>, AppError> {
        let mut items = Vec::new();
        for task in list
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "ac:task")
        {
            let done = child_element(task, "ac:task-status")
                .map(|status| status.text().collect::<String>())
                .is_some_and(|status| status.trim().eq_ignore_ascii_case("complete"));
            let marker = if done { "- [x] " } else { "- [ ] " };
            let blocks = match child_element(task, "ac:task-body") {
                Some(body) => self.render_flow(*body, depth + 1)?,
                None => Vec::new(),
            };
            items.push(list_item(marker, &blocks));
        }

        Ok(if items.is_empty() {
            None
        } else {
            Some(items.join("\n"))
        })
    }

    /// Link target for an attached file, relative to the page document.
    fn attachment_destination(&self, file_name: &str) -> String {
        let file = safe_file_name(file_name);
        match self.options.attachment_dir.as_deref() {
            Some(dir) if !dir.is_empty() => format!("{}/{}", dir.trim_end_matches('/'), file),
            _ => file,
        }
    }
}
