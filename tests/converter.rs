use confluence_export::{convert, convert_with, ConvertOptions, ErrorKind};
use pretty_assertions::assert_eq;
use pulldown_cmark::{Event, Options, Parser, Tag};

const TEAM_TABLE: &str = "<table><tbody>\
    <tr><th>Name</th><th>Role</th><th>Since</th></tr>\
    <tr><td>Ada</td><td>Engineering</td><td>2019</td></tr>\
    <tr><td>Grace | Hopper</td><td><strong>Ops</strong></td><td></td></tr>\
    <tr><td>Linus</td><td>Kernel</td><td>1991</td></tr>\
    </tbody></table>";

fn markdown_events(markdown: &str) -> Vec<Event<'_>> {
    Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS).collect()
}

fn plain_text(markdown: &str) -> String {
    markdown_events(markdown)
        .into_iter()
        .filter_map(|event| match event {
            Event::Text(text) | Event::Code(text) => Some(text.to_string()),
            _ => None,
        })
        .collect()
}

#[test]
fn table_with_n_rows_has_n_plus_one_lines_and_m_columns() {
    let markdown = convert(TEAM_TABLE).unwrap();
    let lines: Vec<&str> = markdown.lines().collect();

    assert_eq!(lines.len(), 4 + 1);
    assert_eq!(lines[1], "| --- | --- | --- |");
    for line in &lines {
        let unescaped_pipes = line.replace("\\|", "").matches('|').count();
        assert_eq!(unescaped_pipes, 3 + 1, "line {:?}", line);
    }
}

#[test]
fn table_survives_a_markdown_parser() {
    let markdown = convert(TEAM_TABLE).unwrap();
    let events = markdown_events(&markdown);

    let heads = events
        .iter()
        .filter(|e| matches!(e, Event::Start(Tag::TableHead)))
        .count();
    let rows = events
        .iter()
        .filter(|e| matches!(e, Event::Start(Tag::TableRow)))
        .count();
    let cells = events
        .iter()
        .filter(|e| matches!(e, Event::Start(Tag::TableCell)))
        .count();

    assert_eq!(heads, 1);
    assert_eq!(rows, 3);
    assert_eq!(cells, 4 * 3);
    assert!(plain_text(&markdown).contains("Grace | Hopper"));
}

#[test]
fn unknown_macros_degrade_without_error() {
    let markup = r#"<p>Before</p>
<ac:structured-macro ac:name="roadmap-planner" ac:schema-version="1">
  <ac:parameter ac:name="source">%7B%22lanes%22%3A%5B%5D%7D</ac:parameter>
  <ac:plain-text-body><![CDATA[lane one]]></ac:plain-text-body>
</ac:structured-macro>
<p>After</p>"#;

    let markdown = convert(markup).unwrap();
    assert_eq!(markdown, "Before\n\nlane one\n\nAfter\n");
}

#[test]
fn literal_text_stays_literal() {
    let markup = "<p>a &lt;b&gt; tag &amp; 5 &lt; 6, snake_case *stars* [x] &amp;amp; ~tilde~</p>\
                  <p>1. not a list</p><p># not a heading</p>";
    let markdown = convert(markup).unwrap();

    assert_eq!(
        plain_text(&markdown),
        "a <b> tag & 5 < 6, snake_case *stars* [x] &amp; ~tilde~1. not a list# not a heading"
    );
    let events = markdown_events(&markdown);
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::Html(_) | Event::InlineHtml(_))));
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::Start(Tag::List(_)) | Event::Start(Tag::Heading { .. }))));
}

#[test]
fn conversion_is_idempotent() {
    let documents = [
        "<h1>Title</h1><p>Some <strong>bold</strong> and <em>italic</em> text.</p>",
        "<ul><li>One<ul><li>Inner</li></ul></li><li>Two</li></ul><ol><li>A</li></ol>",
        TEAM_TABLE,
        r#"<ac:structured-macro ac:name="code"><ac:parameter ac:name="language">html</ac:parameter><ac:plain-text-body><![CDATA[<div class="x">&amp;</div>]]></ac:plain-text-body></ac:structured-macro>"#,
        r#"<ac:structured-macro ac:name="note"><ac:rich-text-body><p>Careful with <code>&lt;br&gt;</code></p></ac:rich-text-body></ac:structured-macro>"#,
        "<p>&lt;script&gt;alert(1)&lt;/script&gt; and &amp;nbsp; stay text</p>",
        r#"<p><a href="https://example.com/a?b=1&amp;c=2">query</a> <ac:link><ri:page ri:content-title="Team Home" /></ac:link></p>"#,
        "<ac:task-list><ac:task><ac:task-status>complete</ac:task-status><ac:task-body>Ship</ac:task-body></ac:task></ac:task-list>",
        "already *markdown* with `<tags>` in code",
        "",
        r#"<ac:structured-macro ac:name="info"><ac:rich-text-body><ac:structured-macro ac:name="code"><ac:plain-text-body><![CDATA[<b>x</b>]]></ac:plain-text-body></ac:structured-macro></ac:rich-text-body></ac:structured-macro>"#,
        "<blockquote><pre>&lt;div class=\"x\"&gt;&lt;/div&gt;</pre></blockquote>",
    ];

    for document in documents {
        let once = convert(document).unwrap();
        let twice = convert(&once).unwrap();
        assert_eq!(twice, once, "not idempotent for {:?}", document);
    }
}

#[test]
fn commonmark_html_converts_back_to_the_same_markdown() {
    let documents = [
        "<h1>Title</h1><p>Some <strong>bold</strong> and <em>italic</em> text.</p><hr /><p>After</p>",
        "<ul><li>One<ul><li>Inner</li></ul></li><li>Two</li></ul><ol><li>A</li></ol>",
        TEAM_TABLE,
        r#"<ac:structured-macro ac:name="warning"><ac:parameter ac:name="title">Heads up</ac:parameter><ac:rich-text-body><p>Do <strong>not</strong> deploy on Fridays.</p><ul><li>Really</li></ul></ac:rich-text-body></ac:structured-macro>"#,
        r#"<ac:structured-macro ac:name="code"><ac:parameter ac:name="language">rust</ac:parameter><ac:plain-text-body><![CDATA[fn main() {}]]></ac:plain-text-body></ac:structured-macro>"#,
        r#"<p><a href="https://example.com/docs">docs</a> and <a href="https://example.com/a?b=1&amp;c=2">query</a></p>"#,
    ];

    for document in documents {
        let markdown = convert(document).unwrap();
        let mut html = String::new();
        let parser = Parser::new_ext(&markdown, Options::ENABLE_TABLES);
        pulldown_cmark::html::push_html(&mut html, parser);
        assert_eq!(convert(&html).unwrap(), markdown, "unstable through {:?}", html);
    }
}

#[test]
fn task_lists_parse_as_checkboxes() {
    let markup = "<ac:task-list>\
        <ac:task><ac:task-status>complete</ac:task-status><ac:task-body>Write docs</ac:task-body></ac:task>\
        <ac:task><ac:task-status>incomplete</ac:task-status><ac:task-body>Review</ac:task-body></ac:task>\
        </ac:task-list>";
    let markdown = convert(markup).unwrap();

    let markers: Vec<bool> = markdown_events(&markdown)
        .into_iter()
        .filter_map(|event| match event {
            Event::TaskListMarker(checked) => Some(checked),
            _ => None,
        })
        .collect();
    assert_eq!(markers, vec![true, false]);
}

#[test]
fn attachment_links_point_into_the_page_folder() {
    let markup = r#"<p><ac:link><ri:attachment ri:filename="run book.pdf" /><ac:plain-text-link-body><![CDATA[the runbook]]></ac:plain-text-link-body></ac:link></p>"#;
    let options = ConvertOptions::default().with_attachment_dir("attachments/Deploy_Guide");
    let markdown = convert_with(markup, &options).unwrap();

    let destinations: Vec<String> = markdown_events(&markdown)
        .into_iter()
        .filter_map(|event| match event {
            Event::Start(Tag::Link { dest_url, .. }) => Some(dest_url.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(
        destinations,
        vec!["attachments/Deploy_Guide/run_book.pdf".to_string()]
    );
}

#[test]
fn malformed_markup_is_a_conversion_error() {
    let err = convert("<p>start <![CDATA[never closed</p>").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion);
}

#[test]
fn release_notes_snapshot() {
    let markup = r#"<h2>Release notes</h2><ul><li>Fixed <code>parse()</code></li><li>Added <a href="https://example.com/docs">docs</a></li></ul><hr /><p>Line one<br />Line two</p>"#;
    let markdown = convert(markup).unwrap();
    insta::assert_snapshot!(markdown.trim_end(), @r#"
    ## Release notes

    - Fixed `parse()`
    - Added [docs](https://example.com/docs)

    ---

    Line one\
    Line two
    "#);
}

#[test]
fn titled_warning_snapshot() {
    let markup = r#"<ac:structured-macro ac:name="warning"><ac:parameter ac:name="title">Heads up</ac:parameter><ac:rich-text-body><p>Do <strong>not</strong> deploy on Fridays.</p><ul><li>Really</li></ul></ac:rich-text-body></ac:structured-macro>"#;
    let markdown = convert(markup).unwrap();
    insta::assert_snapshot!(markdown.trim_end(), @r#"
    > **Heads up**
    >
    > Do **not** deploy on Fridays.
    >
    > - Really
    "#);
}

#[test]
fn inline_status_snapshot() {
    let markup = r#"<p>State: <ac:structured-macro ac:name="status"><ac:parameter ac:name="title">Done</ac:parameter></ac:structured-macro> :)</p>"#;
    let markdown = convert(markup).unwrap();
    insta::assert_snapshot!(markdown.trim_end(), @r"State: \[DONE\] :)");
}
