mod common;

use common::{attachment, CaptureLog, FakeRepository};
use confluence_export::{
    AppError, ConvertOptions, ErrorKind, ExportPipeline, ExportScope, ExportSettings,
    ExportedPage, PageId, PageSink, RunLogger, SearchIndexSink, SinkKind, SpaceKey, ValidatedUrl,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const BROKEN: &str = "<p>start <![CDATA[never closed</p>";

/// Keeps what it is given so tests can look at it.
#[derive(Default)]
struct RecordingSink {
    initialized: bool,
    closed: bool,
    saved: Vec<(String, ExportedPage)>,
}

impl RecordingSink {
    fn titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self
            .saved
            .iter()
            .map(|(_, page)| page.page.title.clone())
            .collect();
        titles.sort();
        titles
    }
}

#[async_trait::async_trait]
impl PageSink for RecordingSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Files
    }

    async fn initialize(&mut self) -> Result<(), AppError> {
        self.initialized = true;
        Ok(())
    }

    async fn save_page(&mut self, page: &ExportedPage, scope_key: &str) -> Result<(), AppError> {
        self.saved.push((scope_key.to_string(), page.clone()));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), AppError> {
        self.closed = true;
        Ok(())
    }
}

fn settings(include_attachments: bool) -> ExportSettings {
    ExportSettings {
        base_url: ValidatedUrl::parse("https://wiki.example.com").unwrap(),
        concurrency: 4,
        include_attachments,
        convert: ConvertOptions::default(),
    }
}

fn pipeline(repo: FakeRepository, include_attachments: bool) -> ExportPipeline {
    ExportPipeline::new(Arc::new(repo), settings(include_attachments))
}

fn space(key: &str) -> ExportScope {
    ExportScope::Space(SpaceKey::new(key).unwrap())
}

#[tokio::test]
async fn one_bad_page_does_not_stop_the_others() {
    let repo = FakeRepository::new()
        .with_page("1", "Home", "TEAM", "<p>Welcome</p>")
        .with_page("2", "Broken", "TEAM", BROKEN)
        .with_page("3", "Guide", "TEAM", "<h1>Guide</h1>");
    let mut sink = RecordingSink::default();

    let report = pipeline(repo, false)
        .run(&[space("TEAM")], &mut sink)
        .await
        .unwrap();

    assert_eq!(report.pages_discovered, 3);
    assert_eq!(report.pages_processed, 2);
    assert_eq!(report.pages_failed(), 1);
    assert_eq!(report.page_failures[0].title, "Broken");
    assert_eq!(report.page_failures[0].page_id, "2");
    assert_eq!(report.page_failures[0].kind, ErrorKind::Conversion);
    assert!(report.is_success());
    assert_eq!(sink.titles(), vec!["Guide", "Home"]);
    assert!(sink.initialized && sink.closed);
}

#[tokio::test]
async fn page_failures_are_logged_with_the_title() {
    let capture = Arc::new(CaptureLog::default());
    let repo = FakeRepository::new()
        .with_page("1", "Home", "TEAM", "<p>Welcome</p>")
        .with_page("2", "Broken", "TEAM", BROKEN);
    let mut sink = RecordingSink::default();

    pipeline(repo, false)
        .with_logger(RunLogger::with_sink(capture.clone()))
        .run(&[space("TEAM")], &mut sink)
        .await
        .unwrap();

    let warnings = capture.at(log::Level::Warn);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("Failed to export page 'Broken':"));
}

#[tokio::test]
async fn failed_scope_is_reported_and_the_next_one_runs() {
    let repo = FakeRepository::new()
        .with_space("GONE")
        .failing_listing("GONE")
        .with_page("1", "Home", "TEAM", "<p>Welcome</p>");
    let mut sink = RecordingSink::default();

    let report = pipeline(repo, false)
        .run(&[space("GONE"), space("TEAM")], &mut sink)
        .await
        .unwrap();

    assert_eq!(report.scope_failures.len(), 1);
    assert_eq!(report.scope_failures[0].scope, "space GONE");
    assert_eq!(report.scope_failures[0].kind, ErrorKind::Http);
    assert_eq!(report.scopes, vec!["TEAM".to_string()]);
    assert_eq!(report.pages_processed, 1);
    assert!(!report.is_success());
    assert!(sink.closed);
}

#[tokio::test]
async fn tree_scopes_are_keyed_by_the_root_title() {
    let repo = FakeRepository::new()
        .with_page("10", "Handbook", "TEAM", "<p>Root</p>")
        .with_page("11", "Onboarding", "TEAM", "<p>Child</p>")
        .with_child("10", "11");
    let mut sink = RecordingSink::default();
    let scope = ExportScope::Tree {
        root: PageId::parse("10").unwrap(),
        recursive: true,
    };

    let report = pipeline(repo, false).run(&[scope], &mut sink).await.unwrap();

    assert_eq!(report.scopes, vec!["Handbook".to_string()]);
    assert_eq!(sink.saved.len(), 2);
    assert!(sink.saved.iter().all(|(key, _)| key == "Handbook"));
}

#[tokio::test]
async fn search_index_receives_every_page() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FakeRepository::new()
        .with_page("1", "Home", "TEAM", "<p>Welcome</p>")
        .with_page("2", "Runbook", "TEAM", "<ol><li>Restart</li></ol>")
        .with_page("3", "Guide", "TEAM", "<h1>Guide</h1>");
    let mut sink = SearchIndexSink::in_dir(dir.path());

    let report = pipeline(repo, false)
        .run(&[space("TEAM")], &mut sink)
        .await
        .unwrap();
    assert_eq!(report.pages_processed, 3);

    let json = std::fs::read_to_string(dir.path().join("meilisearch.json")).unwrap();
    let documents: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(documents.len(), 3);
    let mut bodies: Vec<&str> = documents
        .iter()
        .map(|d| d["body"].as_str().unwrap())
        .collect();
    bodies.sort();
    assert_eq!(bodies, vec!["# Guide\n", "1. Restart\n", "Welcome\n"]);
}

#[tokio::test]
async fn attachment_links_and_listings_follow_the_setting() {
    let body = r#"<p><ac:link><ri:attachment ri:filename="diagram.png" /></ac:link></p>"#;
    let repo = FakeRepository::new()
        .with_page("9", "Deploy Guide", "TEAM", body)
        .with_attachment("9", attachment("att1", "diagram.png", "9"));
    let mut sink = RecordingSink::default();

    pipeline(repo, true)
        .run(&[space("TEAM")], &mut sink)
        .await
        .unwrap();

    let (_, page) = &sink.saved[0];
    assert_eq!(page.attachments.len(), 1);
    assert!(page
        .converted
        .body
        .contains("(attachments/Deploy_Guide/diagram.png)"));
}

#[tokio::test]
async fn attachment_listing_failure_fails_only_that_page() {
    let repo = FakeRepository::new()
        .with_page("1", "Home", "TEAM", "<p>Welcome</p>")
        .with_page("2", "Gallery", "TEAM", "<p>Pictures</p>")
        .failing_listing("attachments:2");
    let mut sink = RecordingSink::default();

    let report = pipeline(repo, true)
        .run(&[space("TEAM")], &mut sink)
        .await
        .unwrap();

    assert_eq!(report.pages_processed, 1);
    assert_eq!(report.page_failures[0].title, "Gallery");
    assert_eq!(sink.titles(), vec!["Home"]);
}

#[tokio::test]
async fn planning_prefers_page_id_then_space_key() {
    let repo = FakeRepository::new().with_space("TEAM").with_space("OPS");
    let pipeline = pipeline(repo, false);
    let key = SpaceKey::new("TEAM").unwrap();
    let root = PageId::parse("42").unwrap();

    let scopes = pipeline
        .plan_scopes(Some(&key), Some(&root), false)
        .await
        .unwrap();
    assert_eq!(
        scopes,
        vec![ExportScope::Tree {
            root: root.clone(),
            recursive: false
        }]
    );

    let scopes = pipeline.plan_scopes(Some(&key), None, true).await.unwrap();
    assert_eq!(scopes, vec![space("TEAM")]);

    let scopes = pipeline.plan_scopes(None, None, true).await.unwrap();
    assert_eq!(scopes, vec![space("TEAM"), space("OPS")]);
}

#[tokio::test]
async fn planning_fails_when_spaces_cannot_be_listed() {
    let repo = FakeRepository::new().failing_listing("*");
    let err = pipeline(repo, false)
        .plan_scopes(None, None, true)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Http);
}
