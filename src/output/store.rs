// src/output/store.rs
//! Embedded relational store sink backed by SQLite.
//!
//! Rows are keyed by page uid and written with an upsert, so rerunning an
//! export replaces rows instead of adding duplicates.

use super::{PageSink, SinkKind};
use crate::constants::STORE_FILE_NAME;
use crate::error::AppError;
use crate::model::ExportedPage;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

const CREATE_PAGES_TABLE: &str = "CREATE TABLE IF NOT EXISTS pages (
    uid   TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    body  TEXT NOT NULL,
    link  TEXT NOT NULL
)";

const UPSERT_PAGE: &str = "INSERT INTO pages (uid, title, body, link)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(uid) DO UPDATE SET
    title = excluded.title,
    body  = excluded.body,
    link  = excluded.link";

pub struct StoreSink {
    path: PathBuf,
    connection: Option<Connection>,
    rows_written: usize,
}

impl StoreSink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            connection: None,
            rows_written: 0,
        }
    }

    /// A store named `confluence.db` inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STORE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connection(&self) -> Result<&Connection, AppError> {
        self.connection.as_ref().ok_or_else(|| AppError::InternalError {
            message: "store used before initialize".to_string(),
            source: None,
        })
    }
}

#[async_trait::async_trait]
impl PageSink for StoreSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Store
    }

    async fn initialize(&mut self) -> Result<(), AppError> {
        if self.connection.is_some() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // rusqlite is blocking; only the single consumer task touches it
        let connection = Connection::open(&self.path)?;
        connection.execute(CREATE_PAGES_TABLE, [])?;
        log::info!("Writing pages to SQLite store {}", self.path.display());
        self.connection = Some(connection);
        Ok(())
    }

    async fn save_page(&mut self, page: &ExportedPage, _scope_key: &str) -> Result<(), AppError> {
        let converted = &page.converted;
        self.connection()?.execute(
            UPSERT_PAGE,
            rusqlite::params![converted.uid, converted.title, converted.body, converted.link],
        )?;
        self.rows_written += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), AppError> {
        if let Some(connection) = self.connection.take() {
            connection.close().map_err(|(_, e)| AppError::Store(e))?;
            log::info!(
                "Upserted {} row(s) into {}",
                self.rows_written,
                self.path.display()
            );
        }
        Ok(())
    }
}
