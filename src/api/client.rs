// src/api/client.rs
//! HTTP transport for the Confluence REST API.
//!
//! Every request carries Basic credentials and a JSON content type, and
//! passes through a shared semaphore so the number of in-flight requests
//! stays bounded no matter how many pages the pipeline prepares at once.

use super::pagination::collect_all;
use super::parser;
use crate::constants::{
    CONFLUENCE_API_PAGE_SIZE, MAX_CONCURRENT_REQUESTS, PAGE_LISTING_EXPAND, PAGE_LOOKUP_EXPAND,
    REQUEST_TIMEOUT_SECS,
};
use crate::error::AppError;
use crate::model::{Attachment, Page, Space};
use crate::types::{Credentials, PageId, SpaceKey, ValidatedUrl};
use reqwest::{header, Client, Method, Response};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;

/// Knobs for the transport.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub timeout: Duration,
    /// Upper bound on concurrent requests
    pub max_in_flight: usize,
    /// Records requested per listing round trip
    pub page_size: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_in_flight: MAX_CONCURRENT_REQUESTS,
            page_size: CONFLUENCE_API_PAGE_SIZE,
        }
    }
}

/// A thin wrapper around reqwest Client for Confluence API requests.
#[derive(Clone)]
pub struct ConfluenceHttpClient {
    client: Client,
    base_url: ValidatedUrl,
    permits: Arc<Semaphore>,
    page_size: usize,
}

impl ConfluenceHttpClient {
    /// Creates a new HTTP client with Basic authentication.
    pub fn new(
        base_url: ValidatedUrl,
        credentials: &Credentials,
        settings: TransportSettings,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(credentials)?)
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            permits: Arc::new(Semaphore::new(settings.max_in_flight.max(1))),
            page_size: settings.page_size,
        })
    }

    /// Creates the default headers for Confluence API requests.
    fn create_headers(credentials: &Credentials) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let mut auth_value = header::HeaderValue::from_str(&credentials.basic_auth_header())
            .map_err(|e| {
                AppError::InvalidConfiguration(format!("Invalid credential format: {}", e))
            })?;
        auth_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_value);

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    pub fn base_url(&self) -> &ValidatedUrl {
        &self.base_url
    }

    /// Sends one request and returns the body with its status.
    ///
    /// `path` is appended to the base URL. Only transport failures are
    /// errors here; status interpretation is left to the parser.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse<String>, AppError> {
        let _permit = self.permits.acquire().await?;
        let url = self.base_url.join_path(path);
        log::debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url).query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        extract_response_text(response).await
    }

    /// Makes a GET request to the specified endpoint.
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse<String>, AppError> {
        self.send(Method::GET, path, query, None).await
    }

    /// Walks a paginated listing, handing each raw page to `parse`.
    async fn collect_listing<T, P>(
        &self,
        path: &str,
        fixed_params: &[(&str, String)],
        parse: P,
    ) -> Result<Vec<T>, AppError>
    where
        P: Fn(ApiResponse<String>) -> Result<Vec<T>, AppError>,
    {
        let parse = &parse;
        let result = collect_all(self.page_size, |start, limit| {
            let mut query = fixed_params.to_vec();
            query.push(("start", start.to_string()));
            query.push(("limit", limit.to_string()));
            async move {
                let response = self.get(path, &query).await?;
                parse(response)
            }
        })
        .await?;

        log::debug!(
            "{}: {} record(s) in {} request(s)",
            path,
            result.items.len(),
            result.requests
        );
        Ok(result.items)
    }

    /// Resolves an attachment download link against the base URL.
    fn download_url(&self, attachment: &Attachment) -> String {
        let link = attachment.download_url.as_str();
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            self.base_url.join_path(link)
        }
    }
}

#[async_trait::async_trait]
impl super::ConfluenceRepository for ConfluenceHttpClient {
    async fn list_spaces(&self) -> Result<Vec<Space>, AppError> {
        self.collect_listing("/rest/api/space", &[], parser::parse_space_listing)
            .await
    }

    async fn list_space_pages(&self, space: &SpaceKey) -> Result<Vec<Page>, AppError> {
        let params = [
            ("spaceKey", space.to_string()),
            ("type", "page".to_string()),
            ("expand", PAGE_LISTING_EXPAND.to_string()),
        ];
        self.collect_listing("/rest/api/content", &params, |response| {
            parser::parse_content_listing(response, None, Some(space))
        })
        .await
    }

    async fn get_page(&self, id: &PageId) -> Result<Page, AppError> {
        let path = format!("/rest/api/content/{}", id);
        let response = self
            .get(&path, &[("expand", PAGE_LOOKUP_EXPAND.to_string())])
            .await?;
        parser::parse_page_response(response)
    }

    async fn list_child_pages(&self, parent: &PageId) -> Result<Vec<Page>, AppError> {
        let path = format!("/rest/api/content/{}/child/page", parent);
        let params = [("expand", PAGE_LISTING_EXPAND.to_string())];
        self.collect_listing(&path, &params, |response| {
            parser::parse_content_listing(response, Some(parent), None)
        })
        .await
    }

    async fn list_attachments(&self, page: &PageId) -> Result<Vec<Attachment>, AppError> {
        let path = format!("/rest/api/content/{}/child/attachment", page);
        let params = [("expand", "version".to_string())];
        self.collect_listing(&path, &params, parser::parse_attachment_listing)
            .await
    }

    async fn download_attachment(
        &self,
        attachment: &Attachment,
        destination: &Path,
    ) -> Result<u64, AppError> {
        let _permit = self.permits.acquire().await?;
        let url = self.download_url(attachment);
        log::debug!("GET {} -> {}", url, destination.display());

        let mut response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::http(status, url, &body));
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(destination).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: reqwest::StatusCode,
    pub url: String,
}

/// Extracts the response body as text with metadata.
pub async fn extract_response_text(response: Response) -> Result<ApiResponse<String>, AppError> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
    })
}
