// src/api/parser.rs
//! Turns raw HTTP responses into typed records.
//!
//! Status handling lives here so the client only moves bytes. A non-2xx
//! status becomes [`AppError::Http`]; a 2xx body that does not decode
//! becomes [`AppError::Decode`].

use super::client::ApiResponse;
use super::responses::{AttachmentRecord, ContentRecord, ListEnvelope, SpaceRecord, ToDomain};
use crate::error::AppError;
use crate::model::{Attachment, Page, Space};
use crate::types::{PageId, SpaceKey};

/// Parse any Confluence API response into `T`.
pub fn parse_api_response<T>(result: ApiResponse<String>) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    if !result.status.is_success() {
        log::debug!("HTTP {} from {}", result.status, result.url);
        return Err(AppError::http(result.status, result.url, &result.data));
    }

    serde_json::from_str(&result.data).map_err(|source| {
        log::error!("Failed to parse response from {}: {}", result.url, source);
        AppError::Decode {
            url: result.url,
            source,
        }
    })
}

/// Parse one page of the space listing.
pub fn parse_space_listing(result: ApiResponse<String>) -> Result<Vec<Space>, AppError> {
    let envelope: ListEnvelope<SpaceRecord> = parse_api_response(result)?;
    envelope
        .results
        .into_iter()
        .map(ToDomain::to_domain)
        .collect()
}

/// Parse a single page lookup.
pub fn parse_page_response(result: ApiResponse<String>) -> Result<Page, AppError> {
    let record: ContentRecord = parse_api_response(result)?;
    record.to_domain()
}

/// Parse one page of a content listing.
///
/// `parent` and `space` fill in what the listing endpoint leaves out of
/// each record.
pub fn parse_content_listing(
    result: ApiResponse<String>,
    parent: Option<&PageId>,
    space: Option<&SpaceKey>,
) -> Result<Vec<Page>, AppError> {
    let envelope: ListEnvelope<ContentRecord> = parse_api_response(result)?;
    envelope
        .results
        .into_iter()
        .map(|record| record.into_page(parent, space))
        .collect()
}

/// Parse one page of an attachment listing.
pub fn parse_attachment_listing(
    result: ApiResponse<String>,
) -> Result<Vec<Attachment>, AppError> {
    let envelope: ListEnvelope<AttachmentRecord> = parse_api_response(result)?;
    envelope
        .results
        .into_iter()
        .map(ToDomain::to_domain)
        .collect()
}
