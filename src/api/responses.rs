// src/api/responses.rs
//! Wire types for Confluence REST API responses.
//!
//! Only the fields the exporter reads are declared; serde ignores the rest.
//! Each record converts into its domain type through [`ToDomain`].

use crate::error::AppError;
use crate::model::{Attachment, Page, Space};
use crate::types::{AttachmentId, PageId, SpaceKey, ValidationError};
use serde::Deserialize;

/// Envelope shared by every listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpaceRecord {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpaceRef {
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageRecord {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BodyRecord {
    #[serde(default)]
    pub storage: Option<StorageRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionRecord {
    #[serde(default)]
    pub number: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinksRecord {
    #[serde(default)]
    pub webui: Option<String>,
    #[serde(default)]
    pub download: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AncestorRecord {
    pub id: String,
}

/// A page as returned by the content endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub space: Option<SpaceRef>,
    #[serde(default)]
    pub body: Option<BodyRecord>,
    #[serde(default)]
    pub version: Option<VersionRecord>,
    #[serde(rename = "_links", default)]
    pub links: Option<LinksRecord>,
    #[serde(default)]
    pub ancestors: Vec<AncestorRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMetadata {
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentExtensions {
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub metadata: Option<AttachmentMetadata>,
    #[serde(default)]
    pub extensions: Option<AttachmentExtensions>,
    #[serde(rename = "_links", default)]
    pub links: Option<LinksRecord>,
}

/// Trait for converting wire records to domain types
pub trait ToDomain<T> {
    fn to_domain(self) -> Result<T, AppError>;
}

impl ToDomain<Space> for SpaceRecord {
    fn to_domain(self) -> Result<Space, AppError> {
        Ok(Space {
            key: SpaceKey::new(self.key)?,
            name: self.name,
        })
    }
}

impl ContentRecord {
    /// Converts into a [`Page`].
    ///
    /// `listing_parent` is used when the record carries no ancestors of its
    /// own; `listing_space` when it carries no space.
    pub fn into_page(
        self,
        listing_parent: Option<&PageId>,
        listing_space: Option<&SpaceKey>,
    ) -> Result<Page, AppError> {
        let parent_id = match self.ancestors.last() {
            Some(ancestor) => Some(PageId::parse(&ancestor.id)?),
            None => listing_parent.cloned(),
        };
        let space_key = match self.space.map(|space| space.key) {
            Some(key) if !key.trim().is_empty() => SpaceKey::new(key)?,
            _ => listing_space
                .cloned()
                .ok_or(ValidationError::EmptyField("space key"))?,
        };

        Ok(Page {
            id: PageId::parse(&self.id)?,
            title: self.title,
            space_key,
            parent_id,
            version: self.version.map(|v| v.number).unwrap_or_default(),
            raw_body: self
                .body
                .and_then(|body| body.storage)
                .map(|storage| storage.value)
                .unwrap_or_default(),
            url: self.links.and_then(|links| links.webui).unwrap_or_default(),
        })
    }
}

impl ToDomain<Page> for ContentRecord {
    fn to_domain(self) -> Result<Page, AppError> {
        self.into_page(None, None)
    }
}

impl ToDomain<Attachment> for AttachmentRecord {
    fn to_domain(self) -> Result<Attachment, AppError> {
        let metadata = self.metadata.unwrap_or_default();
        let extensions = self.extensions.unwrap_or_default();
        Ok(Attachment {
            id: AttachmentId::parse(&self.id)?,
            file_name: self.title.clone(),
            title: self.title,
            media_type: metadata.media_type.or(extensions.media_type),
            file_size: extensions.file_size.or(metadata.size),
            download_url: self
                .links
                .and_then(|links| links.download)
                .unwrap_or_default(),
        })
    }
}
