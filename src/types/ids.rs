use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Strong typing for Confluence content IDs with phantom types
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    value: String,
    _phantom: PhantomData<T>,
}

// Derived Clone would require `T: Clone` on the marker.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _phantom: PhantomData,
        }
    }
}

/// Marker types for different ID kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentMarker;

/// Type aliases for specific ID types
pub type PageId = Id<PageMarker>;
pub type AttachmentId = Id<AttachmentMarker>;

impl<T> Id<T> {
    /// Parses a Confluence content ID.
    ///
    /// Accepts the bare ID (`"98765"`), the attachment form (`"att98765"`), or a
    /// page URL containing `/pages/<id>` or `pageId=<id>`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = normalize_content_id(input)?;
        Ok(Self::from_normalized(normalized))
    }

    /// Create an ID from an already normalized string (internal use)
    pub(crate) fn from_normalized(value: String) -> Self {
        Self {
            value,
            _phantom: PhantomData,
        }
    }

    /// Get the ID as a string reference
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}

/// Normalize the accepted content ID spellings into the bare ID
fn normalize_content_id(input: &str) -> Result<String, ValidationError> {
    let input = input.trim();

    if input.is_empty() {
        return Err(ValidationError::EmptyField("content id"));
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        return extract_id_from_url(input).map(str::to_string).ok_or_else(|| {
            ValidationError::InvalidId(format!("Could not extract a page ID from URL: {}", input))
        });
    }

    if input.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(ValidationError::InvalidId(format!(
            "Content IDs cannot contain whitespace or '/': {}",
            input
        )));
    }

    Ok(input.to_string())
}

/// Extract the page ID from a Confluence page URL
fn extract_id_from_url(url: &str) -> Option<&str> {
    let parsed = url.split(['?', '#']).next().unwrap_or(url);

    // Format: https://host/wiki/spaces/KEY/pages/<id>/<title>
    let mut segments = parsed.split('/');
    while let Some(segment) = segments.next() {
        if segment == "pages" {
            if let Some(candidate) = segments.next() {
                if !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_digit()) {
                    return Some(candidate);
                }
            }
        }
    }

    // Format: https://host/pages/viewpage.action?pageId=<id>
    url.split(['?', '&'])
        .find_map(|pair| pair.strip_prefix("pageId="))
        .filter(|id| !id.is_empty())
}
