use thiserror::Error;

mod domain_types;
mod ids;

pub use domain_types::*;
pub use ids::*;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid content ID format: {0}")]
    InvalidId(String),

    #[error("Invalid space key: {0}")]
    InvalidSpaceKey(String),

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Invalid API token: {reason}")]
    InvalidApiToken { reason: String },

    #[error("Unknown output type: {0} (expected file, sqlite or meilisearch)")]
    UnknownOutputType(String),
}
