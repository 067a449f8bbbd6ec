//! Domain value types shared by every layer: identifiers, slugs, colors,
//! rich text and credentials.

use thiserror::Error;

mod colors;
mod domain_types;
mod ids;
mod rich_text;
mod slug;

pub use colors::*;
pub use domain_types::*;
pub use ids::*;
pub use rich_text::*;
pub use slug::*;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid Notion ID format: {0}")]
    InvalidId(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Invalid API key format: {reason}")]
    InvalidApiKey { reason: String },

    #[error("Invalid post slug '{slug}': {reason}")]
    InvalidSlug { slug: String, reason: String },
}
