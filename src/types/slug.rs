use super::{PageId, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

const SLUG_PREFIX: &str = "post-";

/// URL path segment of a post: `post-<32-hex page id>`.
///
/// This is the only mapping between page ids and URLs. The manifest writer,
/// child-page links and the request-time resolver all go through it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostSlug(String);

impl PostSlug {
    /// Derives the slug of a page. Pure and deterministic.
    pub fn for_page(id: &PageId) -> Self {
        Self(format!("{}{}", SLUG_PREFIX, id.as_str()))
    }

    /// Parses a slug back into its page id, accepting dashed ids.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let raw = input
            .trim()
            .strip_prefix(SLUG_PREFIX)
            .ok_or_else(|| ValidationError::InvalidSlug {
                slug: input.to_string(),
                reason: format!("expected '{}' prefix", SLUG_PREFIX),
            })?;
        let id = PageId::parse(raw).map_err(|e| ValidationError::InvalidSlug {
            slug: input.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::for_page(&id))
    }

    pub fn page_id(&self) -> PageId {
        PageId::from_normalized(self.0[SLUG_PREFIX.len()..].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Site path of the post detail page.
    pub fn blog_path(&self) -> String {
        format!("/blog/{}", self.0)
    }
}

impl fmt::Display for PostSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for PostSlug {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PostSlug {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}
