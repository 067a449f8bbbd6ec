mod block;
pub mod blocks;
pub mod common;
mod post;

pub use block::{count_blocks, flatten_blocks, Block};
pub use blocks::*;
pub use common::*;
pub use post::{ChildPageRef, PageArtifact, PageInfo, PostManifestEntry, UNTITLED_CHILD_PAGE};

use crate::types::{DatabaseId, PageId};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Title used when a page has no usable title property.
pub const UNTITLED_PAGE: &str = "제목 없음";

/// Metadata of one database entry, after property fallbacks were applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub id: PageId,
    pub title: String,
    /// Publish date; `None` when neither a date property nor a creation time exists.
    pub date: Option<NaiveDate>,
    pub description: String,
    pub cover: Option<String>,
    /// Value of a `Slug`/`slug` property, kept for reference only.
    pub custom_slug: Option<String>,
    pub url: Option<String>,
}

impl PageMetadata {
    pub fn untitled(id: PageId) -> Self {
        Self {
            id,
            title: UNTITLED_PAGE.to_string(),
            date: None,
            description: String::new(),
            cover: None,
            custom_slug: None,
            url: None,
        }
    }
}

/// Property names and their Notion type names, in schema order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub id: Option<DatabaseId>,
    pub title: String,
    pub properties: IndexMap<String, String>,
}

impl DatabaseSchema {
    pub fn property_type(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

/// Time-limited download URLs keyed by file id or block id.
///
/// Owned by the single record-map fetch it arrived with and never persisted:
/// signed URLs expire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignedUrlTable(BTreeMap<String, String>);

impl SignedUrlTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, url: impl Into<String>) {
        self.0.insert(normalize_key(&key.into()), url.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&normalize_key(key)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SignedUrlTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

/// Keys are compared without dashes so dashed and plain ids hit the same entry.
fn normalize_key(key: &str) -> String {
    key.trim().replace('-', "").to_lowercase()
}
