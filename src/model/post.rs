//! Persisted shapes: per-page artifacts and manifest entries.

use super::blocks::ChildPageBlock;
use super::Block;
use crate::types::{PageId, PostSlug};
use serde::{Deserialize, Serialize};

/// Title shown for child pages that have none.
pub const UNTITLED_CHILD_PAGE: &str = "하위 페이지";

/// Reference to a child page, always re-derived from a `child_page` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildPageRef {
    pub id: PageId,
    pub title: String,
    pub slug: PostSlug,
}

impl ChildPageRef {
    pub fn from_block(block: &ChildPageBlock) -> Self {
        let id = block.page_id();
        let title = if block.title.trim().is_empty() {
            UNTITLED_CHILD_PAGE.to_string()
        } else {
            block.title.clone()
        };
        Self {
            slug: PostSlug::for_page(&id),
            id,
            title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub id: PageId,
    pub title: String,
    pub slug: PostSlug,
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<PageId>,
}

/// Contents of `post_<id>.json` / `child_page_<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageArtifact {
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
    pub blocks: Vec<Block>,
}

/// One post record in `posts.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostManifestEntry {
    pub slug: PostSlug,
    pub title: String,
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub notion_page_id: PageId,
    #[serde(rename = "has_children")]
    pub has_children: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_pages: Option<Vec<ChildPageRef>>,
    /// Artifact path relative to the manifest's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_slug: Option<String>,
    pub last_synced: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlockCommon;
    use crate::types::BlockId;

    #[test]
    fn child_page_ref_derives_slug_from_block_id() {
        let block = ChildPageBlock {
            common: BlockCommon::new(
                BlockId::parse("1a1d9eed-7ec6-8022-8a3e-c54b7bd4db1a").unwrap(),
            ),
            title: String::new(),
        };
        let child = ChildPageRef::from_block(&block);
        assert_eq!(child.slug.as_str(), "post-1a1d9eed7ec680228a3ec54b7bd4db1a");
        assert_eq!(child.title, UNTITLED_CHILD_PAGE);
    }

    #[test]
    fn manifest_entry_uses_camel_case_keys() {
        let id = PageId::parse("1a1d9eed7ec680228a3ec54b7bd4db1a").unwrap();
        let entry = PostManifestEntry {
            slug: PostSlug::for_page(&id),
            title: "Guide".to_string(),
            date: "2025-03-01".to_string(),
            description: String::new(),
            image: None,
            notion_page_id: id,
            has_children: false,
            child_pages: None,
            artifact: Some("post_1a1d9eed7ec680228a3ec54b7bd4db1a.json".to_string()),
            custom_slug: None,
            last_synced: "2025-03-02T00:00:00Z".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["notionPageId"], "1a1d9eed7ec680228a3ec54b7bd4db1a");
        assert_eq!(json["has_children"], false);
        assert_eq!(json["lastSynced"], "2025-03-02T00:00:00Z");
        assert!(json.get("childPages").is_none());
    }
}
