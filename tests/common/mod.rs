// tests/common/mod.rs
//! Shared fixtures: an in-memory Notion workspace and block builders.

#![allow(dead_code)]

use indexmap::IndexMap;
use notion2html::api::types::{PaginatedResponse, StatusFilter};
use notion2html::model::*;
use notion2html::{AppError, BlockId, DatabaseId, NotionRepository, PageId, RichTextSpan};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

pub const GUIDE_ID: &str = "1a1d9eed7ec680228a3ec54b7bd4db1a";

/// A workspace held in memory. Block listings are served one block per
/// cursor page so pagination is always exercised.
#[derive(Default)]
pub struct MemoryWorkspace {
    pub schema: Option<DatabaseSchema>,
    pub entries: Vec<PageMetadata>,
    pub children: HashMap<BlockId, Vec<Block>>,
    /// Parents whose listing fails.
    pub failing: Mutex<HashSet<BlockId>>,
    pub filters_seen: Mutex<Vec<Option<String>>>,
}

impl MemoryWorkspace {
    /// A blog database with a `status` select property.
    pub fn blog() -> Self {
        let mut properties = IndexMap::new();
        properties.insert("Title".to_string(), "title".to_string());
        properties.insert("status".to_string(), "select".to_string());
        Self {
            schema: Some(DatabaseSchema {
                id: None,
                title: "Blog".to_string(),
                properties,
            }),
            ..Default::default()
        }
    }

    pub fn with_page(mut self, meta: PageMetadata, blocks: Vec<Block>) -> Self {
        self.children.insert(meta.id.cast(), blocks);
        self.entries.push(meta);
        self
    }

    pub fn with_children(mut self, parent: &BlockId, blocks: Vec<Block>) -> Self {
        self.children.insert(parent.clone(), blocks);
        self
    }

    pub fn fail_listing(&self, parent: &BlockId) {
        self.failing.lock().insert(parent.clone());
    }

    pub fn heal(&self) {
        self.failing.lock().clear();
    }
}

#[async_trait::async_trait]
impl NotionRepository for MemoryWorkspace {
    async fn retrieve_database(&self, _: &DatabaseId) -> Result<DatabaseSchema, AppError> {
        self.schema
            .clone()
            .ok_or_else(|| AppError::MalformedResponse("no schema".to_string()))
    }

    async fn query_database(
        &self,
        _: &DatabaseId,
        filter: Option<&StatusFilter>,
        _: Option<String>,
    ) -> Result<PaginatedResponse<PageMetadata>, AppError> {
        self.filters_seen
            .lock()
            .push(filter.map(|f| f.value.clone()));
        Ok(PaginatedResponse::last(self.entries.clone()))
    }

    async fn retrieve_page(&self, id: &PageId) -> Result<PageMetadata, AppError> {
        self.entries
            .iter()
            .find(|meta| &meta.id == id)
            .cloned()
            .ok_or_else(|| AppError::MalformedResponse(format!("no page {}", id)))
    }

    async fn list_block_children(
        &self,
        id: &BlockId,
        cursor: Option<String>,
    ) -> Result<PaginatedResponse<Block>, AppError> {
        if self.failing.lock().contains(id) {
            return Err(AppError::MalformedResponse(format!("listing {} failed", id)));
        }
        let all = self.children.get(id).cloned().unwrap_or_default();
        let start: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
        let end = (start + 1).min(all.len());
        let has_more = end < all.len();
        Ok(PaginatedResponse {
            object: "list".to_string(),
            results: all[start..end].to_vec(),
            next_cursor: has_more.then(|| end.to_string()),
            has_more,
        })
    }
}

pub fn page_id(raw: &str) -> PageId {
    PageId::parse(raw).unwrap()
}

pub fn block_id(n: u32) -> BlockId {
    BlockId::parse(&format!("{:032x}", n)).unwrap()
}

pub fn meta(id: &str, title: &str) -> PageMetadata {
    let mut meta = PageMetadata::untitled(page_id(id));
    meta.title = title.to_string();
    meta
}

pub fn text(s: &str) -> TextBlockContent {
    TextBlockContent::new(vec![RichTextSpan::plain(s)])
}

pub fn paragraph(n: u32, s: &str) -> Block {
    Block::Paragraph(ParagraphBlock {
        common: BlockCommon::new(block_id(n)),
        content: text(s),
    })
}

pub fn heading(level: u8, n: u32, s: &str) -> Block {
    let heading = HeadingBlock {
        common: BlockCommon::new(block_id(n)),
        content: text(s),
        is_toggleable: false,
    };
    match level {
        1 => Block::Heading1(heading),
        2 => Block::Heading2(heading),
        _ => Block::Heading3(heading),
    }
}

pub fn child_page(id: &str, title: &str) -> Block {
    Block::ChildPage(ChildPageBlock {
        common: BlockCommon {
            id: BlockId::parse(id).unwrap(),
            has_children: true,
            children: vec![],
        },
        title: title.to_string(),
    })
}
