// src/api/mod.rs
//! Notion API interaction: the ability to retrieve content from a workspace.
//!
//! Two remotes are covered: the official API behind [`NotionRepository`],
//! and the unofficial record-map endpoint behind [`RecordMapClient`]. I/O,
//! parsing and normalization stay in separate modules.

pub mod client;
pub mod notion_client_adapter;
pub mod parser;
pub mod record_map;
mod responses;
mod simple_pagination;
pub mod types;
pub mod walker;

use crate::error::AppError;
use crate::model::{Block, DatabaseSchema, PageMetadata};
use crate::types::{BlockId, DatabaseId, PageId};
use simple_pagination::fetch_all_pages_simple;
use types::{PaginatedResponse, StatusFilter};

/// The ability to read a blog database and its pages.
///
/// Business logic depends on this trait, never on HTTP details. Listing
/// methods return one cursor page; the provided `*_all` methods drain them.
#[async_trait::async_trait]
pub trait NotionRepository: Send + Sync {
    async fn retrieve_database(&self, id: &DatabaseId) -> Result<DatabaseSchema, AppError>;

    async fn query_database(
        &self,
        id: &DatabaseId,
        filter: Option<&StatusFilter>,
        cursor: Option<String>,
    ) -> Result<PaginatedResponse<PageMetadata>, AppError>;

    async fn retrieve_page(&self, id: &PageId) -> Result<PageMetadata, AppError>;

    async fn list_block_children(
        &self,
        id: &BlockId,
        cursor: Option<String>,
    ) -> Result<PaginatedResponse<Block>, AppError>;

    /// Every entry matching `filter`, in query order.
    async fn query_all(
        &self,
        id: &DatabaseId,
        filter: Option<&StatusFilter>,
    ) -> Result<Vec<PageMetadata>, AppError> {
        let result =
            fetch_all_pages_simple(|_, cursor| self.query_database(id, filter, cursor))
                .await?;
        log::debug!(
            "Database {} returned {} entries over {} pages",
            id,
            result.total_fetched,
            result.pages_fetched
        );
        Ok(result.items)
    }

    /// Every direct child of `id`, in order.
    async fn list_all_children(&self, id: &BlockId) -> Result<Vec<Block>, AppError> {
        let result =
            fetch_all_pages_simple(|_, cursor| self.list_block_children(id, cursor)).await?;
        Ok(result.items)
    }
}

pub use client::NotionHttpClient;
pub use record_map::RecordMapClient;
pub use types::{StatusPropertyKind, PaginationResult};
pub use walker::{TreeWalker, WalkOutcome, WalkStats};
