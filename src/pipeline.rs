// src/pipeline.rs
//! Render pipeline: fetch a page's block tree from some source, render it.
//!
//! [`ContentSource`] hides where the tree comes from. The live API, the
//! private record-map API and the synced artifact directory all yield the
//! same [`PageContent`].

use crate::algebras::PageVisitLedger;
use crate::api::{NotionRepository, RecordMapClient, TreeWalker};
use crate::constants::MAX_TREE_DEPTH;
use crate::error::AppError;
use crate::formatting::{render_page, RenderContext, TocEntry};
use crate::model::{Block, PageArtifact, SignedUrlTable};
use crate::output::{artifact_path, read_json, ArtifactKind};
use crate::types::PageId;
use serde::Serialize;
use std::path::PathBuf;

/// Title used when the source knows no title for the page.
pub const UNTITLED_POST: &str = "Untitled";

/// A page's block tree as delivered by one source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageContent {
    pub title: Option<String>,
    pub blocks: Vec<Block>,
    /// Present only for record-map fetches.
    pub signed_urls: Option<SignedUrlTable>,
}

/// Retrieves the content of one page.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, id: &PageId) -> Result<PageContent, AppError>;
}

/// Output of the render pipeline for one post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPost {
    pub title: String,
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// Fetches `id` from `source` and renders it.
pub async fn render_post(source: &dyn ContentSource, id: &PageId) -> Result<RenderedPost, AppError> {
    let content = source.fetch(id).await?;
    let context = RenderContext {
        signed_urls: content.signed_urls.as_ref(),
    };
    let rendered = render_page(&content.blocks, &context);

    let title = content
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| UNTITLED_POST.to_string());

    log::info!(
        "Rendered '{}' ({} bytes, {} headings)",
        title,
        rendered.html.len(),
        rendered.toc.len()
    );

    Ok(RenderedPost {
        title,
        html: rendered.html,
        toc: rendered.toc.entries,
    })
}

/// Live content through the official API.
pub struct ApiSource<'a, R: ?Sized> {
    repository: &'a R,
    max_depth: u8,
}

impl<'a, R: NotionRepository + ?Sized> ApiSource<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self {
            repository,
            max_depth: MAX_TREE_DEPTH,
        }
    }
}

#[async_trait::async_trait]
impl<R: NotionRepository + ?Sized> ContentSource for ApiSource<'_, R> {
    async fn fetch(&self, id: &PageId) -> Result<PageContent, AppError> {
        let title = match self.repository.retrieve_page(id).await {
            Ok(meta) => Some(meta.title),
            Err(e) => {
                log::warn!("Could not read metadata of {}: {}", id, e);
                None
            }
        };

        let tracker = PageVisitLedger::new();
        let outcome = TreeWalker::new(self.repository)
            .with_max_depth(self.max_depth)
            .walk(&id.cast(), &tracker)
            .await?;

        Ok(PageContent {
            title,
            blocks: outcome.blocks,
            signed_urls: None,
        })
    }
}

/// Live content through the private record-map API, with signed file URLs.
pub struct RecordMapSource {
    client: RecordMapClient,
}

impl RecordMapSource {
    pub fn new(client: RecordMapClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ContentSource for RecordMapSource {
    async fn fetch(&self, id: &PageId) -> Result<PageContent, AppError> {
        let page = self.client.fetch_page(id).await?;
        Ok(PageContent {
            title: page.title,
            blocks: page.blocks,
            signed_urls: Some(page.signed_urls),
        })
    }
}

/// Artifacts written by a previous sync.
pub struct CacheSource {
    output_dir: PathBuf,
}

impl CacheSource {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait::async_trait]
impl ContentSource for CacheSource {
    /// Looks for a post artifact first, then a child-page artifact.
    async fn fetch(&self, id: &PageId) -> Result<PageContent, AppError> {
        let post = artifact_path(&self.output_dir, ArtifactKind::Post, id);
        let path = if post.exists() {
            post
        } else {
            artifact_path(&self.output_dir, ArtifactKind::ChildPage, id)
        };

        let artifact: PageArtifact = read_json(&path)?;
        log::debug!("Loaded {} blocks from {}", artifact.blocks.len(), path.display());

        Ok(PageContent {
            title: Some(artifact.page_info.title),
            blocks: artifact.blocks,
            signed_urls: None,
        })
    }
}
