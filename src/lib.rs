// src/lib.rs
//! notion2html library: mirrors a Notion blog database into local JSON
//! artifacts and renders Notion block trees to HTML.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ValidationError`
//! - **Configuration**: `SyncConfig`, `RenderConfig`, `ResolveFileConfig`
//! - **Domain model**: `Block`, `PageMetadata`, `PostManifestEntry`, etc.
//! - **Ingestion**: normalization of API and record-map payloads into `Block`
//! - **API clients**: `NotionRepository`, `NotionHttpClient`, `RecordMapClient`, `TreeWalker`
//! - **Formatting**: `render_page`, `rich_text_to_html`, table of contents
//! - **Sync and rendering**: `SyncManager`, `ContentSource`, `render_post`

pub mod algebras;
pub mod api;
pub mod attachments;
pub mod config;
pub mod constants;
pub mod error;
pub mod error_recovery;
pub mod formatting;
pub mod ingest;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod routing;
pub mod sync;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, NotionClientError, NotionErrorCode, Result};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{RenderConfig, ResolveFileConfig, SourceKind, SyncConfig};

// --- Domain Model ---
pub use crate::model::{
    Block, BlockCommon, ChildPageRef, DatabaseSchema, PageArtifact, PageInfo, PageMetadata,
    PostManifestEntry, SignedUrlTable,
};

// --- Domain Types ---
pub use crate::types::{
    Annotations, ApiKey, BlockId, Color, DatabaseId, NotionId, PageId, PostSlug, RichTextSpan,
    SessionToken, ValidatedUrl,
};

// --- API Clients ---
pub use crate::api::{
    NotionHttpClient, NotionRepository, RecordMapClient, TreeWalker, WalkOutcome,
};

// --- Formatting ---
pub use crate::formatting::{
    render_blocks, render_page, rich_text_to_html, RenderContext, RenderedBlocks,
    TableOfContents, TocEntry,
};

// --- Sync and Rendering ---
pub use crate::attachments::{find_file_url, resolve_attachment, Resolution};
pub use crate::pipeline::{render_post, CacheSource, ContentSource, PageContent, RenderedPost};
pub use crate::sync::{SyncManager, SyncReport};

// --- Algebras (Capability Traits) ---
pub use crate::algebras::{PageVisitLedger, VisitTracker};
