//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// How many objects the Notion API returns per page of results (API maximum).
pub const NOTION_API_PAGE_SIZE: usize = 100;

/// Nesting depth after which the tree walker stops descending.
///
/// Blocks below this level come back with an empty child list.
pub const MAX_TREE_DEPTH: u8 = 10;

/// Pages synced concurrently. Recursion inside one page stays sequential.
pub const DEFAULT_PAGE_CONCURRENCY: usize = 3;

/// Attempts per HTTP request before a transient failure surfaces.
pub const REQUEST_MAX_ATTEMPTS: u32 = 3;

pub const REQUEST_INITIAL_BACKOFF: Duration = Duration::from_millis(500);

pub const REQUEST_MAX_BACKOFF: Duration = Duration::from_secs(8);

// ---------------------------------------------------------------------------
// Sync policy
// ---------------------------------------------------------------------------

/// Database property names that may hold the publish status, in lookup order.
pub const STATUS_PROPERTY_CANDIDATES: [&str; 4] = ["status", "state", "상태", "Status"];

/// Status values that mark a post as published, in lookup order.
pub const PUBLISHED_STATUS_VALUES: [&str; 4] = ["발행됨", "Published", "게시됨", "Live"];

/// Default directory for artifacts and the manifest.
pub const DEFAULT_OUTPUT_DIR: &str = "notion-data";

pub const MANIFEST_FILE_NAME: &str = "posts.json";

// ---------------------------------------------------------------------------
// String capacity hints (performance, not correctness)
// ---------------------------------------------------------------------------

/// Estimated HTML characters per block, used to pre-allocate output strings.
pub const CHARS_PER_BLOCK_ESTIMATE: usize = 256;

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 500;
