//! The `posts.json` manifest.

use crate::error::AppError;
use crate::model::{ChildPageRef, PageMetadata, PostManifestEntry};
use crate::output::{read_json, write_json_atomic};
use crate::types::PostSlug;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashSet;
use std::path::Path;

/// Manifest record for one synced page.
///
/// A missing publish date falls back to the sync date.
pub fn manifest_entry(
    meta: &PageMetadata,
    child_pages: &[ChildPageRef],
    has_children: bool,
    artifact: Option<String>,
    synced_at: DateTime<Utc>,
) -> PostManifestEntry {
    let date = meta.date.unwrap_or_else(|| synced_at.date_naive());
    PostManifestEntry {
        slug: PostSlug::for_page(&meta.id),
        title: meta.title.clone(),
        date: date.format("%Y-%m-%d").to_string(),
        description: meta.description.clone(),
        image: meta.cover.clone(),
        notion_page_id: meta.id.clone(),
        has_children,
        child_pages: (!child_pages.is_empty()).then(|| child_pages.to_vec()),
        artifact,
        custom_slug: meta.custom_slug.clone(),
        last_synced: synced_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

/// Drops repeated page ids (first wins) and sorts by date, newest first,
/// then by slug.
pub fn normalize_entries(entries: Vec<PostManifestEntry>) -> Vec<PostManifestEntry> {
    let mut seen = HashSet::new();
    let mut entries: Vec<_> = entries
        .into_iter()
        .filter(|entry| seen.insert(entry.notion_page_id.clone()))
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
    entries
}

/// Replaces the manifest. Returns `false` and leaves the old file alone when
/// there is nothing to write.
pub fn write_manifest(path: &Path, entries: &[PostManifestEntry]) -> Result<bool, AppError> {
    if entries.is_empty() {
        log::warn!("No entries to publish; keeping {}", path.display());
        return Ok(false);
    }
    write_json_atomic(path, entries)?;
    log::info!("Wrote {} entries to {}", entries.len(), path.display());
    Ok(true)
}

pub fn read_manifest(path: &Path) -> Result<Vec<PostManifestEntry>, AppError> {
    read_json(path)
}
