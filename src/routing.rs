//! Request-time routing helpers.
//!
//! Slugs are resolved with [`PostSlug`], the same derivation the manifest
//! writer uses, so the two can never disagree.

use crate::error::AppError;
use crate::model::PostManifestEntry;
use crate::types::{PageId, PostSlug};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `/<id>` or `/child-page/<id>`, with the id dashed or not.
    static ref LEGACY_PATH: Regex = Regex::new(
        r"^/(?:child-page/)?([0-9a-fA-F]{32}|[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})/?$"
    )
    .expect("legacy path pattern is valid");
}

/// Page id addressed by a slug.
pub fn page_id_for_slug(slug: &str) -> Result<PageId, AppError> {
    Ok(PostSlug::parse(slug)?.page_id())
}

/// Accepts either a slug or a bare page id.
pub fn resolve_target(target: &str) -> Result<PageId, AppError> {
    let target = target.trim().trim_start_matches("/blog/");
    if target.starts_with("post-") {
        page_id_for_slug(target)
    } else {
        Ok(PageId::parse(target)?)
    }
}

/// Canonical location for a legacy Notion-style path, or `None` when the
/// path needs no redirect.
pub fn legacy_redirect(path: &str) -> Option<String> {
    let captures = LEGACY_PATH.captures(path.trim())?;
    let id = PageId::parse(captures.get(1)?.as_str()).ok()?;
    Some(PostSlug::for_page(&id).blog_path())
}

/// Looks a slug up in the manifest.
pub fn find_post<'a>(entries: &'a [PostManifestEntry], slug: &str) -> Result<&'a PostManifestEntry, AppError> {
    let wanted = PostSlug::parse(slug).ok();
    entries
        .iter()
        .find(|entry| Some(&entry.slug) == wanted.as_ref())
        .ok_or_else(|| AppError::PostNotFound {
            slug: slug.to_string(),
        })
}
