//! Reconciles the local artifact directory with the blog database.
//!
//! One run discovers the published entries, fetches each page's block tree
//! and its child pages, writes one artifact per page and then replaces the
//! manifest. A page that fails to fetch is skipped: its previous artifact
//! stays on disk and its manifest entry keeps pointing at it.

pub mod manifest;
pub mod status;

use crate::algebras::{PageVisitLedger, VisitTracker};
use crate::api::{NotionRepository, TreeWalker};
use crate::config::SyncConfig;
use crate::error::AppError;
use crate::model::{ChildPageRef, PageArtifact, PageInfo, PageMetadata, PostManifestEntry};
use crate::output::{artifact_path, get_relative_path, manifest_path, write_json_atomic, ArtifactKind};
use crate::types::{PageId, PostSlug};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

pub use manifest::{manifest_entry, normalize_entries, read_manifest, write_manifest};
pub use status::{discover_entries, find_status_property, query_published};

/// Summary of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub entries: usize,
    pub posts_written: usize,
    pub child_pages_written: usize,
    pub failed_pages: Vec<PageId>,
    pub failed_child_pages: Vec<PageId>,
    pub manifest_written: bool,
}

/// What happened to one top-level page.
struct PageSync {
    entry: PostManifestEntry,
    post_written: bool,
    child_pages_written: usize,
    failed_child_pages: Vec<PageId>,
}

pub struct SyncManager<'a, R: ?Sized> {
    repository: &'a R,
    config: &'a SyncConfig,
    synced_at: Option<DateTime<Utc>>,
}

impl<'a, R: NotionRepository + ?Sized> SyncManager<'a, R> {
    pub fn new(repository: &'a R, config: &'a SyncConfig) -> Self {
        Self {
            repository,
            config,
            synced_at: None,
        }
    }

    /// Pins the timestamp recorded in the manifest instead of reading the clock.
    pub fn with_sync_time(mut self, synced_at: DateTime<Utc>) -> Self {
        self.synced_at = Some(synced_at);
        self
    }

    pub async fn run(&self) -> Result<SyncReport, AppError> {
        let synced_at = self.synced_at.unwrap_or_else(Utc::now);
        let output_dir = self.config.output_dir.as_path();
        std::fs::create_dir_all(output_dir)?;

        let manifest_file = manifest_path(output_dir);
        let previous = self.previous_entries(&manifest_file);

        let mut seen = HashSet::new();
        let entries: Vec<PageMetadata> = status::discover_entries(self.repository, &self.config.database_id)
            .await
            .into_iter()
            .filter(|meta| seen.insert(meta.id.clone()))
            .collect();

        let mut report = SyncReport {
            entries: entries.len(),
            ..Default::default()
        };
        if entries.is_empty() {
            log::warn!("Database returned no entries; leaving existing artifacts untouched");
            return Ok(report);
        }

        log::info!(
            "Syncing {} pages into {} ({} at a time)",
            entries.len(),
            output_dir.display(),
            self.config.concurrency
        );

        let manifest_ref = manifest_file.as_path();
        let previous_ref = &previous;
        let results: Vec<PageSync> = stream::iter(entries)
            .map(move |meta| self.sync_page(meta, manifest_ref, previous_ref, synced_at))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut manifest = Vec::with_capacity(results.len());
        for result in results {
            if result.post_written {
                report.posts_written += 1;
            } else {
                report.failed_pages.push(result.entry.notion_page_id.clone());
            }
            report.child_pages_written += result.child_pages_written;
            report.failed_child_pages.extend(result.failed_child_pages);
            manifest.push(result.entry);
        }

        let manifest = normalize_entries(manifest);
        report.manifest_written = write_manifest(&manifest_file, &manifest)?;

        log::info!(
            "Sync finished: {} posts, {} child pages, {} failed",
            report.posts_written,
            report.child_pages_written,
            report.failed_pages.len() + report.failed_child_pages.len()
        );
        Ok(report)
    }

    fn previous_entries(&self, manifest_file: &Path) -> HashMap<PageId, PostManifestEntry> {
        if !manifest_file.exists() {
            return HashMap::new();
        }
        match read_manifest(manifest_file) {
            Ok(entries) => entries
                .into_iter()
                .map(|entry| (entry.notion_page_id.clone(), entry))
                .collect(),
            Err(e) => {
                log::warn!("Ignoring unreadable manifest: {}", e);
                HashMap::new()
            }
        }
    }

    async fn sync_page(
        &self,
        meta: PageMetadata,
        manifest_file: &Path,
        previous: &HashMap<PageId, PostManifestEntry>,
        synced_at: DateTime<Utc>,
    ) -> PageSync {
        let tracker = PageVisitLedger::new();
        let post_path = artifact_path(&self.config.output_dir, ArtifactKind::Post, &meta.id);

        let written = match self.fetch_and_write(&meta.id, &meta.title, None, &post_path, &tracker).await {
            Ok(child_pages) => Some(child_pages),
            Err(e) => {
                log::warn!("Skipping page {} ({}): {}", meta.id, meta.title, e);
                None
            }
        };

        let Some(child_pages) = written else {
            let old = previous.get(&meta.id);
            let child_pages = old.and_then(|e| e.child_pages.clone()).unwrap_or_default();
            let entry = manifest_entry(
                &meta,
                &child_pages,
                old.is_some_and(|e| e.has_children),
                self.existing_artifact(manifest_file, &post_path),
                synced_at,
            );
            return PageSync {
                entry,
                post_written: false,
                child_pages_written: 0,
                failed_child_pages: Vec::new(),
            };
        };

        let (child_pages_written, failed_child_pages) =
            self.sync_child_pages(&meta.id, &child_pages, &tracker).await;

        let artifact = match get_relative_path(manifest_file, &post_path) {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        };

        PageSync {
            entry: manifest_entry(&meta, &child_pages, !child_pages.is_empty(), artifact, synced_at),
            post_written: true,
            child_pages_written,
            failed_child_pages,
        }
    }

    /// Fetches child pages breadth first, down to the depth ceiling.
    ///
    /// Child pages share the top-level page's visited set, so a page linked
    /// twice is written once.
    async fn sync_child_pages(
        &self,
        root: &PageId,
        children: &[ChildPageRef],
        tracker: &dyn VisitTracker,
    ) -> (usize, Vec<PageId>) {
        let mut queue: VecDeque<(ChildPageRef, PageId, u8)> = children
            .iter()
            .map(|child| (child.clone(), root.clone(), 1))
            .collect();
        let mut written = 0;
        let mut failed = Vec::new();

        while let Some((child, parent, level)) = queue.pop_front() {
            if tracker.is_visited(&child.id.cast()).await {
                log::debug!("Child page {} already synced for this post", child.id);
                continue;
            }
            if level > self.config.max_depth {
                log::warn!("Child page {} is nested too deep; skipping", child.id);
                continue;
            }

            let path = artifact_path(&self.config.output_dir, ArtifactKind::ChildPage, &child.id);
            match self
                .fetch_and_write(&child.id, &child.title, Some(&parent), &path, tracker)
                .await
            {
                Ok(grandchildren) => {
                    written += 1;
                    queue.extend(
                        grandchildren
                            .into_iter()
                            .map(|grandchild| (grandchild, child.id.clone(), level + 1)),
                    );
                }
                Err(e) => {
                    log::warn!("Skipping child page {} ({}): {}", child.id, child.title, e);
                    failed.push(child.id.clone());
                }
            }
        }

        (written, failed)
    }

    /// Walks one page and writes its artifact, returning its child pages.
    async fn fetch_and_write(
        &self,
        id: &PageId,
        title: &str,
        parent: Option<&PageId>,
        path: &Path,
        tracker: &dyn VisitTracker,
    ) -> Result<Vec<ChildPageRef>, AppError> {
        let outcome = TreeWalker::new(self.repository)
            .with_max_depth(self.config.max_depth)
            .walk(&id.cast(), tracker)
            .await?;

        let artifact = PageArtifact {
            page_info: PageInfo {
                id: id.clone(),
                title: title.to_string(),
                slug: PostSlug::for_page(id),
                parent_id: parent.cloned(),
            },
            blocks: outcome.blocks,
        };
        let bytes = write_json_atomic(path, &artifact)?;
        log::debug!("Wrote {} ({} bytes)", path.display(), bytes);

        Ok(outcome.child_pages)
    }

    /// Relative path of the artifact from an earlier run, if one is on disk.
    fn existing_artifact(&self, manifest_file: &Path, artifact: &Path) -> Option<String> {
        if !artifact.exists() {
            return None;
        }
        get_relative_path(manifest_file, artifact).ok()
    }
}
