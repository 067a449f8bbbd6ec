// tests/sync_e2e.rs
//! End-to-end sync runs against an in-memory workspace.

mod common;

use chrono::{TimeZone, Utc};
use common::*;
use notion2html::constants::PUBLISHED_STATUS_VALUES;
use notion2html::{PageId, SyncConfig, SyncManager};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use std::path::Path;

const CHILD_ID: &str = "2b2d9eed7ec680228a3ec54b7bd4db2b";
const OTHER_ID: &str = "3c3d9eed7ec680228a3ec54b7bd4db3c";

fn config(dir: &Path) -> SyncConfig {
    SyncConfig {
        output_dir: dir.to_path_buf(),
        concurrency: 2,
        ..Default::default()
    }
}

fn read_value(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn without_sync_time(mut manifest: Value) -> Value {
    for entry in manifest.as_array_mut().unwrap() {
        entry.as_object_mut().unwrap().remove("lastSynced");
    }
    manifest
}

fn guide_workspace() -> MemoryWorkspace {
    MemoryWorkspace::blog().with_page(meta(GUIDE_ID, "Guide"), vec![paragraph(1, "Hello")])
}

#[tokio::test]
async fn single_page_produces_artifact_and_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = guide_workspace();
    let config = config(dir.path());

    let report = SyncManager::new(&workspace, &config).run().await.unwrap();

    assert_eq!(report.entries, 1);
    assert_eq!(report.posts_written, 1);
    assert!(report.manifest_written);
    assert!(report.failed_pages.is_empty());

    let artifact = read_value(&dir.path().join(format!("post_{}.json", GUIDE_ID)));
    assert_eq!(artifact["pageInfo"]["title"], "Guide");
    assert_eq!(artifact["pageInfo"]["slug"], format!("post-{}", GUIDE_ID));
    assert_eq!(artifact["blocks"][0]["type"], "paragraph");
    assert_eq!(artifact["blocks"][0]["rich_text"][0]["plain_text"], "Hello");

    let manifest = read_value(&dir.path().join("posts.json"));
    assert_eq!(manifest.as_array().unwrap().len(), 1);
    assert_eq!(manifest[0]["slug"], format!("post-{}", GUIDE_ID));
    assert_eq!(manifest[0]["title"], "Guide");
    assert_eq!(manifest[0]["notionPageId"], GUIDE_ID);
    assert_eq!(manifest[0]["has_children"], false);
    assert_eq!(manifest[0]["artifact"], format!("post_{}.json", GUIDE_ID));
}

#[tokio::test]
async fn status_filter_targets_published_pages() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = guide_workspace();
    let config = config(dir.path());

    SyncManager::new(&workspace, &config).run().await.unwrap();

    assert_eq!(
        workspace.filters_seen.lock().first().cloned(),
        Some(Some(PUBLISHED_STATUS_VALUES[0].to_string()))
    );
}

#[tokio::test]
async fn rerun_without_changes_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = guide_workspace();
    let config = config(dir.path());
    let artifact = dir.path().join(format!("post_{}.json", GUIDE_ID));
    let manifest = dir.path().join("posts.json");

    SyncManager::new(&workspace, &config)
        .with_sync_time(Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap())
        .run()
        .await
        .unwrap();
    let first_artifact = fs::read(&artifact).unwrap();
    let first_manifest = read_value(&manifest);

    SyncManager::new(&workspace, &config)
        .with_sync_time(Utc.with_ymd_and_hms(2025, 1, 1, 20, 15, 0).unwrap())
        .run()
        .await
        .unwrap();

    assert_eq!(fs::read(&artifact).unwrap(), first_artifact);
    assert_eq!(
        without_sync_time(read_value(&manifest)),
        without_sync_time(first_manifest)
    );
}

#[tokio::test]
async fn failed_page_keeps_previous_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = guide_workspace();
    let config = config(dir.path());
    let artifact = dir.path().join(format!("post_{}.json", GUIDE_ID));

    SyncManager::new(&workspace, &config).run().await.unwrap();
    let before = fs::read(&artifact).unwrap();

    workspace.fail_listing(&page_id(GUIDE_ID).cast());
    let report = SyncManager::new(&workspace, &config).run().await.unwrap();

    assert_eq!(report.posts_written, 0);
    assert_eq!(report.failed_pages, vec![page_id(GUIDE_ID)]);
    assert_eq!(fs::read(&artifact).unwrap(), before);

    let manifest = read_value(&dir.path().join("posts.json"));
    assert_eq!(manifest[0]["slug"], format!("post-{}", GUIDE_ID));
    assert_eq!(manifest[0]["artifact"], format!("post_{}.json", GUIDE_ID));
}

#[tokio::test]
async fn failure_on_first_run_leaves_no_artifact_reference() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = MemoryWorkspace::blog()
        .with_page(meta(GUIDE_ID, "Guide"), vec![paragraph(1, "Hello")])
        .with_page(meta(OTHER_ID, "Other"), vec![paragraph(2, "World")]);
    workspace.fail_listing(&page_id(GUIDE_ID).cast());
    let config = config(dir.path());

    let report = SyncManager::new(&workspace, &config).run().await.unwrap();

    assert_eq!(report.posts_written, 1);
    assert_eq!(report.failed_pages, vec![page_id(GUIDE_ID)]);
    assert!(!dir.path().join(format!("post_{}.json", GUIDE_ID)).exists());
    assert!(dir.path().join(format!("post_{}.json", OTHER_ID)).exists());

    let manifest = read_value(&dir.path().join("posts.json"));
    let guide = manifest
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["notionPageId"] == GUIDE_ID)
        .unwrap();
    assert!(guide.get("artifact").is_none());
}

#[tokio::test]
async fn child_pages_get_their_own_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let child: PageId = page_id(CHILD_ID);
    let workspace = MemoryWorkspace::blog()
        .with_page(
            meta(GUIDE_ID, "Guide"),
            vec![paragraph(1, "Hello"), child_page(CHILD_ID, "Appendix")],
        )
        .with_children(&child.cast(), vec![heading(2, 3, "Details")]);
    let config = config(dir.path());

    let report = SyncManager::new(&workspace, &config).run().await.unwrap();

    assert_eq!(report.child_pages_written, 1);

    let artifact = read_value(&dir.path().join(format!("child_page_{}.json", CHILD_ID)));
    assert_eq!(artifact["pageInfo"]["title"], "Appendix");
    assert_eq!(artifact["pageInfo"]["parentId"], GUIDE_ID);
    assert_eq!(artifact["blocks"][0]["type"], "heading_2");

    let post = read_value(&dir.path().join(format!("post_{}.json", GUIDE_ID)));
    assert_eq!(post["blocks"][1]["type"], "child_page");
    assert!(post["blocks"][1].get("children").is_none());

    let manifest = read_value(&dir.path().join("posts.json"));
    assert_eq!(manifest[0]["has_children"], true);
    assert_eq!(manifest[0]["childPages"][0]["id"], CHILD_ID);
    assert_eq!(manifest[0]["childPages"][0]["title"], "Appendix");
    assert_eq!(manifest[0]["childPages"][0]["slug"], format!("post-{}", CHILD_ID));
}

#[tokio::test]
async fn child_page_linking_back_to_its_parent_terminates() {
    let dir = tempfile::tempdir().unwrap();
    let child: PageId = page_id(CHILD_ID);
    let workspace = MemoryWorkspace::blog()
        .with_page(meta(GUIDE_ID, "Guide"), vec![child_page(CHILD_ID, "Loop")])
        .with_children(&child.cast(), vec![child_page(GUIDE_ID, "Back")]);
    let config = config(dir.path());

    let report = SyncManager::new(&workspace, &config).run().await.unwrap();

    assert_eq!(report.posts_written, 1);
    assert_eq!(report.child_pages_written, 1);
    assert!(!dir.path().join(format!("child_page_{}.json", GUIDE_ID)).exists());
}

#[tokio::test]
async fn empty_database_leaves_manifest_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("posts.json");
    fs::write(&manifest, "[]\n").unwrap();
    let workspace = MemoryWorkspace::blog();
    let config = config(dir.path());

    let report = SyncManager::new(&workspace, &config).run().await.unwrap();

    assert_eq!(report.entries, 0);
    assert!(!report.manifest_written);
    assert_eq!(fs::read_to_string(&manifest).unwrap(), "[]\n");
}

#[tokio::test]
async fn manifest_is_sorted_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let mut older = meta(GUIDE_ID, "Older");
    older.date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1);
    let mut newer = meta(OTHER_ID, "Newer");
    newer.date = chrono::NaiveDate::from_ymd_opt(2025, 2, 3);
    let workspace = MemoryWorkspace::blog()
        .with_page(older, vec![paragraph(1, "a")])
        .with_page(newer, vec![paragraph(2, "b")]);
    let config = config(dir.path());

    SyncManager::new(&workspace, &config).run().await.unwrap();

    let manifest = read_value(&dir.path().join("posts.json"));
    assert_eq!(manifest[0]["title"], "Newer");
    assert_eq!(manifest[0]["date"], "2025-02-03");
    assert_eq!(manifest[1]["title"], "Older");
}
