// src/output/paths.rs
//! Pure functions for artifact naming and path calculations.
//!
//! Nothing here touches the filesystem.

use crate::constants::MANIFEST_FILE_NAME;
use crate::error::AppError;
use crate::types::PageId;
use std::path::{Path, PathBuf};

/// Which kind of page an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Post,
    ChildPage,
}

impl ArtifactKind {
    fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Post => "post",
            ArtifactKind::ChildPage => "child_page",
        }
    }
}

/// `post_<id>.json` or `child_page_<id>.json`, with the dashless id.
pub fn artifact_file_name(kind: ArtifactKind, id: &PageId) -> String {
    format!("{}_{}.json", kind.prefix(), id.as_str())
}

pub fn artifact_path(output_dir: &Path, kind: ArtifactKind, id: &PageId) -> PathBuf {
    output_dir.join(artifact_file_name(kind, id))
}

pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILE_NAME)
}

/// Path of `to` relative to the directory containing `from`, with forward slashes.
pub fn get_relative_path(from: &Path, to: &Path) -> Result<String, AppError> {
    let from_dir = from.parent().unwrap_or_else(|| Path::new("."));

    let relative = pathdiff::diff_paths(to, from_dir).ok_or_else(|| AppError::InternalError {
        message: format!(
            "Could not calculate relative path from {} to {}",
            from.display(),
            to.display()
        ),
        source: None,
    })?;

    Ok(relative.to_string_lossy().replace('\\', "/"))
}

/// Sibling temp path used for write-then-rename.
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> PageId {
        PageId::parse("1a1d9eed-7ec6-8022-8a3e-c54b7bd4db1a").unwrap()
    }

    #[test]
    fn artifact_names_use_dashless_ids() {
        assert_eq!(
            artifact_file_name(ArtifactKind::Post, &id()),
            "post_1a1d9eed7ec680228a3ec54b7bd4db1a.json"
        );
        assert_eq!(
            artifact_file_name(ArtifactKind::ChildPage, &id()),
            "child_page_1a1d9eed7ec680228a3ec54b7bd4db1a.json"
        );
    }

    #[test]
    fn relative_path_from_manifest() {
        let manifest = Path::new("/data/notion-data/posts.json");
        let artifact = Path::new("/data/notion-data/post_abc.json");
        assert_eq!(get_relative_path(manifest, artifact).unwrap(), "post_abc.json");
    }

    #[test]
    fn temp_path_stays_in_the_same_directory() {
        let target = Path::new("/data/posts.json");
        let temp = temp_path_for(target);
        assert_eq!(temp.parent(), target.parent());
        assert!(temp.file_name().unwrap().to_string_lossy().starts_with(".posts.json."));
    }
}
