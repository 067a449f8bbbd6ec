// src/output/writer.rs
//! Executes output operations by performing actual I/O.
//!
//! This module is the only place where artifact and manifest files are
//! written. Every write goes to a sibling temp file first and is renamed
//! over the target, so readers never see a partial file.

use super::paths::temp_path_for;
use crate::error::AppError;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Serializes `value` as pretty JSON with a trailing newline and writes it atomically.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<usize, AppError> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    write_atomic(path, content.as_bytes())?;
    Ok(content.len())
}

/// Writes `content` to a temp file beside `path`, then renames it into place.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), AppError> {
    log::debug!("Writing {} bytes to {}", content.len(), path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp = temp_path_for(path);
    let result = (|| {
        let mut file = fs::File::create(&temp)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&temp, path)
    })();

    if let Err(e) = result {
        // leftover temp files are harmless but noisy
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }

    Ok(())
}

/// Reads a JSON file written by [`write_json_atomic`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::ArtifactNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content).map_err(|source| AppError::JsonParseError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn writes_pretty_json_with_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("a.json");

        write_json_atomic(&path, &json!({"b": 1})).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n  \"b\": 1\n}\n");
        // only the target remains in the directory
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn overwrite_replaces_the_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");

        write_json_atomic(&path, &json!(["a long first version of the file"])).unwrap();
        write_json_atomic(&path, &json!([])).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[]\n");
    }

    #[test]
    fn missing_file_is_artifact_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<serde_json::Value, _> = read_json(&dir.path().join("none.json"));
        assert!(matches!(result, Err(AppError::ArtifactNotFound { .. })));
    }

    #[test]
    fn invalid_json_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();

        match read_json::<serde_json::Value>(&path) {
            Err(AppError::JsonParseError { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected JsonParseError, got {:?}", other),
        }
    }
}
