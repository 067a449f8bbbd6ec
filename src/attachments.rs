//! Attachment URL and display-name resolution.
//!
//! A media block may carry its download location in three places depending
//! on which API produced it. Resolution order, first match wins:
//!
//! 1. `attachment:<file id>:..` source → signed-URL table (file id, then block id)
//! 2. a plain absolute source URL, returned unchanged
//! 3. the nested file object URL (`external.url` / `file.url`)

use crate::ingest::{attachment_file_id, RecordMap, ATTACHMENT_PREFIX};
use crate::model::{MediaBlock, MediaKind, SignedUrlTable};
use crate::types::ValidatedUrl;
use serde_json::Value;

/// Text shown in place of a link when no URL could be resolved.
pub const INVALID_FILE_PLACEHOLDER: &str = "유효하지 않은 파일 URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved { url: String, display_name: String },
    Unresolved { display_name: String },
}

impl Resolution {
    pub fn url(&self) -> Option<&str> {
        match self {
            Resolution::Resolved { url, .. } => Some(url),
            Resolution::Unresolved { .. } => None,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Resolution::Resolved { display_name, .. }
            | Resolution::Unresolved { display_name } => display_name,
        }
    }
}

pub fn resolve_attachment(
    kind: MediaKind,
    media: &MediaBlock,
    signed_urls: Option<&SignedUrlTable>,
) -> Resolution {
    let display_name = media
        .display_name
        .clone()
        .unwrap_or_else(|| display_name(kind, media));

    match resolve_url(media, signed_urls) {
        Some(url) => Resolution::Resolved { url, display_name },
        None => {
            log::warn!(
                "No usable URL for {:?} block {}; rendering placeholder",
                kind,
                media.common.id
            );
            Resolution::Unresolved { display_name }
        }
    }
}

pub fn resolve_url(media: &MediaBlock, signed_urls: Option<&SignedUrlTable>) -> Option<String> {
    if let Some(source) = media.source.as_deref() {
        if source.starts_with(ATTACHMENT_PREFIX) {
            let signed = signed_urls.and_then(|table| {
                attachment_file_id(source)
                    .and_then(|file_id| table.get(file_id))
                    .or_else(|| table.get(media.common.id.as_str()))
            });
            if let Some(url) = signed.filter(|url| ValidatedUrl::is_valid(url)) {
                return Some(url.to_string());
            }
        } else if ValidatedUrl::is_valid(source) {
            return Some(source.to_string());
        }
    }

    media
        .file
        .as_ref()
        .map(|file| file.url.as_str())
        .filter(|url| ValidatedUrl::is_valid(url))
        .map(str::to_string)
}

/// Explicit file name, then nested file-object name, then a per-type label.
pub fn display_name(kind: MediaKind, media: &MediaBlock) -> String {
    non_blank(media.file_name.as_deref())
        .or_else(|| non_blank(media.file.as_ref().and_then(|f| f.name.as_deref())))
        .map(str::to_string)
        .unwrap_or_else(|| kind.fallback_label().to_string())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Looks up a download URL for `file_id` in a page's record map.
///
/// Tries the signed-URL table, then a block whose id is the file id and
/// whose source is a plain URL, then a block listing the id in `file_ids`.
pub fn find_file_url(record_map: &RecordMap, file_id: &str) -> Option<String> {
    let signed = record_map.signed_url_table();
    if let Some(url) = signed.get(file_id) {
        return Some(url.to_string());
    }

    let wanted = normalize(file_id);
    let values: Vec<&Value> = record_map.block_values().collect();

    let direct = values
        .iter()
        .filter(|value| block_id(value).is_some_and(|id| normalize(id) == wanted))
        .find_map(|value| plain_source(value));
    if direct.is_some() {
        return direct;
    }

    values.iter().find_map(|value| {
        let listed = value
            .get("file_ids")
            .and_then(Value::as_array)
            .is_some_and(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .any(|id| normalize(id) == wanted)
            });
        if !listed {
            return None;
        }
        block_id(value)
            .and_then(|id| signed.get(id))
            .map(str::to_string)
            .or_else(|| plain_source(value))
    })
}

fn block_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}

fn plain_source(value: &Value) -> Option<String> {
    value
        .get("properties")?
        .get("source")?
        .get(0)?
        .get(0)?
        .as_str()
        .filter(|source| !source.starts_with(ATTACHMENT_PREFIX))
        .filter(|source| ValidatedUrl::is_valid(source))
        .map(str::to_string)
}

fn normalize(id: &str) -> String {
    id.trim().replace('-', "").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileHosting, FileObject};
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn media(source: Option<&str>, file: Option<FileObject>) -> MediaBlock {
        MediaBlock {
            source: source.map(str::to_string),
            file,
            ..Default::default()
        }
    }

    #[test]
    fn attachment_source_uses_signed_table() {
        let table: SignedUrlTable = [("fileId", "https://x")].into_iter().collect();
        let block = media(Some("attachment:fileId:ignored"), None);
        assert_eq!(resolve_url(&block, Some(&table)).as_deref(), Some("https://x"));
    }

    #[test]
    fn plain_source_is_returned_unchanged() {
        let block = media(Some("https://example.com/a.png?x=1"), None);
        assert_eq!(
            resolve_url(&block, None).as_deref(),
            Some("https://example.com/a.png?x=1")
        );
    }

    #[test]
    fn nested_file_object_is_last_resort() {
        let file = FileObject {
            hosting: FileHosting::Notion,
            url: "https://files.example/report.pdf".to_string(),
            name: Some("report.pdf".to_string()),
        };
        let block = media(Some("attachment:missing:x"), Some(file));
        let resolution = resolve_attachment(MediaKind::Pdf, &block, Some(&SignedUrlTable::new()));
        assert_eq!(
            resolution,
            Resolution::Resolved {
                url: "https://files.example/report.pdf".to_string(),
                display_name: "report.pdf".to_string(),
            }
        );
    }

    #[test]
    fn nothing_usable_is_unresolved_with_fallback_label() {
        let block = media(Some("attachment:missing:x"), None);
        let resolution = resolve_attachment(MediaKind::File, &block, None);
        assert_eq!(resolution.url(), None);
        assert_eq!(resolution.display_name(), "첨부파일");
    }

    #[test]
    fn display_name_prefers_explicit_name() {
        let mut block = media(
            None,
            Some(FileObject {
                hosting: FileHosting::External,
                url: "https://e.example/f".to_string(),
                name: Some("nested.bin".to_string()),
            }),
        );
        assert_eq!(display_name(MediaKind::File, &block), "nested.bin");
        block.file_name = Some("explicit.bin".to_string());
        assert_eq!(display_name(MediaKind::File, &block), "explicit.bin");
        block.file_name = Some("  ".to_string());
        block.file = None;
        assert_eq!(display_name(MediaKind::Image, &block), "이미지");
    }

    fn record_map() -> RecordMap {
        let mut block = IndexMap::new();
        block.insert(
            "b1".to_string(),
            json!({"value": {"id": "b1", "type": "file",
                "properties": {"source": [["https://public.example/direct.zip"]]}}}),
        );
        block.insert(
            "b2".to_string(),
            json!({"value": {"id": "b2", "type": "file", "file_ids": ["f-2"],
                "properties": {"source": [["attachment:f-2:doc.pdf"]]}}}),
        );
        RecordMap {
            block,
            signed_urls: BTreeMap::from([
                ("f1".to_string(), "https://signed.example/f1".to_string()),
                ("b2".to_string(), "https://signed.example/b2".to_string()),
            ]),
        }
    }

    #[test]
    fn file_lookup_order() {
        let map = record_map();
        assert_eq!(
            find_file_url(&map, "f1").as_deref(),
            Some("https://signed.example/f1")
        );
        assert_eq!(
            find_file_url(&map, "b1").as_deref(),
            Some("https://public.example/direct.zip")
        );
        assert_eq!(
            find_file_url(&map, "f2").as_deref(),
            Some("https://signed.example/b2")
        );
        assert_eq!(find_file_url(&map, "nope"), None);
    }
}
