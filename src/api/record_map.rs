//! Client for Notion's unofficial page-chunk endpoint.
//!
//! Produces a [`RecordMap`] holding every block of a page plus signed
//! download URLs for its uploaded files. The session token is optional;
//! public pages load without it.

use super::client::extract_response_text;
use super::parser::parse_api_response;
use crate::constants::{REQUEST_INITIAL_BACKOFF, REQUEST_MAX_ATTEMPTS, REQUEST_MAX_BACKOFF};
use crate::error::AppError;
use crate::error_recovery::retry_with_backoff;
use crate::ingest::{attachment_file_id, page_from_record_map, RecordMap, RecordMapPage};
use crate::types::{PageId, SessionToken};
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::{json, Value};

const PRIVATE_API_BASE_URL: &str = "https://www.notion.so/api/v3";
const CHUNK_LIMIT: usize = 100;
/// Guards against a server that keeps returning a cursor.
const MAX_CHUNKS: u32 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageChunk {
    #[serde(default)]
    record_map: RecordMap,
    #[serde(default)]
    cursor: ChunkCursor,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkCursor {
    #[serde(default)]
    stack: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedUrls {
    #[serde(default)]
    signed_urls: Vec<Option<String>>,
}

/// A file source awaiting a signed URL.
#[derive(Debug, Clone, PartialEq)]
struct PendingFile {
    block_id: String,
    source: String,
}

#[derive(Clone)]
pub struct RecordMapClient {
    client: Client,
    base_url: String,
}

impl RecordMapClient {
    pub fn new(token: Option<&SessionToken>) -> Result<Self, AppError> {
        Self::with_base_url(token, PRIVATE_API_BASE_URL)
    }

    pub fn with_base_url(
        token: Option<&SessionToken>,
        base_url: impl Into<String>,
    ) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(token) = token {
            let cookie = format!("token_v2={}", token.as_str());
            headers.insert(
                header::COOKIE,
                header::HeaderValue::from_str(&cookie).map_err(|e| {
                    AppError::MissingConfiguration(format!("Invalid session token: {}", e))
                })?,
            );
        }

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Loads `page_id` and decodes it into a block tree.
    pub async fn fetch_page(&self, page_id: &PageId) -> Result<RecordMapPage, AppError> {
        let record_map = self.load_page(page_id).await?;
        page_from_record_map(&record_map, page_id)
    }

    /// Loads every chunk of `page_id` and signs its uploaded files.
    pub async fn load_page(&self, page_id: &PageId) -> Result<RecordMap, AppError> {
        let mut record_map = RecordMap::default();
        let mut stack: Vec<Value> = Vec::new();
        let mut chunk_number = 0u32;

        loop {
            let body = json!({
                "pageId": page_id.to_dashed(),
                "limit": CHUNK_LIMIT,
                "cursor": { "stack": stack },
                "chunkNumber": chunk_number,
                "verticalColumns": false,
            });
            let chunk: PageChunk = self.post("loadPageChunk", &body).await?;
            record_map.merge(chunk.record_map);
            chunk_number += 1;

            if chunk.cursor.stack.is_empty() {
                break;
            }
            if chunk_number >= MAX_CHUNKS {
                log::warn!(
                    "Page {} still had more chunks after {}; stopping",
                    page_id,
                    MAX_CHUNKS
                );
                break;
            }
            stack = chunk.cursor.stack;
        }

        log::debug!(
            "Loaded {} records for page {} in {} chunks",
            record_map.block.len(),
            page_id,
            chunk_number
        );

        self.sign_files(&mut record_map).await;
        Ok(record_map)
    }

    /// Fills `record_map.signed_urls` by block id and file id.
    ///
    /// A failed signing request leaves the table as it was; rendering then
    /// falls back to the remaining URL sources.
    async fn sign_files(&self, record_map: &mut RecordMap) {
        let pending = pending_files(record_map);
        if pending.is_empty() {
            return;
        }

        let urls: Vec<Value> = pending
            .iter()
            .map(|file| {
                json!({
                    "url": file.source,
                    "permissionRecord": { "table": "block", "id": file.block_id },
                })
            })
            .collect();

        let signed: SignedUrls = match self.post("getSignedFileUrls", &json!({ "urls": urls })).await {
            Ok(signed) => signed,
            Err(e) => {
                log::warn!("Could not sign {} file URLs: {}", pending.len(), e);
                return;
            }
        };

        for (file, url) in pending.iter().zip(signed.signed_urls) {
            let Some(url) = url else { continue };
            if let Some(file_id) = attachment_file_id(&file.source) {
                record_map.signed_urls.insert(file_id.to_string(), url.clone());
            }
            record_map.signed_urls.insert(file.block_id.clone(), url);
        }
    }

    async fn post<T>(&self, endpoint: &str, body: &Value) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        let url = url.as_str();

        retry_with_backoff(
            move || async move {
                log::debug!("POST {}", url);
                let response = self.client.post(url).json(body).send().await?;
                parse_api_response(extract_response_text(response).await?)
            },
            REQUEST_MAX_ATTEMPTS,
            REQUEST_INITIAL_BACKOFF,
            REQUEST_MAX_BACKOFF,
        )
        .await
    }
}

/// Sources that need signing: `attachment:` references and files hosted on
/// Notion's own storage.
fn pending_files(record_map: &RecordMap) -> Vec<PendingFile> {
    record_map
        .block_values()
        .filter_map(|value| {
            let block_id = value.get("id")?.as_str()?;
            let source = value
                .pointer("/properties/source/0/0")
                .and_then(Value::as_str)?;
            needs_signing(source).then(|| PendingFile {
                block_id: block_id.to_string(),
                source: source.to_string(),
            })
        })
        .collect()
}

fn needs_signing(source: &str) -> bool {
    attachment_file_id(source).is_some()
        || source.contains("secure.notion-static.com")
        || source.contains("prod-files-secure")
}
