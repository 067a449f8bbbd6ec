//! Response parsing for the official Notion API.
//!
//! Error bodies are decoded with notion-client's error type. Success bodies
//! are decoded as JSON and handed to the normalizers in [`crate::ingest`] and
//! [`super::notion_client_adapter`].

use super::client::ApiResponse;
use super::notion_client_adapter::{database_schema_from_api, page_metadata_from_api};
use super::responses::NotionError;
use super::types::PaginatedResponse;
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::{AppError, NotionClientError, NotionErrorCode};
use crate::ingest::block_from_api;
use crate::model::{Block, DatabaseSchema, PageMetadata};
use reqwest::StatusCode;
use serde_json::Value;

/// Parses a success body as `T`, or turns an error body into an [`AppError`].
pub fn parse_api_response<T>(result: ApiResponse<String>) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    if result.status.is_success() {
        parse_success(&result.data, &result.url)
    } else {
        parse_error(&result.data, result.status, &result.url)
    }
}

fn parse_success<T>(body: &str, url: &str) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to parse response from {}: {}", url, e);
        NotionClientError::Deserialization {
            source: e,
            body: preview(body),
        }
        .into()
    })
}

fn parse_error<T>(body: &str, status: StatusCode, url: &str) -> Result<T, AppError> {
    if let Ok(notion_error) = serde_json::from_str::<NotionError>(body) {
        log::debug!(
            "Notion error from {}: {} ({})",
            url,
            notion_error.code,
            notion_error.message
        );
        return Err(NotionClientError::NotionApi {
            status: notion_error.status,
            code: notion_error.code,
            message: notion_error.message,
            request_id: notion_error.request_id,
        }
        .into());
    }

    Err(AppError::NotionService {
        code: NotionErrorCode::from_http_status(status.as_u16()),
        message: format!("HTTP {} from {}: {}", status, url, preview(body)),
        status,
    })
}

fn preview(body: &str) -> String {
    if body.len() > ERROR_BODY_PREVIEW_LENGTH {
        let mut end = ERROR_BODY_PREVIEW_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

/// `GET /databases/{id}`.
pub fn parse_database_schema(result: ApiResponse<String>) -> Result<DatabaseSchema, AppError> {
    let value: Value = parse_api_response(result)?;
    database_schema_from_api(&value)
}

/// `GET /pages/{id}`.
pub fn parse_page_metadata(result: ApiResponse<String>) -> Result<PageMetadata, AppError> {
    let value: Value = parse_api_response(result)?;
    page_metadata_from_api(&value)
}

/// `POST /databases/{id}/query`. Entries that cannot be read are skipped with a warning.
pub fn parse_query_page(
    result: ApiResponse<String>,
) -> Result<PaginatedResponse<PageMetadata>, AppError> {
    let response: PaginatedResponse<Value> = parse_api_response(result)?;
    Ok(filter_convert(response, page_metadata_from_api, "database entry"))
}

/// `GET /blocks/{id}/children`. Blocks without an id are skipped with a warning.
pub fn parse_block_children(
    result: ApiResponse<String>,
) -> Result<PaginatedResponse<Block>, AppError> {
    let response: PaginatedResponse<Value> = parse_api_response(result)?;
    Ok(filter_convert(response, block_from_api, "block"))
}

fn filter_convert<T>(
    response: PaginatedResponse<Value>,
    convert: impl Fn(&Value) -> Result<T, AppError>,
    what: &str,
) -> PaginatedResponse<T> {
    let PaginatedResponse {
        object,
        results,
        next_cursor,
        has_more,
    } = response;

    let results = results
        .iter()
        .filter_map(|value| match convert(value) {
            Ok(item) => Some(item),
            Err(e) => {
                log::warn!("Skipping unreadable {}: {}", what, e);
                None
            }
        })
        .collect();

    PaginatedResponse {
        object,
        results,
        next_cursor,
        has_more,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: StatusCode, body: &str) -> ApiResponse<String> {
        ApiResponse {
            data: body.to_string(),
            status,
            url: "https://api.notion.com/v1/test".to_string(),
        }
    }

    #[test]
    fn notion_error_body_is_decoded() {
        let body = r#"{
            "object": "error",
            "status": 404,
            "code": "object_not_found",
            "message": "Could not find page with ID: abc123",
            "request_id": "req_123"
        }"#;

        let result: Result<Value, _> = parse_api_response(response(StatusCode::NOT_FOUND, body));
        match result {
            Err(AppError::NotionClient(NotionClientError::NotionApi { code, status, .. })) => {
                assert_eq!(code, "object_not_found");
                assert_eq!(status, 404);
            }
            other => panic!("Expected NotionApi error, got {:?}", other),
        }
    }

    #[test]
    fn non_json_error_falls_back_to_status() {
        let result: Result<Value, _> =
            parse_api_response(response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"));
        let err = result.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn block_children_skip_blocks_without_ids() {
        let body = r#"{
            "object": "list",
            "results": [
                {"id": "00000000000000000000000000000001", "type": "divider", "divider": {}},
                {"type": "divider", "divider": {}}
            ],
            "next_cursor": "abc",
            "has_more": true
        }"#;
        let page = parse_block_children(response(StatusCode::OK, body)).unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.next_cursor.as_deref(), Some("abc"));
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "가".repeat(400);
        let shortened = preview(&body);
        assert!(shortened.ends_with("..."));
        assert!(shortened.len() <= ERROR_BODY_PREVIEW_LENGTH + 3);
    }
}
