//! HTTP client for the official Notion API.
//!
//! Handles authentication and transient-failure retries. Parsing lives in
//! [`super::parser`].

use super::parser;
use super::types::{PaginatedResponse, StatusFilter};
use super::NotionRepository;
use crate::constants::{
    NOTION_API_PAGE_SIZE, REQUEST_INITIAL_BACKOFF, REQUEST_MAX_ATTEMPTS, REQUEST_MAX_BACKOFF,
};
use crate::error::AppError;
use crate::error_recovery::retry_with_backoff;
use crate::model::{Block, DatabaseSchema, PageMetadata};
use crate::types::{ApiKey, BlockId, DatabaseId, PageId};
use reqwest::{header, Client, Method, Response};
use serde_json::{json, Value};

const NOTION_VERSION: &str = "2022-06-28";
const API_BASE_URL: &str = "https://api.notion.com/v1";

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(api_key: &ApiKey) -> Result<Self, AppError> {
        Self::with_base_url(api_key, API_BASE_URL)
    }

    /// Same as [`Self::new`] against another endpoint, e.g. a local proxy.
    pub fn with_base_url(api_key: &ApiKey, base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );
        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_VERSION),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    /// Sends one request and parses it, retrying transient failures.
    async fn request<T>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        parse: fn(ApiResponse<String>) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let url = url.as_str();
        let method = &method;

        retry_with_backoff(
            move || async move {
                log::debug!("{} {}", method, url);
                let mut builder = self.client.request(method.clone(), url).query(query);
                if let Some(body) = body {
                    builder = builder.json(body);
                }
                let response = builder.send().await?;
                let result = extract_response_text(response).await?;
                if !result.status.is_success() {
                    log::debug!("{} {} returned {}", method, url, result.status);
                }
                parse(result)
            },
            REQUEST_MAX_ATTEMPTS,
            REQUEST_INITIAL_BACKOFF,
            REQUEST_MAX_BACKOFF,
        )
        .await
    }
}

#[async_trait::async_trait]
impl NotionRepository for NotionHttpClient {
    async fn retrieve_database(&self, id: &DatabaseId) -> Result<DatabaseSchema, AppError> {
        let endpoint = format!("databases/{}", id.to_dashed());
        log::info!("Retrieving database schema {}", id);
        self.request(Method::GET, &endpoint, &[], None, parser::parse_database_schema)
            .await
    }

    async fn query_database(
        &self,
        id: &DatabaseId,
        filter: Option<&StatusFilter>,
        cursor: Option<String>,
    ) -> Result<PaginatedResponse<PageMetadata>, AppError> {
        let endpoint = format!("databases/{}/query", id.to_dashed());
        let mut body = json!({ "page_size": NOTION_API_PAGE_SIZE });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }
        if let Some(filter) = filter {
            body["filter"] = filter.to_json();
        }
        log::debug!("Query body: {}", body);
        self.request(Method::POST, &endpoint, &[], Some(&body), parser::parse_query_page)
            .await
    }

    async fn retrieve_page(&self, id: &PageId) -> Result<PageMetadata, AppError> {
        let endpoint = format!("pages/{}", id.to_dashed());
        self.request(Method::GET, &endpoint, &[], None, parser::parse_page_metadata)
            .await
    }

    async fn list_block_children(
        &self,
        id: &BlockId,
        cursor: Option<String>,
    ) -> Result<PaginatedResponse<Block>, AppError> {
        let endpoint = format!("blocks/{}/children", id.to_dashed());
        let mut query = vec![("page_size", NOTION_API_PAGE_SIZE.to_string())];
        if let Some(cursor) = cursor {
            query.push(("start_cursor", cursor));
        }
        self.request(Method::GET, &endpoint, &query, None, parser::parse_block_children)
            .await
    }
}

/// Response body with the status and URL it came from.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: reqwest::StatusCode,
    pub url: String,
}

/// Reads the response body as text, keeping status and URL for error reports.
pub async fn extract_response_text(response: Response) -> Result<ApiResponse<String>, AppError> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ApiKey {
        ApiKey::new("secret_abcdefghijklmnopqrstuvwxyz").unwrap()
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = NotionHttpClient::with_base_url(&key(), "http://localhost:9000/v1/").unwrap();
        assert_eq!(client.base_url, "http://localhost:9000/v1");
    }

    #[test]
    fn headers_carry_bearer_and_version() {
        let headers = NotionHttpClient::create_headers(&key()).unwrap();
        assert_eq!(
            headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer secret_abcdefghijklmnopqrstuvwxyz"
        );
        assert_eq!(headers.get("Notion-Version").unwrap(), NOTION_VERSION);
    }
}
