// src/api/client.rs
//! Thin HTTP client for the Notion API.
//!
//! Handles authentication, per-workspace timeouts, pagination and retry of
//! transient network failures. Parsing lives in [`super::parser`].

use super::simple_pagination::fetch_all_pages_simple;
use super::types::DatabaseQuery;
use super::{parser, NotionRepository};
use crate::constants::{NOTION_API_BASE_URL, NOTION_VERSION};
use crate::error::AppError;
use crate::error_recovery::{retry_transient, RetryPolicy};
use crate::model::{Block, Page};
use crate::types::{ApiKey, BlockId, DatabaseId, PageId};
use reqwest::{header, Client, Method, Response};
use std::time::Duration;

/// An authenticated client for one Notion workspace.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl NotionHttpClient {
    /// Creates a client for the workspace `api_key` belongs to.
    pub fn new(api_key: &ApiKey, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: NOTION_API_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Points the client at another API root, e.g. a recording proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Creates the default headers for Notion API requests.
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

    /// Sends one request, retrying transient network failures, and returns
    /// the raw body with its status.
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse<String>, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let operation = format!("{} {}", method, endpoint);

        retry_transient(&operation, self.retry, || {
            log::debug!("{} {}", method, url);
            let mut request = self.client.request(method.clone(), &url);
            if let Some(body) = body {
                request = request.json(body);
            }
            async move {
                let response = request.send().await?;
                extract_response_text(response).await
            }
        })
        .await
    }
}

#[async_trait::async_trait]
impl NotionRepository for NotionHttpClient {
    async fn query_database(
        &self,
        database: &DatabaseId,
        query: &DatabaseQuery,
    ) -> Result<Vec<Page>, AppError> {
        let endpoint = format!("databases/{}/query", database.to_dashed());
        log::info!("Querying database {}", database);

        let result = fetch_all_pages_simple(
            |page_size, cursor| {
                let body = query.page_body(page_size, cursor.as_deref());
                let endpoint = endpoint.clone();
                async move {
                    let response = self.request(Method::POST, &endpoint, Some(&body)).await?;
                    parser::parse_pages_pagination(response)
                }
            },
            None,
        )
        .await?;

        log::debug!(
            "Database {} returned {} rows in {} page(s)",
            database,
            result.items.len(),
            result.pages_fetched
        );
        Ok(result.items)
    }

    async fn retrieve_page(&self, id: &PageId) -> Result<Page, AppError> {
        let endpoint = format!("pages/{}", id.to_dashed());
        let response = self.request(Method::GET, &endpoint, None).await?;
        parser::parse_page_response(response)
    }

    async fn update_page(
        &self,
        id: &PageId,
        properties: serde_json::Value,
    ) -> Result<Page, AppError> {
        let endpoint = format!("pages/{}", id.to_dashed());
        let body = serde_json::json!({ "properties": properties });
        let response = self.request(Method::PATCH, &endpoint, Some(&body)).await?;
        parser::parse_page_response(response)
    }

    async fn retrieve_children(&self, parent: &BlockId) -> Result<Vec<Block>, AppError> {
        let base_endpoint = format!("blocks/{}/children", parent.to_dashed());

        let result = fetch_all_pages_simple(
            |page_size, cursor| {
                let endpoint = match cursor {
                    Some(c) => format!(
                        "{}?page_size={}&start_cursor={}",
                        base_endpoint, page_size, c
                    ),
                    None => format!("{}?page_size={}", base_endpoint, page_size),
                };
                async move {
                    let response = self.request(Method::GET, &endpoint, None).await?;
                    parser::parse_blocks_pagination(response)
                }
            },
            None,
        )
        .await?;

        Ok(result.items)
    }
}

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: reqwest::StatusCode,
    pub url: String,
}

/// Extracts the response body as text with metadata.
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
