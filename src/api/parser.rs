// src/api/parser.rs
//! Turns raw Notion API responses into domain values or typed errors.

use super::client::ApiResponse;
use super::types::PaginatedResponse;
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::{AppError, NotionErrorCode};
use crate::model::{Block, Page};
use serde::Deserialize;

/// Error body the Notion API returns with non-2xx statuses.
#[derive(Debug, Deserialize)]
struct NotionErrorBody {
    code: String,
    message: String,
}

/// Parse any Notion API response: a success body into `T`, an error body
/// into [`AppError::NotionService`].
pub fn parse_api_response<T>(result: ApiResponse<String>) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    if result.status.is_success() {
        serde_json::from_str(&result.data).map_err(|e| {
            log::error!("Failed to parse response from {}: {}", result.url, e);
            AppError::MalformedResponse(format!(
                "{} (body: {})",
                e,
                preview(&result.data)
            ))
        })
    } else {
        Err(parse_error_body(&result))
    }
}

fn parse_error_body(result: &ApiResponse<String>) -> AppError {
    match serde_json::from_str::<NotionErrorBody>(&result.data) {
        Ok(body) => AppError::NotionService {
            code: NotionErrorCode::from_api_response(&body.code),
            message: body.message,
            status: result.status,
        },
        Err(_) => AppError::NotionService {
            code: NotionErrorCode::from_http_status(result.status.as_u16()),
            message: format!("HTTP {} from {}", result.status, result.url),
            status: result.status,
        },
    }
}

fn preview(body: &str) -> String {
    match body.char_indices().nth(ERROR_BODY_PREVIEW_LENGTH) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

pub fn parse_page_response(result: ApiResponse<String>) -> Result<Page, AppError> {
    parse_api_response(result)
}

pub fn parse_pages_pagination(
    result: ApiResponse<String>,
) -> Result<PaginatedResponse<Page>, AppError> {
    parse_api_response(result)
}

pub fn parse_blocks_pagination(
    result: ApiResponse<String>,
) -> Result<PaginatedResponse<Block>, AppError> {
    parse_api_response(result)
}
