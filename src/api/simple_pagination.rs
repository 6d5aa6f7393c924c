// src/api/simple_pagination.rs
//! Cursor pagination over Notion list endpoints.

use super::types::{PaginatedResponse, PaginationResult};
use crate::constants::NOTION_API_PAGE_SIZE;
use crate::error::AppError;

/// Fetches every page of a cursor-paginated endpoint.
///
/// `fetch_fn` receives the page size and the cursor of the page to fetch
/// (`None` for the first one).
pub async fn fetch_all_pages_simple<T, F, Fut>(
    mut fetch_fn: F,
    max_pages: Option<u32>,
) -> Result<PaginationResult<T>, AppError>
where
    F: FnMut(u32, Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<PaginatedResponse<T>, AppError>>,
{
    let mut all_items = Vec::new();
    let mut cursor = None;
    let mut pages_fetched = 0u32;

    loop {
        if let Some(max) = max_pages {
            if pages_fetched >= max {
                log::debug!("Reached maximum page limit: {}", max);
                break;
            }
        }

        let response = fetch_fn(NOTION_API_PAGE_SIZE as u32, cursor).await?;

        cursor = response.next_cursor;
        all_items.extend(response.results);
        pages_fetched += 1;

        if !response.has_more || cursor.is_none() {
            break;
        }
    }

    Ok(PaginationResult {
        items: all_items,
        pages_fetched,
    })
}
