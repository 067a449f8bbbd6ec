//! Cursor pagination over async fetch closures.

use super::types::{PaginatedResponse, PaginationResult};
use crate::constants::NOTION_API_PAGE_SIZE;
use crate::error::AppError;

/// Drains a cursor-paginated listing, concatenating pages in order.
///
/// Stops when the provider reports no further pages. Any failed page fails
/// the whole listing so that callers never see a silently truncated result.
pub async fn fetch_all_pages_simple<T, F, Fut>(
    mut fetch_fn: F,
) -> Result<PaginationResult<T>, AppError>
where
    T: Send + 'static,
    F: FnMut(u32, Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<PaginatedResponse<T>, AppError>>,
{
    let mut all_items = Vec::new();
    let mut cursor = None;
    let mut pages_fetched = 0u32;

    loop {
        let response = fetch_fn(NOTION_API_PAGE_SIZE as u32, cursor.take()).await?;
        pages_fetched += 1;
        all_items.extend(response.results);

        match (response.has_more, response.next_cursor) {
            (true, Some(next)) => cursor = Some(next),
            (true, None) => {
                log::warn!("Listing reported more results without a cursor; stopping");
                break;
            }
            (false, _) => break,
        }
    }

    Ok(PaginationResult {
        total_fetched: all_items.len(),
        items: all_items,
        pages_fetched,
    })
}
