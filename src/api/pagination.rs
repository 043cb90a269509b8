// src/api/pagination.rs
//! Offset pagination over Confluence listing endpoints.

use crate::error::AppError;

/// Result of a pagination operation.
#[derive(Debug, Clone)]
pub struct PaginationResult<T> {
    pub items: Vec<T>,
    /// Number of round trips it took
    pub requests: usize,
}

/// Fetches every page of a listing, in response order.
///
/// `fetch_page(start, limit)` is called with `start = 0, limit, 2*limit, ...`
/// until a page comes back with fewer than `limit` records. The offset
/// always advances by `limit`, never by the number actually received, so a
/// short page in the middle of a listing ends it. An exact multiple of
/// `limit` costs one extra, empty round trip.
///
/// Any error aborts the whole collection; nothing collected so far is returned.
pub async fn collect_all<T, F, Fut>(
    page_size: usize,
    mut fetch_page: F,
) -> Result<PaginationResult<T>, AppError>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: std::future::Future<Output = Result<Vec<T>, AppError>>,
{
    let limit = if page_size == 0 {
        log::warn!("Page size 0 requested; using 1");
        1
    } else {
        page_size
    };

    let mut all_items = Vec::new();
    let mut start = 0usize;
    let mut requests = 0usize;

    loop {
        let batch = fetch_page(start, limit).await?;
        requests += 1;

        let received = batch.len();
        all_items.extend(batch);

        if received < limit {
            break;
        }
        start += limit;
    }

    log::debug!(
        "Collected {} records in {} request(s)",
        all_items.len(),
        requests
    );

    Ok(PaginationResult {
        items: all_items,
        requests,
    })
}
