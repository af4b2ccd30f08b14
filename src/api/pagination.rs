use std::collections::HashSet;
use std::future::Future;

use crate::error::{GhSubError, GhSubResult};
use crate::models::Connection;

/// One page of a cursor-paginated listing.
#[derive(Debug)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub end_cursor: Option<String>,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn from_connection(connection: Connection<T>) -> Self {
        Self {
            records: connection.nodes,
            end_cursor: connection.page_info.end_cursor,
            has_next: connection.page_info.has_next_page,
        }
    }

    pub fn last(records: Vec<T>) -> Self {
        Self {
            records,
            end_cursor: None,
            has_next: false,
        }
    }
}

/// Walk a paginated listing to completion: exactly one fetch per page, records
/// concatenated in order, stopping when the server reports no next page. A
/// cursor that repeats, or more than `max_pages` pages, is malformed
/// pagination and fails rather than looping. Per-page retry is the fetch
/// closure's concern; its errors propagate unchanged.
pub async fn collect_all<T, F, Fut>(mut fetch: F, max_pages: usize) -> GhSubResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = GhSubResult<Page<T>>>,
{
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut seen_cursors: HashSet<String> = HashSet::new();
    let mut pages = 0usize;

    loop {
        if pages >= max_pages {
            return Err(GhSubError::PaginationLoop { pages });
        }

        let page = fetch(cursor.clone()).await?;
        pages += 1;
        records.extend(page.records);

        if !page.has_next {
            return Ok(records);
        }

        match page.end_cursor {
            Some(next) => {
                if !seen_cursors.insert(next.clone()) {
                    return Err(GhSubError::PaginationLoop { pages });
                }
                cursor = Some(next);
            }
            None => {
                return Err(GhSubError::MalformedResponse(
                    "hasNextPage is true but endCursor is missing".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn paged(records: &[u32], per_page: usize) -> Vec<Page<u32>> {
        let chunks: Vec<&[u32]> = records.chunks(per_page.max(1)).collect();
        let total = chunks.len().max(1);
        let mut pages = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            pages.push(Page {
                records: chunk.to_vec(),
                end_cursor: Some(format!("c{}", i)),
                has_next: i + 1 < total,
            });
        }
        if pages.is_empty() {
            pages.push(Page::last(vec![]));
        }
        pages
    }

    async fn walk(pages: Vec<Page<u32>>, max_pages: usize) -> (GhSubResult<Vec<u32>>, u32) {
        let fetches = Cell::new(0u32);
        let pages = std::cell::RefCell::new(pages.into_iter());
        let result = collect_all(
            |_cursor| {
                fetches.set(fetches.get() + 1);
                let page = pages.borrow_mut().next();
                async move {
                    page.ok_or_else(|| GhSubError::Unknown("ran out of pages".to_string()))
                }
            },
            max_pages,
        )
        .await;
        (result, fetches.get())
    }

    #[tokio::test]
    async fn returns_all_records_in_order_for_any_split() {
        let records: Vec<u32> = (0..17).collect();
        for per_page in [1usize, 3, 5, 16, 17, 50] {
            let pages = paged(&records, per_page);
            let expected_fetches = records.len().div_ceil(per_page) as u32;
            let (result, fetches) = walk(pages, 100).await;
            assert_eq!(result.unwrap(), records);
            assert_eq!(fetches, expected_fetches, "per_page={}", per_page);
        }
    }

    #[tokio::test]
    async fn empty_listing_is_one_fetch() {
        let (result, fetches) = walk(vec![Page::last(vec![])], 100).await;
        assert!(result.unwrap().is_empty());
        assert_eq!(fetches, 1);
    }

    #[tokio::test]
    async fn repeated_cursor_is_a_pagination_loop() {
        let pages = vec![
            Page {
                records: vec![1],
                end_cursor: Some("same".to_string()),
                has_next: true,
            },
            Page {
                records: vec![2],
                end_cursor: Some("same".to_string()),
                has_next: true,
            },
        ];
        let (result, _) = walk(pages, 100).await;
        assert!(matches!(result, Err(GhSubError::PaginationLoop { .. })));
    }

    #[tokio::test]
    async fn page_ceiling_is_a_pagination_loop() {
        let pages: Vec<Page<u32>> = (0..10)
            .map(|i| Page {
                records: vec![i],
                end_cursor: Some(format!("c{}", i)),
                has_next: true,
            })
            .collect();
        let (result, fetches) = walk(pages, 4).await;
        assert!(matches!(result, Err(GhSubError::PaginationLoop { pages: 4 })));
        assert_eq!(fetches, 4);
    }

    #[tokio::test]
    async fn missing_cursor_with_next_page_is_malformed() {
        let pages = vec![Page {
            records: vec![1u32],
            end_cursor: None,
            has_next: true,
        }];
        let (result, _) = walk(pages, 100).await;
        assert!(matches!(result, Err(GhSubError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn fetch_error_propagates() {
        let pages = vec![Page {
            records: vec![1u32],
            end_cursor: Some("c0".to_string()),
            has_next: true,
        }];
        // Second fetch runs out and fails; the walker surfaces it unchanged.
        let (result, fetches) = walk(pages, 100).await;
        assert!(matches!(result, Err(GhSubError::Unknown(_))));
        assert_eq!(fetches, 2);
    }
}
