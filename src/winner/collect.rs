//! Cursor pagination that degrades to a partial list on failure

use crate::twitter::{ApiError, IdsPage, UsersPage, FIRST_CURSOR};
use crate::utils::logging::LoggingHelper;
use std::future::Future;

/// Stop following cursors after this many pages
pub const MAX_PAGES: usize = 1000;

/// One page of results plus the cursor of the next page (`0` when done)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: i64,
}

impl From<UsersPage> for Page<crate::twitter::TwitterUser> {
    fn from(page: UsersPage) -> Self {
        Self {
            items: page.users,
            next_cursor: page.next_cursor,
        }
    }
}

impl From<IdsPage> for Page<u64> {
    fn from(page: IdsPage) -> Self {
        Self {
            items: page.ids,
            next_cursor: page.next_cursor,
        }
    }
}

/// Whatever was gathered, and what stopped the gathering early if anything did
#[derive(Debug)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub failure: Option<ApiError>,
    /// The page cap was hit before the last page
    pub truncated: bool,
}

impl<T> Collected<T> {
    #[must_use]
    pub fn complete(items: Vec<T>) -> Self {
        Self {
            items,
            failure: None,
            truncated: false,
        }
    }

    /// Wrap a single-request collection; an error yields an empty partial list
    pub fn from_result(collection: &str, result: Result<Vec<T>, ApiError>) -> Self {
        match result {
            Ok(items) => Self::complete(items),
            Err(err) => {
                LoggingHelper::log_partial_fetch(collection, 0, 0, &err);
                Self {
                    items: Vec::new(),
                    failure: Some(err),
                    truncated: false,
                }
            }
        }
    }

    #[must_use]
    pub fn incomplete(&self) -> bool {
        self.failure.is_some() || self.truncated
    }
}

/// Follow cursors from the first page until the API reports no more pages
///
/// An error keeps the items of every page fetched before it.
pub async fn collect_pages<T, F, Fut, P>(collection: &str, mut fetch: F) -> Collected<T>
where
    F: FnMut(i64) -> Fut,
    Fut: Future<Output = Result<P, ApiError>>,
    P: Into<Page<T>>,
{
    let mut items = Vec::new();
    let mut cursor = FIRST_CURSOR;

    for pages in 0..MAX_PAGES {
        match fetch(cursor).await {
            Ok(page) => {
                let page = page.into();
                items.extend(page.items);
                if page.next_cursor == 0 {
                    return Collected::complete(items);
                }
                cursor = page.next_cursor;
            }
            Err(err) => {
                LoggingHelper::log_partial_fetch(collection, pages, items.len(), &err);
                return Collected {
                    items,
                    failure: Some(err),
                    truncated: false,
                };
            }
        }
    }

    log::warn!("Stopped fetching {collection} after {MAX_PAGES} pages");
    Collected {
        items,
        failure: None,
        truncated: true,
    }
}
