//! Lazy, bounded pagination over catalog APIs.
//!
//! Both supported protocols reduce to the same loop: request a page at some
//! offset, emit its items, advance the offset by the page size, and stop on
//! an empty page, on an exhausted server-reported total, or on the page
//! ceiling. [`paginate`] implements that loop once as a stream; protocol
//! clients only implement [`PageFetcher`] to turn a [`PageRequest`] into a
//! [`Page`].
//!
//! The returned stream is finite and owns its fetcher. It cannot be rewound:
//! harvesting the same source again requires a fresh call to [`paginate`].
//!
//! # Error policy
//!
//! Pagination never panics and never surfaces an error mid-sequence:
//! - [`AppError::NotFound`] ends the stream quietly after a warning, because
//!   absent domains are routine when enumerating many portals.
//! - Any other error is yielded once as the final `Err` element, so callers
//!   can record why their sequence is short. Nothing is fetched after it.

use std::future::Future;

use futures::stream::{self, BoxStream, StreamExt};

use crate::error::AppError;

/// Offset-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based index of the first item requested (`offset` / `start`).
    pub offset: usize,
    /// Number of items requested (`limit` / `rows`).
    pub size: usize,
}

/// One page of raw items.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total result count reported by the server, when the protocol has one.
    pub total: Option<usize>,
    /// Entries the server returned that could not be decoded into `T`.
    ///
    /// A page with no items but some skipped entries is not the end of the
    /// sequence.
    pub skipped: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            total: None,
            skipped: 0,
        }
    }

    pub fn with_total(items: Vec<T>, total: usize) -> Self {
        Self {
            items,
            total: Some(total),
            skipped: 0,
        }
    }

    pub fn with_skipped(mut self, skipped: usize) -> Self {
        self.skipped = skipped;
        self
    }
}

/// Page size and page ceiling for one pagination run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationLimits {
    pub page_size: usize,
    pub max_pages: usize,
}

impl PaginationLimits {
    pub fn new(page_size: usize, max_pages: usize) -> Self {
        Self {
            page_size,
            max_pages,
        }
    }

    /// Clamps the page size into `1..=protocol_max`.
    pub fn clamped(self, protocol_max: usize) -> Self {
        Self {
            page_size: self.page_size.clamp(1, protocol_max.max(1)),
            max_pages: self.max_pages,
        }
    }
}

/// Fetches a single page from a catalog API.
///
/// Implementations perform exactly one attempt per call.
pub trait PageFetcher: Send + Sync {
    /// Raw, source-native item type.
    type Item: Send;

    /// Human-readable label for log lines (domain or base URL).
    fn label(&self) -> String;

    fn fetch_page(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Page<Self::Item>, AppError>> + Send;
}

struct PaginationState<F> {
    fetcher: F,
    next_offset: usize,
    pages_fetched: usize,
    limits: PaginationLimits,
    exhausted: bool,
}

/// Streams every item of a paginated source, lazily, one page at a time.
///
/// A page is only requested once the consumer has drained the previous one,
/// so dropping the stream early (e.g. after `take(n)`) stops network traffic.
pub fn paginate<F>(
    fetcher: F,
    start: usize,
    limits: PaginationLimits,
) -> BoxStream<'static, Result<F::Item, AppError>>
where
    F: PageFetcher + 'static,
    F::Item: 'static,
{
    let state = PaginationState {
        fetcher,
        next_offset: start,
        pages_fetched: 0,
        limits,
        exhausted: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.exhausted {
            return None;
        }
        if state.pages_fetched >= state.limits.max_pages {
            tracing::debug!(
                source = %state.fetcher.label(),
                pages = state.pages_fetched,
                "Page ceiling reached"
            );
            return None;
        }

        let request = PageRequest {
            offset: state.next_offset,
            size: state.limits.page_size,
        };
        state.pages_fetched += 1;

        match state.fetcher.fetch_page(request).await {
            Ok(page) => {
                if page.items.is_empty() && page.skipped == 0 {
                    return None;
                }
                if let Some(total) = page.total {
                    if request.offset + request.size >= total {
                        state.exhausted = true;
                    }
                }
                state.next_offset += request.size;
                let items: Vec<Result<F::Item, AppError>> =
                    page.items.into_iter().map(Ok).collect();
                Some((items, state))
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    source = %state.fetcher.label(),
                    "Not found in catalog API, skipping"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    source = %state.fetcher.label(),
                    offset = request.offset,
                    error = %e,
                    "Page request failed, stopping pagination"
                );
                state.exhausted = true;
                Some((vec![Err(e)], state))
            }
        }
    })
    .flat_map(stream::iter)
    .boxed()
}
