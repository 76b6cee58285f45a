//! Cancelable query primitive and paging helpers.
//!
//! [`CancelableQuery`] is the one place that decides whether a response may
//! touch visible state. Page-level controllers wrap it instead of repeating
//! the abort/stale bookkeeping.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reelscope_api::{ApiError, ResultPage};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::request::LatestRequest;

/// Message recorded when page 0 is requested.
pub(crate) const INVALID_PAGE: &str = "Page numbers start at 1";

/// How a query run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The response replaced the visible value.
    Applied,
    /// A newer request superseded this one; the response was dropped.
    Stale,
    /// The request was cancelled. Not an error.
    Aborted,
    /// The request failed; the message is in the error slot.
    Failed(String),
    /// Input was rejected before any network call.
    Rejected(String),
}

impl QueryOutcome {
    /// Whether the visible value changed.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// User-visible message for failed or rejected runs.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Failed(m) | Self::Rejected(m) => Some(m),
            Self::Applied | Self::Stale | Self::Aborted => None,
        }
    }
}

#[derive(Debug)]
struct QueryState<T> {
    latest: LatestRequest,
    value: Option<T>,
    loading: bool,
    error: Option<String>,
}

/// Value slot fed by cancelable requests, with loading and error state.
///
/// Cloning yields another handle to the same slot.
#[derive(Debug)]
pub struct CancelableQuery<T> {
    state: Arc<Mutex<QueryState<T>>>,
}

impl<T> Clone for CancelableQuery<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for CancelableQuery<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CancelableQuery<T> {
    /// Creates an empty, idle slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueryState {
                latest: LatestRequest::new(),
                value: None,
                loading: false,
                error: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueryState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `fetch` as the new current request.
    ///
    /// The previous request is cancelled first. `fetch` receives the token
    /// for the network call and is additionally raced against it, so a
    /// cancelled run ends promptly even if the transport ignores the token.
    pub async fn run<F, Fut>(&self, fetch: F) -> QueryOutcome
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = reelscope_api::Result<T>>,
    {
        let ticket = {
            let mut state = self.lock();
            let ticket = state.latest.begin();
            state.loading = true;
            state.error = None;
            ticket
        };
        let token = ticket.token().clone();

        let result = tokio::select! {
            biased;
            () = token.cancelled() => Err(ApiError::Aborted),
            result = fetch(token.clone()) => result,
        };

        let mut state = self.lock();
        let current = state.latest.is_current(&ticket);

        if matches!(&result, Err(err) if err.is_aborted()) {
            if current {
                state.latest.finish(&ticket);
                state.loading = false;
            }
            return QueryOutcome::Aborted;
        }
        if !current {
            debug!(generation = ticket.generation(), "discarding stale response");
            return QueryOutcome::Stale;
        }

        state.latest.finish(&ticket);
        state.loading = false;
        match result {
            Ok(value) => {
                state.value = Some(value);
                QueryOutcome::Applied
            }
            Err(err) => {
                let message = err
                    .user_message()
                    .unwrap_or_else(|| String::from("Request failed"));
                state.error = Some(message.clone());
                QueryOutcome::Failed(message)
            }
        }
    }

    /// Supersedes any in-flight request and records a validation failure.
    pub fn reject(&self, message: impl Into<String>) -> QueryOutcome {
        let message = message.into();
        let mut state = self.lock();
        state.latest.cancel();
        state.loading = false;
        state.error = Some(message.clone());
        QueryOutcome::Rejected(message)
    }

    /// Records an error from an operation outside [`CancelableQuery::run`],
    /// such as a mutation on the listed items.
    pub fn set_error(&self, message: impl Into<String>) {
        self.lock().error = Some(message.into());
    }

    /// Cancels the in-flight request. Its response will not be applied.
    pub fn cancel(&self) {
        let mut state = self.lock();
        state.latest.cancel();
        state.loading = false;
    }

    /// Cancels and clears value and error.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.latest.cancel();
        state.loading = false;
        state.value = None;
        state.error = None;
    }

    /// Mutates the current value in place, if there is one.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        if let Some(value) = self.lock().value.as_mut() {
            f(value);
        }
    }

    /// Reads the current value without cloning.
    pub fn with_value<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.lock().value.as_ref())
    }

    /// Whether a request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// Current error message.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }
}

impl<T: Clone> CancelableQuery<T> {
    /// Clone of the current value.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.lock().value.clone()
    }
}

// --- Paged listings ---

/// Bounded view over one fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Current page, within `1..=total_pages`.
    pub page: u32,
    /// Total pages, at least 1.
    pub total_pages: u32,
    /// Total results reported by the server.
    pub total_results: u64,
}

impl<T> PageView<T> {
    /// Normalises a server page so that `1 <= page <= max(total_pages, 1)`.
    #[must_use]
    pub fn from_page(page: ResultPage<T>) -> Self {
        let total_pages = page.total_pages.max(1);
        Self {
            items: page.results,
            page: page.page.clamp(1, total_pages),
            total_pages,
            total_results: page.total_results,
        }
    }

    /// Whether the "previous" control is enabled.
    #[must_use]
    pub const fn can_prev(&self) -> bool {
        self.page > 1
    }

    /// Whether the "next" control is enabled.
    #[must_use]
    pub const fn can_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Previous page number, `None` at the lower bound.
    #[must_use]
    pub const fn prev_page(&self) -> Option<u32> {
        if self.can_prev() {
            self.page.checked_sub(1)
        } else {
            None
        }
    }

    /// Next page number, `None` at the upper bound.
    #[must_use]
    pub const fn next_page(&self) -> Option<u32> {
        if self.can_next() {
            self.page.checked_add(1)
        } else {
            None
        }
    }

    /// Whether the page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// [`CancelableQuery`] over result pages that remembers the last-requested
/// parameters.
#[derive(Debug)]
pub struct PagedQuery<P, T> {
    params: Arc<Mutex<Option<P>>>,
    query: CancelableQuery<PageView<T>>,
}

impl<P, T> Clone for PagedQuery<P, T> {
    fn clone(&self) -> Self {
        Self {
            params: Arc::clone(&self.params),
            query: self.query.clone(),
        }
    }
}

impl<P: Clone, T> Default for PagedQuery<P, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Clone, T> PagedQuery<P, T> {
    /// Creates an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: Arc::new(Mutex::new(None)),
            query: CancelableQuery::new(),
        }
    }

    /// Records `params` as last requested and runs `fetch` with them.
    pub async fn run<F, Fut>(&self, params: P, fetch: F) -> QueryOutcome
    where
        F: FnOnce(P, CancellationToken) -> Fut,
        Fut: Future<Output = reelscope_api::Result<ResultPage<T>>>,
    {
        *self.params.lock().unwrap_or_else(PoisonError::into_inner) = Some(params.clone());
        self.query
            .run(move |token| {
                let fetching = fetch(params, token);
                async move { fetching.await.map(PageView::from_page) }
            })
            .await
    }

    /// Last-requested parameters.
    #[must_use]
    pub fn params(&self) -> Option<P> {
        self.params
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Underlying value slot.
    #[must_use]
    pub const fn query(&self) -> &CancelableQuery<PageView<T>> {
        &self.query
    }

    /// Current page number, if a page has been applied.
    #[must_use]
    pub fn page(&self) -> Option<u32> {
        self.query.with_value(|v| v.map(|view| view.page))
    }

    /// `page` clamped to the shown page's `total_pages`. `None` for page 0.
    #[must_use]
    pub fn checked_page(&self, page: u32) -> Option<u32> {
        if page == 0 {
            return None;
        }
        Some(self.query.with_value(|v| v.map_or(page, |view| page.min(view.total_pages))))
    }

    /// Next page number, unless at the bound or loading.
    #[must_use]
    pub fn next_page(&self) -> Option<u32> {
        if self.query.is_loading() {
            return None;
        }
        self.query.with_value(|v| v.and_then(PageView::next_page))
    }

    /// Previous page number, unless at the bound or loading.
    #[must_use]
    pub fn prev_page(&self) -> Option<u32> {
        if self.query.is_loading() {
            return None;
        }
        self.query.with_value(|v| v.and_then(PageView::prev_page))
    }
}

impl<P, T: Clone> PagedQuery<P, T> {
    /// Clone of the current page view.
    #[must_use]
    pub fn view(&self) -> Option<PageView<T>> {
        self.query.value()
    }
}

// --- Local windowing ---

/// Client-side pager over an already-fetched collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalPager {
    page_index: usize,
    page_size: usize,
}

impl LocalPager {
    /// Creates a pager at page 1. A zero `page_size` is treated as 1.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            page_index: 1,
            page_size: page_size.max(1),
        }
    }

    /// Current page (1-based).
    #[must_use]
    pub const fn page_index(&self) -> usize {
        self.page_index
    }

    /// Items per page.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages for `len` items, at least 1.
    #[must_use]
    pub const fn total_pages(&self, len: usize) -> usize {
        let pages = len.div_ceil(self.page_size);
        if pages == 0 { 1 } else { pages }
    }

    /// Items on the current page: `items[(page_index-1)*page_size ..][..page_size]`.
    #[must_use]
    pub fn window<'a, U>(&self, items: &'a [U]) -> &'a [U] {
        let start = self
            .page_index
            .saturating_sub(1)
            .saturating_mul(self.page_size);
        let end = start.saturating_add(self.page_size).min(items.len());
        items.get(start..end).unwrap_or(&[])
    }

    /// Advances one page. Returns `false` at the last page.
    pub fn next(&mut self, len: usize) -> bool {
        if self.page_index < self.total_pages(len) {
            self.page_index = self.page_index.saturating_add(1);
            true
        } else {
            false
        }
    }

    /// Goes back one page. Returns `false` at page 1.
    pub const fn prev(&mut self) -> bool {
        if self.page_index > 1 {
            self.page_index = self.page_index.saturating_sub(1);
            true
        } else {
            false
        }
    }

    /// Returns to page 1.
    pub const fn reset(&mut self) {
        self.page_index = 1;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::time::Duration;

    use super::*;

    fn page(n: u32, total: u32) -> ResultPage<u32> {
        ResultPage {
            results: vec![n],
            page: n,
            total_pages: total,
            total_results: u64::from(total),
        }
    }

    #[test]
    fn test_page_view_bounds() {
        // Arrange
        let first = PageView::from_page(page(1, 3));
        let last = PageView::from_page(page(3, 3));

        // Act & Assert
        assert!(!first.can_prev());
        assert_eq!(first.prev_page(), None);
        assert_eq!(first.next_page(), Some(2));
        assert!(!last.can_next());
        assert_eq!(last.next_page(), None);
        assert_eq!(last.prev_page(), Some(2));
    }

    #[test]
    fn test_page_view_clamps_out_of_range_server_values() {
        // Arrange
        let zero_pages = ResultPage {
            results: Vec::<u32>::new(),
            page: 0,
            total_pages: 0,
            total_results: 0,
        };

        // Act
        let view = PageView::from_page(zero_pages);
        let beyond = PageView::from_page(page(9, 4));

        // Assert
        assert_eq!(view.page, 1);
        assert_eq!(view.total_pages, 1);
        assert!(!view.can_prev() && !view.can_next());
        assert_eq!(beyond.page, 4);
    }

    #[test]
    fn test_local_pager_windows_without_overrun() {
        // Arrange
        let items = [1, 2, 3, 4, 5];
        let mut pager = LocalPager::new(2);

        // Act & Assert
        assert_eq!(pager.total_pages(items.len()), 3);
        assert_eq!(pager.window(&items), &[1, 2]);
        assert!(pager.next(items.len()));
        assert!(pager.next(items.len()));
        assert_eq!(pager.window(&items), &[5]);
        assert!(!pager.next(items.len()));
        assert_eq!(pager.page_index(), 3);
        assert!(pager.prev());
        pager.reset();
        assert!(!pager.prev());
        assert_eq!(pager.page_index(), 1);
    }

    #[test]
    fn test_local_pager_empty_collection() {
        // Arrange
        let items: [u8; 0] = [];
        let mut pager = LocalPager::new(1);

        // Act & Assert
        assert_eq!(pager.total_pages(0), 1);
        assert!(pager.window(&items).is_empty());
        assert!(!pager.next(0));
    }

    #[tokio::test]
    async fn test_run_applies_current_response() {
        // Arrange
        let query = CancelableQuery::<u32>::new();

        // Act
        let outcome = query.run(|_| async { Ok(7) }).await;

        // Assert
        assert_eq!(outcome, QueryOutcome::Applied);
        assert_eq!(query.value(), Some(7));
        assert!(!query.is_loading());
        assert!(query.error().is_none());
    }

    #[tokio::test]
    async fn test_superseded_run_never_overwrites_newer_value() {
        // Arrange
        let query = CancelableQuery::<&'static str>::new();

        // Act: R1 is slow, R2 starts later and resolves first.
        let (first, second) = tokio::join!(
            query.run(|_| async {
                tokio::time::sleep(Duration::from_millis(80)).await;
                Ok("r1")
            }),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                query.run(|_| async { Ok("r2") }).await
            }
        );

        // Assert
        assert_eq!(first, QueryOutcome::Aborted);
        assert_eq!(second, QueryOutcome::Applied);
        assert_eq!(query.value(), Some("r2"));
        assert!(query.error().is_none());
    }

    #[tokio::test]
    async fn test_failure_sets_error_and_abort_does_not() {
        // Arrange
        let query = CancelableQuery::<u32>::new();

        // Act
        let failed = query
            .run(|_| async { Err(ApiError::from_status(500, None)) })
            .await;
        let aborted = query.run(|_| async { Err(ApiError::Aborted) }).await;

        // Assert
        assert_eq!(failed, QueryOutcome::Failed(String::from("Request failed")));
        assert_eq!(aborted, QueryOutcome::Aborted);
        assert!(query.error().is_none());
        assert!(!query.is_loading());
    }

    #[tokio::test]
    async fn test_cancel_during_flight_is_aborted() {
        // Arrange
        let query = CancelableQuery::<u32>::new();

        // Act
        let (outcome, ()) = tokio::join!(
            query.run(|_| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(1)
            }),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                query.cancel();
            }
        );

        // Assert
        assert_eq!(outcome, QueryOutcome::Aborted);
        assert!(query.value().is_none());
        assert!(!query.is_loading());
    }

    #[test]
    fn test_reject_records_message() {
        // Arrange
        let query = CancelableQuery::<u32>::new();

        // Act
        let outcome = query.reject("Please enter a search term");

        // Assert
        assert_eq!(outcome.message(), Some("Please enter a search term"));
        assert_eq!(query.error().as_deref(), Some("Please enter a search term"));
    }

    #[tokio::test]
    async fn test_paged_query_remembers_params_and_bounds() {
        // Arrange
        let paged = PagedQuery::<u32, u32>::new();

        // Act
        let outcome = paged.run(2, |p, _| async move { Ok(page(p, 2)) }).await;

        // Assert
        assert!(outcome.is_applied());
        assert_eq!(paged.params(), Some(2));
        assert_eq!(paged.page(), Some(2));
        assert_eq!(paged.next_page(), None);
        assert_eq!(paged.prev_page(), Some(1));
        assert_eq!(paged.view().unwrap().items, vec![2]);
    }

    #[tokio::test]
    async fn test_default_paged_query_starts_empty() {
        // Arrange
        let paged = PagedQuery::<String, u32>::default();

        // Act
        let outcome = paged
            .run(String::from("q"), |_, _| async move { Ok(page(1, 3)) })
            .await;

        // Assert
        assert!(outcome.is_applied());
        assert_eq!(paged.params().as_deref(), Some("q"));
        assert_eq!(paged.next_page(), Some(2));
    }

    #[tokio::test]
    async fn test_checked_page_rejects_zero_and_clamps_to_total() {
        // Arrange
        let paged = PagedQuery::<u32, u32>::new();

        // Act & Assert
        assert_eq!(paged.checked_page(0), None);
        assert_eq!(paged.checked_page(7), Some(7));
        paged.run(1, |p, _| async move { Ok(page(p, 3)) }).await;
        assert_eq!(paged.checked_page(0), None);
        assert_eq!(paged.checked_page(2), Some(2));
        assert_eq!(paged.checked_page(7), Some(3));
    }
}
