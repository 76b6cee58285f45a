//! Search/discover page controller.
//!
//! One result list fed by two query modes. A non-blank keyword selects
//! keyword search; otherwise the structured filters drive discovery. Every
//! transition resets to page 1 and supersedes the request in flight.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use reelscope_api::{
    DiscoverParams, LocalBackendApi, MediaSummary, MediaType, SearchParams, SortKey, genres_for,
};
use tracing::instrument;

use crate::locale::Locale;
use crate::paged::{INVALID_PAGE, PageView, PagedQuery, QueryOutcome};

/// Message recorded when a blank keyword is submitted.
const EMPTY_KEYWORD: &str = "Please enter a search term";

/// Which backend operation a query uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Free-text search.
    Keyword,
    /// Structured discovery.
    Filtered,
}

/// Filter panel values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    /// Selected genre IDs.
    pub genre_ids: BTreeSet<u32>,
    /// Sort order.
    pub sort_key: SortKey,
    /// Release year.
    pub year: Option<u32>,
    /// Earliest release date.
    pub date_from: Option<NaiveDate>,
    /// Latest release date.
    pub date_to: Option<NaiveDate>,
}

/// Everything the controller last asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameters {
    /// Media type.
    pub media_type: MediaType,
    /// Trimmed, non-empty keyword; `None` in filtered mode.
    pub keyword: Option<String>,
    /// Year, shared by both modes.
    pub year: Option<u32>,
    /// Genre filter (filtered mode only).
    pub genre_ids: BTreeSet<u32>,
    /// Sort order (filtered mode only).
    pub sort_key: SortKey,
    /// Earliest release date (filtered mode only).
    pub date_from: Option<NaiveDate>,
    /// Latest release date (filtered mode only).
    pub date_to: Option<NaiveDate>,
    /// Requested page (1-based).
    pub page: u32,
    /// Language and region.
    pub locale: Locale,
}

impl QueryParameters {
    /// Filtered-mode defaults for `media_type`.
    #[must_use]
    pub fn new(media_type: MediaType, locale: Locale) -> Self {
        Self {
            media_type,
            keyword: None,
            year: None,
            genre_ids: BTreeSet::new(),
            sort_key: SortKey::default(),
            date_from: None,
            date_to: None,
            page: 1,
            locale,
        }
    }

    /// Mode implied by the keyword.
    #[must_use]
    pub const fn mode(&self) -> QueryMode {
        if self.keyword.is_some() {
            QueryMode::Keyword
        } else {
            QueryMode::Filtered
        }
    }

    /// Backend request for the current state.
    #[must_use]
    pub fn to_request(&self) -> QueryRequest {
        match &self.keyword {
            Some(keyword) => QueryRequest::Search(
                SearchParams::new(self.media_type, keyword.as_str())
                    .page(self.page)
                    .language(self.locale.language.as_str())
                    .year(self.year),
            ),
            None => QueryRequest::Discover(
                DiscoverParams::new(self.media_type)
                    .page(self.page)
                    .locale(
                        self.locale.language.as_str(),
                        self.locale.region.as_str(),
                    )
                    .genres(self.genre_ids.iter().copied())
                    .sort_by(self.sort_key)
                    .year(self.year)
                    .date_range(self.date_from, self.date_to),
            ),
        }
    }
}

/// A concrete backend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRequest {
    /// `GET /search`.
    Search(SearchParams),
    /// `GET /discover`.
    Discover(DiscoverParams),
}

/// Controller for the combined search/filter page.
#[derive(Debug)]
pub struct SearchController<A> {
    api: Arc<A>,
    params: Mutex<QueryParameters>,
    results: PagedQuery<QueryRequest, MediaSummary>,
}

impl<A: LocalBackendApi> SearchController<A> {
    /// Creates a controller in filtered mode at page 1.
    pub fn new(api: Arc<A>, media_type: MediaType, locale: Locale) -> Self {
        Self {
            api,
            params: Mutex::new(QueryParameters::new(media_type, locale)),
            results: PagedQuery::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueryParameters> {
        self.params.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current parameters.
    #[must_use]
    pub fn params(&self) -> QueryParameters {
        self.lock().clone()
    }

    /// Active mode.
    #[must_use]
    pub fn mode(&self) -> QueryMode {
        self.lock().mode()
    }

    /// Visible results.
    #[must_use]
    pub fn results(&self) -> Option<PageView<MediaSummary>> {
        self.results.view()
    }

    /// Whether a request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.results.query().is_loading()
    }

    /// Per-view error message.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.results.query().error()
    }

    /// Last request actually issued.
    #[must_use]
    pub fn last_request(&self) -> Option<QueryRequest> {
        self.results.params()
    }

    /// Issues the request for the current parameters.
    #[instrument(skip_all)]
    pub async fn load(&self) -> QueryOutcome {
        let request = self.lock().to_request();
        let api = Arc::clone(&self.api);
        self.results
            .run(request, move |request, token| async move {
                match request {
                    QueryRequest::Search(params) => api.search(&params, Some(&token)).await,
                    QueryRequest::Discover(params) => api.discover(&params, Some(&token)).await,
                }
            })
            .await
    }

    /// Submits the keyword form. Filters are retained but the keyword wins.
    pub async fn submit_search(&self, keyword: &str, year: Option<u32>) -> QueryOutcome {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return self.results.query().reject(EMPTY_KEYWORD);
        }
        {
            let mut params = self.lock();
            params.keyword = Some(String::from(keyword));
            params.year = year;
            params.page = 1;
        }
        self.load().await
    }

    /// Applies the filter panel, clearing the keyword.
    pub async fn apply_filters(&self, filters: FilterSet) -> QueryOutcome {
        {
            let mut params = self.lock();
            params.keyword = None;
            params.genre_ids = filters.genre_ids;
            params.sort_key = filters.sort_key;
            params.year = filters.year;
            params.date_from = filters.date_from;
            params.date_to = filters.date_to;
            params.page = 1;
        }
        self.load().await
    }

    /// Switches media type and replays the active mode at page 1.
    ///
    /// Genre IDs that do not exist for the new media type are dropped.
    pub async fn set_media_type(&self, media_type: MediaType) -> QueryOutcome {
        {
            let mut params = self.lock();
            let catalogue = genres_for(media_type);
            params
                .genre_ids
                .retain(|id| catalogue.iter().any(|g| g.id == *id));
            params.media_type = media_type;
            params.page = 1;
        }
        self.load().await
    }

    /// Changes language/region and reloads at page 1.
    pub async fn set_locale(&self, locale: Locale) -> QueryOutcome {
        {
            let mut params = self.lock();
            params.locale = locale;
            params.page = 1;
        }
        self.load().await
    }

    /// Loads the next page. `None` at the last page or while loading.
    pub async fn next_page(&self) -> Option<QueryOutcome> {
        let page = self.results.next_page()?;
        Some(self.go_to_page(page).await)
    }

    /// Loads the previous page. `None` at page 1 or while loading.
    pub async fn prev_page(&self) -> Option<QueryOutcome> {
        let page = self.results.prev_page()?;
        Some(self.go_to_page(page).await)
    }

    /// Loads `page` of the active query.
    ///
    /// Page 0 is rejected without a request. Once a page has been shown,
    /// `page` is clamped to its `total_pages`.
    pub async fn go_to_page(&self, page: u32) -> QueryOutcome {
        let Some(page) = self.results.checked_page(page) else {
            return self.results.query().reject(INVALID_PAGE);
        };
        self.lock().page = page;
        self.load().await
    }

    /// Cancels the request in flight, leaving visible results untouched.
    pub fn cancel(&self) {
        self.results.query().cancel();
    }
}
