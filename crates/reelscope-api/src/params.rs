//! Query-string construction and request parameter types.

use chrono::NaiveDate;

use crate::types::{MediaType, SortKey, TrendWindow};

/// Default response language.
pub(crate) const DEFAULT_LANGUAGE: &str = "en-US";

/// Default region.
pub(crate) const DEFAULT_REGION: &str = "US";

/// A value that may appear in a query string.
///
/// Returning `None` omits the parameter entirely. Callers rely on this to
/// leave server-side defaults in effect instead of sending an explicit one.
pub trait QueryValue {
    /// Rendered value, or `None` to omit the parameter.
    fn to_query_value(&self) -> Option<String>;
}

impl QueryValue for str {
    fn to_query_value(&self) -> Option<String> {
        (!self.trim().is_empty()).then(|| String::from(self))
    }
}

impl QueryValue for String {
    fn to_query_value(&self) -> Option<String> {
        self.as_str().to_query_value()
    }
}

impl<T: QueryValue + ?Sized> QueryValue for &T {
    fn to_query_value(&self) -> Option<String> {
        (**self).to_query_value()
    }
}

impl<T: QueryValue> QueryValue for Option<T> {
    fn to_query_value(&self) -> Option<String> {
        self.as_ref().and_then(QueryValue::to_query_value)
    }
}

macro_rules! impl_query_value_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl QueryValue for $ty {
                fn to_query_value(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}

impl_query_value_display!(u16, u32, u64, i32, i64, usize, bool, MediaType, TrendWindow);

impl QueryValue for NaiveDate {
    fn to_query_value(&self) -> Option<String> {
        Some(self.format("%Y-%m-%d").to_string())
    }
}

/// Ordered query parameters with the omission rule applied on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    /// Creates an empty parameter list.
    #[must_use]
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Sets `key`, replacing any earlier value. Omitted values remove the key.
    pub fn set(&mut self, key: &'static str, value: impl QueryValue) -> &mut Self {
        let rendered = value.to_query_value();
        if let Some(pos) = self.pairs.iter().position(|(k, _)| *k == key) {
            match rendered {
                Some(v) => {
                    if let Some(slot) = self.pairs.get_mut(pos) {
                        slot.1 = v;
                    }
                }
                None => {
                    self.pairs.remove(pos);
                }
            }
        } else if let Some(v) = rendered {
            self.pairs.push((key, v));
        }
        self
    }

    /// Builder-style [`QueryParams::set`].
    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl QueryValue) -> Self {
        self.set(key, value);
        self
    }

    /// Value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Whether no parameter is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Key/value pairs in insertion order.
    #[must_use]
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    /// Form-urlencoded query string with a leading `?`, or `""` when empty.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        if self.pairs.is_empty() {
            return String::new();
        }
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter().map(|(k, v)| (*k, v.as_str())))
            .finish();
        format!("?{encoded}")
    }
}

// --- Search ---

/// Parameters for `GET /search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Media type.
    pub media_type: MediaType,
    /// Search keyword (required, non-blank).
    pub query: String,
    /// Result page (default: 1).
    pub page: u32,
    /// Response language (default: "en-US").
    pub language: String,
    /// Year filter, interpreted by the server.
    pub year: Option<u32>,
}

impl SearchParams {
    /// Creates search params for the given keyword.
    pub fn new(media_type: MediaType, query: impl Into<String>) -> Self {
        Self {
            media_type,
            query: query.into(),
            page: 1,
            language: String::from(DEFAULT_LANGUAGE),
            year: None,
        }
    }

    /// Sets the page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets or clears the year filter.
    #[must_use]
    pub const fn year(mut self, year: Option<u32>) -> Self {
        self.year = year;
        self
    }

    /// Renders the query parameters.
    #[must_use]
    pub fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .with("type", self.media_type)
            .with("query", &self.query)
            .with("page", self.page)
            .with("language", &self.language)
            .with("year", self.year)
    }
}

// --- Discover ---

/// Parameters for `GET /discover`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverParams {
    /// Media type.
    pub media_type: MediaType,
    /// Result page (default: 1).
    pub page: u32,
    /// Response language (default: "en-US").
    pub language: String,
    /// Region (default: "US").
    pub region: String,
    /// Include adult titles (default: false).
    pub include_adult: bool,
    /// Genre IDs, sent comma-joined.
    pub genres: Vec<u32>,
    /// Sort order.
    pub sort_by: SortKey,
    /// Release year; sent as `year` or `first_air_date_year`.
    pub year: Option<u32>,
    /// Earliest release date.
    pub from_date: Option<NaiveDate>,
    /// Latest release date.
    pub to_date: Option<NaiveDate>,
}

impl DiscoverParams {
    /// Creates discover params with default filters.
    #[must_use]
    pub fn new(media_type: MediaType) -> Self {
        Self {
            media_type,
            page: 1,
            language: String::from(DEFAULT_LANGUAGE),
            region: String::from(DEFAULT_REGION),
            include_adult: false,
            genres: Vec::new(),
            sort_by: SortKey::default(),
            year: None,
            from_date: None,
            to_date: None,
        }
    }

    /// Sets the page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Sets language and region.
    #[must_use]
    pub fn locale(mut self, language: impl Into<String>, region: impl Into<String>) -> Self {
        self.language = language.into();
        self.region = region.into();
        self
    }

    /// Sets the genre filter.
    #[must_use]
    pub fn genres(mut self, genres: impl IntoIterator<Item = u32>) -> Self {
        self.genres = genres.into_iter().collect();
        self
    }

    /// Sets the sort order.
    #[must_use]
    pub const fn sort_by(mut self, sort_by: SortKey) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Sets or clears the year filter.
    #[must_use]
    pub const fn year(mut self, year: Option<u32>) -> Self {
        self.year = year;
        self
    }

    /// Sets the release date range.
    #[must_use]
    pub const fn date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from_date = from;
        self.to_date = to;
        self
    }

    /// Renders the query parameters.
    #[must_use]
    pub fn to_query(&self) -> QueryParams {
        let with_genres = self
            .genres
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");

        QueryParams::new()
            .with("type", self.media_type)
            .with("page", self.page)
            .with("language", &self.language)
            .with("region", &self.region)
            .with("include_adult", self.include_adult)
            .with("sort_by", self.sort_by.as_param(self.media_type))
            .with("with_genres", with_genres)
            .with(self.media_type.year_param(), self.year)
            .with("fromDate", self.from_date)
            .with("toDate", self.to_date)
    }
}

// --- Trending ---

/// Parameters for `GET /trending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendingParams {
    /// Media type.
    pub media_type: MediaType,
    /// Time window.
    pub window: TrendWindow,
    /// Result page (default: 1).
    pub page: u32,
    /// Response language (default: "en-US").
    pub language: String,
    /// Region (default: "US").
    pub region: String,
}

impl TrendingParams {
    /// Creates trending params for a media type and window.
    #[must_use]
    pub fn new(media_type: MediaType, window: TrendWindow) -> Self {
        Self {
            media_type,
            window,
            page: 1,
            language: String::from(DEFAULT_LANGUAGE),
            region: String::from(DEFAULT_REGION),
        }
    }

    /// Sets the page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Sets language and region.
    #[must_use]
    pub fn locale(mut self, language: impl Into<String>, region: impl Into<String>) -> Self {
        self.language = language.into();
        self.region = region.into();
        self
    }

    /// Renders the query parameters.
    #[must_use]
    pub fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .with("type", self.media_type)
            .with("window", self.window)
            .with("page", self.page)
            .with("language", &self.language)
            .with("region", &self.region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_strings_and_none_are_omitted() {
        // Arrange
        let mut params = QueryParams::new();

        // Act
        params
            .set("empty", "")
            .set("spaces", "   ")
            .set("tab", "\t\n")
            .set("missing", None::<u32>)
            .set("missing_str", None::<&str>);

        // Assert
        assert!(params.is_empty());
        assert_eq!(params.to_query_string(), "");
    }

    #[test]
    fn test_zero_and_false_are_present() {
        // Arrange & Act
        let params = QueryParams::new()
            .with("page", 0u32)
            .with("include_adult", false);

        // Assert
        assert_eq!(params.get("page"), Some("0"));
        assert_eq!(params.get("include_adult"), Some("false"));
        assert_eq!(params.to_query_string(), "?page=0&include_adult=false");
    }

    #[test]
    fn test_set_replaces_and_omitted_value_removes_key() {
        // Arrange
        let mut params = QueryParams::new().with("query", "dune").with("page", 1u32);

        // Act
        params.set("query", "arrakis");
        params.set("page", " ");

        // Assert
        assert_eq!(params.get("query"), Some("arrakis"));
        assert!(!params.contains("page"));
    }

    #[test]
    fn test_query_string_is_form_encoded() {
        // Arrange
        let params = QueryParams::new().with("query", "spy × family & co");

        // Act
        let qs = params.to_query_string();

        // Assert
        assert!(qs.starts_with("?query=spy+"));
        assert!(qs.contains("%26"));
    }

    #[test]
    fn test_search_params_omit_missing_year() {
        // Arrange
        let params = SearchParams::new(MediaType::Movie, "dune").page(2);

        // Act
        let query = params.to_query();

        // Assert
        assert_eq!(query.get("type"), Some("movie"));
        assert_eq!(query.get("query"), Some("dune"));
        assert_eq!(query.get("page"), Some("2"));
        assert_eq!(query.get("language"), Some("en-US"));
        assert!(!query.contains("year"));
    }

    #[test]
    fn test_discover_tv_maps_year_and_genres() {
        // Arrange
        let params = DiscoverParams::new(MediaType::Tv)
            .genres([18])
            .sort_by(SortKey::PopularityDesc)
            .year(Some(2021));

        // Act
        let query = params.to_query();

        // Assert
        assert_eq!(query.get("first_air_date_year"), Some("2021"));
        assert!(!query.contains("year"));
        assert_eq!(query.get("with_genres"), Some("18"));
        assert_eq!(query.get("sort_by"), Some("popularity.desc"));
        assert_eq!(query.get("include_adult"), Some("false"));
        assert_eq!(query.get("region"), Some("US"));
    }

    #[test]
    fn test_discover_movie_maps_year_and_dates() {
        // Arrange
        let from = NaiveDate::from_ymd_opt(2020, 1, 1);
        let to = NaiveDate::from_ymd_opt(2020, 12, 31);
        let params = DiscoverParams::new(MediaType::Movie)
            .genres([28, 12])
            .sort_by(SortKey::DateDesc)
            .year(Some(2020))
            .date_range(from, to);

        // Act
        let query = params.to_query();

        // Assert
        assert_eq!(query.get("year"), Some("2020"));
        assert!(!query.contains("first_air_date_year"));
        assert_eq!(query.get("with_genres"), Some("28,12"));
        assert_eq!(query.get("sort_by"), Some("primary_release_date.desc"));
        assert_eq!(query.get("fromDate"), Some("2020-01-01"));
        assert_eq!(query.get("toDate"), Some("2020-12-31"));
    }

    #[test]
    fn test_discover_without_filters_omits_optional_keys() {
        // Arrange
        let params = DiscoverParams::new(MediaType::Movie);

        // Act
        let query = params.to_query();

        // Assert
        assert!(!query.contains("with_genres"));
        assert!(!query.contains("year"));
        assert!(!query.contains("fromDate"));
        assert!(!query.contains("toDate"));
    }

    #[test]
    fn test_trending_params() {
        // Arrange
        let params = TrendingParams::new(MediaType::Tv, TrendWindow::Week)
            .page(3)
            .locale("ja-JP", "JP");

        // Act
        let query = params.to_query();

        // Assert
        assert_eq!(
            query.to_query_string(),
            "?type=tv&window=week&page=3&language=ja-JP&region=JP"
        );
    }
}
