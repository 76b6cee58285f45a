//! Multi-section trending page controller.
//!
//! Four independent sections, each with its own request lifecycle. Only the
//! locale is shared; changing it reloads every section at page 1
//! concurrently.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use reelscope_api::{LocalBackendApi, MediaSummary, MediaType, TrendWindow, TrendingParams};
use tracing::instrument;

use crate::favorites::{Decorated, FavoriteSavePolicy, FavoriteSet, SaveOutcome, decorate};
use crate::locale::Locale;
use crate::paged::{INVALID_PAGE, PageView, PagedQuery, QueryOutcome};

/// One trending section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    /// Movies, last 24 hours.
    MovieDay,
    /// Movies, last 7 days.
    MovieWeek,
    /// TV, last 24 hours.
    TvDay,
    /// TV, last 7 days.
    TvWeek,
}

impl SectionId {
    /// All sections in display order.
    pub const ALL: [Self; 4] = [Self::MovieDay, Self::MovieWeek, Self::TvDay, Self::TvWeek];

    /// Section for a media type and window.
    #[must_use]
    pub const fn from_parts(media_type: MediaType, window: TrendWindow) -> Self {
        match (media_type, window) {
            (MediaType::Movie, TrendWindow::Day) => Self::MovieDay,
            (MediaType::Movie, TrendWindow::Week) => Self::MovieWeek,
            (MediaType::Tv, TrendWindow::Day) => Self::TvDay,
            (MediaType::Tv, TrendWindow::Week) => Self::TvWeek,
        }
    }

    /// Media type listed by the section.
    #[must_use]
    pub const fn media_type(self) -> MediaType {
        match self {
            Self::MovieDay | Self::MovieWeek => MediaType::Movie,
            Self::TvDay | Self::TvWeek => MediaType::Tv,
        }
    }

    /// Time window of the section.
    #[must_use]
    pub const fn window(self) -> TrendWindow {
        match self {
            Self::MovieDay | Self::TvDay => TrendWindow::Day,
            Self::MovieWeek | Self::TvWeek => TrendWindow::Week,
        }
    }

    /// Heading shown above the section.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::MovieDay => "Trending Movies Today",
            Self::MovieWeek => "Trending Movies This Week",
            Self::TvDay => "Trending TV Shows Today",
            Self::TvWeek => "Trending TV Shows This Week",
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media_type(), self.window())
    }
}

type Section = PagedQuery<TrendingParams, MediaSummary>;

/// Controller for the trending page.
#[derive(Debug)]
pub struct TrendingController<A> {
    api: Arc<A>,
    locale: Mutex<Locale>,
    sections: [Section; 4],
    favorites: FavoriteSet,
    policy: FavoriteSavePolicy,
}

impl<A: LocalBackendApi> TrendingController<A> {
    /// Creates a controller with empty sections.
    pub fn new(
        api: Arc<A>,
        locale: Locale,
        favorites: FavoriteSet,
        policy: FavoriteSavePolicy,
    ) -> Self {
        Self {
            api,
            locale: Mutex::new(locale),
            sections: Default::default(),
            favorites,
            policy,
        }
    }

    const fn section(&self, id: SectionId) -> &Section {
        let [movie_day, movie_week, tv_day, tv_week] = &self.sections;
        match id {
            SectionId::MovieDay => movie_day,
            SectionId::MovieWeek => movie_week,
            SectionId::TvDay => tv_day,
            SectionId::TvWeek => tv_week,
        }
    }

    /// Current locale.
    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Loads one page of one section.
    ///
    /// Page 0 is rejected without a request. Once the section has shown a
    /// page, `page` is clamped to its `total_pages`.
    #[instrument(skip_all, fields(section = %id, page = page))]
    pub async fn load_section(&self, id: SectionId, page: u32) -> QueryOutcome {
        let section = self.section(id);
        let Some(page) = section.checked_page(page) else {
            return section.query().reject(INVALID_PAGE);
        };
        let locale = self.locale();
        let params = TrendingParams::new(id.media_type(), id.window())
            .page(page)
            .locale(locale.language, locale.region);
        let api = Arc::clone(&self.api);
        section
            .run(params, move |params, token| async move {
                api.trending(&params, Some(&token)).await
            })
            .await
    }

    /// Loads page 1 of every section concurrently.
    pub async fn load_all(&self) -> Vec<(SectionId, QueryOutcome)> {
        let loads = SectionId::ALL.map(|id| async move { (id, self.load_section(id, 1).await) });
        join_all(loads).await
    }

    /// Changes the shared locale and reloads every section at page 1.
    pub async fn set_locale(&self, locale: Locale) -> Vec<(SectionId, QueryOutcome)> {
        *self.locale.lock().unwrap_or_else(PoisonError::into_inner) = locale;
        self.load_all().await
    }

    /// Next page of one section. `None` at the bound or while loading.
    pub async fn next_page(&self, id: SectionId) -> Option<QueryOutcome> {
        let page = self.section(id).next_page()?;
        Some(self.load_section(id, page).await)
    }

    /// Previous page of one section. `None` at the bound or while loading.
    pub async fn prev_page(&self, id: SectionId) -> Option<QueryOutcome> {
        let page = self.section(id).prev_page()?;
        Some(self.load_section(id, page).await)
    }

    /// Visible page of a section.
    #[must_use]
    pub fn view(&self, id: SectionId) -> Option<PageView<MediaSummary>> {
        self.section(id).view()
    }

    /// Whether a section is loading.
    #[must_use]
    pub fn is_loading(&self, id: SectionId) -> bool {
        self.section(id).query().is_loading()
    }

    /// Error message of a section.
    #[must_use]
    pub fn error(&self, id: SectionId) -> Option<String> {
        self.section(id).query().error()
    }

    /// Items of a section with their favorite flag.
    #[must_use]
    pub fn decorated(&self, id: SectionId) -> Vec<Decorated> {
        self.section(id).query().with_value(|view| {
            view.map_or_else(Vec::new, |v| {
                decorate(&v.items, id.media_type(), &self.favorites)
            })
        })
    }

    /// Saves a listed item as a favorite under the configured policy.
    pub async fn save_favorite(
        &self,
        bearer: &str,
        id: SectionId,
        item: &MediaSummary,
    ) -> SaveOutcome {
        let favorite = item.to_new_favorite(id.media_type());
        self.favorites
            .save(self.api.as_ref(), bearer, &favorite, self.policy)
            .await
    }
}
