//! Wire types exchanged with the backend proxy API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ParseValueError;

// --- Enumerations ---

/// Kind of media a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Feature film.
    #[default]
    Movie,
    /// TV series.
    Tv,
}

impl MediaType {
    /// Wire representation (`movie` / `tv`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }

    /// Discover-query key carrying the release year for this media type.
    #[must_use]
    pub const fn year_param(self) -> &'static str {
        match self {
            Self::Movie => "year",
            Self::Tv => "first_air_date_year",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "tv" => Ok(Self::Tv),
            _ => Err(ParseValueError::new("media type", s)),
        }
    }
}

/// Trending time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendWindow {
    /// Last 24 hours.
    #[default]
    Day,
    /// Last 7 days.
    Week,
}

impl TrendWindow {
    /// Wire representation (`day` / `week`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

impl fmt::Display for TrendWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendWindow {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            _ => Err(ParseValueError::new("trend window", s)),
        }
    }
}

/// Sort order for discover queries.
///
/// The date keys render differently per media type: movies sort on
/// `primary_release_date`, TV on `first_air_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    /// Most popular first.
    #[default]
    PopularityDesc,
    /// Least popular first.
    PopularityAsc,
    /// Highest rated first.
    RatingDesc,
    /// Lowest rated first.
    RatingAsc,
    /// Newest first.
    DateDesc,
    /// Oldest first.
    DateAsc,
}

impl SortKey {
    /// All sort keys in display order.
    pub const ALL: [Self; 6] = [
        Self::PopularityDesc,
        Self::PopularityAsc,
        Self::RatingDesc,
        Self::RatingAsc,
        Self::DateDesc,
        Self::DateAsc,
    ];

    /// `sort_by` value for the given media type.
    #[must_use]
    pub const fn as_param(self, media_type: MediaType) -> &'static str {
        match (self, media_type) {
            (Self::PopularityDesc, _) => "popularity.desc",
            (Self::PopularityAsc, _) => "popularity.asc",
            (Self::RatingDesc, _) => "vote_average.desc",
            (Self::RatingAsc, _) => "vote_average.asc",
            (Self::DateDesc, MediaType::Movie) => "primary_release_date.desc",
            (Self::DateAsc, MediaType::Movie) => "primary_release_date.asc",
            (Self::DateDesc, MediaType::Tv) => "first_air_date.desc",
            (Self::DateAsc, MediaType::Tv) => "first_air_date.asc",
        }
    }
}

impl FromStr for SortKey {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let (field, direction) = normalized
            .rsplit_once('.')
            .ok_or_else(|| ParseValueError::new("sort key", s))?;
        let descending = match direction {
            "desc" => true,
            "asc" => false,
            _ => return Err(ParseValueError::new("sort key", s)),
        };
        let key = match (field, descending) {
            ("popularity", true) => Self::PopularityDesc,
            ("popularity", false) => Self::PopularityAsc,
            ("vote_average" | "rating", true) => Self::RatingDesc,
            ("vote_average" | "rating", false) => Self::RatingAsc,
            ("primary_release_date" | "first_air_date" | "release_date" | "date", true) => {
                Self::DateDesc
            }
            ("primary_release_date" | "first_air_date" | "release_date" | "date", false) => {
                Self::DateAsc
            }
            _ => return Err(ParseValueError::new("sort key", s)),
        };
        Ok(key)
    }
}

// --- Result pages ---

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultPage<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    /// Current page (1-based).
    #[serde(default = "first_page")]
    pub page: u32,
    /// Total number of pages.
    #[serde(default = "first_page")]
    pub total_pages: u32,
    /// Total number of results.
    #[serde(default)]
    pub total_results: u64,
}

const fn first_page() -> u32 {
    1
}

impl<T> Default for ResultPage<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            page: 1,
            total_pages: 1,
            total_results: 0,
        }
    }
}

/// A search, discover or trending result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaSummary {
    /// TMDB ID.
    pub id: u64,
    /// Media type, present on mixed listings only.
    #[serde(default)]
    pub media_type: Option<MediaType>,
    /// Movie title.
    #[serde(default)]
    pub title: Option<String>,
    /// TV series name.
    #[serde(default)]
    pub name: Option<String>,
    /// Movie release date (YYYY-MM-DD).
    #[serde(default)]
    pub release_date: Option<String>,
    /// TV first air date (YYYY-MM-DD).
    #[serde(default)]
    pub first_air_date: Option<String>,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: Option<f64>,
}

impl MediaSummary {
    /// Title for display, whichever of `title`/`name` is set.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("Untitled")
    }

    /// Release or first-air date.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
            .filter(|d| !d.is_empty())
    }

    /// Identity key, using `fallback` when the record carries no media type.
    #[must_use]
    pub fn key(&self, fallback: MediaType) -> FavoriteKey {
        FavoriteKey::new(self.media_type.unwrap_or(fallback), self.id)
    }

    /// Builds the favorite payload for this record.
    #[must_use]
    pub fn to_new_favorite(&self, fallback: MediaType) -> NewFavorite {
        let key = self.key(fallback);
        let title = match key.media_type {
            MediaType::Movie => self.title.as_deref(),
            MediaType::Tv => self.name.as_deref(),
        };
        NewFavorite {
            media_type: key.media_type,
            tmdb_id: key.tmdb_id,
            title: title.map(String::from),
            poster_path: self.poster_path.clone(),
        }
    }
}

// --- Details ---

/// Genre entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Genre {
    /// Genre ID.
    pub id: u32,
    /// Genre name.
    pub name: String,
}

/// Season summary within TV details.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeasonSummary {
    /// Season number (0 = specials).
    pub season_number: u32,
    /// Season name.
    #[serde(default)]
    pub name: Option<String>,
    /// Number of episodes.
    #[serde(default)]
    pub episode_count: u32,
    /// Air date.
    #[serde(default)]
    pub air_date: Option<String>,
}

/// Cast credit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CastMember {
    /// Person ID.
    pub id: u64,
    /// Person name.
    pub name: String,
    /// Character played.
    #[serde(default)]
    pub character: Option<String>,
    /// Profile image path.
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Crew credit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrewMember {
    /// Person ID.
    pub id: u64,
    /// Person name.
    pub name: String,
    /// Department (e.g. "Directing").
    #[serde(default)]
    pub department: Option<String>,
    /// Job title.
    #[serde(default)]
    pub job: Option<String>,
}

/// Credits block of a details record.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Credits {
    /// Cast list.
    #[serde(default)]
    pub cast: Vec<CastMember>,
    /// Crew list.
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

/// Departments shown in the key-crew list.
const MAIN_CREW_DEPARTMENTS: [&str; 3] = ["Directing", "Writing", "Production"];

/// Maximum number of key-crew entries.
const MAIN_CREW_LIMIT: usize = 10;

/// Response from `GET /details`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaDetails {
    /// TMDB ID.
    pub id: u64,
    /// Movie title.
    #[serde(default)]
    pub title: Option<String>,
    /// TV series name.
    #[serde(default)]
    pub name: Option<String>,
    /// Movie release date.
    #[serde(default)]
    pub release_date: Option<String>,
    /// TV first air date.
    #[serde(default)]
    pub first_air_date: Option<String>,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
    /// Genres.
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Movie runtime in minutes.
    #[serde(default)]
    pub runtime: Option<u32>,
    /// TV episode runtimes in minutes.
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    /// TV seasons.
    #[serde(default)]
    pub seasons: Vec<SeasonSummary>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: Option<f64>,
    /// Vote count.
    #[serde(default)]
    pub vote_count: Option<u64>,
    /// Status (e.g. "Released", "Ended").
    #[serde(default)]
    pub status: Option<String>,
    /// Original language (ISO 639-1).
    #[serde(default)]
    pub original_language: Option<String>,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Cast and crew.
    #[serde(default)]
    pub credits: Option<Credits>,
}

impl MediaDetails {
    /// Title for display.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("Untitled")
    }

    /// Release year, taken from the release or first-air date.
    #[must_use]
    pub fn year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
            .and_then(|d| d.get(..4))
    }

    /// Runtime in minutes: movie runtime or the first TV episode runtime.
    #[must_use]
    pub fn runtime_minutes(&self, media_type: MediaType) -> Option<u32> {
        match media_type {
            MediaType::Movie => self.runtime,
            MediaType::Tv => self.episode_run_time.first().copied(),
        }
        .filter(|m| *m > 0)
    }

    /// Last season that has episodes, falling back to the last season listed.
    #[must_use]
    pub fn latest_season(&self) -> Option<&SeasonSummary> {
        self.seasons
            .iter()
            .rev()
            .find(|s| s.episode_count > 0)
            .or_else(|| self.seasons.last())
    }

    /// Cast list (empty when credits are absent).
    #[must_use]
    pub fn cast(&self) -> &[CastMember] {
        self.credits.as_ref().map_or(&[], |c| c.cast.as_slice())
    }

    /// Directing, writing and production crew, at most ten entries.
    #[must_use]
    pub fn main_crew(&self) -> Vec<&CrewMember> {
        self.credits.as_ref().map_or_else(Vec::new, |c| {
            c.crew
                .iter()
                .filter(|m| {
                    m.department
                        .as_deref()
                        .is_some_and(|d| MAIN_CREW_DEPARTMENTS.contains(&d))
                })
                .take(MAIN_CREW_LIMIT)
                .collect()
        })
    }
}

// --- Media sub-resources ---

/// A video (trailer or teaser).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaVideo {
    /// Site-specific video key.
    pub key: String,
    /// Video name.
    #[serde(default)]
    pub name: String,
    /// Hosting site (e.g. "YouTube").
    #[serde(default)]
    pub site: String,
    /// Video type (e.g. "Trailer").
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl MediaVideo {
    /// Watch URL for YouTube-hosted videos.
    #[must_use]
    pub fn watch_url(&self) -> Option<String> {
        (self.site == "YouTube").then(|| format!("https://www.youtube.com/watch?v={}", self.key))
    }
}

/// An image record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaImage {
    /// Image path.
    pub file_path: String,
    /// Pixel width.
    #[serde(default)]
    pub width: Option<u32>,
    /// Pixel height.
    #[serde(default)]
    pub height: Option<u32>,
}

/// Response from `GET /media`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MediaAssets {
    /// Trailers and teasers.
    #[serde(default)]
    pub trailers: Vec<MediaVideo>,
    /// Backdrop images.
    #[serde(default)]
    pub backdrops: Vec<MediaImage>,
}

// --- Favorites ---

/// Identity of a favorite: `(media_type, tmdb_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FavoriteKey {
    /// Media type.
    pub media_type: MediaType,
    /// TMDB ID.
    pub tmdb_id: u64,
}

impl FavoriteKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(media_type: MediaType, tmdb_id: u64) -> Self {
        Self {
            media_type,
            tmdb_id,
        }
    }
}

impl fmt::Display for FavoriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.media_type, self.tmdb_id)
    }
}

/// A stored favorite.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Favorite {
    /// Server-side row ID.
    #[serde(default)]
    pub id: Option<u64>,
    /// Media type.
    pub media_type: MediaType,
    /// TMDB ID (the backend stores it as text).
    #[serde(deserialize_with = "deserialize_tmdb_id")]
    pub tmdb_id: u64,
    /// Title at the time of saving.
    #[serde(default)]
    pub title: Option<String>,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Creation timestamp (ISO 8601).
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Favorite {
    /// Identity key.
    #[must_use]
    pub const fn key(&self) -> FavoriteKey {
        FavoriteKey::new(self.media_type, self.tmdb_id)
    }
}

/// Body of `POST /favorites`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewFavorite {
    /// Media type.
    pub media_type: MediaType,
    /// TMDB ID.
    pub tmdb_id: u64,
    /// Title.
    pub title: Option<String>,
    /// Poster image path.
    pub poster_path: Option<String>,
}

impl NewFavorite {
    /// Identity key.
    #[must_use]
    pub const fn key(&self) -> FavoriteKey {
        FavoriteKey::new(self.media_type, self.tmdb_id)
    }
}

/// Generic `{ "ok": true, "id": … }` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    /// Success flag.
    #[serde(default)]
    pub ok: bool,
    /// ID of a created row, when one was created.
    #[serde(default)]
    pub id: Option<u64>,
}

// --- Profile & alerts ---

/// Response from `GET /profile`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    /// Identity-provider user ID.
    pub uid: String,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `PUT /profile`. `None` fields are left unchanged by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    /// New display name.
    pub display_name: Option<String>,
    /// New avatar URL.
    pub photo_url: Option<String>,
}

/// Alert delivery frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertFrequency {
    /// Once a day.
    Daily,
    /// Once a week.
    #[default]
    Weekly,
    /// Once a month.
    Monthly,
}

impl FromStr for AlertFrequency {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(ParseValueError::new("alert frequency", s)),
        }
    }
}

impl fmt::Display for AlertFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        })
    }
}

/// Alert preferences (`GET`/`PUT /alerts`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPreferences {
    /// Delivery frequency.
    #[serde(default)]
    pub frequency: AlertFrequency,
    /// Comma-separated keywords.
    #[serde(default)]
    pub keywords: String,
    /// Comma-separated channels (e.g. "email,push").
    #[serde(default)]
    pub channels: String,
    /// Last update timestamp (read-only).
    #[serde(default, skip_serializing)]
    pub updated_at: Option<String>,
}

// --- Comments ---

/// A comment on a movie or TV series.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Comment {
    /// Comment ID.
    pub id: u64,
    /// Author user ID.
    #[serde(default)]
    pub uid: Option<String>,
    /// Media type.
    pub media_type: MediaType,
    /// TMDB ID.
    #[serde(deserialize_with = "deserialize_tmdb_id")]
    pub tmdb_id: u64,
    /// Comment body.
    pub content: String,
    /// Author display name.
    #[serde(default)]
    pub author_name: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `POST /comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComment {
    /// Media type.
    pub media_type: MediaType,
    /// TMDB ID.
    pub tmdb_id: u64,
    /// Comment body.
    pub content: String,
}

/// Accepts a TMDB ID encoded as either a JSON number or a string.
fn deserialize_tmdb_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

// --- Genre catalogues ---

/// Selectable genre in the filter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenreOption {
    /// Genre ID.
    pub id: u32,
    /// Display name.
    pub name: &'static str,
}

const fn genre(id: u32, name: &'static str) -> GenreOption {
    GenreOption { id, name }
}

/// Movie genres.
pub const MOVIE_GENRES: [GenreOption; 19] = [
    genre(28, "Action"),
    genre(12, "Adventure"),
    genre(16, "Animation"),
    genre(35, "Comedy"),
    genre(80, "Crime"),
    genre(99, "Documentary"),
    genre(18, "Drama"),
    genre(10751, "Family"),
    genre(14, "Fantasy"),
    genre(36, "History"),
    genre(27, "Horror"),
    genre(10402, "Music"),
    genre(9648, "Mystery"),
    genre(10749, "Romance"),
    genre(878, "Science Fiction"),
    genre(10770, "TV Movie"),
    genre(53, "Thriller"),
    genre(10752, "War"),
    genre(37, "Western"),
];

/// TV genres.
pub const TV_GENRES: [GenreOption; 12] = [
    genre(10759, "Action & Adventure"),
    genre(16, "Animation"),
    genre(35, "Comedy"),
    genre(80, "Crime"),
    genre(99, "Documentary"),
    genre(18, "Drama"),
    genre(10751, "Family"),
    genre(10762, "Kids"),
    genre(9648, "Mystery"),
    genre(10765, "Sci-Fi & Fantasy"),
    genre(10768, "War & Politics"),
    genre(37, "Western"),
];

/// Genre catalogue for a media type.
#[must_use]
pub const fn genres_for(media_type: MediaType) -> &'static [GenreOption] {
    match media_type {
        MediaType::Movie => &MOVIE_GENRES,
        MediaType::Tv => &TV_GENRES,
    }
}
