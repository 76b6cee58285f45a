//! Client library for the reelscope backend proxy API.
//!
//! Translates typed calls into HTTP requests against the `/api` base path,
//! normalises failures into [`ApiError`] and supports cooperative
//! cancellation through [`tokio_util::sync::CancellationToken`].

mod api;
mod client;
mod error;
mod params;
mod types;

pub use api::{BackendApi, LocalBackendApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{ApiClient, ApiClientBuilder, RequestOptions};
#[allow(clippy::module_name_repetitions)]
pub use error::{ApiError, ParseValueError, Result};
pub use params::{DiscoverParams, QueryParams, QueryValue, SearchParams, TrendingParams};
pub use types::{
    Ack, AlertFrequency, AlertPreferences, CastMember, Comment, Credits, CrewMember, Favorite,
    FavoriteKey, Genre, GenreOption, MOVIE_GENRES, MediaAssets, MediaDetails, MediaImage,
    MediaSummary, MediaType, MediaVideo, NewComment, NewFavorite, Profile, ProfileUpdate,
    ResultPage, SeasonSummary, SortKey, TV_GENRES, TrendWindow, genres_for,
};

/// Re-exported so callers can build cancellation handles without a direct dependency.
pub use tokio_util::sync::CancellationToken;
