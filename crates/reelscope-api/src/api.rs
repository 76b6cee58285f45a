//! `BackendApi` trait definition.
#![allow(clippy::future_not_send)]

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::params::{DiscoverParams, SearchParams, TrendingParams};
use crate::types::{
    Ack, AlertPreferences, Comment, Favorite, FavoriteKey, MediaAssets, MediaDetails,
    MediaSummary, MediaType, NewComment, NewFavorite, Profile, ProfileUpdate, ResultPage,
};

/// Backend proxy API.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
///
/// Read operations accept an optional cancellation token; a cancelled call
/// fails with [`crate::ApiError::Aborted`]. Authenticated operations take
/// the bearer token issued by the identity provider.
#[trait_variant::make(BackendApi: Send)]
pub trait LocalBackendApi {
    /// Keyword search (`GET /search`).
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::Validation`] for a blank query, otherwise
    /// any transport, status or decode failure.
    async fn search(
        &self,
        params: &SearchParams,
        cancel: Option<&CancellationToken>,
    ) -> Result<ResultPage<MediaSummary>>;

    /// Filtered discovery (`GET /discover`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails.
    async fn discover(
        &self,
        params: &DiscoverParams,
        cancel: Option<&CancellationToken>,
    ) -> Result<ResultPage<MediaSummary>>;

    /// Trending listing (`GET /trending`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails.
    async fn trending(
        &self,
        params: &TrendingParams,
        cancel: Option<&CancellationToken>,
    ) -> Result<ResultPage<MediaSummary>>;

    /// Full details record (`GET /details`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails.
    async fn details(
        &self,
        media_type: MediaType,
        id: u64,
        language: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<MediaDetails>;

    /// Trailers and backdrops (`GET /media`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails.
    async fn media(
        &self,
        media_type: MediaType,
        id: u64,
        cancel: Option<&CancellationToken>,
    ) -> Result<MediaAssets>;

    /// Lists the signed-in user's favorites (`GET /favorites`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails.
    async fn list_favorites(
        &self,
        bearer: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Favorite>>;

    /// Saves a favorite (`POST /favorites`). The server ignores duplicates.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server rejects it.
    async fn add_favorite(&self, bearer: &str, favorite: &NewFavorite) -> Result<Ack>;

    /// Removes a favorite (`DELETE /favorites/{media_type}/{tmdb_id}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server rejects it.
    async fn remove_favorite(&self, bearer: &str, key: FavoriteKey) -> Result<Ack>;

    /// Ensures a server-side user row exists (`POST /user/bootstrap`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server rejects it.
    async fn bootstrap_user(&self, bearer: &str) -> Result<Ack>;

    /// Fetches the profile (`GET /profile`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails.
    async fn profile(&self, bearer: &str) -> Result<Profile>;

    /// Updates the profile (`PUT /profile`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server rejects it.
    async fn update_profile(&self, bearer: &str, update: &ProfileUpdate) -> Result<Ack>;

    /// Fetches alert preferences (`GET /alerts`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails.
    async fn alerts(&self, bearer: &str) -> Result<AlertPreferences>;

    /// Updates alert preferences (`PUT /alerts`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server rejects it.
    async fn update_alerts(&self, bearer: &str, prefs: &AlertPreferences) -> Result<Ack>;

    /// Lists comments for a title, newest first (`GET /comments`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails.
    async fn comments(
        &self,
        media_type: MediaType,
        tmdb_id: u64,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Comment>>;

    /// Posts a comment (`POST /comments`) and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::Validation`] for blank content, otherwise
    /// any transport, status or decode failure.
    async fn add_comment(&self, bearer: &str, comment: &NewComment) -> Result<Comment>;
}
