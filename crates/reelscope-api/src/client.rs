//! `ApiClient` - backend proxy API client implementation.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use url::Url;

use crate::api::LocalBackendApi;
use crate::error::{ApiError, Result};
use crate::params::{DiscoverParams, QueryParams, SearchParams, TrendingParams};
use crate::types::{
    Ack, AlertPreferences, Comment, Favorite, FavoriteKey, MediaAssets, MediaDetails,
    MediaSummary, MediaType, NewComment, NewFavorite, Profile, ProfileUpdate, ResultPage,
};

/// Default base URL: the backend proxy mounted under `/api`.
const DEFAULT_BASE_URL: &str = "http://localhost:5000/api/";

/// Backend proxy API client.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct ApiClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests (always ends with `/`).
    base_url: Url,
}

/// Builder for `ApiClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct ApiClientBuilder {
    base_url: Option<Url>,
    user_agent: Option<String>,
}

impl ApiClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            user_agent: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<ApiClient> {
        let user_agent = self
            .user_agent
            .ok_or_else(|| ApiError::Validation(String::from("user_agent is required")))?;

        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .map_err(ApiError::Network)?;

        Ok(ApiClient {
            http_client,
            base_url: with_trailing_slash(base_url),
        })
    }
}

/// Ensures relative joins land under the base path instead of replacing it.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Options for a single [`ApiClient::request`] call.
#[derive(Debug, Clone)]
pub struct RequestOptions<'a> {
    method: Method,
    params: QueryParams,
    body: Option<Value>,
    cancel: Option<&'a CancellationToken>,
    bearer: Option<&'a str>,
}

impl<'a> RequestOptions<'a> {
    /// Options for the given HTTP method with no params, body, or auth.
    #[must_use]
    pub const fn new(method: Method) -> Self {
        Self {
            method,
            params: QueryParams::new(),
            body: None,
            cancel: None,
            bearer: None,
        }
    }

    /// `GET` request.
    #[must_use]
    pub const fn get() -> Self {
        Self::new(Method::GET)
    }

    /// `POST` request.
    #[must_use]
    pub const fn post() -> Self {
        Self::new(Method::POST)
    }

    /// `PUT` request.
    #[must_use]
    pub const fn put() -> Self {
        Self::new(Method::PUT)
    }

    /// `DELETE` request.
    #[must_use]
    pub const fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Sets the query parameters.
    #[must_use]
    pub fn params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attaches a cancellation token.
    #[must_use]
    pub const fn cancel(mut self, token: Option<&'a CancellationToken>) -> Self {
        self.cancel = token;
        self
    }

    /// Attaches a bearer token.
    #[must_use]
    pub const fn bearer(mut self, token: &'a str) -> Self {
        self.bearer = Some(token);
        self
    }
}

impl ApiClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `path` against the base URL and appends `params`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be joined onto the base URL.
    pub fn build_url(&self, path: &str, params: &QueryParams) -> Result<Url> {
        let mut url = self.base_url.join(path.trim_start_matches('/'))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.pairs().iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Sends one request and returns the parsed JSON payload, if any.
    ///
    /// A body that is not JSON yields `Ok(None)` on success. Any non-2xx
    /// status fails with [`ApiError::Status`]. A cancelled token fails with
    /// [`ApiError::Aborted`].
    ///
    /// # Errors
    ///
    /// See above; transport failures surface as [`ApiError::Network`].
    #[instrument(skip_all, fields(method = %options.method, path = path))]
    pub async fn request(&self, path: &str, options: RequestOptions<'_>) -> Result<Option<Value>> {
        let url = self.build_url(path, &options.params)?;

        let mut builder = self
            .http_client
            .request(options.method.clone(), url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = options.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }
        let request = builder.build().map_err(ApiError::Network)?;

        tracing::debug!(url = %request.url(), "API request");

        let exchange = self.exchange(request);
        match options.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        tracing::debug!("API request aborted");
                        Err(ApiError::Aborted)
                    }
                    result = exchange => result,
                }
            }
            None => exchange.await,
        }
    }

    /// Executes a built request and classifies the response.
    async fn exchange(&self, request: reqwest::Request) -> Result<Option<Value>> {
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(ApiError::Network)?;

        let status = response.status();
        let text = response.text().await.map_err(ApiError::Network)?;
        let payload = serde_json::from_str::<Value>(&text).ok();

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "API request failed");
            return Err(ApiError::from_status(status.as_u16(), payload));
        }
        Ok(payload)
    }

    /// Sends a request and decodes the payload into `T`.
    async fn request_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions<'_>,
    ) -> Result<T> {
        let payload = self.request(path, options).await?;
        serde_json::from_value(payload.unwrap_or(Value::Null)).map_err(|source| ApiError::Decode {
            path: String::from(path),
            source,
        })
    }

    /// Sends a request whose success body is only an acknowledgement.
    async fn request_ack(&self, path: &str, options: RequestOptions<'_>) -> Result<Ack> {
        match self.request(path, options).await? {
            Some(payload) => serde_json::from_value(payload).map_err(|source| ApiError::Decode {
                path: String::from(path),
                source,
            }),
            None => Ok(Ack { ok: true, id: None }),
        }
    }
}

/// Serialises a request body.
fn encode(body: &impl Serialize) -> Result<Value> {
    serde_json::to_value(body).map_err(ApiError::Encode)
}

impl LocalBackendApi for ApiClient {
    #[instrument(skip_all)]
    async fn search(
        &self,
        params: &SearchParams,
        cancel: Option<&CancellationToken>,
    ) -> Result<ResultPage<MediaSummary>> {
        if params.query.trim().is_empty() {
            return Err(ApiError::Validation(String::from("query is required")));
        }
        let options = RequestOptions::get()
            .params(params.to_query())
            .cancel(cancel);
        self.request_json("search", options).await
    }

    #[instrument(skip_all)]
    async fn discover(
        &self,
        params: &DiscoverParams,
        cancel: Option<&CancellationToken>,
    ) -> Result<ResultPage<MediaSummary>> {
        let options = RequestOptions::get()
            .params(params.to_query())
            .cancel(cancel);
        self.request_json("discover", options).await
    }

    #[instrument(skip_all)]
    async fn trending(
        &self,
        params: &TrendingParams,
        cancel: Option<&CancellationToken>,
    ) -> Result<ResultPage<MediaSummary>> {
        let options = RequestOptions::get()
            .params(params.to_query())
            .cancel(cancel);
        self.request_json("trending", options).await
    }

    #[instrument(skip_all)]
    async fn details(
        &self,
        media_type: MediaType,
        id: u64,
        language: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<MediaDetails> {
        let params = QueryParams::new()
            .with("type", media_type)
            .with("id", id)
            .with("language", language);
        let options = RequestOptions::get().params(params).cancel(cancel);
        self.request_json("details", options).await
    }

    #[instrument(skip_all)]
    async fn media(
        &self,
        media_type: MediaType,
        id: u64,
        cancel: Option<&CancellationToken>,
    ) -> Result<MediaAssets> {
        let params = QueryParams::new().with("type", media_type).with("id", id);
        let options = RequestOptions::get().params(params).cancel(cancel);
        self.request_json("media", options).await
    }

    #[instrument(skip_all)]
    async fn list_favorites(
        &self,
        bearer: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Favorite>> {
        let options = RequestOptions::get().bearer(bearer).cancel(cancel);
        self.request_json("favorites", options).await
    }

    #[instrument(skip_all)]
    async fn add_favorite(&self, bearer: &str, favorite: &NewFavorite) -> Result<Ack> {
        let options = RequestOptions::post()
            .bearer(bearer)
            .body(encode(favorite)?);
        self.request_ack("favorites", options).await
    }

    #[instrument(skip_all)]
    async fn remove_favorite(&self, bearer: &str, key: FavoriteKey) -> Result<Ack> {
        let path = format!("favorites/{}/{}", key.media_type, key.tmdb_id);
        let options = RequestOptions::delete().bearer(bearer);
        self.request_ack(&path, options).await
    }

    #[instrument(skip_all)]
    async fn bootstrap_user(&self, bearer: &str) -> Result<Ack> {
        let options = RequestOptions::post().bearer(bearer);
        self.request_ack("user/bootstrap", options).await
    }

    #[instrument(skip_all)]
    async fn profile(&self, bearer: &str) -> Result<Profile> {
        let options = RequestOptions::get().bearer(bearer);
        self.request_json("profile", options).await
    }

    #[instrument(skip_all)]
    async fn update_profile(&self, bearer: &str, update: &ProfileUpdate) -> Result<Ack> {
        let options = RequestOptions::put().bearer(bearer).body(encode(update)?);
        self.request_ack("profile", options).await
    }

    #[instrument(skip_all)]
    async fn alerts(&self, bearer: &str) -> Result<AlertPreferences> {
        let options = RequestOptions::get().bearer(bearer);
        self.request_json("alerts", options).await
    }

    #[instrument(skip_all)]
    async fn update_alerts(&self, bearer: &str, prefs: &AlertPreferences) -> Result<Ack> {
        let options = RequestOptions::put().bearer(bearer).body(encode(prefs)?);
        self.request_ack("alerts", options).await
    }

    #[instrument(skip_all)]
    async fn comments(
        &self,
        media_type: MediaType,
        tmdb_id: u64,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Comment>> {
        let params = QueryParams::new()
            .with("media_type", media_type)
            .with("tmdb_id", tmdb_id);
        let options = RequestOptions::get().params(params).cancel(cancel);
        self.request_json("comments", options).await
    }

    #[instrument(skip_all)]
    async fn add_comment(&self, bearer: &str, comment: &NewComment) -> Result<Comment> {
        let content = comment.content.trim();
        if content.is_empty() {
            return Err(ApiError::Validation(String::from("content required")));
        }
        let body = NewComment {
            content: String::from(content),
            ..comment.clone()
        };
        let options = RequestOptions::post().bearer(bearer).body(encode(&body)?);
        self.request_json("comments", options).await
    }
}
