//! In-memory `LocalBackendApi` used by controller tests.
#![allow(clippy::unwrap_used)]
#![allow(clippy::arithmetic_side_effects)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use reelscope_api::{
    Ack, AlertPreferences, ApiError, CancellationToken, Comment, DiscoverParams, Favorite,
    FavoriteKey, LocalBackendApi, MediaAssets, MediaDetails, MediaImage, MediaSummary, MediaType,
    MediaVideo, NewComment, NewFavorite, Profile, ProfileUpdate, Result, ResultPage, SearchParams,
    TrendingParams,
};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Search(SearchParams),
    Discover(DiscoverParams),
    Trending(TrendingParams),
    Details(MediaType, u64),
    Media(MediaType, u64),
    Comments(MediaType, u64),
    ListFavorites,
    AddFavorite(NewFavorite),
    RemoveFavorite(FavoriteKey),
    Bootstrap,
    Profile,
    UpdateProfile(ProfileUpdate),
    Alerts,
    UpdateAlerts(AlertPreferences),
    AddComment(NewComment),
}

/// Scriptable backend.
///
/// Delays and failures are keyed by labels such as `search:dune`,
/// `discover`, `trending:tv/week`, `details:1`, `add_favorite`.
#[derive(Debug)]
pub struct MockApi {
    pub calls: Mutex<Vec<Call>>,
    pub delays: Mutex<HashMap<String, Duration>>,
    pub failures: Mutex<HashMap<String, (u16, String)>>,
    pub total_pages: u32,
    pub favorites: Mutex<Vec<Favorite>>,
    pub trailers: usize,
    pub backdrops: usize,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            delays: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            total_pages: 5,
            favorites: Mutex::new(Vec::new()),
            trailers: 3,
            backdrops: 5,
        }
    }
}

impl MockApi {
    pub fn delay(&self, label: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(String::from(label), delay);
    }

    pub fn fail(&self, label: &str, status: u16, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(String::from(label), (status, String::from(message)));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    async fn enter(&self, call: Call, label: &str) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        let delay = self.delays.lock().unwrap().get(label).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.failures.lock().unwrap().get(label).cloned();
        match failure {
            Some((status, message)) => Err(ApiError::Status {
                message,
                status,
                body: None,
            }),
            None => Ok(()),
        }
    }

    fn page(&self, title: String, media_type: MediaType, page: u32) -> ResultPage<MediaSummary> {
        ResultPage {
            results: vec![summary(u64::from(page), media_type, title)],
            page,
            total_pages: self.total_pages,
            total_results: u64::from(self.total_pages) * 20,
        }
    }
}

pub fn summary(id: u64, media_type: MediaType, title: String) -> MediaSummary {
    MediaSummary {
        id,
        media_type: Some(media_type),
        title: Some(title),
        name: None,
        release_date: None,
        first_air_date: None,
        poster_path: None,
        vote_average: None,
    }
}

fn details(id: u64) -> MediaDetails {
    MediaDetails {
        id,
        title: Some(format!("title-{id}")),
        name: None,
        release_date: None,
        first_air_date: None,
        overview: None,
        genres: Vec::new(),
        runtime: None,
        episode_run_time: Vec::new(),
        seasons: Vec::new(),
        vote_average: None,
        vote_count: None,
        status: None,
        original_language: None,
        poster_path: None,
        backdrop_path: None,
        credits: None,
    }
}

pub fn comment(id: u64, media_type: MediaType, tmdb_id: u64, content: &str) -> Comment {
    Comment {
        id,
        uid: Some(String::from("u-1")),
        media_type,
        tmdb_id,
        content: String::from(content),
        author_name: None,
        created_at: None,
    }
}

impl LocalBackendApi for MockApi {
    async fn search(
        &self,
        params: &SearchParams,
        _cancel: Option<&CancellationToken>,
    ) -> Result<ResultPage<MediaSummary>> {
        let label = format!("search:{}", params.query);
        self.enter(Call::Search(params.clone()), &label).await?;
        Ok(self.page(label, params.media_type, params.page))
    }

    async fn discover(
        &self,
        params: &DiscoverParams,
        _cancel: Option<&CancellationToken>,
    ) -> Result<ResultPage<MediaSummary>> {
        self.enter(Call::Discover(params.clone()), "discover").await?;
        Ok(self.page(String::from("discover"), params.media_type, params.page))
    }

    async fn trending(
        &self,
        params: &TrendingParams,
        _cancel: Option<&CancellationToken>,
    ) -> Result<ResultPage<MediaSummary>> {
        let label = format!("trending:{}/{}", params.media_type, params.window);
        self.enter(Call::Trending(params.clone()), &label).await?;
        Ok(self.page(label, params.media_type, params.page))
    }

    async fn details(
        &self,
        media_type: MediaType,
        id: u64,
        _language: &str,
        _cancel: Option<&CancellationToken>,
    ) -> Result<MediaDetails> {
        self.enter(Call::Details(media_type, id), &format!("details:{id}"))
            .await?;
        Ok(details(id))
    }

    async fn media(
        &self,
        media_type: MediaType,
        id: u64,
        _cancel: Option<&CancellationToken>,
    ) -> Result<MediaAssets> {
        self.enter(Call::Media(media_type, id), &format!("media:{id}"))
            .await?;
        let trailers = (0..self.trailers)
            .map(|n| MediaVideo {
                key: format!("{id}-t{n}"),
                name: format!("Trailer {n}"),
                site: String::from("YouTube"),
                kind: String::from("Trailer"),
            })
            .collect();
        let backdrops = (0..self.backdrops)
            .map(|n| MediaImage {
                file_path: format!("/{id}-b{n}.jpg"),
                width: None,
                height: None,
            })
            .collect();
        Ok(MediaAssets {
            trailers,
            backdrops,
        })
    }

    async fn list_favorites(
        &self,
        _bearer: &str,
        _cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Favorite>> {
        self.enter(Call::ListFavorites, "list_favorites").await?;
        Ok(self.favorites.lock().unwrap().clone())
    }

    async fn add_favorite(&self, _bearer: &str, favorite: &NewFavorite) -> Result<Ack> {
        self.enter(Call::AddFavorite(favorite.clone()), "add_favorite")
            .await?;
        let mut favorites = self.favorites.lock().unwrap();
        if !favorites.iter().any(|f| f.key() == favorite.key()) {
            favorites.push(Favorite {
                id: None,
                media_type: favorite.media_type,
                tmdb_id: favorite.tmdb_id,
                title: favorite.title.clone(),
                poster_path: favorite.poster_path.clone(),
                created_at: None,
            });
        }
        Ok(Ack { ok: true, id: None })
    }

    async fn remove_favorite(&self, _bearer: &str, key: FavoriteKey) -> Result<Ack> {
        self.enter(Call::RemoveFavorite(key), "remove_favorite")
            .await?;
        self.favorites.lock().unwrap().retain(|f| f.key() != key);
        Ok(Ack { ok: true, id: None })
    }

    async fn bootstrap_user(&self, _bearer: &str) -> Result<Ack> {
        self.enter(Call::Bootstrap, "bootstrap").await?;
        Ok(Ack { ok: true, id: None })
    }

    async fn profile(&self, _bearer: &str) -> Result<Profile> {
        self.enter(Call::Profile, "profile").await?;
        Ok(Profile {
            uid: String::from("u-1"),
            email: Some(String::from("user@example.com")),
            display_name: Some(String::from("User")),
            photo_url: None,
            created_at: None,
        })
    }

    async fn update_profile(&self, _bearer: &str, update: &ProfileUpdate) -> Result<Ack> {
        self.enter(Call::UpdateProfile(update.clone()), "update_profile")
            .await?;
        Ok(Ack { ok: true, id: None })
    }

    async fn alerts(&self, _bearer: &str) -> Result<AlertPreferences> {
        self.enter(Call::Alerts, "alerts").await?;
        Ok(AlertPreferences::default())
    }

    async fn update_alerts(&self, _bearer: &str, prefs: &AlertPreferences) -> Result<Ack> {
        self.enter(Call::UpdateAlerts(prefs.clone()), "update_alerts")
            .await?;
        Ok(Ack { ok: true, id: None })
    }

    async fn comments(
        &self,
        media_type: MediaType,
        tmdb_id: u64,
        _cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Comment>> {
        self.enter(
            Call::Comments(media_type, tmdb_id),
            &format!("comments:{tmdb_id}"),
        )
        .await?;
        Ok(vec![comment(1, media_type, tmdb_id, "first")])
    }

    async fn add_comment(&self, _bearer: &str, new: &NewComment) -> Result<Comment> {
        self.enter(Call::AddComment(new.clone()), "add_comment")
            .await?;
        Ok(comment(99, new.media_type, new.tmdb_id, new.content.trim()))
    }
}
