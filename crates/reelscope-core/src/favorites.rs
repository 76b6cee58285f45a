//! Shared favorite membership and the favorites management view.
//!
//! [`FavoriteSet`] is read by every listing controller to decorate items.
//! Keys are inserted only after the server confirms a save; a failed save
//! leaves no trace, so there is nothing to roll back.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use reelscope_api::{
    ApiError, Favorite, FavoriteKey, LocalBackendApi, MediaSummary, MediaType, NewFavorite,
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::paged::{CancelableQuery, QueryOutcome};

/// What a listing view does when saving a favorite fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteSavePolicy {
    /// Log at WARN and show nothing.
    #[default]
    Log,
    /// Return the message so the view can show it.
    Surface,
}

/// Result of [`FavoriteSet::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The server confirmed the save and the key is now in the set.
    Saved,
    /// The key was already in the set; no request was made.
    AlreadyFavorite,
    /// A save for the same key is still pending; no request was made.
    InFlight,
    /// The server rejected the save. `notice` is set under
    /// [`FavoriteSavePolicy::Surface`].
    Failed {
        /// Message to show, if the policy surfaces failures.
        notice: Option<String>,
    },
}

#[derive(Debug, Default)]
struct Membership {
    keys: HashSet<FavoriteKey>,
    pending: HashSet<FavoriteKey>,
}

/// Set of favorited identities shared across controllers.
///
/// Cloning yields another handle to the same set.
#[derive(Debug, Clone, Default)]
pub struct FavoriteSet {
    inner: Arc<RwLock<Membership>>,
}

impl FavoriteSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Membership> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Membership> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the set with the user's stored favorites.
    ///
    /// # Errors
    ///
    /// Returns the API error if listing fails; the set is left unchanged.
    #[instrument(skip_all)]
    pub async fn load<A: LocalBackendApi>(&self, api: &A, bearer: &str) -> Result<usize, ApiError> {
        let favorites = api.list_favorites(bearer, None).await?;
        self.replace(favorites.iter().map(Favorite::key));
        Ok(self.len())
    }

    /// Replaces the set's contents.
    pub fn replace(&self, keys: impl IntoIterator<Item = FavoriteKey>) {
        self.write().keys = keys.into_iter().collect();
    }

    /// Empties the set, e.g. on sign-out.
    pub fn clear(&self) {
        let mut membership = self.write();
        membership.keys.clear();
        membership.pending.clear();
    }

    /// Whether `key` is a favorite.
    #[must_use]
    pub fn contains(&self, key: &FavoriteKey) -> bool {
        self.read().keys.contains(key)
    }

    /// Whether a save for `key` is pending.
    #[must_use]
    pub fn is_pending(&self, key: &FavoriteKey) -> bool {
        self.read().pending.contains(key)
    }

    /// Number of favorites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().keys.len()
    }

    /// Whether there are no favorites.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().keys.is_empty()
    }

    /// Drops `key` after a confirmed removal.
    pub fn forget(&self, key: &FavoriteKey) {
        self.write().keys.remove(key);
    }

    /// Saves a favorite from a listing view.
    ///
    /// Idempotent per identity: a present or pending key short-circuits
    /// without a request. The key is inserted strictly after the server
    /// confirms.
    pub async fn save<A: LocalBackendApi>(
        &self,
        api: &A,
        bearer: &str,
        favorite: &NewFavorite,
        policy: FavoriteSavePolicy,
    ) -> SaveOutcome {
        let key = favorite.key();
        {
            let mut membership = self.write();
            if membership.keys.contains(&key) {
                return SaveOutcome::AlreadyFavorite;
            }
            if !membership.pending.insert(key) {
                return SaveOutcome::InFlight;
            }
        }

        let result = api.add_favorite(bearer, favorite).await;

        let mut membership = self.write();
        membership.pending.remove(&key);
        match result {
            Ok(_) => {
                membership.keys.insert(key);
                SaveOutcome::Saved
            }
            Err(err) => {
                drop(membership);
                match policy {
                    FavoriteSavePolicy::Log => {
                        warn!(favorite = %key, error = %err, "failed to save favorite");
                        SaveOutcome::Failed { notice: None }
                    }
                    FavoriteSavePolicy::Surface => SaveOutcome::Failed {
                        notice: Some(
                            err.user_message()
                                .unwrap_or_else(|| String::from("Failed to save favorite")),
                        ),
                    },
                }
            }
        }
    }
}

/// A listing item with its favorite decoration.
#[derive(Debug, Clone, PartialEq)]
pub struct Decorated {
    /// The listed item.
    pub item: MediaSummary,
    /// Identity, with the section's media type as fallback.
    pub key: FavoriteKey,
    /// Whether the identity is in the favorite set.
    pub is_favorite: bool,
}

/// Decorates `items` with favorite membership.
#[must_use]
pub fn decorate(
    items: &[MediaSummary],
    fallback: MediaType,
    favorites: &FavoriteSet,
) -> Vec<Decorated> {
    let membership = favorites.read();
    items
        .iter()
        .map(|item| {
            let key = item.key(fallback);
            Decorated {
                item: item.clone(),
                key,
                is_favorite: membership.keys.contains(&key),
            }
        })
        .collect()
}

/// The dedicated favorites management view.
#[derive(Debug)]
pub struct FavoritesView<A> {
    api: Arc<A>,
    favorites: FavoriteSet,
    list: CancelableQuery<Vec<Favorite>>,
}

impl<A: LocalBackendApi> FavoritesView<A> {
    /// Creates the view over a shared favorite set.
    pub fn new(api: Arc<A>, favorites: FavoriteSet) -> Self {
        Self {
            api,
            favorites,
            list: CancelableQuery::new(),
        }
    }

    /// Loads the list and refreshes the shared set from it.
    #[instrument(skip_all)]
    pub async fn load(&self, bearer: &str) -> QueryOutcome {
        let api = Arc::clone(&self.api);
        let bearer = String::from(bearer);
        let outcome = self
            .list
            .run(move |token| async move { api.list_favorites(&bearer, Some(&token)).await })
            .await;
        if outcome.is_applied() {
            self.list.with_value(|items| {
                if let Some(items) = items {
                    self.favorites.replace(items.iter().map(Favorite::key));
                }
            });
        }
        outcome
    }

    /// Removes a favorite, then reloads the list.
    #[instrument(skip_all, fields(favorite = %key))]
    pub async fn remove(&self, bearer: &str, key: FavoriteKey) -> QueryOutcome {
        match self.api.remove_favorite(bearer, key).await {
            Ok(_) => {
                self.favorites.forget(&key);
                self.load(bearer).await
            }
            Err(err) => {
                let message = err
                    .user_message()
                    .unwrap_or_else(|| String::from("Request failed"));
                self.list.set_error(message.clone());
                QueryOutcome::Failed(message)
            }
        }
    }

    /// Listed favorites.
    #[must_use]
    pub fn items(&self) -> Vec<Favorite> {
        self.list.value().unwrap_or_default()
    }

    /// Whether the list is loading.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.list.is_loading()
    }

    /// Per-view error message.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.list.error()
    }
}
