//! Detail page controller.
//!
//! Three independent loads share one `(media_type, id)` identity: the
//! details record, trailers/backdrops and comments. Opening a new identity
//! supersedes all three. Trailers and backdrops are paged locally.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reelscope_api::{
    ApiError, Comment, LocalBackendApi, MediaAssets, MediaDetails, MediaImage, MediaType,
    MediaVideo, NewComment,
};
use tracing::instrument;

use crate::paged::{CancelableQuery, LocalPager, QueryOutcome};

/// Trailers shown per page.
pub const TRAILERS_PER_PAGE: usize = 1;

/// Backdrop images shown per page.
pub const IMAGES_PER_PAGE: usize = 2;

/// Identity of the title on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaIdentity {
    /// Media type.
    pub media_type: MediaType,
    /// TMDB ID.
    pub id: u64,
}

impl MediaIdentity {
    /// Creates an identity.
    #[must_use]
    pub const fn new(media_type: MediaType, id: u64) -> Self {
        Self { media_type, id }
    }
}

impl fmt::Display for MediaIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media_type, self.id)
    }
}

#[derive(Debug)]
struct Pagers {
    trailers: LocalPager,
    images: LocalPager,
}

impl Default for Pagers {
    fn default() -> Self {
        Self {
            trailers: LocalPager::new(TRAILERS_PER_PAGE),
            images: LocalPager::new(IMAGES_PER_PAGE),
        }
    }
}

/// Controller for one detail view.
#[derive(Debug)]
pub struct DetailController<A> {
    api: Arc<A>,
    language: String,
    identity: Mutex<Option<MediaIdentity>>,
    details: CancelableQuery<MediaDetails>,
    assets: CancelableQuery<MediaAssets>,
    comments: CancelableQuery<Vec<Comment>>,
    pagers: Mutex<Pagers>,
}

impl<A: LocalBackendApi> DetailController<A> {
    /// Creates an empty controller that requests details in `language`.
    pub fn new(api: Arc<A>, language: impl Into<String>) -> Self {
        Self {
            api,
            language: language.into(),
            identity: Mutex::new(None),
            details: CancelableQuery::new(),
            assets: CancelableQuery::new(),
            comments: CancelableQuery::new(),
            pagers: Mutex::new(Pagers::default()),
        }
    }

    fn identity_slot(&self) -> MutexGuard<'_, Option<MediaIdentity>> {
        self.identity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pagers(&self) -> MutexGuard<'_, Pagers> {
        self.pagers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Identity on screen.
    #[must_use]
    pub fn identity(&self) -> Option<MediaIdentity> {
        *self.identity_slot()
    }

    /// Shows `identity`, loading its three resources concurrently.
    ///
    /// Returns the outcomes for details, assets and comments.
    #[instrument(skip_all, fields(identity = %identity))]
    pub async fn open(
        &self,
        identity: MediaIdentity,
    ) -> (QueryOutcome, QueryOutcome, QueryOutcome) {
        self.switch_to(identity);
        futures::join!(
            self.load_details(identity),
            self.load_assets(identity),
            self.load_comments(identity)
        )
    }

    /// Shows `identity` with only its comments loaded. Details and assets
    /// stay empty.
    #[instrument(skip_all, fields(identity = %identity))]
    pub async fn open_comments(&self, identity: MediaIdentity) -> QueryOutcome {
        self.switch_to(identity);
        self.load_comments(identity).await
    }

    fn switch_to(&self, identity: MediaIdentity) {
        *self.identity_slot() = Some(identity);
        self.details.reset();
        self.assets.reset();
        self.comments.reset();
        *self.pagers() = Pagers::default();
    }

    /// Reloads the current identity, if any.
    pub async fn reload(&self) -> Option<(QueryOutcome, QueryOutcome, QueryOutcome)> {
        let identity = self.identity()?;
        Some(self.open(identity).await)
    }

    async fn load_details(&self, identity: MediaIdentity) -> QueryOutcome {
        let api = Arc::clone(&self.api);
        let language = self.language.clone();
        self.details
            .run(move |token| async move {
                api.details(identity.media_type, identity.id, &language, Some(&token)).await
            })
            .await
    }

    async fn load_assets(&self, identity: MediaIdentity) -> QueryOutcome {
        let api = Arc::clone(&self.api);
        let outcome = self
            .assets
            .run(move |token| async move {
                api.media(identity.media_type, identity.id, Some(&token)).await
            })
            .await;
        if outcome.is_applied() {
            *self.pagers() = Pagers::default();
        }
        outcome
    }

    async fn load_comments(&self, identity: MediaIdentity) -> QueryOutcome {
        let api = Arc::clone(&self.api);
        self.comments
            .run(move |token| async move {
                api.comments(identity.media_type, identity.id, Some(&token)).await
            })
            .await
    }

    /// Leaves the view. In-flight loads are cancelled and never applied.
    pub fn close(&self) {
        *self.identity_slot() = None;
        self.details.reset();
        self.assets.reset();
        self.comments.reset();
    }

    /// Details slot.
    #[must_use]
    pub const fn details(&self) -> &CancelableQuery<MediaDetails> {
        &self.details
    }

    /// Trailers/backdrops slot.
    #[must_use]
    pub const fn assets(&self) -> &CancelableQuery<MediaAssets> {
        &self.assets
    }

    /// Comments slot, newest first.
    #[must_use]
    pub const fn comments(&self) -> &CancelableQuery<Vec<Comment>> {
        &self.comments
    }

    // --- Local paging ---

    /// Trailers on the current trailer page.
    #[must_use]
    pub fn visible_trailers(&self) -> Vec<MediaVideo> {
        let pager = self.pagers().trailers;
        self.assets.with_value(|assets| {
            assets.map_or_else(Vec::new, |a| pager.window(&a.trailers).to_vec())
        })
    }

    /// Backdrops on the current image page.
    #[must_use]
    pub fn visible_images(&self) -> Vec<MediaImage> {
        let pager = self.pagers().images;
        self.assets.with_value(|assets| {
            assets.map_or_else(Vec::new, |a| pager.window(&a.backdrops).to_vec())
        })
    }

    /// `(page, total_pages)` of the trailer pager.
    #[must_use]
    pub fn trailer_page(&self) -> (usize, usize) {
        let pager = self.pagers().trailers;
        (pager.page_index(), pager.total_pages(self.trailer_count()))
    }

    /// `(page, total_pages)` of the image pager.
    #[must_use]
    pub fn image_page(&self) -> (usize, usize) {
        let pager = self.pagers().images;
        (pager.page_index(), pager.total_pages(self.image_count()))
    }

    /// Next trailer page. Never touches the network.
    pub fn next_trailers(&self) -> bool {
        let len = self.trailer_count();
        self.pagers().trailers.next(len)
    }

    /// Previous trailer page.
    pub fn prev_trailers(&self) -> bool {
        self.pagers().trailers.prev()
    }

    /// Next image page. Never touches the network.
    pub fn next_images(&self) -> bool {
        let len = self.image_count();
        self.pagers().images.next(len)
    }

    /// Previous image page.
    pub fn prev_images(&self) -> bool {
        self.pagers().images.prev()
    }

    fn trailer_count(&self) -> usize {
        self.assets.with_value(|a| a.map_or(0, |a| a.trailers.len()))
    }

    fn image_count(&self) -> usize {
        self.assets.with_value(|a| a.map_or(0, |a| a.backdrops.len()))
    }

    // --- Comments ---

    /// Posts a comment on the title on screen.
    ///
    /// The stored comment returned by the server is prepended to the list,
    /// unless the view has moved to another identity meanwhile. Nothing is
    /// inserted before confirmation and a failure leaves the list untouched.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] when signed out, when nothing is on screen,
    /// or when `content` is blank (no request is made); otherwise the API
    /// error.
    #[instrument(skip_all)]
    pub async fn post_comment(
        &self,
        bearer: Option<&str>,
        content: &str,
    ) -> Result<Comment, ApiError> {
        let bearer = bearer
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ApiError::Validation(String::from("Sign in to comment")))?;
        let identity = self
            .identity()
            .ok_or_else(|| ApiError::Validation(String::from("No title selected")))?;
        let content = content.trim();
        if content.is_empty() {
            return Err(ApiError::Validation(String::from("Comment cannot be empty")));
        }

        let comment = NewComment {
            media_type: identity.media_type,
            tmdb_id: identity.id,
            content: String::from(content),
        };
        let created = self.api.add_comment(bearer, &comment).await?;

        if self.identity() == Some(identity) {
            self.comments
                .update(|list| list.insert(0, created.clone()));
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::time::Duration;

    use super::*;
    use crate::testing::{Call, MockApi};

    const DUNE: MediaIdentity = MediaIdentity::new(MediaType::Movie, 438_631);
    const GOT: MediaIdentity = MediaIdentity::new(MediaType::Tv, 1399);

    fn controller(api: &Arc<MockApi>) -> DetailController<MockApi> {
        DetailController::new(Arc::clone(api), "en-US")
    }

    #[tokio::test]
    async fn test_open_loads_three_resources() {
        // Arrange
        let api = Arc::new(MockApi::default());
        let ctrl = controller(&api);

        // Act
        let (details, assets, comments) = ctrl.open(DUNE).await;

        // Assert
        assert!(details.is_applied() && assets.is_applied() && comments.is_applied());
        let calls = api.calls();
        assert!(calls.contains(&Call::Details(MediaType::Movie, 438_631)));
        assert!(calls.contains(&Call::Media(MediaType::Movie, 438_631)));
        assert!(calls.contains(&Call::Comments(MediaType::Movie, 438_631)));
        assert_eq!(ctrl.details().value().unwrap().id, 438_631);
    }

    #[tokio::test]
    async fn test_open_comments_loads_only_the_thread() {
        // Arrange
        let api = Arc::new(MockApi::default());
        let ctrl = controller(&api);
        ctrl.open(GOT).await;
        api.clear_calls();

        // Act
        let outcome = ctrl.open_comments(DUNE).await;

        // Assert
        assert_eq!(outcome, QueryOutcome::Applied);
        assert_eq!(api.calls(), vec![Call::Comments(MediaType::Movie, 438_631)]);
        assert_eq!(ctrl.identity(), Some(DUNE));
        assert!(ctrl.details().value().is_none());
        assert!(ctrl.assets().value().is_none());
        assert!(!ctrl.comments().value().unwrap().is_empty());

        let created = ctrl.post_comment(Some("tok"), "first").await.unwrap();
        assert_eq!(ctrl.comments().value().unwrap()[0], created);
    }

    #[tokio::test]
    async fn test_local_paging_makes_no_requests() {
        // Arrange
        let api = Arc::new(MockApi::default());
        let ctrl = controller(&api);
        ctrl.open(DUNE).await;
        api.clear_calls();

        // Act
        assert!(ctrl.next_trailers());
        assert!(ctrl.next_images());
        assert!(ctrl.next_images());
        let trailers = ctrl.visible_trailers();
        let images = ctrl.visible_images();

        // Assert
        assert_eq!(api.call_count(), 0);
        assert_eq!(trailers.len(), 1);
        assert_eq!(trailers[0].key, "438631-t1");
        // 5 backdrops, 2 per page: page 3 holds the last one.
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].file_path, "/438631-b4.jpg");
        assert_eq!(ctrl.image_page(), (3, 3));
        assert!(!ctrl.next_images());
        assert_eq!(ctrl.trailer_page(), (2, 3));
    }

    #[tokio::test]
    async fn test_reopening_resets_pagers() {
        // Arrange
        let api = Arc::new(MockApi::default());
        let ctrl = controller(&api);
        ctrl.open(DUNE).await;
        ctrl.next_trailers();

        // Act
        ctrl.open(GOT).await;

        // Assert
        assert_eq!(ctrl.trailer_page().0, 1);
        assert_eq!(ctrl.visible_trailers()[0].key, "1399-t0");
    }

    #[tokio::test]
    async fn test_identity_change_discards_superseded_details() {
        // Arrange
        let api = Arc::new(MockApi::default());
        api.delay("details:438631", Duration::from_millis(80));
        let ctrl = controller(&api);

        // Act
        let (first, second) = tokio::join!(ctrl.open(DUNE), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            ctrl.open(GOT).await
        });

        // Assert
        assert_eq!(first.0, QueryOutcome::Aborted);
        assert!(second.0.is_applied());
        assert_eq!(ctrl.details().value().unwrap().id, 1399);
        assert_eq!(ctrl.identity(), Some(GOT));
    }

    #[tokio::test]
    async fn test_blank_comment_is_rejected_without_request() {
        // Arrange
        let api = Arc::new(MockApi::default());
        let ctrl = controller(&api);
        ctrl.open(DUNE).await;
        api.clear_calls();

        // Act
        let result = ctrl.post_comment(Some("tok"), "  \n\t ").await;

        // Assert
        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert_eq!(api.call_count(), 0);
        assert_eq!(ctrl.comments().value().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_comment_requires_token() {
        // Arrange
        let api = Arc::new(MockApi::default());
        let ctrl = controller(&api);
        ctrl.open(DUNE).await;
        api.clear_calls();

        // Act
        let result = ctrl.post_comment(None, "hello").await;

        // Assert
        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_posted_comment_is_prepended() {
        // Arrange
        let api = Arc::new(MockApi::default());
        let ctrl = controller(&api);
        ctrl.open(DUNE).await;

        // Act
        let created = ctrl.post_comment(Some("tok"), "  great  ").await.unwrap();

        // Assert
        assert_eq!(created.content, "great");
        let comments = ctrl.comments().value().unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, 99);
        let calls = api.calls();
        let Some(Call::AddComment(sent)) = calls.last() else {
            panic!("expected add_comment call");
        };
        assert_eq!(sent.content, "great");
    }

    #[tokio::test]
    async fn test_rejected_comment_leaves_list_untouched() {
        // Arrange
        let api = Arc::new(MockApi::default());
        api.fail("add_comment", 400, "content required");
        let ctrl = controller(&api);
        ctrl.open(DUNE).await;

        // Act
        let result = ctrl.post_comment(Some("tok"), "hello").await;

        // Assert
        assert_eq!(result.unwrap_err().status(), Some(400));
        assert_eq!(ctrl.comments().value().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_comment_confirmed_after_navigation_is_not_prepended() {
        // Arrange
        let api = Arc::new(MockApi::default());
        api.delay("add_comment", Duration::from_millis(50));
        let ctrl = controller(&api);
        ctrl.open(DUNE).await;

        // Act
        let (posted, _) = tokio::join!(ctrl.post_comment(Some("tok"), "late"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            ctrl.open(GOT).await
        });

        // Assert
        assert!(posted.is_ok());
        let comments = ctrl.comments().value().unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].tmdb_id, 1399);
    }

    #[tokio::test]
    async fn test_close_cancels_in_flight_loads() {
        // Arrange
        let api = Arc::new(MockApi::default());
        api.delay("comments:438631", Duration::from_millis(80));
        let ctrl = controller(&api);

        // Act
        let (outcomes, ()) = tokio::join!(ctrl.open(DUNE), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            ctrl.close();
        });

        // Assert
        assert_eq!(outcomes.2, QueryOutcome::Aborted);
        assert!(ctrl.comments().value().is_none());
        assert!(ctrl.identity().is_none());
    }
}
