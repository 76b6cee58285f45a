//! Profile and alert-preference controllers.
//!
//! Each holds a single form state with a per-view error or notice message.

use std::sync::{Arc, Mutex, PoisonError};

use reelscope_api::{
    AlertFrequency, AlertPreferences, ApiError, LocalBackendApi, Profile, ProfileUpdate,
};
use tracing::{instrument, warn};

/// Notice shown after a successful save.
pub const SAVED: &str = "Saved";

/// Form value with its last error or notice. Setting one clears the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState<T> {
    /// Current value.
    pub value: T,
    /// Last error message.
    pub error: Option<String>,
    /// Last success notice.
    pub notice: Option<String>,
}

impl<T> FormState<T> {
    fn fail(&mut self, err: &ApiError, fallback: &str) {
        self.error = Some(err.user_message().unwrap_or_else(|| String::from(fallback)));
        self.notice = None;
    }

    fn succeed(&mut self) {
        self.error = None;
        self.notice = Some(String::from(SAVED));
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(|v| String::from(v.trim()))
}

/// Controller for the profile page.
#[derive(Debug)]
pub struct ProfileController<A> {
    api: Arc<A>,
    state: Mutex<FormState<Option<Profile>>>,
}

impl<A: LocalBackendApi> ProfileController<A> {
    /// Creates an empty controller.
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            state: Mutex::new(FormState::default()),
        }
    }

    /// Snapshot of the form.
    #[must_use]
    pub fn state(&self) -> FormState<Option<Profile>> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Ensures the server-side user row exists, then loads the profile.
    ///
    /// # Errors
    ///
    /// Returns the first failing request's error, also kept in the form.
    #[instrument(skip_all)]
    pub async fn load(&self, bearer: &str) -> Result<Profile, ApiError> {
        let result = match self.api.bootstrap_user(bearer).await {
            Ok(_) => self.api.profile(bearer).await,
            Err(err) => Err(err),
        };
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &result {
            Ok(profile) => {
                state.value = Some(profile.clone());
                state.error = None;
            }
            Err(err) => {
                warn!(error = %err, "failed to load profile");
                state.fail(err, "Failed to load profile");
            }
        }
        drop(state);
        result
    }

    /// Saves the display name and avatar URL.
    ///
    /// `None` leaves a field unchanged. A blank value clears it.
    ///
    /// # Errors
    ///
    /// Returns the request error, also kept in the form.
    #[instrument(skip_all)]
    pub async fn save(
        &self,
        bearer: &str,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<(), ApiError> {
        let update = ProfileUpdate {
            display_name: trimmed(display_name),
            photo_url: trimmed(photo_url),
        };
        let result = self.api.update_profile(bearer, &update).await;
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(_) => {
                if let Some(profile) = state.value.as_mut() {
                    if update.display_name.is_some() {
                        profile.display_name.clone_from(&update.display_name);
                    }
                    if update.photo_url.is_some() {
                        profile.photo_url.clone_from(&update.photo_url);
                    }
                }
                state.succeed();
                Ok(())
            }
            Err(err) => {
                state.fail(&err, "Failed to save profile");
                Err(err)
            }
        }
    }
}

/// Joins comma-separated entries after trimming, dropping empty ones.
fn normalize_list(value: &str) -> String {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Controller for the alert-preferences page.
#[derive(Debug)]
pub struct AlertsController<A> {
    api: Arc<A>,
    state: Mutex<FormState<AlertPreferences>>,
}

impl<A: LocalBackendApi> AlertsController<A> {
    /// Creates a controller holding default preferences.
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            state: Mutex::new(FormState::default()),
        }
    }

    /// Snapshot of the form.
    #[must_use]
    pub fn state(&self) -> FormState<AlertPreferences> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Loads stored preferences. On failure the form keeps defaults.
    #[instrument(skip_all)]
    pub async fn load(&self, bearer: &str) -> AlertPreferences {
        let result = self.api.alerts(bearer).await;
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(prefs) => {
                state.value = prefs;
                state.error = None;
            }
            Err(err) => {
                warn!(error = %err, "failed to load alert preferences");
                state.value = AlertPreferences::default();
                state.fail(&err, "Failed to load alert preferences");
            }
        }
        state.value.clone()
    }

    /// Saves preferences. Keyword and channel lists are normalized first.
    ///
    /// # Errors
    ///
    /// Returns the request error, also kept in the form.
    #[instrument(skip_all, fields(frequency = %frequency))]
    pub async fn save(
        &self,
        bearer: &str,
        frequency: AlertFrequency,
        keywords: &str,
        channels: &str,
    ) -> Result<(), ApiError> {
        let prefs = AlertPreferences {
            frequency,
            keywords: normalize_list(keywords),
            channels: normalize_list(channels),
            updated_at: None,
        };
        let result = self.api.update_alerts(bearer, &prefs).await;
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(_) => {
                state.value = prefs;
                state.succeed();
                Ok(())
            }
            Err(err) => {
                state.fail(&err, "Failed to save alert preferences");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::testing::{Call, MockApi};

    #[test]
    fn test_normalize_list() {
        // Arrange & Act & Assert
        assert_eq!(normalize_list(" email , ,push,"), "email,push");
        assert_eq!(normalize_list(""), "");
    }

    #[tokio::test]
    async fn test_profile_load_bootstraps_first() {
        // Arrange
        let api = Arc::new(MockApi::default());
        let ctrl = ProfileController::new(Arc::clone(&api));

        // Act
        let profile = ctrl.load("tok").await.unwrap();

        // Assert
        assert_eq!(profile.uid, "u-1");
        assert_eq!(api.calls(), vec![Call::Bootstrap, Call::Profile]);
        assert_eq!(ctrl.state().value, Some(profile));
    }

    #[tokio::test]
    async fn test_profile_load_stops_when_bootstrap_fails() {
        // Arrange
        let api = Arc::new(MockApi::default());
        api.fail("bootstrap", 401, "Unauthorized");
        let ctrl = ProfileController::new(Arc::clone(&api));

        // Act
        let result = ctrl.load("tok").await;

        // Assert
        assert!(result.is_err());
        assert_eq!(api.calls(), vec![Call::Bootstrap]);
        assert_eq!(ctrl.state().error.as_deref(), Some("Unauthorized"));
        assert!(ctrl.state().value.is_none());
    }

    #[tokio::test]
    async fn test_profile_save_sends_trimmed_update_and_notice() {
        // Arrange
        let api = Arc::new(MockApi::default());
        let ctrl = ProfileController::new(Arc::clone(&api));
        ctrl.load("tok").await.unwrap();
        api.clear_calls();

        // Act
        ctrl.save("tok", Some("  New Name "), None).await.unwrap();

        // Assert
        assert_eq!(
            api.calls(),
            vec![Call::UpdateProfile(ProfileUpdate {
                display_name: Some(String::from("New Name")),
                photo_url: None,
            })]
        );
        let state = ctrl.state();
        assert_eq!(state.notice.as_deref(), Some(SAVED));
        assert!(state.error.is_none());
        assert_eq!(
            state.value.unwrap().display_name.as_deref(),
            Some("New Name")
        );
    }

    #[tokio::test]
    async fn test_profile_save_blank_value_clears_field() {
        // Arrange
        let api = Arc::new(MockApi::default());
        let ctrl = ProfileController::new(Arc::clone(&api));
        ctrl.load("tok").await.unwrap();
        api.clear_calls();

        // Act
        ctrl.save("tok", Some("   "), None).await.unwrap();

        // Assert
        assert_eq!(
            api.calls(),
            vec![Call::UpdateProfile(ProfileUpdate {
                display_name: Some(String::new()),
                photo_url: None,
            })]
        );
        assert_eq!(ctrl.state().value.unwrap().display_name.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_profile_save_failure_clears_notice() {
        // Arrange
        let api = Arc::new(MockApi::default());
        let ctrl = ProfileController::new(Arc::clone(&api));
        ctrl.save("tok", Some("A"), None).await.unwrap();
        api.fail("update_profile", 500, "Internal Server Error");

        // Act
        let result = ctrl.save("tok", Some("B"), None).await;

        // Assert
        assert!(result.is_err());
        let state = ctrl.state();
        assert!(state.notice.is_none());
        assert_eq!(state.error.as_deref(), Some("Internal Server Error"));
    }

    #[tokio::test]
    async fn test_alerts_load_failure_keeps_defaults() {
        // Arrange
        let api = Arc::new(MockApi::default());
        api.fail("alerts", 503, "Service Unavailable");
        let ctrl = AlertsController::new(Arc::clone(&api));

        // Act
        let prefs = ctrl.load("tok").await;

        // Assert
        assert_eq!(prefs, AlertPreferences::default());
        assert_eq!(prefs.frequency, AlertFrequency::Weekly);
        assert_eq!(ctrl.state().error.as_deref(), Some("Service Unavailable"));
    }

    #[tokio::test]
    async fn test_alerts_save_normalizes_lists() {
        // Arrange
        let api = Arc::new(MockApi::default());
        let ctrl = AlertsController::new(Arc::clone(&api));

        // Act
        ctrl.save("tok", AlertFrequency::Daily, "sci-fi, noir ,", "email, push")
            .await
            .unwrap();

        // Assert
        let calls = api.calls();
        let [Call::UpdateAlerts(sent)] = calls.as_slice() else {
            panic!("unexpected calls: {calls:?}");
        };
        assert_eq!(sent.keywords, "sci-fi,noir");
        assert_eq!(sent.channels, "email,push");
        assert_eq!(sent.frequency, AlertFrequency::Daily);
        assert_eq!(ctrl.state().notice.as_deref(), Some(SAVED));
        assert_eq!(ctrl.state().value, *sent);
    }
}
