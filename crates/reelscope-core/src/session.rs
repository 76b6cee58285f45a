//! Authentication session context.
//!
//! The identity provider is external. [`SessionContext`] subscribes to its
//! user changes, fetches a bearer token for each signed-in user and
//! publishes `{user, token, loading}` snapshots. It is constructed
//! explicitly and torn down with [`SessionContext::shutdown`].

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Provider user ID.
    pub uid: String,
    /// Email address.
    pub email: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
}

/// Identity provider failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The provider refused the operation.
    #[error("{0}")]
    Rejected(String),
    /// No user is signed in.
    #[error("not signed in")]
    SignedOut,
    /// The provider cannot perform this operation.
    #[error("{0} is not supported by this identity provider")]
    Unsupported(&'static str),
}

/// External identity provider.
///
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[trait_variant::make(IdentityProvider: Send)]
pub trait LocalIdentityProvider {
    /// Receiver of user changes. The current value is the current user.
    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>>;

    /// Bearer token for `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot issue a token.
    async fn id_token(&self, user: &AuthUser) -> Result<String, AuthError>;

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the provider's rejection.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Registers a new account.
    ///
    /// # Errors
    ///
    /// Returns the provider's rejection.
    async fn register(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Signs out.
    ///
    /// # Errors
    ///
    /// Returns the provider's rejection.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Session state seen by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Current user.
    pub user: Option<AuthUser>,
    /// Bearer token for the current user.
    pub token: Option<String>,
    /// `true` until the first session check resolves.
    pub loading: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            user: None,
            token: None,
            loading: true,
        }
    }
}

/// Explicitly constructed session context.
#[derive(Debug)]
pub struct SessionContext<P> {
    provider: Arc<P>,
    snapshot: watch::Receiver<SessionSnapshot>,
    shutdown: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<P> SessionContext<P>
where
    P: IdentityProvider + Sync + 'static,
{
    /// Subscribes to `provider` and spawns the listener task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(provider: Arc<P>) -> Self {
        let (tx, rx) = watch::channel(SessionSnapshot::default());
        let shutdown = CancellationToken::new();
        let listener = tokio::spawn(listen(Arc::clone(&provider), tx, shutdown.clone()));

        Self {
            provider,
            snapshot: rx,
            shutdown,
            listener: Mutex::new(Some(listener)),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Bearer token of the signed-in user.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.snapshot.borrow().token.clone()
    }

    /// Receiver of snapshot changes.
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Waits until the first session check has resolved.
    pub async fn ready(&self) -> SessionSnapshot {
        let mut rx = self.snapshot.clone();
        let resolved = rx.wait_for(|s| !s.loading).await.map(|s| s.clone());
        resolved.unwrap_or_else(|_| self.snapshot())
    }

    /// Signs in through the provider.
    ///
    /// # Errors
    ///
    /// Returns the provider's rejection.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        IdentityProvider::sign_in(self.provider.as_ref(), email, password).await
    }

    /// Registers through the provider.
    ///
    /// # Errors
    ///
    /// Returns the provider's rejection.
    pub async fn register(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        IdentityProvider::register(self.provider.as_ref(), email, password).await
    }

    /// Signs out through the provider.
    ///
    /// # Errors
    ///
    /// Returns the provider's rejection.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        IdentityProvider::sign_out(self.provider.as_ref()).await
    }

    /// Unsubscribes and waits for the listener task to exit.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(error = %err, "session listener terminated abnormally");
            }
        }
    }
}

impl<P> Drop for SessionContext<P> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn listen<P: IdentityProvider>(
    provider: Arc<P>,
    snapshot: watch::Sender<SessionSnapshot>,
    shutdown: CancellationToken,
) {
    let mut users = IdentityProvider::subscribe(provider.as_ref());
    loop {
        let user = users.borrow_and_update().clone();
        let token = match &user {
            Some(u) => match IdentityProvider::id_token(provider.as_ref(), u).await {
                Ok(token) => Some(token),
                Err(err) => {
                    warn!(uid = %u.uid, error = %err, "failed to fetch id token");
                    None
                }
            },
            None => None,
        };
        debug!(signed_in = user.is_some(), "session changed");
        snapshot.send_replace(SessionSnapshot {
            user,
            token,
            loading: false,
        });

        tokio::select! {
            () = shutdown.cancelled() => break,
            changed = users.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    debug!("session listener stopped");
}

/// Identity provider backed by a pre-issued bearer token.
#[derive(Debug)]
pub struct StaticIdentityProvider {
    token: Option<String>,
    user: watch::Sender<Option<AuthUser>>,
}

impl StaticIdentityProvider {
    /// Signed in when `token` is present and non-blank.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        let user = token.as_ref().map(|_| AuthUser {
            uid: String::from("static"),
            email: None,
            display_name: None,
        });
        let (tx, _) = watch::channel(user);
        Self { token, user: tx }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.user.subscribe()
    }

    async fn id_token(&self, _user: &AuthUser) -> Result<String, AuthError> {
        if self.user.borrow().is_none() {
            return Err(AuthError::SignedOut);
        }
        self.token.clone().ok_or(AuthError::SignedOut)
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> Result<AuthUser, AuthError> {
        Err(AuthError::Unsupported("sign-in"))
    }

    async fn register(&self, _email: &str, _password: &str) -> Result<AuthUser, AuthError> {
        Err(AuthError::Unsupported("registration"))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.user.send_replace(None);
        Ok(())
    }
}
