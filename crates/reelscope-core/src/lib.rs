//! Query controllers and shared session state for reelscope.
//!
//! Every controller owns its "last requested" state and applies a response
//! only when the request that produced it is still the current one. The
//! primitives live in [`request`] and [`paged`]; the page-level controllers
//! build on them.

pub mod account;
pub mod detail;
pub mod favorites;
pub mod locale;
pub mod paged;
pub mod request;
pub mod search;
pub mod session;
pub mod trending;

#[cfg(test)]
mod testing;

#[allow(clippy::module_name_repetitions)]
pub use account::{AlertsController, FormState, ProfileController};
pub use detail::{DetailController, MediaIdentity};
pub use favorites::{
    Decorated, FavoriteSavePolicy, FavoriteSet, FavoritesView, SaveOutcome, decorate,
};
pub use locale::Locale;
pub use paged::{CancelableQuery, LocalPager, PageView, PagedQuery, QueryOutcome};
pub use request::{LatestRequest, RequestTicket};
pub use search::{FilterSet, QueryMode, QueryParameters, QueryRequest, SearchController};
pub use session::{
    AuthError, AuthUser, IdentityProvider, LocalIdentityProvider, SessionContext,
    SessionSnapshot, StaticIdentityProvider,
};
pub use trending::{SectionId, TrendingController};
