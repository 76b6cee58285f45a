//! Latest-request tracking.
//!
//! A controller keeps one [`LatestRequest`]. Beginning a new request cancels
//! the previous token before the new one is stored, and the generation
//! counter lets a late response detect that it has been superseded even if
//! its cancellation was lost in a race.

use tokio_util::sync::CancellationToken;

/// Handle for one issued request.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    generation: u64,
    token: CancellationToken,
}

impl RequestTicket {
    /// Generation this ticket was issued for.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Cancellation token handed to the network call.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// The single "current" request of a controller.
#[derive(Debug, Default)]
pub struct LatestRequest {
    generation: u64,
    current: Option<CancellationToken>,
}

impl LatestRequest {
    /// Creates an idle tracker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            generation: 0,
            current: None,
        }
    }

    /// Supersedes whatever is in flight and issues a new ticket.
    pub fn begin(&mut self) -> RequestTicket {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        self.generation = self.generation.wrapping_add(1);
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        RequestTicket {
            generation: self.generation,
            token,
        }
    }

    /// Whether `ticket` is still the latest request.
    #[must_use]
    pub const fn is_current(&self, ticket: &RequestTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Marks `ticket` as completed. No-op for superseded tickets.
    pub fn finish(&mut self, ticket: &RequestTicket) {
        if self.is_current(ticket) {
            self.current = None;
        }
    }

    /// Cancels the in-flight request, if any, and invalidates all tickets.
    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Whether a request is in flight.
    #[must_use]
    pub const fn in_flight(&self) -> bool {
        self.current.is_some()
    }
}
