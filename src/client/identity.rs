use tokio::sync::broadcast::{self, error::TryRecvError};
use uuid::Uuid;

use crate::domain::{GuestInfo, OrderingError, OrderingResult};

/// Token-backed identity of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub token: String,
}

/// Identity an order is submitted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Authenticated(AuthenticatedUser),
    Guest(GuestInfo),
}

/// Cross-tab notifications, typically fed from browser storage-change events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    SignedIn { user_id: Uuid },
    SignedOut,
    StorageChanged { key: String },
}

/// Source of truth for the current sign-in state.
pub trait IdentityProvider {
    fn current_identity(&self) -> Option<AuthenticatedUser>;
}

/// Caches the authenticated identity and drops it whenever another tab
/// reports a sign-in/out, so the next submission re-reads the provider.
pub struct IdentitySync<P> {
    provider: P,
    events: broadcast::Receiver<IdentityEvent>,
    cached: Option<AuthenticatedUser>,
    stale: bool,
}

impl<P: IdentityProvider> IdentitySync<P> {
    pub fn new(provider: P, events: broadcast::Receiver<IdentityEvent>) -> Self {
        Self {
            provider,
            events,
            cached: None,
            stale: true,
        }
    }

    /// Drain pending notifications; returns `true` if the cache was invalidated.
    pub fn poll_events(&mut self) -> bool {
        let mut invalidated = false;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    tracing::debug!(?event, "identity change observed");
                    invalidated = true;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "identity events lagged");
                    invalidated = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if invalidated {
            self.invalidate();
        }
        invalidated
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
        self.stale = true;
    }

    /// Current authenticated identity, re-read from the provider if stale.
    pub fn authenticated(&mut self) -> Option<AuthenticatedUser> {
        self.poll_events();
        if self.stale {
            self.cached = self.provider.current_identity();
            self.stale = false;
        }
        self.cached.clone()
    }

    /// Identity to submit under: the signed-in user, otherwise a complete guest.
    pub fn resolve(&mut self, guest: Option<&GuestInfo>) -> OrderingResult<Identity> {
        if let Some(user) = self.authenticated() {
            return Ok(Identity::Authenticated(user));
        }
        match guest {
            Some(info) if info.is_complete() => Ok(Identity::Guest(info.clone())),
            Some(_) => Err(OrderingError::MissingIdentity(
                "guest checkout needs a name and phone number".into(),
            )),
            None => Err(OrderingError::MissingIdentity(
                "sign in or provide guest contact details".into(),
            )),
        }
    }
}
