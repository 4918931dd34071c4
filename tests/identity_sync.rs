use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use menu_ordering_api::{
    client::{AuthenticatedUser, Identity, IdentityEvent, IdentityProvider, IdentitySync},
    domain::{GuestInfo, OrderingError},
};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Stands in for shared browser storage: another "tab" writes to it.
#[derive(Clone, Default)]
struct SharedStorage {
    user: Arc<Mutex<Option<AuthenticatedUser>>>,
    reads: Arc<AtomicUsize>,
}

impl SharedStorage {
    fn sign_in(&self, user: AuthenticatedUser) {
        *self.user.lock().unwrap() = Some(user);
    }

    fn sign_out(&self) {
        *self.user.lock().unwrap() = None;
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for SharedStorage {
    fn current_identity(&self) -> Option<AuthenticatedUser> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.user.lock().unwrap().clone()
    }
}

fn guest() -> GuestInfo {
    GuestInfo {
        name: "Ada".into(),
        phone: "555-0100".into(),
        email: Some("ada@example.com".into()),
    }
}

fn user() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: Uuid::new_v4(),
        token: "jwt".into(),
    }
}

#[test]
fn signed_out_resolves_to_complete_guest() {
    let storage = SharedStorage::default();
    let (_tx, rx) = broadcast::channel(8);
    let mut sync = IdentitySync::new(storage, rx);

    assert_eq!(sync.resolve(Some(&guest())), Ok(Identity::Guest(guest())));
}

#[test]
fn missing_or_incomplete_guest_is_rejected() {
    let (_tx, rx) = broadcast::channel(8);
    let mut sync = IdentitySync::new(SharedStorage::default(), rx);

    assert!(matches!(sync.resolve(None), Err(OrderingError::MissingIdentity(_))));

    let mut incomplete = guest();
    incomplete.phone = String::new();
    assert!(matches!(
        sync.resolve(Some(&incomplete)),
        Err(OrderingError::MissingIdentity(_))
    ));
}

#[test]
fn signed_in_user_takes_precedence_over_guest_details() {
    let storage = SharedStorage::default();
    let signed_in = user();
    storage.sign_in(signed_in.clone());
    let (_tx, rx) = broadcast::channel(8);
    let mut sync = IdentitySync::new(storage, rx);

    assert_eq!(
        sync.resolve(Some(&guest())),
        Ok(Identity::Authenticated(signed_in))
    );
}

#[test]
fn identity_is_cached_until_an_event_arrives() {
    let storage = SharedStorage::default();
    let (tx, rx) = broadcast::channel(8);
    let mut sync = IdentitySync::new(storage.clone(), rx);

    assert_eq!(sync.authenticated(), None);
    assert_eq!(sync.authenticated(), None);
    assert_eq!(storage.reads(), 1);

    let signed_in = user();
    storage.sign_in(signed_in.clone());
    // Without a notification the cached sign-out is still served.
    assert_eq!(sync.authenticated(), None);

    tx.send(IdentityEvent::SignedIn {
        user_id: signed_in.user_id,
    })
    .expect("receiver alive");
    assert_eq!(sync.authenticated(), Some(signed_in));
    assert_eq!(storage.reads(), 2);
}

#[test]
fn sign_out_in_another_tab_falls_back_to_guest() {
    let storage = SharedStorage::default();
    storage.sign_in(user());
    let (tx, rx) = broadcast::channel(8);
    let mut sync = IdentitySync::new(storage.clone(), rx);
    assert!(sync.authenticated().is_some());

    storage.sign_out();
    tx.send(IdentityEvent::SignedOut).expect("receiver alive");

    assert_eq!(sync.resolve(Some(&guest())), Ok(Identity::Guest(guest())));
}

#[test]
fn lagged_receiver_still_invalidates() {
    let storage = SharedStorage::default();
    let (tx, rx) = broadcast::channel(1);
    let mut sync = IdentitySync::new(storage.clone(), rx);
    sync.authenticated();

    for key in ["token", "user", "token"] {
        tx.send(IdentityEvent::StorageChanged { key: key.into() })
            .expect("receiver alive");
    }

    assert!(sync.poll_events());
    assert!(!sync.poll_events());
}
