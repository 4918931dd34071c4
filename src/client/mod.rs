//! Customer-side half of ordering: cart state, identity, and submission.

pub mod cart;
pub mod http;
pub mod identity;
pub mod submitter;

pub use cart::{AddOutcome, CartLine, CartSnapshot, CartStore, LineKey, RestaurantSwitchPolicy};
pub use http::ApiClient;
pub use identity::{AuthenticatedUser, Identity, IdentityEvent, IdentityProvider, IdentitySync};
pub use submitter::{CreateOrderOutcome, OrderGateway, OrderSubmitter};
