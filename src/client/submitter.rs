use std::{future::Future, time::Duration};

use uuid::Uuid;

use crate::domain::{
    GuestInfo, IdempotencyToken, Order, OrderPayload, OrderPayloadItem, OrderingError,
    OrderingResult,
};

use super::{cart::CartStore, identity::Identity};

pub use crate::domain::order::MAX_INSTRUCTIONS_LEN;

/// Result of an order-creation call. A replayed token yields the order that
/// was created the first time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOrderOutcome {
    Created(Order),
    Duplicate(Order),
}

impl CreateOrderOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, CreateOrderOutcome::Duplicate(_))
    }

    pub fn into_order(self) -> Order {
        match self {
            CreateOrderOutcome::Created(order) | CreateOrderOutcome::Duplicate(order) => order,
        }
    }
}

/// The order-creation endpoint. Implementations must deduplicate on the token.
pub trait OrderGateway {
    fn create_order(
        &self,
        payload: &OrderPayload,
        token: &IdempotencyToken,
        identity: &Identity,
    ) -> impl Future<Output = OrderingResult<CreateOrderOutcome>> + Send;
}

/// Who a pending submission was made as. Signed-in users are keyed by id so a
/// refreshed session token still reuses the pending order token.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Submitter {
    User(Uuid),
    Guest(GuestInfo),
}

impl From<&Identity> for Submitter {
    fn from(identity: &Identity) -> Self {
        match identity {
            Identity::Authenticated(user) => Submitter::User(user.user_id),
            Identity::Guest(info) => Submitter::Guest(info.clone()),
        }
    }
}

#[derive(Debug, Clone)]
struct PendingSubmission {
    fingerprint: String,
    submitter: Submitter,
    token: IdempotencyToken,
}

/// Turns a cart into exactly one order.
///
/// After a recoverable failure the token is kept, and resubmitting the same
/// payload as the same identity reuses it so the endpoint can collapse the
/// retry into the first order.
pub struct OrderSubmitter<G> {
    gateway: G,
    timeout: Duration,
    pending: Option<PendingSubmission>,
}

impl<G: OrderGateway> OrderSubmitter<G> {
    pub fn new(gateway: G, timeout: Duration) -> Self {
        Self {
            gateway,
            timeout,
            pending: None,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Token a retry of the last failed submission would reuse.
    pub fn pending_token(&self) -> Option<&IdempotencyToken> {
        self.pending.as_ref().map(|p| &p.token)
    }

    pub async fn submit(
        &mut self,
        cart: &mut CartStore,
        identity: &Identity,
        special_instructions: Option<String>,
    ) -> OrderingResult<Order> {
        let payload = build_payload(cart, identity, special_instructions)?;
        let fingerprint = payload.fingerprint();
        let submitter = Submitter::from(identity);

        let token = match &self.pending {
            Some(pending)
                if pending.fingerprint == fingerprint && pending.submitter == submitter =>
            {
                pending.token.clone()
            }
            _ => IdempotencyToken::mint(&fingerprint),
        };
        self.pending = Some(PendingSubmission {
            fingerprint,
            submitter,
            token: token.clone(),
        });

        let result = tokio::time::timeout(
            self.timeout,
            self.gateway.create_order(&payload, &token, identity),
        )
        .await
        .unwrap_or_else(|_| {
            Err(OrderingError::NetworkFailure(format!(
                "order submission timed out after {:?}",
                self.timeout
            )))
        });

        match result {
            Ok(outcome) => {
                let duplicate = outcome.is_duplicate();
                let order = outcome.into_order();
                self.pending = None;
                cart.clear();
                tracing::info!(order_id = %order.id, token = %token, duplicate, "order submitted");
                Ok(order)
            }
            Err(err) if err.is_recoverable() => {
                tracing::warn!(
                    error = %err,
                    token = %token,
                    "order submission failed, retry allowed"
                );
                Err(err)
            }
            Err(err) => {
                self.pending = None;
                tracing::warn!(error = %err, "order submission rejected");
                Err(err)
            }
        }
    }
}

/// Freeze the cart into an order request. Fails before any network activity.
pub fn build_payload(
    cart: &CartStore,
    identity: &Identity,
    special_instructions: Option<String>,
) -> OrderingResult<OrderPayload> {
    if cart.is_empty() {
        return Err(OrderingError::EmptyCart);
    }
    let restaurant_id = cart.restaurant_id().ok_or_else(|| {
        OrderingError::ValidationFailure("cart is not bound to a restaurant".into())
    })?;

    let guest = match identity {
        Identity::Authenticated(user) if user.token.trim().is_empty() => {
            return Err(OrderingError::MissingIdentity(
                "signed-in identity has no token".into(),
            ));
        }
        Identity::Authenticated(_) => None,
        Identity::Guest(info) if info.is_complete() => Some(info.clone()),
        Identity::Guest(_) => {
            return Err(OrderingError::MissingIdentity(
                "guest checkout needs a name and phone number".into(),
            ));
        }
    };

    let special_instructions = special_instructions
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if special_instructions
        .as_ref()
        .is_some_and(|s| s.chars().count() > MAX_INSTRUCTIONS_LEN)
    {
        return Err(OrderingError::ValidationFailure(format!(
            "special instructions exceed {MAX_INSTRUCTIONS_LEN} characters"
        )));
    }

    let items = cart
        .lines()
        .iter()
        .map(|line| OrderPayloadItem {
            menu_item_id: line.item.id,
            price_point_id: line.price_point_id,
            name: line.item.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            price_point_label: line.label.clone(),
        })
        .collect();

    Ok(OrderPayload {
        restaurant_id,
        items,
        guest,
        special_instructions,
    })
}
