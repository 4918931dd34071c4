//! Server-side order status state machine.
//!
//! Every allowed edge lives in [`TRANSITIONS`]; anything not listed there is
//! rejected. Checks run in a fixed order: closed order, then edge, then actor.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    error::{OrderingError, OrderingResult},
    order::{Order, OrderStatus},
};

/// Who may take an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Staff of the owning restaurant only.
    Staff,
    /// Staff, or the identity that placed the order.
    StaffOrPlacer,
}

pub const TRANSITIONS: &[(OrderStatus, OrderStatus, Permission)] = &[
    (OrderStatus::Pending, OrderStatus::Confirmed, Permission::Staff),
    (OrderStatus::Confirmed, OrderStatus::Preparing, Permission::Staff),
    (OrderStatus::Preparing, OrderStatus::Ready, Permission::Staff),
    (OrderStatus::Ready, OrderStatus::Completed, Permission::Staff),
    (OrderStatus::Pending, OrderStatus::Cancelled, Permission::StaffOrPlacer),
    (OrderStatus::Confirmed, OrderStatus::Cancelled, Permission::Staff),
    (OrderStatus::Preparing, OrderStatus::Cancelled, Permission::Staff),
];

pub fn permission_for(from: OrderStatus, to: OrderStatus) -> Option<Permission> {
    TRANSITIONS
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, permission)| *permission)
}

/// A status with no outgoing edges.
pub fn is_terminal(status: OrderStatus) -> bool {
    !TRANSITIONS.iter().any(|(from, _, _)| *from == status)
}

/// The identity requesting a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Staff { user_id: Uuid, restaurant_id: Uuid },
    Customer { user_id: Uuid },
    /// Guest proving ownership with the order's idempotency token.
    Guest { token: String },
}

impl Actor {
    fn is_staff_of(&self, restaurant_id: Uuid) -> bool {
        matches!(self, Actor::Staff { restaurant_id: r, .. } if *r == restaurant_id)
    }

    fn placed(&self, order: &Order) -> bool {
        match self {
            Actor::Customer { user_id } => order.user_id == Some(*user_id),
            Actor::Guest { token } => order.user_id.is_none() && order.idempotency_token == *token,
            Actor::Staff { .. } => false,
        }
    }
}

pub fn transition(order: &Order, requested: OrderStatus, actor: &Actor) -> OrderingResult<Order> {
    transition_at(order, requested, actor, Utc::now())
}

/// Apply `requested` to a copy of `order`, stamping `at` as the update time.
///
/// Only `status`, `updated_at` and `version` change; items and total are never
/// touched. The input order is left as it was on every path.
pub fn transition_at(
    order: &Order,
    requested: OrderStatus,
    actor: &Actor,
    at: DateTime<Utc>,
) -> OrderingResult<Order> {
    if is_terminal(order.status) {
        return Err(OrderingError::OrderClosed(format!(
            "order {} is {}",
            order.id, order.status
        )));
    }

    let permission = permission_for(order.status, requested).ok_or_else(|| {
        OrderingError::InvalidTransition(format!("{} -> {}", order.status, requested))
    })?;

    let allowed = match permission {
        Permission::Staff => actor.is_staff_of(order.restaurant_id),
        Permission::StaffOrPlacer => actor.is_staff_of(order.restaurant_id) || actor.placed(order),
    };
    if !allowed {
        return Err(OrderingError::Unauthorized(format!(
            "actor may not move order {} from {} to {}",
            order.id, order.status, requested
        )));
    }

    let mut next = order.clone();
    next.status = requested;
    next.updated_at = at;
    next.version = order.version + 1;
    Ok(next)
}
