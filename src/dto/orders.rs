use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Order, OrderStatus};

/// Header carrying the client-generated idempotency token on order creation.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
/// Header a guest uses to prove they placed an order.
pub const ORDER_TOKEN_HEADER: &str = "x-order-token";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderResponse {
    pub order: Order,
    /// The token had already been used; `order` is the original order.
    pub duplicate: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransitionOrderRequest {
    pub status: OrderStatus,
    /// Reject the transition if the order has moved on since this version.
    pub expected_version: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
