use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::{OrderingError, OrderingResult};

/// Largest quantity a single order line may carry.
pub const MAX_QUANTITY: i64 = 9999;
pub const MAX_INSTRUCTIONS_LEN: usize = 500;

/// Order status as transmitted across the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderingError::ValidationFailure(format!("unknown order status `{s}`")))
    }
}

/// Contact details for an order placed without an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GuestInfo {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

impl GuestInfo {
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.phone.trim().is_empty()
    }
}

/// Frozen copy of a cart line taken when the order is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub menu_item_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub price_point_label: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    /// Placing account; `None` for guest orders.
    pub user_id: Option<Uuid>,
    pub items: Vec<OrderItem>,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub guest: Option<GuestInfo>,
    pub special_instructions: Option<String>,
    pub idempotency_token: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn order_total(items: &[OrderItem]) -> i64 {
    items.iter().map(OrderItem::line_total).sum()
}

/// One requested line of an order creation request.
///
/// `unit_price`, `name` and `price_point_label` are what the customer saw; the
/// server re-resolves the price and refuses the order if they disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderPayloadItem {
    pub menu_item_id: Uuid,
    pub price_point_id: Option<Uuid>,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub price_point_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderPayload {
    pub restaurant_id: Uuid,
    pub items: Vec<OrderPayloadItem>,
    pub guest: Option<GuestInfo>,
    pub special_instructions: Option<String>,
}

impl OrderPayload {
    /// Hex SHA-256 over the serialized payload. Equal payloads, equal fingerprints.
    pub fn fingerprint(&self) -> String {
        // Serializing plain structs with string/number fields cannot fail.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }
}

/// Client-generated key the order endpoint deduplicates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct IdempotencyToken(String);

impl IdempotencyToken {
    pub const MAX_LEN: usize = 128;

    /// Fingerprint prefix plus a per-submission nonce.
    pub fn mint(fingerprint: &str) -> Self {
        let prefix: String = fingerprint.chars().take(16).collect();
        Self(format!("{}-{}", prefix, Uuid::new_v4().simple()))
    }

    pub fn parse(raw: &str) -> OrderingResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.len() > Self::MAX_LEN {
            return Err(OrderingError::ValidationFailure(format!(
                "idempotency token must be 1..={} characters",
                Self::MAX_LEN
            )));
        }
        if !raw.chars().all(|c| c.is_ascii_graphic()) {
            return Err(OrderingError::ValidationFailure(
                "idempotency token must be printable ASCII".into(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
