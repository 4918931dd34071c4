use thiserror::Error;

/// Failures of the cart-to-order lifecycle.
///
/// Cart and pricing variants are local: they block the attempted mutation and
/// leave prior state untouched. Only [`OrderingError::NetworkFailure`] is worth
/// retrying without changing input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderingError {
    #[error("Invalid price point selection: {0}")]
    InvalidSelection(String),

    #[error("Item unavailable: {0}")]
    ItemUnavailable(String),

    #[error("Restaurant mismatch: {0}")]
    RestaurantMismatch(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Missing identity: {0}")]
    MissingIdentity(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Order closed: {0}")]
    OrderClosed(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Validation failure: {0}")]
    ValidationFailure(String),

    /// Catalog data that can never be priced (negative price, several defaults).
    #[error("Invalid catalog data: {0}")]
    InvalidCatalog(String),
}

impl OrderingError {
    /// Stable wire code, sent in error bodies and decoded by the client.
    pub fn code(&self) -> &'static str {
        match self {
            OrderingError::InvalidSelection(_) => "invalid_selection",
            OrderingError::ItemUnavailable(_) => "item_unavailable",
            OrderingError::RestaurantMismatch(_) => "restaurant_mismatch",
            OrderingError::InvalidQuantity(_) => "invalid_quantity",
            OrderingError::EmptyCart => "empty_cart",
            OrderingError::MissingIdentity(_) => "missing_identity",
            OrderingError::InvalidTransition(_) => "invalid_transition",
            OrderingError::Unauthorized(_) => "unauthorized",
            OrderingError::OrderClosed(_) => "order_closed",
            OrderingError::NetworkFailure(_) => "network_failure",
            OrderingError::ValidationFailure(_) => "validation_failure",
            OrderingError::InvalidCatalog(_) => "invalid_catalog",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            OrderingError::EmptyCart => None,
            OrderingError::InvalidSelection(d)
            | OrderingError::ItemUnavailable(d)
            | OrderingError::RestaurantMismatch(d)
            | OrderingError::InvalidQuantity(d)
            | OrderingError::MissingIdentity(d)
            | OrderingError::InvalidTransition(d)
            | OrderingError::Unauthorized(d)
            | OrderingError::OrderClosed(d)
            | OrderingError::NetworkFailure(d)
            | OrderingError::ValidationFailure(d)
            | OrderingError::InvalidCatalog(d) => Some(d.as_str()),
        }
    }

    /// Rebuild an error from a wire code. Unknown codes become
    /// `ValidationFailure` so callers never retry something they don't understand.
    pub fn from_code(code: &str, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match code {
            "invalid_selection" => OrderingError::InvalidSelection(detail),
            "item_unavailable" => OrderingError::ItemUnavailable(detail),
            "restaurant_mismatch" => OrderingError::RestaurantMismatch(detail),
            "invalid_quantity" => OrderingError::InvalidQuantity(detail),
            "empty_cart" => OrderingError::EmptyCart,
            "missing_identity" => OrderingError::MissingIdentity(detail),
            "invalid_transition" => OrderingError::InvalidTransition(detail),
            "unauthorized" => OrderingError::Unauthorized(detail),
            "order_closed" => OrderingError::OrderClosed(detail),
            "network_failure" => OrderingError::NetworkFailure(detail),
            "invalid_catalog" => OrderingError::InvalidCatalog(detail),
            _ => OrderingError::ValidationFailure(detail),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, OrderingError::NetworkFailure(_))
    }
}

pub type OrderingResult<T> = Result<T, OrderingError>;
