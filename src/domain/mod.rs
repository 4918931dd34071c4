pub mod catalog;
pub mod error;
pub mod lifecycle;
pub mod order;
pub mod pricing;

pub use catalog::{CatalogItem, Menu, MenuSection, PricePoint};
pub use error::{OrderingError, OrderingResult};
pub use lifecycle::{Actor, transition};
pub use order::{
    GuestInfo, IdempotencyToken, Order, OrderItem, OrderPayload, OrderPayloadItem, OrderStatus,
};
pub use pricing::{ResolvedPrice, resolve_price};
