use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A named priced variant of a catalog item (size, tier, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PricePoint {
    pub id: Uuid,
    pub label: String,
    pub price: i64,
    #[serde(default)]
    pub is_default: bool,
}

/// Immutable description of something a customer can order.
///
/// Prices are minor currency units. `price_points` keeps menu order; when it is
/// non-empty the flagged default (or the first entry) prices the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CatalogItem {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub available: bool,
    #[serde(default)]
    pub price_points: Vec<PricePoint>,
}

impl CatalogItem {
    pub fn price_point(&self, id: Uuid) -> Option<&PricePoint> {
        self.price_points.iter().find(|pp| pp.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MenuSection {
    pub id: Uuid,
    pub name: String,
    pub items: Vec<CatalogItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Menu {
    pub restaurant_id: Uuid,
    pub sections: Vec<MenuSection>,
}

impl Menu {
    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    pub fn find_item(&self, id: Uuid) -> Option<&CatalogItem> {
        self.items().find(|item| item.id == id)
    }
}
