use uuid::Uuid;

use super::{
    catalog::{CatalogItem, PricePoint},
    error::{OrderingError, OrderingResult},
};

/// Authoritative unit price for one item/variant choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrice {
    pub unit_price: i64,
    pub label: Option<String>,
    /// The price point actually used, including an implied default.
    pub price_point_id: Option<Uuid>,
}

/// Resolve the unit price of `item`, optionally for an explicit price point.
///
/// Without a selection the default price point wins (first entry when none is
/// flagged), falling back to the base price for items without variants.
/// Negative prices and duplicate defaults are catalog faults and are reported,
/// never clamped.
pub fn resolve_price(
    item: &CatalogItem,
    price_point_id: Option<Uuid>,
) -> OrderingResult<ResolvedPrice> {
    if item.price < 0 {
        return Err(OrderingError::InvalidCatalog(format!(
            "item {} has negative base price {}",
            item.id, item.price
        )));
    }

    let chosen = match price_point_id {
        Some(id) => Some(item.price_point(id).ok_or_else(|| {
            OrderingError::InvalidSelection(format!(
                "price point {} is not offered for item {}",
                id, item.id
            ))
        })?),
        None => default_price_point(item)?,
    };

    match chosen {
        Some(pp) => {
            if pp.price < 0 {
                return Err(OrderingError::InvalidCatalog(format!(
                    "price point {} of item {} has negative price {}",
                    pp.id, item.id, pp.price
                )));
            }
            Ok(ResolvedPrice {
                unit_price: pp.price,
                label: Some(pp.label.clone()),
                price_point_id: Some(pp.id),
            })
        }
        None => Ok(ResolvedPrice {
            unit_price: item.price,
            label: None,
            price_point_id: None,
        }),
    }
}

fn default_price_point(item: &CatalogItem) -> OrderingResult<Option<&PricePoint>> {
    let mut defaults = item.price_points.iter().filter(|pp| pp.is_default);
    match (defaults.next(), defaults.next()) {
        (Some(_), Some(_)) => Err(OrderingError::InvalidCatalog(format!(
            "item {} flags more than one default price point",
            item.id
        ))),
        (Some(pp), None) => Ok(Some(pp)),
        (None, _) => Ok(item.price_points.first()),
    }
}
