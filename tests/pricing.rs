use menu_ordering_api::domain::{CatalogItem, OrderingError, PricePoint, resolve_price};
use uuid::Uuid;

fn item(price: i64, price_points: Vec<PricePoint>) -> CatalogItem {
    CatalogItem {
        id: Uuid::new_v4(),
        restaurant_id: Uuid::new_v4(),
        name: "Fries".into(),
        description: None,
        price,
        available: true,
        price_points,
    }
}

fn point(label: &str, price: i64, is_default: bool) -> PricePoint {
    PricePoint {
        id: Uuid::new_v4(),
        label: label.into(),
        price,
        is_default,
    }
}

#[test]
fn item_without_price_points_uses_base_price() {
    let fries = item(300, vec![]);
    let resolved = resolve_price(&fries, None).expect("resolve");
    assert_eq!(resolved.unit_price, 300);
    assert_eq!(resolved.label, None);
    assert_eq!(resolved.price_point_id, None);
}

#[test]
fn flagged_default_wins_over_first_entry() {
    let large = point("Large", 350, false);
    let regular = point("Regular", 250, true);
    let fries = item(300, vec![large, regular.clone()]);

    let resolved = resolve_price(&fries, None).expect("resolve");
    assert_eq!(resolved.unit_price, 250);
    assert_eq!(resolved.label.as_deref(), Some("Regular"));
    assert_eq!(resolved.price_point_id, Some(regular.id));
}

#[test]
fn first_price_point_is_default_when_none_flagged() {
    let small = point("Small", 200, false);
    let fries = item(300, vec![small.clone(), point("Large", 350, false)]);

    let resolved = resolve_price(&fries, None).expect("resolve");
    assert_eq!(resolved.unit_price, 200);
    assert_eq!(resolved.price_point_id, Some(small.id));
}

#[test]
fn explicit_selection_is_honoured() {
    let large = point("Large", 350, false);
    let fries = item(300, vec![point("Regular", 250, true), large.clone()]);

    let resolved = resolve_price(&fries, Some(large.id)).expect("resolve");
    assert_eq!(resolved.unit_price, 350);
    assert_eq!(resolved.label.as_deref(), Some("Large"));
}

#[test]
fn unknown_selection_is_invalid() {
    let fries = item(300, vec![point("Regular", 250, true)]);
    let err = resolve_price(&fries, Some(Uuid::new_v4())).unwrap_err();
    assert!(matches!(err, OrderingError::InvalidSelection(_)));
}

#[test]
fn selection_on_item_without_variants_is_invalid() {
    let burger = item(800, vec![]);
    let err = resolve_price(&burger, Some(Uuid::new_v4())).unwrap_err();
    assert!(matches!(err, OrderingError::InvalidSelection(_)));
}

#[test]
fn negative_prices_are_catalog_faults() {
    let err = resolve_price(&item(-1, vec![]), None).unwrap_err();
    assert!(matches!(err, OrderingError::InvalidCatalog(_)));

    let broken = item(300, vec![point("Regular", -250, true)]);
    let err = resolve_price(&broken, None).unwrap_err();
    assert!(matches!(err, OrderingError::InvalidCatalog(_)));
}

#[test]
fn two_defaults_are_a_catalog_fault() {
    let fries = item(300, vec![point("Regular", 250, true), point("Large", 350, true)]);
    let err = resolve_price(&fries, None).unwrap_err();
    assert!(matches!(err, OrderingError::InvalidCatalog(_)));
}

#[test]
fn free_items_are_allowed() {
    let water = item(0, vec![]);
    assert_eq!(resolve_price(&water, None).expect("resolve").unit_price, 0);
}
