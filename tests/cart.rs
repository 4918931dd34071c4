use menu_ordering_api::{
    client::{
        CartStore, LineKey, RestaurantSwitchPolicy,
        cart::{MAX_QUANTITY, quantity_from_input},
    },
    domain::{CatalogItem, Menu, MenuSection, OrderingError, PricePoint},
};
use uuid::Uuid;

struct Diner {
    restaurant_id: Uuid,
    burger: CatalogItem,
    fries: CatalogItem,
    regular: Uuid,
    large: Uuid,
}

fn diner() -> Diner {
    let restaurant_id = Uuid::new_v4();
    let regular = Uuid::new_v4();
    let large = Uuid::new_v4();
    Diner {
        restaurant_id,
        burger: CatalogItem {
            id: Uuid::new_v4(),
            restaurant_id,
            name: "Burger".into(),
            description: None,
            price: 800,
            available: true,
            price_points: vec![],
        },
        fries: CatalogItem {
            id: Uuid::new_v4(),
            restaurant_id,
            name: "Fries".into(),
            description: None,
            price: 250,
            available: true,
            price_points: vec![
                PricePoint {
                    id: regular,
                    label: "Regular".into(),
                    price: 250,
                    is_default: true,
                },
                PricePoint {
                    id: large,
                    label: "Large".into(),
                    price: 350,
                    is_default: false,
                },
            ],
        },
        regular,
        large,
    }
}

fn menu_of(restaurant_id: Uuid, items: Vec<CatalogItem>) -> Menu {
    Menu {
        restaurant_id,
        sections: vec![MenuSection {
            id: Uuid::new_v4(),
            name: "Mains".into(),
            items,
        }],
    }
}

fn other_restaurant_item() -> CatalogItem {
    CatalogItem {
        id: Uuid::new_v4(),
        restaurant_id: Uuid::new_v4(),
        name: "Ramen".into(),
        description: None,
        price: 1200,
        available: true,
        price_points: vec![],
    }
}

#[test]
fn adding_same_item_twice_merges_quantities() {
    let d = diner();
    let mut cart = CartStore::new();

    cart.add_item(&d.burger, 1, None).expect("add");
    let outcome = cart.add_item(&d.burger, 2, None).expect("add again");

    assert_eq!(outcome.quantity, 3);
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.total(), 2400);
    assert_eq!(cart.restaurant_id(), Some(d.restaurant_id));
}

#[test]
fn implied_and_explicit_default_share_a_line() {
    let d = diner();
    let mut cart = CartStore::new();

    let first = cart.add_item(&d.fries, 1, None).expect("add");
    let second = cart.add_item(&d.fries, 1, Some(d.regular)).expect("add");

    assert_eq!(first.key, second.key);
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].quantity, 2);
    assert_eq!(cart.lines()[0].label.as_deref(), Some("Regular"));
    assert_eq!(cart.total(), 500);
}

#[test]
fn different_price_points_are_separate_lines() {
    let d = diner();
    let mut cart = CartStore::new();

    cart.add_item(&d.fries, 1, Some(d.regular)).expect("add regular");
    cart.add_item(&d.fries, 1, Some(d.large)).expect("add large");

    assert_eq!(cart.lines().len(), 2);
    assert_eq!(cart.total(), 600);
}

#[test]
fn total_is_sum_of_line_totals() {
    let d = diner();
    let mut cart = CartStore::new();

    cart.add_item(&d.burger, 2, None).expect("burgers");
    cart.add_item(&d.fries, 1, Some(d.large)).expect("large fries");

    assert_eq!(cart.total(), 1950);
    assert_eq!(cart.item_count(), 3);
}

#[test]
fn invalid_quantities_leave_cart_untouched() {
    let d = diner();
    let mut cart = CartStore::new();
    cart.add_item(&d.burger, 1, None).expect("add");
    let before = cart.snapshot();

    for quantity in [0, -3, MAX_QUANTITY + 1] {
        let err = cart.add_item(&d.burger, quantity, None).unwrap_err();
        assert!(matches!(err, OrderingError::InvalidQuantity(_)), "{quantity}");
    }
    assert_eq!(cart.snapshot(), before);
}

#[test]
fn merging_past_the_limit_is_rejected() {
    let d = diner();
    let mut cart = CartStore::new();
    cart.add_item(&d.burger, MAX_QUANTITY, None).expect("fill");

    let err = cart.add_item(&d.burger, 1, None).unwrap_err();
    assert!(matches!(err, OrderingError::InvalidQuantity(_)));
    assert_eq!(i64::from(cart.lines()[0].quantity), MAX_QUANTITY);
}

#[test]
fn fractional_ui_input_is_rejected() {
    assert_eq!(quantity_from_input(2.0), Ok(2));
    for value in [1.5, f64::NAN, f64::INFINITY, 0.0, -1.0] {
        assert!(matches!(
            quantity_from_input(value),
            Err(OrderingError::InvalidQuantity(_))
        ));
    }
}

#[test]
fn unavailable_item_is_rejected() {
    let d = diner();
    let mut cart = CartStore::new();
    let mut sold_out = d.burger.clone();
    sold_out.available = false;

    let err = cart.add_item(&sold_out, 1, None).unwrap_err();
    assert!(matches!(err, OrderingError::ItemUnavailable(_)));
    assert!(cart.is_empty());
    assert_eq!(cart.restaurant_id(), None);
}

#[test]
fn unknown_price_point_is_rejected() {
    let d = diner();
    let mut cart = CartStore::new();
    let err = cart.add_item(&d.fries, 1, Some(Uuid::new_v4())).unwrap_err();
    assert!(matches!(err, OrderingError::InvalidSelection(_)));
    assert!(cart.is_empty());
}

#[test]
fn reject_policy_refuses_other_restaurant() {
    let d = diner();
    let mut cart = CartStore::new();
    assert_eq!(cart.policy(), RestaurantSwitchPolicy::Reject);
    cart.add_item(&d.burger, 1, None).expect("add");
    let before = cart.snapshot();

    let err = cart.add_item(&other_restaurant_item(), 1, None).unwrap_err();
    assert!(matches!(err, OrderingError::RestaurantMismatch(_)));
    assert_eq!(cart.snapshot(), before);
}

#[test]
fn clear_and_rebind_policy_switches_restaurant() {
    let d = diner();
    let mut cart = CartStore::with_policy(RestaurantSwitchPolicy::ClearAndRebind);
    cart.add_item(&d.burger, 2, None).expect("add");

    let ramen = other_restaurant_item();
    let outcome = cart.add_item(&ramen, 1, None).expect("switch");

    assert!(outcome.cart_cleared);
    assert_eq!(cart.restaurant_id(), Some(ramen.restaurant_id));
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.total(), 1200);
}

#[test]
fn emptied_cart_accepts_any_restaurant() {
    let d = diner();
    let mut cart = CartStore::new();
    let key = cart.add_item(&d.burger, 1, None).expect("add").key;
    cart.update_quantity(key, 0).expect("remove");

    let ramen = other_restaurant_item();
    let outcome = cart.add_item(&ramen, 1, None).expect("add ramen");
    assert!(!outcome.cart_cleared);
    assert_eq!(cart.restaurant_id(), Some(ramen.restaurant_id));
}

#[test]
fn bind_restaurant_reports_dropped_lines() {
    let d = diner();
    let mut cart = CartStore::new();
    assert!(!cart.bind_restaurant(d.restaurant_id));

    cart.add_item(&d.burger, 1, None).expect("add");
    assert!(!cart.bind_restaurant(d.restaurant_id));
    assert!(cart.bind_restaurant(Uuid::new_v4()));
    assert!(cart.is_empty());
}

#[test]
fn update_quantity_sets_removes_and_validates() {
    let d = diner();
    let mut cart = CartStore::new();
    let key = cart.add_item(&d.burger, 1, None).expect("add").key;

    cart.update_quantity(key, 5).expect("set");
    assert_eq!(cart.line(key).map(|l| l.quantity), Some(5));

    let err = cart.update_quantity(key, -1).unwrap_err();
    assert!(matches!(err, OrderingError::InvalidQuantity(_)));
    assert_eq!(cart.line(key).map(|l| l.quantity), Some(5));

    cart.update_quantity(key, 0).expect("remove");
    assert!(cart.is_empty());

    let missing = LineKey {
        item_id: Uuid::new_v4(),
        price_point_id: None,
    };
    let err = cart.update_quantity(missing, 2).unwrap_err();
    assert!(matches!(err, OrderingError::ValidationFailure(_)));
}

#[test]
fn clear_keeps_restaurant_binding() {
    let d = diner();
    let mut cart = CartStore::new();
    cart.add_item(&d.burger, 1, None).expect("add");
    cart.clear();
    assert!(cart.is_empty());
    assert_eq!(cart.restaurant_id(), Some(d.restaurant_id));
}

#[test]
fn watchers_see_each_mutation() {
    let d = diner();
    let mut cart = CartStore::new();
    let mut rx = cart.watch();
    assert!(!rx.has_changed().expect("sender alive"));

    cart.add_item(&d.burger, 2, None).expect("add");
    assert!(rx.has_changed().expect("sender alive"));
    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(snapshot.lines.len(), 1);
    assert_eq!(snapshot.restaurant_id, Some(d.restaurant_id));

    let _ = cart.add_item(&d.burger, 0, None);
    assert!(!rx.has_changed().expect("sender alive"));
}

#[test]
fn snapshot_restores_into_equivalent_cart() {
    let d = diner();
    let mut cart = CartStore::new();
    cart.add_item(&d.burger, 2, None).expect("add");
    cart.add_item(&d.fries, 1, Some(d.large)).expect("add");

    let json = serde_json::to_string(&cart.snapshot()).expect("serialize");
    let restored = CartStore::restore(
        serde_json::from_str(&json).expect("deserialize"),
        RestaurantSwitchPolicy::Reject,
    )
    .expect("restore");

    assert_eq!(restored.snapshot(), cart.snapshot());
    assert_eq!(restored.total(), 1950);
}

#[test]
fn restore_rejects_mixed_restaurants() {
    let d = diner();
    let mut cart = CartStore::new();
    cart.add_item(&d.burger, 1, None).expect("add");
    let mut snapshot = cart.snapshot();

    let mut foreign = CartStore::new();
    foreign.add_item(&other_restaurant_item(), 1, None).expect("add");
    snapshot.lines.extend(foreign.snapshot().lines);

    let err = CartStore::restore(snapshot, RestaurantSwitchPolicy::Reject).unwrap_err();
    assert!(matches!(err, OrderingError::RestaurantMismatch(_)));
}

#[test]
fn reprice_follows_menu_changes() {
    let d = diner();
    let mut cart = CartStore::new();
    let burger_key = cart.add_item(&d.burger, 2, None).expect("add").key;
    let fries_key = cart.add_item(&d.fries, 1, Some(d.large)).expect("add").key;

    let mut burger = d.burger.clone();
    burger.price = 900;
    let mut fries = d.fries.clone();
    fries.price_points.retain(|pp| pp.id != d.large);

    let report = cart
        .reprice(&menu_of(d.restaurant_id, vec![burger, fries]))
        .expect("reprice");

    assert_eq!(report.repriced, vec![burger_key]);
    assert_eq!(report.removed, vec![fries_key]);
    assert_eq!(cart.total(), 1800);
}

#[test]
fn reprice_drops_unavailable_and_missing_items() {
    let d = diner();
    let mut cart = CartStore::new();
    cart.add_item(&d.burger, 1, None).expect("add");
    cart.add_item(&d.fries, 1, None).expect("add");

    let mut burger = d.burger.clone();
    burger.available = false;
    let report = cart
        .reprice(&menu_of(d.restaurant_id, vec![burger]))
        .expect("reprice");

    assert_eq!(report.removed.len(), 2);
    assert!(cart.is_empty());
}

#[test]
fn reprice_rejects_other_restaurant_menu() {
    let d = diner();
    let mut cart = CartStore::new();
    cart.add_item(&d.burger, 1, None).expect("add");

    let err = cart.reprice(&menu_of(Uuid::new_v4(), vec![])).unwrap_err();
    assert!(matches!(err, OrderingError::RestaurantMismatch(_)));
    assert_eq!(cart.lines().len(), 1);
}
