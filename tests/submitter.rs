use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::Utc;
use menu_ordering_api::{
    client::{
        AuthenticatedUser, CartStore, CreateOrderOutcome, Identity, OrderGateway, OrderSubmitter,
        submitter::build_payload,
    },
    domain::{
        CatalogItem, GuestInfo, IdempotencyToken, Order, OrderItem, OrderPayload, OrderStatus,
        OrderingError, OrderingResult, PricePoint, order::order_total,
    },
};
use uuid::Uuid;

#[derive(Debug)]
enum Failure {
    /// Fails before anything is stored.
    Network,
    /// Stores the order, then loses the response.
    LostResponse,
    Hang,
    Reject(OrderingError),
}

#[derive(Default)]
struct GatewayState {
    orders: HashMap<String, Order>,
    tokens: Vec<String>,
    failures: VecDeque<Failure>,
}

/// Order endpoint stand-in that deduplicates on the token like the server does.
#[derive(Clone, Default)]
struct InMemoryGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl InMemoryGateway {
    fn fail_next(&self, failure: Failure) {
        self.state.lock().unwrap().failures.push_back(failure);
    }

    fn calls(&self) -> usize {
        self.state.lock().unwrap().tokens.len()
    }

    fn tokens(&self) -> Vec<String> {
        self.state.lock().unwrap().tokens.clone()
    }

    fn stored_orders(&self) -> usize {
        self.state.lock().unwrap().orders.len()
    }

    fn stored(&self, token: &str) -> Option<Order> {
        self.state.lock().unwrap().orders.get(token).cloned()
    }
}

impl OrderGateway for InMemoryGateway {
    async fn create_order(
        &self,
        payload: &OrderPayload,
        token: &IdempotencyToken,
        identity: &Identity,
    ) -> OrderingResult<CreateOrderOutcome> {
        let failure = {
            let mut state = self.state.lock().unwrap();
            state.tokens.push(token.to_string());
            state.failures.pop_front()
        };
        let lost_response = matches!(failure, Some(Failure::LostResponse));
        match failure {
            Some(Failure::Network) => {
                return Err(OrderingError::NetworkFailure("connection reset".into()));
            }
            Some(Failure::Reject(err)) => return Err(err),
            Some(Failure::Hang) => tokio::time::sleep(Duration::from_secs(10)).await,
            Some(Failure::LostResponse) | None => {}
        }

        let outcome = {
            let mut state = self.state.lock().unwrap();
            match state.orders.get(token.as_str()) {
                Some(existing) => CreateOrderOutcome::Duplicate(existing.clone()),
                None => {
                    let order = place(payload, token, identity);
                    state.orders.insert(token.to_string(), order.clone());
                    CreateOrderOutcome::Created(order)
                }
            }
        };

        if lost_response {
            return Err(OrderingError::NetworkFailure("response lost".into()));
        }
        Ok(outcome)
    }
}

fn place(payload: &OrderPayload, token: &IdempotencyToken, identity: &Identity) -> Order {
    let items: Vec<OrderItem> = payload
        .items
        .iter()
        .map(|line| OrderItem {
            menu_item_id: line.menu_item_id,
            name: line.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            price_point_label: line.price_point_label.clone(),
        })
        .collect();
    let now = Utc::now();
    Order {
        id: Uuid::new_v4(),
        restaurant_id: payload.restaurant_id,
        user_id: match identity {
            Identity::Authenticated(user) => Some(user.user_id),
            Identity::Guest(_) => None,
        },
        total_amount: order_total(&items),
        items,
        status: OrderStatus::Pending,
        guest: payload.guest.clone(),
        special_instructions: payload.special_instructions.clone(),
        idempotency_token: token.to_string(),
        version: 0,
        created_at: now,
        updated_at: now,
    }
}

struct Menu {
    burger: CatalogItem,
    fries: CatalogItem,
    large: Uuid,
}

fn menu() -> Menu {
    let restaurant_id = Uuid::new_v4();
    let large = Uuid::new_v4();
    Menu {
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
                    id: Uuid::new_v4(),
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
        large,
    }
}

fn guest() -> Identity {
    Identity::Guest(GuestInfo {
        name: "Ada".into(),
        phone: "555-0100".into(),
        email: None,
    })
}

fn filled_cart(menu: &Menu) -> CartStore {
    let mut cart = CartStore::new();
    cart.add_item(&menu.burger, 2, None).expect("burgers");
    cart.add_item(&menu.fries, 1, Some(menu.large)).expect("fries");
    cart
}

fn submitter(gateway: &InMemoryGateway) -> OrderSubmitter<InMemoryGateway> {
    OrderSubmitter::new(gateway.clone(), Duration::from_secs(5))
}

#[tokio::test]
async fn empty_cart_never_reaches_the_gateway() {
    let gateway = InMemoryGateway::default();
    let mut cart = CartStore::new();

    let err = submitter(&gateway)
        .submit(&mut cart, &guest(), None)
        .await
        .unwrap_err();

    assert_eq!(err, OrderingError::EmptyCart);
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn incomplete_guest_never_reaches_the_gateway() {
    let gateway = InMemoryGateway::default();
    let menu = menu();
    let mut cart = filled_cart(&menu);
    let nameless = Identity::Guest(GuestInfo {
        name: "  ".into(),
        phone: "555-0100".into(),
        email: None,
    });

    let err = submitter(&gateway)
        .submit(&mut cart, &nameless, None)
        .await
        .unwrap_err();

    assert!(matches!(err, OrderingError::MissingIdentity(_)));
    assert_eq!(gateway.calls(), 0);
    assert!(!cart.is_empty());
}

#[tokio::test]
async fn signed_in_identity_without_token_is_missing() {
    let gateway = InMemoryGateway::default();
    let menu = menu();
    let mut cart = filled_cart(&menu);
    let identity = Identity::Authenticated(AuthenticatedUser {
        user_id: Uuid::new_v4(),
        token: String::new(),
    });

    let err = submitter(&gateway)
        .submit(&mut cart, &identity, None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderingError::MissingIdentity(_)));
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn two_burgers_and_large_fries_total_1950() {
    let gateway = InMemoryGateway::default();
    let menu = menu();
    let mut cart = filled_cart(&menu);

    let order = submitter(&gateway)
        .submit(&mut cart, &guest(), Some("  no pickles ".into()))
        .await
        .expect("submit");

    assert_eq!(order.total_amount, 1950);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[1].price_point_label.as_deref(), Some("Large"));
    assert_eq!(order.special_instructions.as_deref(), Some("no pickles"));
    assert_eq!(order.user_id, None);
    assert!(cart.is_empty());
}

#[tokio::test]
async fn retry_after_lost_response_yields_the_same_order() {
    let gateway = InMemoryGateway::default();
    gateway.fail_next(Failure::LostResponse);
    let menu = menu();
    let mut cart = filled_cart(&menu);
    let mut submitter = submitter(&gateway);

    let err = submitter.submit(&mut cart, &guest(), None).await.unwrap_err();
    assert!(err.is_recoverable());
    assert!(!cart.is_empty());
    assert!(submitter.pending_token().is_some());

    let order = submitter.submit(&mut cart, &guest(), None).await.expect("retry");

    let tokens = gateway.tokens();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0], tokens[1]);
    assert_eq!(gateway.stored_orders(), 1);
    assert_eq!(gateway.stored(&tokens[0]).map(|o| o.id), Some(order.id));
    assert!(submitter.pending_token().is_none());
    assert!(cart.is_empty());
}

fn signed_in() -> Identity {
    Identity::Authenticated(AuthenticatedUser {
        user_id: Uuid::new_v4(),
        token: "jwt".into(),
    })
}

#[tokio::test]
async fn another_user_does_not_inherit_a_pending_token() {
    let gateway = InMemoryGateway::default();
    gateway.fail_next(Failure::Network);
    let menu = menu();
    let mut cart = filled_cart(&menu);
    let mut submitter = submitter(&gateway);
    let first = signed_in();
    let second = signed_in();

    let err = submitter.submit(&mut cart, &first, None).await.unwrap_err();
    assert!(err.is_recoverable());

    let order = submitter.submit(&mut cart, &second, None).await.expect("second user");

    let tokens = gateway.tokens();
    assert_eq!(tokens.len(), 2);
    assert_ne!(tokens[0], tokens[1]);
    if let Identity::Authenticated(user) = &second {
        assert_eq!(order.user_id, Some(user.user_id));
    }
}

#[tokio::test]
async fn refreshed_session_token_keeps_the_pending_token() {
    let gateway = InMemoryGateway::default();
    gateway.fail_next(Failure::Network);
    let menu = menu();
    let mut cart = filled_cart(&menu);
    let mut submitter = submitter(&gateway);
    let user_id = Uuid::new_v4();
    let session = |token: &str| {
        Identity::Authenticated(AuthenticatedUser {
            user_id,
            token: token.into(),
        })
    };

    submitter.submit(&mut cart, &session("old"), None).await.unwrap_err();
    submitter.submit(&mut cart, &session("new"), None).await.expect("retry");

    let tokens = gateway.tokens();
    assert_eq!(tokens[0], tokens[1]);
}

#[tokio::test]
async fn guest_details_change_mints_a_new_token() {
    let gateway = InMemoryGateway::default();
    gateway.fail_next(Failure::Network);
    let menu = menu();
    let mut cart = filled_cart(&menu);
    let mut submitter = submitter(&gateway);
    let other_guest = Identity::Guest(GuestInfo {
        name: "Grace".into(),
        phone: "555-0199".into(),
        email: None,
    });

    submitter.submit(&mut cart, &guest(), None).await.unwrap_err();
    submitter.submit(&mut cart, &other_guest, None).await.expect("other guest");

    let tokens = gateway.tokens();
    assert_ne!(tokens[0], tokens[1]);
}

#[tokio::test]
async fn changed_cart_gets_a_fresh_token() {
    let gateway = InMemoryGateway::default();
    gateway.fail_next(Failure::Network);
    let menu = menu();
    let mut cart = filled_cart(&menu);
    let mut submitter = submitter(&gateway);

    submitter.submit(&mut cart, &guest(), None).await.unwrap_err();
    cart.add_item(&menu.burger, 1, None).expect("one more");
    let order = submitter.submit(&mut cart, &guest(), None).await.expect("submit");

    let tokens = gateway.tokens();
    assert_ne!(tokens[0], tokens[1]);
    assert_eq!(order.total_amount, 2750);
}

#[tokio::test]
async fn rejected_submission_keeps_cart_and_forgets_token() {
    let gateway = InMemoryGateway::default();
    gateway.fail_next(Failure::Reject(OrderingError::ItemUnavailable(
        "Fries sold out".into(),
    )));
    let menu = menu();
    let mut cart = filled_cart(&menu);
    let before = cart.snapshot();
    let mut submitter = submitter(&gateway);

    let err = submitter.submit(&mut cart, &guest(), None).await.unwrap_err();

    assert!(matches!(err, OrderingError::ItemUnavailable(_)));
    assert!(!err.is_recoverable());
    assert_eq!(cart.snapshot(), before);
    assert!(submitter.pending_token().is_none());
}

#[tokio::test]
async fn slow_gateway_times_out_as_network_failure() {
    let gateway = InMemoryGateway::default();
    gateway.fail_next(Failure::Hang);
    let menu = menu();
    let mut cart = filled_cart(&menu);
    let mut submitter = OrderSubmitter::new(gateway.clone(), Duration::from_millis(50));

    let err = submitter.submit(&mut cart, &guest(), None).await.unwrap_err();

    assert!(matches!(err, OrderingError::NetworkFailure(_)));
    assert!(!cart.is_empty());
    assert!(submitter.pending_token().is_some());
    assert_eq!(gateway.stored_orders(), 0);
}

#[tokio::test]
async fn placed_order_ignores_later_menu_changes() {
    let gateway = InMemoryGateway::default();
    let mut menu = menu();
    let mut cart = filled_cart(&menu);
    let mut submitter = submitter(&gateway);

    let first = submitter.submit(&mut cart, &guest(), None).await.expect("first");

    menu.burger.price = 900;
    menu.burger.name = "Deluxe Burger".into();
    cart.add_item(&menu.burger, 1, None).expect("add");
    let second = submitter.submit(&mut cart, &guest(), None).await.expect("second");

    let stored = gateway
        .stored(&first.idempotency_token)
        .expect("first order stored");
    assert_eq!(stored.items[0].name, "Burger");
    assert_eq!(stored.items[0].unit_price, 800);
    assert_eq!(stored.total_amount, 1950);
    assert_eq!(second.total_amount, 900);
}

#[test]
fn oversized_instructions_fail_locally() {
    let menu = menu();
    let cart = filled_cart(&menu);
    let err = build_payload(&cart, &guest(), Some("x".repeat(501))).unwrap_err();
    assert!(matches!(err, OrderingError::ValidationFailure(_)));

    let payload = build_payload(&cart, &guest(), Some("   ".into())).expect("payload");
    assert_eq!(payload.special_instructions, None);
}

#[test]
fn equal_payloads_share_a_fingerprint() {
    let menu = menu();
    let cart = filled_cart(&menu);
    let a = build_payload(&cart, &guest(), None).expect("payload");
    let b = build_payload(&cart, &guest(), None).expect("payload");
    assert_eq!(a.fingerprint(), b.fingerprint());

    let minted = IdempotencyToken::mint(&a.fingerprint());
    assert!(minted.as_str().starts_with(&a.fingerprint()[..16]));
    assert_eq!(IdempotencyToken::parse(minted.as_str()), Ok(minted));
}
