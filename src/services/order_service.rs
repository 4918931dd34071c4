use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType, OnConflict},
};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    domain::{
        Actor, GuestInfo, IdempotencyToken, Order, OrderItem, OrderPayload, OrderStatus,
        OrderingError, lifecycle,
        order::{MAX_INSTRUCTIONS_LEN, MAX_QUANTITY, order_total},
        resolve_price,
    },
    dto::orders::{CreateOrderResponse, OrderList, TransitionOrderRequest},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        menu_service,
        restaurant_service::{ensure_staff, is_staff},
    },
    state::AppState,
};

/// Create an order exactly once per idempotency token.
///
/// Prices and total are recomputed from the live catalog; a client price that
/// no longer matches is refused rather than silently corrected. A replayed
/// token returns the order it created the first time.
pub async fn create_order(
    state: &AppState,
    user: Option<&AuthUser>,
    token: Option<&str>,
    payload: OrderPayload,
) -> AppResult<CreateOrderResponse> {
    let token = IdempotencyToken::parse(token.ok_or_else(|| {
        OrderingError::ValidationFailure("missing Idempotency-Key header".into())
    })?)?;
    if payload.items.is_empty() {
        return Err(OrderingError::EmptyCart.into());
    }

    let user_id = user.map(|u| u.user_id);
    let guest = match (user_id, payload.guest) {
        (Some(_), _) => None,
        (None, Some(guest)) if guest.is_complete() => Some(GuestInfo {
            name: guest.name.trim().to_string(),
            phone: guest.phone.trim().to_string(),
            email: guest.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
        }),
        (None, _) => {
            return Err(OrderingError::MissingIdentity(
                "sign in or provide guest name and phone".into(),
            )
            .into());
        }
    };

    let special_instructions = payload
        .special_instructions
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if special_instructions
        .as_ref()
        .is_some_and(|s| s.chars().count() > MAX_INSTRUCTIONS_LEN)
    {
        return Err(OrderingError::ValidationFailure(format!(
            "special instructions exceed {MAX_INSTRUCTIONS_LEN} characters"
        ))
        .into());
    }

    for line in &payload.items {
        if line.quantity <= 0 || i64::from(line.quantity) > MAX_QUANTITY {
            return Err(OrderingError::InvalidQuantity(format!(
                "quantity for {} must be between 1 and {MAX_QUANTITY}",
                line.name
            ))
            .into());
        }
    }

    if let Some(existing) = find_order_by_token(&state.orm, &token).await? {
        return replay(existing, payload.restaurant_id, user_id);
    }

    let txn = state.orm.begin().await?;

    let ids = payload.items.iter().map(|line| line.menu_item_id).collect();
    let catalog = menu_service::catalog_items(&txn, payload.restaurant_id, ids).await?;

    let mut items = Vec::with_capacity(payload.items.len());
    for line in &payload.items {
        let item = catalog.get(&line.menu_item_id).ok_or_else(|| {
            OrderingError::ValidationFailure(format!(
                "{} is not on this restaurant's menu",
                line.name
            ))
        })?;
        if !item.available {
            return Err(OrderingError::ItemUnavailable(format!(
                "{} is no longer available",
                item.name
            ))
            .into());
        }
        let resolved = resolve_price(item, line.price_point_id)?;
        if resolved.unit_price != line.unit_price {
            return Err(OrderingError::ValidationFailure(format!(
                "price of {} changed from {} to {}; refresh the menu",
                item.name, line.unit_price, resolved.unit_price
            ))
            .into());
        }
        items.push(OrderItem {
            menu_item_id: item.id,
            name: item.name.clone(),
            unit_price: resolved.unit_price,
            quantity: line.quantity,
            price_point_label: resolved.label,
        });
    }

    let order_id = Uuid::new_v4();
    let now = Utc::now();
    let total_amount = order_total(&items);

    let inserted = Orders::insert(OrderActive {
        id: Set(order_id),
        restaurant_id: Set(payload.restaurant_id),
        user_id: Set(user_id),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        guest_name: Set(guest.as_ref().map(|g| g.name.clone())),
        guest_phone: Set(guest.as_ref().map(|g| g.phone.clone())),
        guest_email: Set(guest.as_ref().and_then(|g| g.email.clone())),
        special_instructions: Set(special_instructions.clone()),
        idempotency_token: Set(token.as_str().to_string()),
        version: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    })
    .on_conflict(
        OnConflict::column(OrderCol::IdempotencyToken)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;

    if inserted == 0 {
        // A concurrent request with the same token committed first.
        txn.rollback().await?;
        let existing = find_order_by_token(&state.orm, &token)
            .await?
            .ok_or_else(|| AppError::Conflict("idempotency token is being processed".into()))?;
        return replay(existing, payload.restaurant_id, user_id);
    }

    OrderItems::insert_many(items.iter().enumerate().map(|(position, item)| OrderItemActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        menu_item_id: Set(item.menu_item_id),
        name: Set(item.name.clone()),
        unit_price: Set(item.unit_price),
        quantity: Set(item.quantity),
        price_point_label: Set(item.price_point_label.clone()),
        position: Set(position as i32),
    }))
    .exec_without_returning(&txn)
    .await?;

    log_audit(
        &txn,
        user_id,
        AuditAction::OrderCreate,
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order_id,
            "restaurant_id": payload.restaurant_id,
            "total_amount": total_amount,
        })),
    )
    .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order_id,
        restaurant_id = %payload.restaurant_id,
        total_amount,
        guest = guest.is_some(),
        "order created"
    );

    Ok(CreateOrderResponse {
        order: Order {
            id: order_id,
            restaurant_id: payload.restaurant_id,
            user_id,
            items,
            total_amount,
            status: OrderStatus::Pending,
            guest,
            special_instructions,
            idempotency_token: token.as_str().to_string(),
            version: 0,
            created_at: now,
            updated_at: now,
        },
        duplicate: false,
    })
}

fn replay(
    existing: Order,
    restaurant_id: Uuid,
    user_id: Option<Uuid>,
) -> AppResult<CreateOrderResponse> {
    if existing.restaurant_id != restaurant_id || existing.user_id != user_id {
        return Err(OrderingError::ValidationFailure(
            "idempotency token was already used for a different order".into(),
        )
        .into());
    }
    tracing::info!(order_id = %existing.id, "duplicate order submission collapsed");
    Ok(CreateOrderResponse {
        order: existing,
        duplicate: true,
    })
}

/// Visible to restaurant staff, the placing user, or a guest holding the token.
pub async fn get_order(
    state: &AppState,
    user: Option<&AuthUser>,
    guest_token: Option<&str>,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let model = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let visible = match (user, guest_token) {
        (Some(user), _) if model.user_id == Some(user.user_id) => true,
        (Some(user), _) if is_staff(&state.orm, model.restaurant_id, user.user_id).await? => true,
        (_, Some(token)) => model.user_id.is_none() && model.idempotency_token == token,
        _ => false,
    };
    if !visible {
        return Err(AppError::NotFound);
    }

    let order = load_order(&state.orm, model).await?;
    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}

pub async fn list_orders_for_user(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    list_orders(state, condition, query).await
}

pub async fn list_restaurant_orders(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_staff(&state.orm, restaurant_id, user).await?;
    let condition = Condition::all().add(OrderCol::RestaurantId.eq(restaurant_id));
    list_orders(state, condition, query).await
}

async fn list_orders(
    state: &AppState,
    mut condition: Condition,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let mut items = load_items(&state.orm, models.iter().map(|o| o.id).collect()).await?;
    let orders = models
        .into_iter()
        .map(|model| {
            let lines = items.remove(&model.id).unwrap_or_default();
            order_from_entity(model, lines)
        })
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items: orders }, Some(meta)))
}

/// Move an order through its lifecycle.
///
/// The row is locked for the duration, and the write is guarded by the version
/// read under that lock, so two racing requests cannot both apply to the same
/// base state.
pub async fn transition_order(
    state: &AppState,
    user: Option<&AuthUser>,
    guest_token: Option<&str>,
    id: Uuid,
    payload: TransitionOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let model = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(expected) = payload.expected_version {
        if expected != model.version {
            return Err(AppError::Conflict(format!(
                "order is at version {}, expected {}",
                model.version, expected
            )));
        }
    }

    let actor = match (user, guest_token) {
        (Some(user), _) if is_staff(&txn, model.restaurant_id, user.user_id).await? => {
            Actor::Staff {
                user_id: user.user_id,
                restaurant_id: model.restaurant_id,
            }
        }
        (Some(user), _) => Actor::Customer {
            user_id: user.user_id,
        },
        (None, Some(token)) => Actor::Guest {
            token: token.to_string(),
        },
        (None, None) => {
            return Err(OrderingError::Unauthorized(
                "sign in or present the order token".into(),
            )
            .into());
        }
    };
    let actor_id = user.map(|u| u.user_id);

    let base_version = model.version;
    let order = load_order(&txn, model).await?;
    let from = order.status;
    let next = lifecycle::transition(&order, payload.status, &actor)?;

    let updated = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(next.status.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(next.updated_at.fixed_offset()))
        .col_expr(OrderCol::Version, Expr::col(OrderCol::Version).add(1))
        .filter(OrderCol::Id.eq(id))
        .filter(OrderCol::Version.eq(base_version))
        .exec(&txn)
        .await?;
    if updated.rows_affected == 0 {
        return Err(AppError::Conflict("order changed concurrently".into()));
    }

    log_audit(
        &txn,
        actor_id,
        AuditAction::OrderTransition,
        Some("orders"),
        Some(serde_json::json!({
            "order_id": id,
            "from": from.as_str(),
            "to": next.status.as_str(),
        })),
    )
    .await?;
    txn.commit().await?;

    tracing::info!(order_id = %id, from = %from, to = %next.status, "order transitioned");
    Ok(ApiResponse::success("Order updated", next, Some(Meta::empty())))
}

async fn find_order_by_token<C: ConnectionTrait>(
    conn: &C,
    token: &IdempotencyToken,
) -> AppResult<Option<Order>> {
    let model = Orders::find()
        .filter(OrderCol::IdempotencyToken.eq(token.as_str()))
        .one(conn)
        .await?;
    match model {
        Some(model) => Ok(Some(load_order(conn, model).await?)),
        None => Ok(None),
    }
}

async fn load_order<C: ConnectionTrait>(conn: &C, model: OrderModel) -> AppResult<Order> {
    let items = load_items(conn, vec![model.id])
        .await?
        .remove(&model.id)
        .unwrap_or_default();
    order_from_entity(model, items)
}

async fn load_items<C: ConnectionTrait>(
    conn: &C,
    order_ids: Vec<Uuid>,
) -> AppResult<HashMap<Uuid, Vec<OrderItemModel>>> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .order_by_asc(OrderItemCol::Position)
        .all(conn)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_id).or_default().push(row);
    }
    Ok(grouped)
}

fn order_from_entity(model: OrderModel, items: Vec<OrderItemModel>) -> AppResult<Order> {
    let status = model
        .status
        .parse::<OrderStatus>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("order {} has {}", model.id, e)))?;
    let guest = match (model.guest_name, model.guest_phone) {
        (Some(name), Some(phone)) => Some(GuestInfo {
            name,
            phone,
            email: model.guest_email,
        }),
        _ => None,
    };

    Ok(Order {
        id: model.id,
        restaurant_id: model.restaurant_id,
        user_id: model.user_id,
        items: items.into_iter().map(order_item_from_entity).collect(),
        total_amount: model.total_amount,
        status,
        guest,
        special_instructions: model.special_instructions,
        idempotency_token: model.idempotency_token,
        version: model.version,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        menu_item_id: model.menu_item_id,
        name: model.name,
        unit_price: model.unit_price,
        quantity: model.quantity,
        price_point_label: model.price_point_label,
    }
}
