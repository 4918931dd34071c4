use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    domain::{Order, OrderPayload},
    dto::orders::{
        CreateOrderResponse, IDEMPOTENCY_KEY_HEADER, ORDER_TOKEN_HEADER, OrderList,
        TransitionOrderRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/{id}", get(get_order))
        .route("/{id}/status", patch(transition_order))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<Option<&'a str>> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| AppError::BadRequest(format!("invalid {name} header")))
        })
        .transpose()
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = OrderPayload,
    params(
        ("Idempotency-Key" = String, Header, description = "Client-generated token; replays return the original order"),
    ),
    responses(
        (status = 201, description = "Order created", body = ApiResponse<CreateOrderResponse>),
        (status = 200, description = "Token already used; original order returned", body = ApiResponse<CreateOrderResponse>),
        (status = 422, description = "Empty cart, unavailable item, stale price or missing identity"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    headers: HeaderMap,
    Json(payload): Json<OrderPayload>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreateOrderResponse>>)> {
    let token = header_str(&headers, IDEMPOTENCY_KEY_HEADER)?;
    let resp = order_service::create_order(&state, user.as_ref(), token, payload).await?;
    let (status, message) = if resp.duplicate {
        (StatusCode::OK, "Order already placed")
    } else {
        (StatusCode::CREATED, "Order placed")
    };
    Ok((
        status,
        Json(ApiResponse::success(message, resp, Some(Meta::empty()))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "asc or desc by creation time"),
    ),
    responses(
        (status = 200, description = "Orders placed by the caller", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders_for_user(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        ("X-Order-Token" = Option<String>, Header, description = "Guest proof of ownership"),
    ),
    responses(
        (status = 200, description = "Order", body = ApiResponse<Order>),
        (status = 404, description = "Order not found or not visible to the caller"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let guest_token = header_str(&headers, ORDER_TOKEN_HEADER)?;
    let resp = order_service::get_order(&state, user.as_ref(), guest_token, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    request_body = TransitionOrderRequest,
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        ("X-Order-Token" = Option<String>, Header, description = "Guest proof of ownership"),
    ),
    responses(
        (status = 200, description = "Order moved to the requested status", body = ApiResponse<Order>),
        (status = 403, description = "Caller may not perform this transition"),
        (status = 409, description = "Transition not allowed, order closed, or version mismatch"),
    ),
    tag = "Orders"
)]
pub async fn transition_order(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let guest_token = header_str(&headers, ORDER_TOKEN_HEADER)?;
    let resp =
        order_service::transition_order(&state, user.as_ref(), guest_token, id, payload).await?;
    Ok(Json(resp))
}
