use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    domain::{CatalogItem, Menu},
    dto::{
        menu::{CreateMenuItemRequest, CreateSectionRequest, SectionCreated, UpdateMenuItemRequest},
        orders::OrderList,
        restaurants::{AddStaffRequest, CreateRestaurantRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Restaurant, StaffMember},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::{menu_service, order_service, restaurant_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_restaurant))
        .route("/{id}/staff", post(add_staff))
        .route("/{id}/menu", get(get_menu))
        .route("/{id}/menu/sections", post(create_section))
        .route("/{id}/menu/items", post(create_menu_item))
        .route("/{id}/menu/items/{item_id}", patch(update_menu_item))
        .route("/{id}/orders", get(list_restaurant_orders))
}

#[utoipa::path(
    post,
    path = "/api/restaurants",
    request_body = CreateRestaurantRequest,
    responses(
        (status = 201, description = "Restaurant created; caller becomes staff", body = ApiResponse<Restaurant>)
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn create_restaurant(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateRestaurantRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Restaurant>>)> {
    let resp = restaurant_service::create_restaurant(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/restaurants/{id}/staff",
    request_body = AddStaffRequest,
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "User is staff of the restaurant", body = ApiResponse<StaffMember>),
        (status = 403, description = "Caller is not staff"),
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn add_staff(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddStaffRequest>,
) -> AppResult<Json<ApiResponse<StaffMember>>> {
    let resp = restaurant_service::add_staff(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/restaurants/{id}/menu",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Sections and items with price points", body = ApiResponse<Menu>),
        (status = 404, description = "Restaurant not found"),
    ),
    tag = "Menu"
)]
pub async fn get_menu(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Menu>>> {
    let menu = menu_service::get_catalog(&state.orm, id).await?;
    Ok(Json(ApiResponse::success("Menu", menu, Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/api/restaurants/{id}/menu/sections",
    request_body = CreateSectionRequest,
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 201, description = "Section created", body = ApiResponse<SectionCreated>)
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn create_section(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateSectionRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SectionCreated>>)> {
    let resp = menu_service::create_section(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/restaurants/{id}/menu/items",
    request_body = CreateMenuItemRequest,
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 201, description = "Menu item created", body = ApiResponse<CatalogItem>),
        (status = 400, description = "Negative price or conflicting defaults"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateMenuItemRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CatalogItem>>)> {
    let resp = menu_service::create_item(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/restaurants/{id}/menu/items/{item_id}",
    request_body = UpdateMenuItemRequest,
    params(
        ("id" = Uuid, Path, description = "Restaurant ID"),
        ("item_id" = Uuid, Path, description = "Menu item ID"),
    ),
    responses(
        (status = 200, description = "Menu item updated", body = ApiResponse<CatalogItem>),
        (status = 404, description = "Item not found in this restaurant"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateMenuItemRequest>,
) -> AppResult<Json<ApiResponse<CatalogItem>>> {
    let resp = menu_service::update_item(&state, &user, id, item_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/restaurants/{id}/orders",
    params(
        ("id" = Uuid, Path, description = "Restaurant ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
    ),
    responses(
        (status = 200, description = "Orders placed at the restaurant", body = ApiResponse<OrderList>),
        (status = 403, description = "Caller is not staff"),
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn list_restaurant_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_restaurant_orders(&state, &user, id, query).await?;
    Ok(Json(resp))
}
