use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    domain::{CatalogItem, Menu, MenuSection, PricePoint},
    dto::menu::{
        CreateMenuItemRequest, CreateSectionRequest, NewPricePoint, SectionCreated,
        UpdateMenuItemRequest,
    },
    entity::{
        menu_items::{
            ActiveModel as ItemActive, Column as ItemCol, Entity as MenuItems, Model as ItemModel,
        },
        menu_sections::{
            ActiveModel as SectionActive, Column as SectionCol, Entity as MenuSections,
        },
        price_points::{
            ActiveModel as PricePointActive, Column as PricePointCol, Entity as PricePoints,
            Model as PricePointModel,
        },
        restaurants::Entity as Restaurants,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::restaurant_service::ensure_staff,
    state::AppState,
};

pub async fn get_catalog<C: ConnectionTrait>(conn: &C, restaurant_id: Uuid) -> AppResult<Menu> {
    if Restaurants::find_by_id(restaurant_id).one(conn).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let sections = MenuSections::find()
        .filter(SectionCol::RestaurantId.eq(restaurant_id))
        .order_by_asc(SectionCol::Position)
        .order_by_asc(SectionCol::Name)
        .all(conn)
        .await?;

    let items = MenuItems::find()
        .filter(ItemCol::RestaurantId.eq(restaurant_id))
        .order_by_asc(ItemCol::Position)
        .order_by_asc(ItemCol::Name)
        .all(conn)
        .await?;
    let mut price_points = load_price_points(conn, items.iter().map(|i| i.id).collect()).await?;

    let mut by_section: HashMap<Uuid, Vec<CatalogItem>> = HashMap::new();
    for item in items {
        let points = price_points.remove(&item.id).unwrap_or_default();
        by_section
            .entry(item.section_id)
            .or_default()
            .push(catalog_item_from_entity(item, points));
    }

    let sections = sections
        .into_iter()
        .map(|section| MenuSection {
            items: by_section.remove(&section.id).unwrap_or_default(),
            id: section.id,
            name: section.name,
        })
        .collect();

    Ok(Menu {
        restaurant_id,
        sections,
    })
}

/// Catalog items of `restaurant_id` among `ids`, keyed by id. Ids from other
/// restaurants are silently absent.
pub async fn catalog_items<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: Uuid,
    ids: Vec<Uuid>,
) -> AppResult<HashMap<Uuid, CatalogItem>> {
    let items = MenuItems::find()
        .filter(ItemCol::RestaurantId.eq(restaurant_id))
        .filter(ItemCol::Id.is_in(ids))
        .all(conn)
        .await?;
    let mut price_points = load_price_points(conn, items.iter().map(|i| i.id).collect()).await?;

    Ok(items
        .into_iter()
        .map(|item| {
            let points = price_points.remove(&item.id).unwrap_or_default();
            (item.id, catalog_item_from_entity(item, points))
        })
        .collect())
}

pub async fn create_section(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    payload: CreateSectionRequest,
) -> AppResult<ApiResponse<SectionCreated>> {
    ensure_staff(&state.orm, restaurant_id, user).await?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("section name must not be empty".into()));
    }

    let section = SectionActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        name: Set(name),
        position: Set(payload.position.unwrap_or(0)),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Section created",
        SectionCreated {
            id: section.id,
            name: section.name,
            position: section.position,
        },
        Some(Meta::empty()),
    ))
}

pub async fn create_item(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    payload: CreateMenuItemRequest,
) -> AppResult<ApiResponse<CatalogItem>> {
    ensure_staff(&state.orm, restaurant_id, user).await?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("item name must not be empty".into()));
    }
    validate_price(payload.price)?;
    validate_price_points(&payload.price_points)?;

    let section = MenuSections::find_by_id(payload.section_id)
        .one(&state.orm)
        .await?;
    if section.is_none_or(|s| s.restaurant_id != restaurant_id) {
        return Err(AppError::BadRequest("section does not belong to this restaurant".into()));
    }

    let txn = state.orm.begin().await?;
    let item = ItemActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        section_id: Set(payload.section_id),
        name: Set(name),
        description: Set(payload.description),
        price: Set(payload.price),
        available: Set(payload.available),
        position: Set(0),
        updated_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    let mut points = Vec::with_capacity(payload.price_points.len());
    for (position, pp) in payload.price_points.into_iter().enumerate() {
        let model = PricePointActive {
            id: Set(Uuid::new_v4()),
            menu_item_id: Set(item.id),
            label: Set(pp.label.trim().to_string()),
            price: Set(pp.price),
            is_default: Set(pp.is_default),
            position: Set(position as i32),
        }
        .insert(&txn)
        .await?;
        points.push(model);
    }

    log_audit(
        &txn,
        Some(user.user_id),
        AuditAction::MenuChange,
        Some("menu_items"),
        Some(serde_json::json!({ "menu_item_id": item.id, "change": "create" })),
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Menu item created",
        catalog_item_from_entity(item, points),
        Some(Meta::empty()),
    ))
}

/// Edit a menu item. Placed orders hold their own snapshots and are unaffected.
pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    item_id: Uuid,
    payload: UpdateMenuItemRequest,
) -> AppResult<ApiResponse<CatalogItem>> {
    ensure_staff(&state.orm, restaurant_id, user).await?;

    let existing = MenuItems::find_by_id(item_id)
        .one(&state.orm)
        .await?
        .filter(|item| item.restaurant_id == restaurant_id)
        .ok_or(AppError::NotFound)?;

    let mut active: ItemActive = existing.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("item name must not be empty".into()));
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
        active.price = Set(price);
    }
    if let Some(available) = payload.available {
        active.available = Set(available);
    }
    active.updated_at = Set(Utc::now().into());
    let item = active.update(&state.orm).await?;

    log_audit(
        &state.orm,
        Some(user.user_id),
        AuditAction::MenuChange,
        Some("menu_items"),
        Some(serde_json::json!({ "menu_item_id": item.id, "change": "update" })),
    )
    .await?;

    let points = load_price_points(&state.orm, vec![item.id])
        .await?
        .remove(&item.id)
        .unwrap_or_default();
    Ok(ApiResponse::success(
        "Menu item updated",
        catalog_item_from_entity(item, points),
        Some(Meta::empty()),
    ))
}

async fn load_price_points<C: ConnectionTrait>(
    conn: &C,
    item_ids: Vec<Uuid>,
) -> AppResult<HashMap<Uuid, Vec<PricePointModel>>> {
    if item_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = PricePoints::find()
        .filter(PricePointCol::MenuItemId.is_in(item_ids))
        .order_by_asc(PricePointCol::Position)
        .all(conn)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<PricePointModel>> = HashMap::new();
    for row in rows {
        grouped.entry(row.menu_item_id).or_default().push(row);
    }
    Ok(grouped)
}

fn validate_price(price: i64) -> AppResult<()> {
    if price < 0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    Ok(())
}

fn validate_price_points(points: &[NewPricePoint]) -> AppResult<()> {
    for pp in points {
        validate_price(pp.price)?;
        if pp.label.trim().is_empty() {
            return Err(AppError::BadRequest("price point label must not be empty".into()));
        }
    }
    if points.iter().filter(|pp| pp.is_default).count() > 1 {
        return Err(AppError::BadRequest("at most one price point may be the default".into()));
    }
    Ok(())
}

fn catalog_item_from_entity(model: ItemModel, points: Vec<PricePointModel>) -> CatalogItem {
    CatalogItem {
        id: model.id,
        restaurant_id: model.restaurant_id,
        name: model.name,
        description: model.description,
        price: model.price,
        available: model.available,
        price_points: points
            .into_iter()
            .map(|pp| PricePoint {
                id: pp.id,
                label: pp.label,
                price: pp.price,
                is_default: pp.is_default,
            })
            .collect(),
    }
}
