use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    dto::restaurants::{AddStaffRequest, CreateRestaurantRequest},
    entity::{
        restaurant_staff::{
            ActiveModel as StaffActive, Column as StaffCol, Entity as RestaurantStaff,
        },
        restaurants::{
            ActiveModel as RestaurantActive, Column as RestaurantCol, Entity as Restaurants,
            Model as RestaurantModel,
        },
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Restaurant, StaffMember},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn create_restaurant(
    state: &AppState,
    user: &AuthUser,
    payload: CreateRestaurantRequest,
) -> AppResult<ApiResponse<Restaurant>> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    let taken = Restaurants::find()
        .filter(RestaurantCol::Name.eq(name.as_str()))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict(format!("restaurant name `{name}` is taken")));
    }

    let txn = state.orm.begin().await?;
    let now = Utc::now();
    let restaurant = RestaurantActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    StaffActive {
        restaurant_id: Set(restaurant.id),
        user_id: Set(user.user_id),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    log_audit(
        &txn,
        Some(user.user_id),
        AuditAction::RestaurantCreate,
        Some("restaurants"),
        Some(serde_json::json!({ "restaurant_id": restaurant.id })),
    )
    .await?;
    txn.commit().await?;

    tracing::info!(restaurant_id = %restaurant.id, owner = %user.user_id, "restaurant created");
    Ok(ApiResponse::success(
        "Restaurant created",
        restaurant_from_entity(restaurant),
        Some(Meta::empty()),
    ))
}

pub async fn add_staff(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    payload: AddStaffRequest,
) -> AppResult<ApiResponse<StaffMember>> {
    ensure_staff(&state.orm, restaurant_id, user).await?;

    if Users::find_by_id(payload.user_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let now = Utc::now();
    RestaurantStaff::insert(StaffActive {
        restaurant_id: Set(restaurant_id),
        user_id: Set(payload.user_id),
        created_at: Set(now.into()),
    })
    .on_conflict(
        OnConflict::columns([StaffCol::RestaurantId, StaffCol::UserId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await?;

    log_audit(
        &state.orm,
        Some(user.user_id),
        AuditAction::StaffAdd,
        Some("restaurant_staff"),
        Some(serde_json::json!({ "restaurant_id": restaurant_id, "user_id": payload.user_id })),
    )
    .await?;

    Ok(ApiResponse::success(
        "Staff added",
        StaffMember {
            restaurant_id,
            user_id: payload.user_id,
            created_at: now,
        },
        Some(Meta::empty()),
    ))
}

pub async fn is_staff<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: Uuid,
    user_id: Uuid,
) -> AppResult<bool> {
    let membership = RestaurantStaff::find_by_id((restaurant_id, user_id))
        .one(conn)
        .await?;
    Ok(membership.is_some())
}

/// `NotFound` for an unknown restaurant, `Forbidden` for non-staff.
pub async fn ensure_staff<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: Uuid,
    user: &AuthUser,
) -> AppResult<()> {
    if Restaurants::find_by_id(restaurant_id).one(conn).await?.is_none() {
        return Err(AppError::NotFound);
    }
    if !is_staff(conn, restaurant_id, user.user_id).await? {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

fn restaurant_from_entity(model: RestaurantModel) -> Restaurant {
    Restaurant {
        id: model.id,
        name: model.name,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
