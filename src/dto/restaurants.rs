use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRestaurantRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddStaffRequest {
    pub user_id: Uuid,
}
