use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSectionRequest {
    pub name: String,
    pub position: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SectionCreated {
    pub id: Uuid,
    pub name: String,
    pub position: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewPricePoint {
    pub label: String,
    pub price: i64,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenuItemRequest {
    pub section_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub price_points: Vec<NewPricePoint>,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateMenuItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub available: Option<bool>,
}
