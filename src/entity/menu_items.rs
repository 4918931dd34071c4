use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "menu_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub section_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub available: bool,
    pub position: i32,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::restaurants::Entity",
        from = "Column::RestaurantId",
        to = "super::restaurants::Column::Id"
    )]
    Restaurants,
    #[sea_orm(
        belongs_to = "super::menu_sections::Entity",
        from = "Column::SectionId",
        to = "super::menu_sections::Column::Id"
    )]
    MenuSections,
    #[sea_orm(has_many = "super::price_points::Entity")]
    PricePoints,
}

impl Related<super::restaurants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Restaurants.def()
    }
}

impl Related<super::menu_sections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuSections.def()
    }
}

impl Related<super::price_points::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PricePoints.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
