use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{
        CatalogItem, GuestInfo, Menu, MenuSection, Order, OrderItem, OrderPayload,
        OrderPayloadItem, OrderStatus, PricePoint,
    },
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        menu::{
            CreateMenuItemRequest, CreateSectionRequest, NewPricePoint, SectionCreated,
            UpdateMenuItemRequest,
        },
        orders::{CreateOrderResponse, OrderList, TransitionOrderRequest},
        restaurants::{AddStaffRequest, CreateRestaurantRequest},
    },
    models::{Restaurant, StaffMember, User},
    response::{ApiResponse, ErrorData, Meta},
    routes::{auth, health, orders, params, restaurants},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        restaurants::create_restaurant,
        restaurants::add_staff,
        restaurants::get_menu,
        restaurants::create_section,
        restaurants::create_menu_item,
        restaurants::update_menu_item,
        restaurants::list_restaurant_orders,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::transition_order
    ),
    components(
        schemas(
            User,
            Restaurant,
            StaffMember,
            Menu,
            MenuSection,
            CatalogItem,
            PricePoint,
            Order,
            OrderItem,
            OrderStatus,
            GuestInfo,
            OrderPayload,
            OrderPayloadItem,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateRestaurantRequest,
            AddStaffRequest,
            CreateSectionRequest,
            SectionCreated,
            NewPricePoint,
            CreateMenuItemRequest,
            UpdateMenuItemRequest,
            CreateOrderResponse,
            TransitionOrderRequest,
            OrderList,
            ErrorData,
            params::Pagination,
            params::OrderListQuery,
            params::SortOrder,
            health::HealthData,
            Meta,
            ApiResponse<Menu>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<CreateOrderResponse>,
            ApiResponse<ErrorData>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Restaurants", description = "Restaurant and staff endpoints"),
        (name = "Menu", description = "Menu catalog endpoints"),
        (name = "Orders", description = "Order placement and lifecycle endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
