pub mod audit_logs;
pub mod menu_items;
pub mod menu_sections;
pub mod order_items;
pub mod orders;
pub mod price_points;
pub mod restaurant_staff;
pub mod restaurants;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use menu_items::Entity as MenuItems;
pub use menu_sections::Entity as MenuSections;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use price_points::Entity as PricePoints;
pub use restaurant_staff::Entity as RestaurantStaff;
pub use restaurants::Entity as Restaurants;
pub use users::Entity as Users;
