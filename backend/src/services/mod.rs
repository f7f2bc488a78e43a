//! Business logic services for the Inventory Management Platform
//!
//! Every service method takes the caller's organization id and scopes all
//! of its SQL to it.

pub mod auth;
pub mod category;
pub mod item;
pub mod order;
pub mod organization;
pub mod reporting;
pub mod supplier;
pub mod user;

pub use auth::AuthService;
pub use category::CategoryService;
pub use item::ItemService;
pub use order::OrderService;
pub use organization::OrganizationService;
pub use reporting::ReportingService;
pub use supplier::SupplierService;
pub use user::UserService;
