//! HTTP handlers for the Inventory Management Platform

pub mod auth;
pub mod categories;
pub mod health;
pub mod items;
pub mod orders;
pub mod organizations;
pub mod reporting;
pub mod suppliers;
pub mod users;

pub use auth::*;
pub use categories::*;
pub use health::*;
pub use items::*;
pub use orders::*;
pub use organizations::*;
pub use reporting::*;
pub use suppliers::*;
pub use users::*;
