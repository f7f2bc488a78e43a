//! Domain models for the Inventory Management Platform

mod category;
mod item;
mod order;
mod organization;
mod supplier;
mod user;

pub use category::*;
pub use item::*;
pub use order::*;
pub use organization::*;
pub use supplier::*;
pub use user::*;
