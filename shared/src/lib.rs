//! Shared types and models for the Inventory Management Platform
//!
//! This crate holds the domain model and the pure rules of the order
//! workflow (stock reservation, status transitions, report arithmetic).
//! It performs no I/O; the backend drives it against PostgreSQL.

pub mod models;
pub mod reporting;
pub mod types;
pub mod validation;

pub use models::*;
pub use reporting::*;
pub use types::*;
pub use validation::*;
