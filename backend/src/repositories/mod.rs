//! Data access layer.
//!
//! One repository per entity, each holding a reference to the shared
//! connection pool. Repositories return `anyhow::Result`; services convert
//! failures into `ServiceError::Database`.

pub mod role_repository;
pub mod session_repository;
pub mod transaction_repository;
pub mod user_repository;
