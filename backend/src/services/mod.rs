//! Module for core business logic services.
//!
//! Services orchestrate repositories and gateways; the session and access
//! services live in `auth`.

pub mod payment_service;
pub mod user_service;
