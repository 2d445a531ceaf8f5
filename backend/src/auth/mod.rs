//! Authentication module: sessions, tokens and access control.
//!
//! Provides the session manager (login, token issue, caller resolution,
//! logout), the role/permission authorization engine, and the axum
//! middleware that wires both into request handling.

pub mod access;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
