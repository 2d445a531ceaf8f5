//! Payment API: initiation, provider callbacks and the admin transaction
//! listing.

pub mod handlers;
pub mod models;
pub mod routes;
