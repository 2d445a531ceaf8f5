//! Central module for organizing the application's API endpoints.
//!
//! Payment endpoints live here; authentication routes are handled
//! separately under `auth`.

pub mod common;
pub mod payment;
