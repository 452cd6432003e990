//! REST API server module.
//!
//! Provides HTTP endpoints for starting encode pipelines and for
//! inspecting and administering their jobs.

pub mod error;
pub mod models;
pub mod routes;
pub mod server;

pub use server::{ApiServer, ApiServerConfig, AppState};
