//! API route modules.
//!
//! Organizes routes by pipeline input kind plus the system/job surface.

pub mod decklink;
pub mod file;
pub mod health;
pub mod rtp;
pub mod system;

use axum::Router;

use crate::api::server::AppState;

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/decklink", decklink::router())
        .nest("/api/rtp", rtp::router())
        .nest("/api/file", file::router())
        .nest("/api/system", system::router())
        .nest("/health", health::router())
        .with_state(state)
}
