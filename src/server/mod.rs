//! Async shell: HTTP router, WebSocket sessions, and the shared hub.

pub mod http;
pub mod hub;
pub mod ws;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::server::hub::RoomHub;

/// Assemble the application router: room creation plus the realtime
/// channel.
pub fn router(hub: Arc<RoomHub>) -> Router {
    Router::new()
        .route("/create", get(http::create_room))
        .route("/ws", get(ws::ws_handler))
        .with_state(hub)
}
