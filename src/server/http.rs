//! Room-creation endpoint, consumed by whatever front end shares codes.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::protocol::RoomCreated;
use crate::server::hub::RoomHub;

pub async fn create_room(State(hub): State<Arc<RoomHub>>) -> Json<RoomCreated> {
    let id = hub.create_room().await;
    Json(RoomCreated { id })
}
