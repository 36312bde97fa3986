//! HTTP API endpoints for creating rooms and browsing the public room list.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::manager::SessionManager;
use crate::protocol::RoomListing;
use crate::types::RoomCode;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CreateRoomRequest {
    /// Whether the room should appear on the public room list
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRoomResponse {
    pub room_code: RoomCode,
}

/// Create a new room.
///
/// POST /rooms
///
/// The body is optional; without one the room is private.
pub async fn create_room(
    State(manager): State<Arc<SessionManager>>,
    body: Option<Json<CreateRoomRequest>>,
) -> (StatusCode, Json<CreateRoomResponse>) {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let room_code = manager.create_room(request.is_public).await;
    (StatusCode::CREATED, Json(CreateRoomResponse { room_code }))
}

/// List public rooms that can still be joined.
///
/// GET /rooms
pub async fn list_rooms(State(manager): State<Arc<SessionManager>>) -> Json<Vec<RoomListing>> {
    Json(manager.public_rooms().await)
}
