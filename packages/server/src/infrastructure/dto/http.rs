//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Room summary for `GET /api/rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    /// Whether the patient slot is occupied
    pub patient: bool,
    /// Whether the doctor slot is occupied
    pub doctor: bool,
    pub created_at: String,
}

/// Occupied slot detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDetailDto {
    pub connection_id: String,
    pub joined_at: String,
}

/// Room detail for `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub id: String,
    pub patient: Option<SlotDetailDto>,
    pub doctor: Option<SlotDetailDto>,
    pub created_at: String,
}
