//! Conversion logic between DTOs and domain entities.

use teleconsult_shared::time::timestamp_to_rfc3339;

use crate::domain::entity::{PeerHandle, Room};
use crate::infrastructure::dto::http::{RoomDetailDto, RoomSummaryDto, SlotDetailDto};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&PeerHandle> for SlotDetailDto {
    fn from(handle: &PeerHandle) -> Self {
        Self {
            connection_id: handle.connection_id().as_uuid().to_string(),
            joined_at: timestamp_to_rfc3339(handle.joined_at().value()),
        }
    }
}

impl From<&Room> for RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            patient: room.patient.is_some(),
            doctor: room.doctor.is_some(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&Room> for RoomDetailDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            patient: room.patient.as_ref().map(SlotDetailDto::from),
            doctor: room.doctor.as_ref().map(SlotDetailDto::from),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}
