//! UseCase: アクティブな Room 一覧の取得

use std::sync::Arc;

use crate::domain::{Room, RoomRegistry};

pub struct GetRoomsUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl GetRoomsUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Room 一覧を取得（RoomId 順）
    pub async fn execute(&self) -> Vec<Room> {
        self.registry.list_rooms().await
    }
}
