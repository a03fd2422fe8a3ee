//! Infrastructure layer
//!
//! - `repository`: RoomRegistry trait の具体的な実装
//! - `dto`: WebSocket / HTTP のワイヤフォーマット

pub mod dto;
pub mod repository;
