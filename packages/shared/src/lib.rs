//! Utilities shared by the teleconsult relay server and its CLI client.

pub mod logger;
pub mod time;
