//! Client execution logic with reconnection support.

use std::time::Duration;

use teleconsult_server::domain::Role;

use super::{
    domain::{should_attempt_reconnect, should_exit_immediately},
    error::ClientError,
    session::run_client_session,
};

/// Connection settings for the signaling client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL of the relay, without query string
    pub url: String,
    pub room: String,
    pub role: Role,
    pub max_reconnect_attempts: u32,
    pub reconnect_interval: Duration,
}

/// Run the signaling client with reconnection logic
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to join room '{}' at {} as {} (attempt {}/{})",
            config.room,
            config.url,
            config.role,
            reconnect_count + 1,
            config.max_reconnect_attempts
        );

        match run_client_session(&config.url, &config.room, config.role).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) if should_exit_immediately(&e) => {
                tracing::error!("{}. Exiting.", e);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                if !should_attempt_reconnect(&e, reconnect_count, config.max_reconnect_attempts) {
                    tracing::error!(
                        "Failed to reconnect after {} attempts. Exiting.",
                        config.max_reconnect_attempts
                    );
                    return Err(e);
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    config.reconnect_interval.as_secs(),
                    reconnect_count + 1,
                    config.max_reconnect_attempts
                );

                tokio::time::sleep(config.reconnect_interval).await;
            }
        }
    }
}
