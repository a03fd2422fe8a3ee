//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    infrastructure::dto::websocket::ServerEvent,
    ui::state::AppState,
    usecase::{ConnectionSession, SessionControl},
};

/// Time allowed for queued frames to reach the client after the session closes
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Query parameters for WebSocket connection
///
/// Both are optional at the extractor level so that a missing parameter is
/// reported in-band instead of failing the HTTP upgrade.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub room: Option<String>,
    pub role: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    ws.max_message_size(state.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state, query))
}

/// Spawns a task that drains the connection's outbound queue into the WebSocket sink.
///
/// The queue is fed by this session (`wait`) and by the peer's session
/// (`peer-joined`, relayed signals, `left`). When every sender is gone the
/// connection is closed.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    })
}

/// Report a rejected join to the client, then close the connection.
async fn reject(sender: &mut SplitSink<WebSocket, Message>, msg: String) {
    let frame = ServerEvent::error(msg.clone()).to_json();
    if let Err(e) = sender.send(Message::Text(frame.into())).await {
        tracing::warn!("Failed to send join rejection: {}", e);
        return;
    }
    let close = CloseFrame {
        code: close_code::POLICY,
        reason: msg.into(),
    };
    let _ = sender.send(Message::Close(Some(close))).await;
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, query: ConnectQuery) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    let mut session = ConnectionSession::new(
        state.join_room_usecase.clone(),
        state.relay_signal_usecase.clone(),
        state.leave_room_usecase.clone(),
    );
    let connection_id = session.connection_id();

    if let Err(e) = session
        .join(query.room.as_deref(), query.role.as_deref(), tx)
        .await
    {
        reject(&mut sender, e.client_message()).await;
        return;
    }

    let mut send_task = pusher_loop(rx, sender);
    let mut send_task_done = false;

    loop {
        tokio::select! {
            frame = receiver.next() => {
                let control = match frame {
                    Some(Ok(Message::Text(text))) => session.on_text(text.as_str()).await,
                    Some(Ok(Message::Binary(data))) => {
                        tracing::warn!(
                            "Connection {} sent a binary frame ({} bytes), ignoring",
                            connection_id,
                            data.len()
                        );
                        SessionControl::Continue
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("Connection {} requested close", connection_id);
                        SessionControl::Close
                    }
                    // Ping/pong is handled automatically by the WebSocket protocol
                    Some(Ok(_)) => SessionControl::Continue,
                    Some(Err(e)) => {
                        tracing::warn!("Connection {} WebSocket error: {}", connection_id, e);
                        SessionControl::Close
                    }
                    None => SessionControl::Close,
                };
                if control == SessionControl::Close {
                    break;
                }
            }
            _ = &mut send_task => {
                tracing::debug!("Connection {} outbound side closed", connection_id);
                send_task_done = true;
                break;
            }
        }
    }

    let last_state = session.refresh_state().await;
    tracing::debug!("Connection {} closing from {:?}", connection_id, last_state);
    session.close().await;

    if !send_task_done
        && tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, &mut send_task)
            .await
            .is_err()
    {
        send_task.abort();
    }
}
