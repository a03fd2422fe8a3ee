//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::{DefaultEditor, error::ReadlineError};
use teleconsult_server::{
    domain::Role,
    infrastructure::dto::websocket::{ClientSignal, ServerEvent},
};
use teleconsult_shared::time::now_millis;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::error::ClientError;

use super::{
    domain::{Handshake, Inbound, Outgoing, classify, connect_url, parse_command},
    formatter::MessageFormatter,
    ui::redisplay_prompt,
};

/// How the read side of a session ended
enum ReadEnd {
    Closed,
    Rejected(String),
    Failed(String),
}

/// How the write side of a session ended
enum WriteEnd {
    /// stdin reached EOF or Ctrl+C
    InputClosed,
    /// The user sent `leave`
    Left,
    Failed(String),
}

/// Run one WebSocket client session
///
/// Returns `Ok(())` when the user ends the session, `Err(ClientError::Rejected)`
/// when the relay refuses the join, and `Err(ClientError::ConnectionError)`
/// when the connection drops.
pub async fn run_client_session(url: &str, room: &str, role: Role) -> Result<(), ClientError> {
    let url = connect_url(url, room, role)?;

    let (ws_stream, _response) = connect_async(&url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to signaling server");
    print!("{}", MessageFormatter::format_connected(room, role.as_str()));

    let (mut write, mut read) = ws_stream.split();

    // Announce ourselves; the relay forwards this to the peer if present
    let join = Outgoing::Signal(ClientSignal::Join { role }).encode()?;
    write
        .send(Message::text(join))
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    // Automatic replies decided by the read task are sent by the write task
    let (reaction_tx, mut reaction_rx) = mpsc::unbounded_channel::<ClientSignal>();

    let mut read_task = tokio::spawn(async move {
        let mut handshake = Handshake::new(role);

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let inbound = classify(text.as_str());
                    match &inbound {
                        Inbound::Event(event) => print!("{}", MessageFormatter::format_event(event)),
                        Inbound::Signal(signal) => {
                            print!("{}", MessageFormatter::format_signal(signal, now_millis()))
                        }
                        Inbound::Other(raw) => print!("{}", MessageFormatter::format_raw_message(raw)),
                    }
                    redisplay_prompt(role);

                    if let Inbound::Event(ServerEvent::Error { msg }) = &inbound {
                        return ReadEnd::Rejected(msg.clone());
                    }
                    if let Some(reply) = handshake.react(&inbound)
                        && reaction_tx.send(reply).is_err()
                    {
                        return ReadEnd::Closed;
                    }
                }
                Ok(Message::Binary(data)) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt(role);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    return ReadEnd::Closed;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return ReadEnd::Failed(e.to_string());
                }
                _ => {}
            }
        }

        ReadEnd::Closed
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", role);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let mut write_task = tokio::spawn(async move {
        loop {
            let outgoing = tokio::select! {
                line = input_rx.recv() => match line {
                    Some(line) => match parse_command(&line) {
                        Ok(outgoing) => outgoing,
                        Err(e) => {
                            println!("{}", e);
                            redisplay_prompt(role);
                            continue;
                        }
                    },
                    None => return WriteEnd::InputClosed,
                },
                Some(reply) = reaction_rx.recv() => Outgoing::Signal(reply),
            };

            let json = match outgoing.encode() {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("{}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::text(json)).await {
                tracing::warn!("Failed to send message: {}", e);
                return WriteEnd::Failed(e.to_string());
            }

            print!("\n{}", MessageFormatter::format_sent(outgoing.kind(), now_millis()));
            redisplay_prompt(role);

            if outgoing.is_leave() {
                let _ = write.close().await;
                return WriteEnd::Left;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            match read_result {
                Ok(ReadEnd::Rejected(msg)) => Err(ClientError::Rejected(msg)),
                Ok(ReadEnd::Failed(e)) => Err(ClientError::ConnectionError(e)),
                Ok(ReadEnd::Closed) | Err(_) => Err(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )),
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            match write_result {
                Ok(WriteEnd::InputClosed) | Ok(WriteEnd::Left) => Ok(()),
                Ok(WriteEnd::Failed(e)) => Err(ClientError::ConnectionError(e)),
                Err(_) => Err(ClientError::ConnectionError("Connection lost".to_string())),
            }
        }
    }
}
