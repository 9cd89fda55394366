//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::broadcast::OUTBOUND_BUFFER;
use crate::game::GameCommand;
use crate::util::rate_limit::PlayerRateLimiter;
use crate::ws::protocol::{ClientMsg, PlayerId, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let player_id = Uuid::new_v4();
    info!(player_id = %player_id, "New WebSocket connection");

    let (ws_sink, mut ws_stream) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);

    let cmd_tx = state.game.cmd_tx.clone();
    if cmd_tx
        .send(GameCommand::Connect {
            player_id,
            outbound: outbound_tx,
        })
        .await
        .is_err()
    {
        error!(player_id = %player_id, "Game loop is not running");
        return;
    }

    // Writer task: game loop -> WebSocket
    let writer_handle = tokio::spawn(run_writer(player_id, ws_sink, outbound_rx));

    // Reader loop: WebSocket -> game loop
    let rate_limiter = PlayerRateLimiter::new();
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(player_id = %player_id, "Rate limited input message");
                    continue;
                }

                match parse_client_msg(&text) {
                    Ok(msg) => {
                        if cmd_tx
                            .send(GameCommand::Client { player_id, msg })
                            .await
                            .is_err()
                        {
                            debug!(player_id = %player_id, "Command channel closed");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(player_id = %player_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(player_id = %player_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(player_id = %player_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(player_id = %player_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        }

        // The game loop dropped our sender (e.g. server full)
        if writer_handle.is_finished() {
            break;
        }
    }

    // Signal disconnect to the game loop
    let _ = cmd_tx.send(GameCommand::Disconnect { player_id }).await;

    writer_handle.abort();
    info!(player_id = %player_id, "WebSocket connection closed");
}

/// Forward outbound messages until the game loop drops the sender, then close
async fn run_writer(
    player_id: PlayerId,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<ServerMsg>,
) {
    while let Some(msg) = outbound_rx.recv().await {
        if let Err(e) = send_msg(&mut ws_sink, &msg).await {
            debug!(player_id = %player_id, error = %e, "WebSocket send failed");
            return;
        }
    }

    debug!(player_id = %player_id, "Outbound channel closed");
    let _ = ws_sink.send(Message::Close(None)).await;
}

fn parse_client_msg(text: &str) -> Result<ClientMsg, serde_json::Error> {
    serde_json::from_str(text)
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_input_is_an_error() {
        assert!(parse_client_msg("not json").is_err());
        assert!(parse_client_msg(r#"{"type":"teleport"}"#).is_err());
        assert!(parse_client_msg(r#"{"noType":true}"#).is_err());
    }

    #[test]
    fn known_messages_parse() {
        assert!(matches!(
            parse_client_msg(r#"{"type":"seekerSwing"}"#),
            Ok(ClientMsg::SeekerSwing)
        ));
        assert!(matches!(
            parse_client_msg(r#"{"type":"playerInput"}"#),
            Ok(ClientMsg::PlayerInput { .. })
        ));
    }
}
