//! `WS /ws/voice/{session_id}` (§6): client sends raw binary PCM16 chunks,
//! server pushes back JSON `ServerMessage` frames from the session's actor.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use tokio::sync::mpsc;

use voice_agent_agent::orchestrator::{SessionActor, SessionInput};
use voice_agent_core::SessionId;

use crate::state::AppState;

pub async fn voice_ws_handler(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    match session_id.parse::<SessionId>() {
        Ok(id) => ws.on_upgrade(move |socket| handle_socket(socket, id, state)),
        Err(_) => axum::http::StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn handle_socket(socket: WebSocket, id: SessionId, state: AppState) {
    if state.registry.get(id).is_some() {
        // An already-running actor has no output receiver to hand to a
        // second connection; §5 treats one session as one logically
        // sequential actor with a single attached transport, so a reconnect
        // is rejected by closing immediately rather than racing two
        // consumers over one inbox.
        let _ = socket.close().await;
        return;
    }

    let outbox = SessionActor::spawn(
        id,
        state.adapters.clone(),
        state.store.clone(),
        state.settings.turn_timing,
        state.settings.session.clone(),
        state.registry.clone(),
    );
    let inbox = state
        .registry
        .get(id)
        .expect("SessionActor::spawn registers its inbox before returning");
    run_socket(socket, id, inbox, outbox).await;
}

async fn run_socket(
    mut socket: WebSocket,
    id: SessionId,
    inbox: mpsc::Sender<SessionInput>,
    mut outbox: mpsc::Receiver<voice_agent_core::ServerMessage>,
) {
    loop {
        tokio::select! {
            outgoing = outbox.recv() => {
                match outgoing {
                    Some(message) => {
                        let Ok(json) = serde_json::to_string(&message) else { continue };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Binary(pcm))) => {
                        if inbox.send(SessionInput::AudioChunk(pcm.to_vec())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        let _ = inbox.send(SessionInput::Close).await;
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }
    tracing::debug!(session_id = %id, "voice websocket closed");
}
