use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::ws::{CloseFrame, Message as WsMessage, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt, future};
use tokio::sync::mpsc;
use wethap_api::{JsonProtocol, Protocol};

use crate::services::{Inbound, Outbound, SessionContext, run_sender_session};

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SenderWsState {
    pub context: Arc<SessionContext>,
}

pub fn sender_ws_router(state: SenderWsState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/ws/PingPong", get(ping_pong_handler))
        .with_state(state)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SenderWsState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_sender_socket(socket, state.context))
}

async fn ping_pong_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(handle_ping_pong)
}

fn encode(outbound: &Outbound) -> Option<WsMessage> {
    let text = match outbound {
        Outbound::Ack(ack) => JsonProtocol.encode_text(ack),
        Outbound::Push(push) => JsonProtocol.encode_text(push),
        Outbound::Close(code) => {
            return Some(WsMessage::Close(Some(CloseFrame {
                code: *code,
                reason: Cow::Borrowed(""),
            })));
        }
    };

    match text {
        Ok(text) => Some(WsMessage::Text(text)),
        Err(e) => {
            tracing::error!("failed to encode outbound frame: {}", e);
            None
        }
    }
}

fn decode(message: Result<WsMessage, axum::Error>) -> Option<Inbound> {
    match message {
        Ok(WsMessage::Text(text)) => Some(Inbound::Text(text)),
        Ok(WsMessage::Close(_)) => Some(Inbound::Closed),
        Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Binary(_)) => None,
        Err(e) => {
            tracing::debug!("websocket read failed: {}", e);
            Some(Inbound::Closed)
        }
    }
}

async fn handle_sender_socket(socket: WebSocket, context: Arc<SessionContext>) {
    let (mut sender, receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();

    let mut writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let Some(message) = encode(&outbound) else {
                continue;
            };
            let closing = matches!(message, WsMessage::Close(_));

            if sender.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    let inbound = receiver.filter_map(|message| future::ready(decode(message)));
    run_sender_session(&context, inbound, tx).await;

    // Let the writer flush a pending close frame; the channel closes once every handle is gone
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        writer.abort();
    }
}

async fn handle_ping_pong(socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            WsMessage::Text(text) => {
                if sender.send(WsMessage::Text(text)).await.is_err() {
                    break;
                }
            }
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    tracing::debug!("ping pong socket closed");
}
