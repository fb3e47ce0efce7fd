//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::{mpsc, oneshot, watch};

use crate::{
    domain::{ConnectionId, UserId},
    ui::state::AppState,
};

use super::events::ClientSession;

/// 認証済み接続の識別情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Authenticated {
    pub user_id: UserId,
    pub connection_id: ConnectionId,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// The loop ends when every sender of the channel is gone, which happens when the
/// connection is superseded by a newer one for the same user. The socket is closed then.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                return;
            }
        }
        if let Err(e) = sender.send(Message::Close(None)).await {
            tracing::debug!("Failed to send close frame: {}", e);
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    // Outbound queue for this socket. Until `authenticate` the only strong sender lives
    // in the session; afterwards it is owned by the MessagePusher.
    let (tx, rx) = mpsc::unbounded_channel();
    let (identity_tx, identity_rx) = watch::channel(None::<Authenticated>);
    let mut session = ClientSession::new(state.clone(), tx, identity_tx);
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    // A frame being handled always runs to completion. The stop signal is only
    // observed between frames so a use case is never cancelled halfway.
    let mut recv_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                biased;
                _ = &mut stop_rx => break,
                msg = receiver.next() => msg,
            };
            let Some(msg) = msg else {
                break;
            };
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => session.handle_text(text.as_str()).await,
                Message::Binary(_) => {
                    tracing::debug!("Ignoring binary frame");
                }
                Message::Ping(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                    tracing::trace!("Received ping");
                }
                Message::Close(_) => {
                    tracing::debug!("Client requested close");
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    // The receive side stopping ends the socket. The send side stopping (superseded,
    // or the peer went away) asks the receive side to stop after its current frame.
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => {
            if stop_tx.send(()).is_err() {
                tracing::trace!("Receive task already finished");
            }
            if let Err(e) = (&mut recv_task).await {
                tracing::warn!("Receive task failed: {}", e);
            }
        }
    };

    // Transport disconnect is an implicit leave_chat plus unregister
    let identity = identity_rx.borrow().clone();
    let Some(Authenticated {
        user_id,
        connection_id,
    }) = identity
    else {
        tracing::debug!("Unauthenticated socket closed");
        return;
    };

    let unregistration = state
        .disconnect_user_usecase
        .execute(&user_id, connection_id)
        .await;
    if unregistration.removed {
        state.presence_usecase.set_online(&user_id, false).await;
    }
}
