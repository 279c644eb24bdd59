//! Dashboard WebSocket
//!
//! One connection is one session: a writer task drains the session queue onto
//! the socket while the reader loop hands text frames to the broadcaster.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tracing::{debug, info};

use crate::api::AppState;
use crate::broadcaster::SessionBroadcaster;

/// GET /ws
pub async fn connect(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.broadcaster))
}

async fn handle_socket(socket: WebSocket, broadcaster: Arc<SessionBroadcaster>) {
    let (sink, stream) = socket.split();
    serve_session(sink, stream, broadcaster).await;
}

/// Runs one session over any message sink and stream
///
/// Returns once either side stops: the peer closes or errors, or the
/// broadcaster drops the session's queue.
async fn serve_session<S, R, E>(sink: S, stream: R, broadcaster: Arc<SessionBroadcaster>)
where
    S: Sink<Message> + Send + 'static,
    R: Stream<Item = Result<Message, E>> + Send + 'static,
    E: Send,
{
    let (session_id, mut outbound) = broadcaster.connect();
    info!(%session_id, "Session connected");

    let mut writer = tokio::spawn(async move {
        let mut sink = std::pin::pin!(sink);
        while let Some(text) = outbound.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let inbound = Arc::clone(&broadcaster);
    let mut reader = tokio::spawn(async move {
        let mut stream = std::pin::pin!(stream);
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) => inbound.handle_inbound(session_id, text.as_str()),
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    broadcaster.disconnect(session_id);
    debug!(%session_id, "Session closed");
}
