//! WebSocket handler for live viewers.

use std::fmt::Display;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use futures::{future, Sink, SinkExt, StreamExt};

use crate::error::Error;
use crate::viewer::PeerFrame;

use super::extract::request_host;
use super::state::AppState;

/// `/init-client`: upgrade and subscribe to the requesting host.
pub async fn init_client(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if method != Method::GET {
        return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
    }
    state.stats.record_subscription();

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "WebSocket upgrade rejected");
            return rejection.into_response();
        }
    };

    let host = request_host(&headers, &uri);
    ws.on_upgrade(move |socket| serve_viewer(socket, state, host))
}

/// Adapts a WebSocket sink to the viewer transport: one text frame per payload.
fn text_frames<S>(sink: S) -> impl Sink<String, Error = Error> + Unpin
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    sink.sink_map_err(|e| Error::Transport(e.to_string()))
        .with(|payload: String| future::ready(Ok::<_, Error>(Message::Text(payload.into()))))
}

/// Runs one viewer until either side closes.
async fn serve_viewer(socket: WebSocket, state: AppState, host: String) {
    let connection = state.catcher.subscribe(&host).await;
    tracing::info!(host = %connection.channel().hostname(), "Initializing a new client");

    let (sender, receiver) = socket.split();
    let sink = text_frames(sender);

    // Viewers send nothing meaningful; only watch for close
    let peer = receiver.map(|frame| match frame {
        Ok(Message::Close(_)) | Err(_) => PeerFrame::Close,
        Ok(_) => PeerFrame::Message,
    });

    let reason = connection.run(sink, peer).await;
    tracing::debug!(host = %host, reason = ?reason, "WebSocket connection closed");
}
