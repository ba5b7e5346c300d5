//! Event stream transport: URL derivation and the WebSocket connector.

use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use shared::protocol::EVENT_STREAM_PATH;
use tokio::sync::oneshot;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;
use url::Url;

use crate::error::ClientError;

/// Text frames of one open connection; the stream ends when the peer closes.
pub type FrameStream = BoxStream<'static, Result<String, ClientError>>;

/// Resolves when the owner wants the connection closed, either by sending or
/// by dropping the paired sender. The frame stream ends after a close handshake.
pub type CloseSignal = oneshot::Receiver<()>;

#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self, url: &Url, close: CloseSignal) -> Result<FrameStream, ClientError>;
}

/// Event stream URL for a server base URL: `https` maps to `wss`, `http` to `ws`.
pub fn event_stream_url(server_url: &Url) -> Result<Url, ClientError> {
    let scheme = match server_url.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => return Err(ClientError::UnsupportedScheme(other.to_string())),
    };
    let mut url = server_url.join(EVENT_STREAM_PATH)?;
    url.set_scheme(scheme)
        .map_err(|()| ClientError::UnsupportedScheme(server_url.scheme().to_string()))?;
    Ok(url)
}

pub struct WsConnector;

#[async_trait]
impl StreamConnector for WsConnector {
    async fn connect(&self, url: &Url, close: CloseSignal) -> Result<FrameStream, ClientError> {
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|err| ClientError::Transport(format!("failed to connect websocket {url}: {err}")))?;

        let frames = futures::stream::unfold((ws_stream, close), |(mut ws, mut close)| async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut close => {
                        if let Err(err) = ws.close(None).await {
                            debug!(error = %err, "event stream: close handshake failed");
                        }
                        return None;
                    }
                    msg = ws.next() => match msg {
                        None | Some(Ok(Message::Close(_))) => return None,
                        Some(Ok(Message::Text(text))) => return Some((Ok(text), (ws, close))),
                        Some(Ok(_)) => continue,
                        Some(Err(err)) => {
                            return Some((
                                Err(ClientError::Transport(err.to_string())),
                                (ws, close),
                            ));
                        }
                    },
                }
            }
        });
        Ok(frames.boxed())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
