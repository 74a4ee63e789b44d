use chesslab_api::LiveMessage;
use futures::StreamExt as _;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

#[derive(Debug, thiserror::Error)]
pub enum LiveChannelError {
    #[error("failed to connect live channel {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },

    #[error("live channel protocol error: {0}")]
    Protocol(#[from] Box<tokio_tungstenite::tungstenite::Error>),
}

/// One websocket connection to the remote source's push endpoint.
pub struct LiveChannel {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl LiveChannel {
    pub async fn connect(url: &str) -> Result<Self, LiveChannelError> {
        let (socket, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|err| LiveChannelError::Connect {
                url: url.to_owned(),
                source: Box::new(err),
            })?;
        Ok(Self { socket })
    }

    /// Next decoded message, or `None` once the peer closed the connection.
    /// Frames that are not valid JSON messages are skipped.
    pub async fn next_message(&mut self) -> Option<Result<LiveMessage, LiveChannelError>> {
        loop {
            let frame = match self.socket.next().await? {
                Ok(frame) => frame,
                Err(err) => return Some(Err(LiveChannelError::Protocol(Box::new(err)))),
            };
            let text = match frame {
                Message::Text(text) => text,
                Message::Close(_) => return None,
                _ => continue,
            };
            match serde_json::from_str::<LiveMessage>(&text) {
                Ok(message) => return Some(Ok(message)),
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring malformed live message");
                }
            }
        }
    }
}
