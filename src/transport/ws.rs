use super::{BoxFuture, ConnectRequest, Connector, Socket};
use crate::{Error, Result};
use futures::{SinkExt, StreamExt, future};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::Message;

/// Connector backed by `tokio-tungstenite` (TLS through rustls with native roots).
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn connect(&self, request: ConnectRequest) -> BoxFuture<'_, Result<Socket>> {
        Box::pin(async move {
            let mut req = request.url.as_str().into_client_request()?;
            req.headers_mut().extend(request.headers);

            let (ws_stream, response) = connect_async(req).await?;
            tracing::debug!("Handshake with {} returned {}", request.url.path(), response.status());

            let (write, read) = ws_stream.split();
            let sink = write
                .sink_map_err(Error::from)
                .with(|text: String| future::ready(Ok::<_, Error>(Message::Text(text.into()))));
            let stream = read.filter_map(|msg| future::ready(frame_bytes(msg)));

            Ok(Socket {
                sink: Box::pin(sink),
                stream: Box::pin(stream),
            })
        })
    }
}

fn frame_bytes(msg: std::result::Result<Message, tungstenite::Error>) -> Option<Result<Vec<u8>>> {
    match msg {
        Ok(Message::Text(text)) => Some(Ok(text.as_bytes().to_vec())),
        Ok(Message::Binary(bytes)) => Some(Ok(bytes.to_vec())),
        Ok(Message::Close(frame)) => {
            tracing::info!("WebSocket connection closed by server: {frame:?}");
            Some(Err(Error::ConnectionClosed))
        }
        Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => None,
        Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
            Some(Err(Error::ConnectionClosed))
        }
        Err(err) => Some(Err(Error::from(err))),
    }
}
