pub mod endpoint;
pub mod memory;
pub mod ws;

use crate::{Error, Result};
use futures::{Sink, Stream};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio_tungstenite::tungstenite::http::HeaderMap;
use url::Url;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Write half of an open socket. Each item is one JSON text frame.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = Error> + Send>>;

/// Read half of an open socket. Yields raw frame bytes; a clean close is
/// reported as [`Error::ConnectionClosed`] or end of stream.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

pub struct Socket {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket").finish_non_exhaustive()
    }
}

/// Everything a connector needs to open a socket.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub handshake_timeout: Duration,
}

/// Opens sockets. The client bounds every call by `handshake_timeout`.
pub trait Connector: Send + Sync {
    fn connect(&self, request: ConnectRequest) -> BoxFuture<'_, Result<Socket>>;
}

pub use endpoint::{build_url, handshake_headers};
pub use memory::{MemoryConnector, MemoryPeer};
pub use ws::WsConnector;
