use crate::protocol::EventType;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Failed to parse or serialize JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Header error: {0}")]
    Header(#[from] tokio_tungstenite::tungstenite::http::header::InvalidHeaderValue),

    #[error("Invalid base64 audio: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unsupported endpoint: {0}")]
    InvalidUrl(String),

    #[error("The client is already connected")]
    AlreadyConnected,

    #[error("The client is not connected")]
    NotConnected,

    #[error("The connection was closed")]
    ConnectionClosed,

    #[error("Send queue is full")]
    QueueFull,

    #[error("WebSocket handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    #[error("Timed out after {0:?} waiting for events")]
    WaitTimeout(Duration),

    #[error("Wait was cancelled")]
    Cancelled,

    #[error("Invalid wait: {0}")]
    InvalidWait(&'static str),

    #[error("Invalid client event: {0}")]
    InvalidClientEvent(String),

    #[error("Failed to decode `{event_type}` payload: {source}")]
    Decode {
        event_type: EventType,
        #[source]
        source: serde_json::Error,
    },

    #[error("Handler received an unexpected payload for `{0}`")]
    UnexpectedPayload(EventType),

    #[error("Event handler failed: {0}")]
    Handler(String),
}

impl Error {
    /// Wrap any displayable failure raised from inside an event handler.
    #[must_use]
    pub fn handler(message: impl std::fmt::Display) -> Self {
        Self::Handler(message.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
