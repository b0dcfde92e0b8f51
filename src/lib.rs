#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

//! Async client for the Coze real-time event-stream API.
//!
//! Three channels share one connection model: [`SpeechClient`] (text to
//! speech), [`TranscriptionsClient`] (speech to text) and [`ChatClient`]
//! (voice or text conversation with a bot). Each sends typed events, routes
//! received events to handlers, and lets callers wait for specific events.

pub mod error;
pub mod protocol;
pub mod sdk;
pub mod transport;

pub use error::{Error, Result};
pub use protocol::models;
pub use protocol::{Codec, Event, EventRegistry, EventType, Payload};
pub use sdk::{
    Auth, ChatClient, ChatEventHandler, ClientOptions, ConnectionState, CozeWebSockets,
    CreateChatRequest, CreateTranscriptionsRequest, EventWaiter, SpeechClient,
    SpeechEventHandler, TokenAuth, TranscriptionsClient, TranscriptionsEventHandler, WaitMode,
    WebSocketClient, WebSocketClientBuilder,
};
pub use transport::{Connector, MemoryConnector, MemoryPeer, WsConnector};

/// API base URL for coze.com.
pub const COM_BASE_URL: &str = "https://api.coze.com";
/// API base URL for coze.cn.
pub const CN_BASE_URL: &str = "https://api.coze.cn";

pub(crate) const TRACE_LOG_MAX_BYTES: usize = 1024;
const TRACE_TRUNCATE_SUFFIX: &str = "... (truncated)";

pub(crate) fn safe_truncate(s: &str, max_bytes: usize) -> std::borrow::Cow<'_, str> {
    if s.len() <= max_bytes {
        return std::borrow::Cow::Borrowed(s);
    }

    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    std::borrow::Cow::Owned(format!(
        "{} {} {} bytes",
        &s[..end],
        TRACE_TRUNCATE_SUFFIX,
        s.len() - end
    ))
}
