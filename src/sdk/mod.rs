//! Channel clients built on one generic event-stream connection.
//!
//! [`WebSocketClient`] owns the socket, the handler table and the waiter.
//! [`SpeechClient`], [`TranscriptionsClient`] and [`ChatClient`] add typed
//! senders, waits and handler traits for their channel. Use
//! [`CozeWebSockets`] to create them from a shared configuration.

mod auth;
mod builder;
mod chat;
mod client;
mod dispatch;
mod handlers;
mod speech;
mod transcriptions;
mod waiter;
mod websockets;

pub use auth::{Auth, TokenAuth};
pub use builder::{
    ClientOptions, DEFAULT_CLOSE_TIMEOUT, DEFAULT_ERROR_QUEUE_CAPACITY, DEFAULT_HANDSHAKE_TIMEOUT,
    DEFAULT_RECEIVE_QUEUE_CAPACITY, DEFAULT_SEND_QUEUE_CAPACITY, WebSocketClientBuilder,
};
pub use chat::{CHAT_PATH, ChatClient, ChatEventHandler, CreateChatRequest};
pub use client::{ConnectionState, WebSocketClient};
pub use handlers::{BoxFuture, EventHandler};
pub use speech::{SPEECH_PATH, SpeechClient, SpeechEventHandler};
pub use transcriptions::{
    CreateTranscriptionsRequest, TRANSCRIPTIONS_PATH, TranscriptionsClient,
    TranscriptionsEventHandler,
};
pub use waiter::{EventWaiter, WaitMode};
pub use websockets::{BASE_URL_ENV, CozeWebSockets, TOKEN_ENV};
