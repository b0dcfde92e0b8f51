use super::auth::{Auth, TokenAuth};
use super::client::WebSocketClient;
use crate::protocol::EventRegistry;
use crate::transport::{Connector, WsConnector};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SEND_QUEUE_CAPACITY: usize = 1000;
pub const DEFAULT_RECEIVE_QUEUE_CAPACITY: usize = 1000;
pub const DEFAULT_ERROR_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(3);

/// Tunables for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Frames that may wait to be written before `send_event` fails with `QueueFull`.
    pub send_queue_capacity: usize,
    /// Decoded events that may wait for delivery before reading pauses.
    pub receive_queue_capacity: usize,
    /// Pending `client_error` reports; extra reports are logged and dropped.
    pub error_queue_capacity: usize,
    pub handshake_timeout: Duration,
    /// How long `close` waits for queued frames to be written before the
    /// socket is dropped unflushed.
    pub close_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            send_queue_capacity: DEFAULT_SEND_QUEUE_CAPACITY,
            receive_queue_capacity: DEFAULT_RECEIVE_QUEUE_CAPACITY,
            error_queue_capacity: DEFAULT_ERROR_QUEUE_CAPACITY,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }
}

impl ClientOptions {
    #[must_use]
    pub const fn send_queue_capacity(mut self, capacity: usize) -> Self {
        self.send_queue_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn receive_queue_capacity(mut self, capacity: usize) -> Self {
        self.receive_queue_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn error_queue_capacity(mut self, capacity: usize) -> Self {
        self.error_queue_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }
}

/// Where a client connects: API base URL, channel path and query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Endpoint {
    pub(crate) base_url: String,
    pub(crate) path: String,
    pub(crate) query: BTreeMap<String, String>,
}

/// Parts needed to assemble a [`WebSocketClient`].
pub(crate) struct ClientParts {
    pub(crate) endpoint: Endpoint,
    pub(crate) auth: Arc<dyn Auth>,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) registry: Arc<EventRegistry>,
    pub(crate) options: ClientOptions,
}

#[must_use]
pub struct WebSocketClientBuilder {
    endpoint: Endpoint,
    auth: Option<Arc<dyn Auth>>,
    connector: Option<Arc<dyn Connector>>,
    registry: Option<Arc<EventRegistry>>,
    options: ClientOptions,
}

impl WebSocketClientBuilder {
    pub fn new(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint {
                base_url: base_url.into(),
                path: path.into(),
                query: BTreeMap::new(),
            },
            auth: None,
            connector: None,
            registry: None,
            options: ClientOptions::default(),
        }
    }

    pub fn auth(mut self, auth: impl Auth + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    pub fn shared_auth(mut self, auth: Arc<dyn Auth>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Shorthand for [`TokenAuth`].
    pub fn token(self, token: impl Into<String>) -> Self {
        self.auth(TokenAuth::new(token))
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.endpoint.query.insert(key.into(), value.into());
        self
    }

    pub fn query_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Replace the default [`WsConnector`].
    pub fn connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    pub fn shared_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Replace [`EventRegistry::standard`].
    pub fn registry(mut self, registry: Arc<EventRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub const fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub const fn send_queue_capacity(mut self, capacity: usize) -> Self {
        self.options.send_queue_capacity = capacity;
        self
    }

    pub const fn receive_queue_capacity(mut self, capacity: usize) -> Self {
        self.options.receive_queue_capacity = capacity;
        self
    }

    pub const fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.options.handshake_timeout = timeout;
        self
    }

    pub const fn close_timeout(mut self, timeout: Duration) -> Self {
        self.options.close_timeout = timeout;
        self
    }

    /// # Errors
    /// Returns [`Error::Auth`] if no auth provider was configured.
    #[allow(clippy::result_large_err)]
    pub fn build(self) -> Result<WebSocketClient> {
        let auth = self
            .auth
            .ok_or_else(|| Error::Auth("an auth provider is required".to_string()))?;
        Ok(WebSocketClient::from_parts(ClientParts {
            endpoint: self.endpoint,
            auth,
            connector: self
                .connector
                .unwrap_or_else(|| Arc::new(WsConnector) as Arc<dyn Connector>),
            registry: self
                .registry
                .unwrap_or_else(|| Arc::new(EventRegistry::standard())),
            options: self.options,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_limits() {
        let options = ClientOptions::default();
        assert_eq!(options.send_queue_capacity, 1000);
        assert_eq!(options.receive_queue_capacity, 1000);
        assert_eq!(options.handshake_timeout, Duration::from_secs(3));
    }

    #[test]
    fn build_requires_auth() {
        let err = WebSocketClientBuilder::new("https://api.coze.cn", "/v1/chat")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn optional_query_params_are_skipped() {
        let builder = WebSocketClientBuilder::new("https://api.coze.cn", "/v1/chat")
            .query("bot_id", "b1")
            .query_opt("workflow_id", None::<String>)
            .query_opt("device_id", Some("d1"));
        assert_eq!(builder.endpoint.query.len(), 2);
        assert_eq!(builder.endpoint.query["device_id"], "d1");
    }
}
