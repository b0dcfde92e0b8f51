use super::auth::Auth;
use super::builder::{ClientOptions, ClientParts, Endpoint, WebSocketClientBuilder};
use super::dispatch::{Pumps, QueueSizes, Shared};
use super::handlers::boxed;
use super::waiter::WaitMode;
use crate::protocol::codec::describe;
use crate::protocol::{Codec, Event, EventType, validate_client_event};
use crate::transport::{ConnectRequest, Connector, Socket, build_url, handshake_headers};
use crate::{Error, Result, TRACE_LOG_MAX_BYTES, safe_truncate};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Lifecycle of a connection. A client is single-use: once `Closed` it stays closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

struct Link {
    state: ConnectionState,
    outbound: Option<mpsc::Sender<String>>,
}

struct Inner {
    endpoint: Endpoint,
    auth: Arc<dyn Auth>,
    connector: Arc<dyn Connector>,
    options: ClientOptions,
    link: RwLock<Link>,
    shared: Arc<Shared>,
    pumps: Mutex<Option<Pumps>>,
    done: watch::Sender<bool>,
}

/// A persistent event-stream connection to one channel.
///
/// Cloning is cheap and every clone drives the same connection.
#[derive(Clone)]
pub struct WebSocketClient {
    inner: Arc<Inner>,
}

/// Puts the state back to `Disconnected` if a connect attempt fails or is dropped.
struct ConnectAttempt<'a> {
    link: &'a RwLock<Link>,
    armed: bool,
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut link = self.link.write().unwrap_or_else(PoisonError::into_inner);
            link.state = ConnectionState::Disconnected;
        }
    }
}

impl WebSocketClient {
    pub fn builder(base_url: impl Into<String>, path: impl Into<String>) -> WebSocketClientBuilder {
        WebSocketClientBuilder::new(base_url, path)
    }

    pub(crate) fn from_parts(parts: ClientParts) -> Self {
        Self {
            inner: Arc::new(Inner {
                endpoint: parts.endpoint,
                auth: parts.auth,
                connector: parts.connector,
                options: parts.options,
                link: RwLock::new(Link {
                    state: ConnectionState::Disconnected,
                    outbound: None,
                }),
                shared: Arc::new(Shared::new(Codec::new(parts.registry))),
                pumps: Mutex::new(None),
                done: watch::channel(false).0,
            }),
        }
    }

    fn link(&self) -> std::sync::RwLockReadGuard<'_, Link> {
        self.inner.link.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn link_mut(&self) -> std::sync::RwLockWriteGuard<'_, Link> {
        self.inner.link.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open the socket and start dispatching.
    ///
    /// # Errors
    /// Returns [`Error::AlreadyConnected`] while connecting or connected,
    /// [`Error::ConnectionClosed`] once closed, or the URL, auth, or handshake
    /// failure. A failed attempt leaves the client `Disconnected`.
    pub async fn connect(&self) -> Result<()> {
        {
            let mut link = self.link_mut();
            match link.state {
                ConnectionState::Connecting | ConnectionState::Connected => {
                    return Err(Error::AlreadyConnected);
                }
                ConnectionState::Closed => return Err(Error::ConnectionClosed),
                ConnectionState::Disconnected => link.state = ConnectionState::Connecting,
            }
        }
        let mut attempt = ConnectAttempt {
            link: &self.inner.link,
            armed: true,
        };

        let socket = self.open().await?;

        let options = &self.inner.options;
        let (pumps, outbound) = Pumps::spawn(
            socket,
            &self.inner.shared,
            QueueSizes {
                send: options.send_queue_capacity,
                receive: options.receive_queue_capacity,
                errors: options.error_queue_capacity,
            },
        );
        *self.inner.pumps.lock().unwrap_or_else(PoisonError::into_inner) = Some(pumps);
        {
            let mut link = self.link_mut();
            link.state = ConnectionState::Connected;
            link.outbound = Some(outbound);
        }
        attempt.armed = false;

        tracing::info!("Connected to {}", self.inner.endpoint.path);
        Ok(())
    }

    async fn open(&self) -> Result<Socket> {
        let endpoint = &self.inner.endpoint;
        let url = build_url(&endpoint.base_url, &endpoint.path, &endpoint.query)?;
        tracing::debug!("Connecting to {url}");

        let token = self.inner.auth.token().await?;
        let timeout = self.inner.options.handshake_timeout;
        let request = ConnectRequest {
            url,
            headers: handshake_headers(&token)?,
            handshake_timeout: timeout,
        };

        tokio::time::timeout(timeout, self.inner.connector.connect(request))
            .await
            .map_err(|_| Error::HandshakeTimeout(timeout))?
    }

    /// Close the connection.
    ///
    /// Stops reading, waits for events already read to finish their handlers,
    /// then writes any queued frames and closes the socket. Pending waits are
    /// released with [`Error::ConnectionClosed`]. Does nothing unless connected.
    ///
    /// Writing the queued frames is bounded by
    /// [`ClientOptions::close_timeout`]; a socket still busy after that is
    /// dropped without a close frame.
    ///
    /// When called from inside one of this client's handlers the drain step is
    /// skipped, since the calling handler is itself in flight.
    ///
    /// # Errors
    /// Returns the error from closing the socket, if any.
    pub async fn close(&self) -> Result<()> {
        let taken = self
            .inner
            .pumps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut pumps) = taken else {
            return Ok(());
        };

        let shared = &self.inner.shared;
        let in_delivery = shared.in_delivery();
        pumps.stop_reading().await;
        if !in_delivery {
            tracing::debug!("Draining {} in-flight events", shared.in_flight.count());
            shared.in_flight.drained().await;
        }

        {
            let mut link = self.link_mut();
            link.state = ConnectionState::Closed;
            link.outbound = None;
        }
        let result = pumps
            .shutdown(!in_delivery, self.inner.options.close_timeout)
            .await;
        shared.waiter.shutdown();
        self.inner.done.send_replace(true);

        tracing::info!("Connection to {} closed", self.inner.endpoint.path);
        result
    }

    /// Resolves once [`close`](Self::close) has finished.
    pub async fn closed(&self) {
        let mut done = self.inner.done.subscribe();
        let _ = done.wait_for(|closed| *closed).await;
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.link().state == ConnectionState::Connected
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.link().state
    }

    /// Register the handler for `event_type`, replacing any previous one.
    ///
    /// Handlers run one at a time, in the order events arrived. An error or
    /// panic is reported as a `client_error` event and does not affect the
    /// connection.
    pub fn on_event<F, Fut>(&self, event_type: EventType, handler: F)
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.inner.shared.handlers.insert(event_type, boxed(handler));
    }

    /// Returns `true` if a handler was registered.
    pub fn remove_handler(&self, event_type: &EventType) -> bool {
        self.inner.shared.handlers.remove(event_type)
    }

    #[must_use]
    pub fn has_handler(&self, event_type: &EventType) -> bool {
        self.inner.shared.handlers.contains(event_type)
    }

    /// Queue an event for sending. Never waits.
    ///
    /// # Errors
    /// Returns [`Error::NotConnected`] unless connected, [`Error::InvalidClientEvent`]
    /// if the event fails validation, or [`Error::QueueFull`] if the send queue
    /// is at capacity.
    #[allow(clippy::result_large_err)]
    pub fn send_event(&self, event: &Event) -> Result<()> {
        let link = self.link();
        let outbound = match (&link.state, &link.outbound) {
            (ConnectionState::Connected, Some(outbound)) => outbound,
            _ => return Err(Error::NotConnected),
        };

        validate_client_event(event)?;
        let frame = self.inner.shared.codec.encode(event)?;
        tracing::debug!(
            "Sending event: {}",
            safe_truncate(&describe(event), TRACE_LOG_MAX_BYTES)
        );

        outbound.try_send(frame).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => Error::QueueFull,
            mpsc::error::TrySendError::Closed(_) => Error::ConnectionClosed,
        })
    }

    /// Wait until the listed event types have been received.
    ///
    /// Events received earlier on this connection count, so the wait may
    /// resolve immediately. Each distinct event type waited on or received
    /// keeps a latch until the client is dropped.
    ///
    /// # Errors
    /// Returns [`Error::WaitTimeout`] after `timeout`, or
    /// [`Error::ConnectionClosed`] if the connection ended first.
    pub async fn wait_for_event(
        &self,
        event_types: &[EventType],
        mode: WaitMode,
        timeout: Duration,
    ) -> Result<Event> {
        self.inner
            .shared
            .waiter
            .wait_timeout(event_types.iter().map(EventType::as_str), mode, timeout)
            .await
    }

    /// Like [`wait_for_event`](Self::wait_for_event), abandoned when `cancel` completes.
    ///
    /// # Errors
    /// Returns [`Error::Cancelled`] if `cancel` finished first, or
    /// [`Error::ConnectionClosed`] if the connection ended first.
    pub async fn wait_for_event_until<C>(
        &self,
        event_types: &[EventType],
        mode: WaitMode,
        cancel: C,
    ) -> Result<Event>
    where
        C: Future<Output = ()>,
    {
        self.inner
            .shared
            .waiter
            .wait_until(event_types.iter().map(EventType::as_str), mode, cancel)
            .await
    }
}

impl std::fmt::Debug for WebSocketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketClient")
            .field("endpoint", &self.inner.endpoint)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
