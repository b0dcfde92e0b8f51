//! In-process loopback socket.
//!
//! [`MemoryConnector`] is handed to a client in place of [`super::WsConnector`];
//! the matching [`MemoryPeer`] plays the server: it reads what the client
//! wrote, injects inbound frames, and can close or break the connection.

use super::{BoxFuture, ConnectRequest, Connector, Socket};
use crate::protocol::{Codec, Event};
use crate::{Error, Result};
use futures::channel::mpsc;
use futures::{Sink, SinkExt, StreamExt};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

type Inbound = Result<Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Open,
    Stalled,
    Refuse,
}

pub struct MemoryConnector {
    inbound: Mutex<Option<mpsc::UnboundedReceiver<Inbound>>>,
    outbound: mpsc::UnboundedSender<String>,
    requests: Arc<Mutex<Vec<ConnectRequest>>>,
    mode: Mode,
    handshake_delay: Option<Duration>,
}

pub struct MemoryPeer {
    inbound: mpsc::UnboundedSender<Inbound>,
    outbound: mpsc::UnboundedReceiver<String>,
    requests: Arc<Mutex<Vec<ConnectRequest>>>,
    codec: Codec,
}

impl MemoryConnector {
    /// A connected connector/peer pair.
    #[must_use]
    pub fn pair() -> (Self, MemoryPeer) {
        let (in_tx, in_rx) = mpsc::unbounded();
        let (out_tx, out_rx) = mpsc::unbounded();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let connector = Self {
            inbound: Mutex::new(Some(in_rx)),
            outbound: out_tx,
            requests: Arc::clone(&requests),
            mode: Mode::Open,
            handshake_delay: None,
        };
        let peer = MemoryPeer {
            inbound: in_tx,
            outbound: out_rx,
            requests,
            codec: Codec::default(),
        };
        (connector, peer)
    }

    /// Writes never complete, so frames pile up in the client's send queue.
    #[must_use]
    pub const fn stalled(mut self) -> Self {
        self.mode = Mode::Stalled;
        self
    }

    /// Every handshake fails.
    #[must_use]
    pub const fn refusing(mut self) -> Self {
        self.mode = Mode::Refuse;
        self
    }

    /// Delay the handshake, to exercise handshake timeouts.
    #[must_use]
    pub const fn handshake_delay(mut self, delay: Duration) -> Self {
        self.handshake_delay = Some(delay);
        self
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, request: ConnectRequest) -> BoxFuture<'_, Result<Socket>> {
        Box::pin(async move {
            if let Some(delay) = self.handshake_delay {
                tokio::time::sleep(delay).await;
            }
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(request);

            if self.mode == Mode::Refuse {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "memory peer refused the handshake",
                )));
            }

            let inbound = self
                .inbound
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
                .ok_or(Error::ConnectionClosed)?;

            let sink: super::FrameSink = if self.mode == Mode::Stalled {
                Box::pin(StalledSink)
            } else {
                Box::pin(
                    self.outbound
                        .clone()
                        .sink_map_err(|_| Error::ConnectionClosed),
                )
            };

            Ok(Socket {
                sink,
                stream: Box::pin(inbound),
            })
        })
    }
}

impl MemoryPeer {
    /// Deliver a raw frame to the client.
    pub fn push(&self, frame: impl Into<String>) {
        let _ = self.inbound.unbounded_send(Ok(frame.into().into_bytes()));
    }

    /// Encode and deliver an event to the client.
    ///
    /// # Errors
    /// Returns an error if the event cannot be encoded.
    #[allow(clippy::result_large_err)]
    pub fn push_event(&self, event: &Event) -> Result<()> {
        let frame = self.codec.encode(event)?;
        self.push(frame);
        Ok(())
    }

    /// Next frame written by the client, or `None` once the connector is dropped.
    pub async fn next_sent(&mut self) -> Option<String> {
        self.outbound.next().await
    }

    /// Next frame written by the client, decoded.
    ///
    /// # Errors
    /// Returns an error if the socket is gone or the frame does not decode.
    pub async fn next_sent_event(&mut self) -> Result<Event> {
        let frame = self.next_sent().await.ok_or(Error::ConnectionClosed)?;
        self.codec.decode(frame.as_bytes())
    }

    /// Frames written so far that have not been read yet.
    pub fn drain_sent(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(Some(frame)) = self.outbound.try_next() {
            frames.push(frame);
        }
        frames
    }

    /// Close the connection from the server side.
    pub fn close(&self) {
        let _ = self.inbound.unbounded_send(Err(Error::ConnectionClosed));
        self.inbound.close_channel();
    }

    /// Break the connection with a read error.
    pub fn fail(&self, reason: &str) {
        let _ = self
            .inbound
            .unbounded_send(Err(Error::Io(std::io::Error::other(reason.to_string()))));
    }

    /// The most recent handshake request seen by the connector.
    #[must_use]
    pub fn last_request(&self) -> Option<ConnectRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

struct StalledSink;

impl Sink<String> for StalledSink {
    type Error = Error;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Pending
    }

    fn start_send(self: Pin<&mut Self>, _item: String) -> Result<()> {
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }
}
