//! The three pumps that move frames between a socket and the handlers.
//!
//! ```text
//!  send_event ──► outbound queue ──► send pump ──► socket
//!  socket ──► receive pump ──► inbound queue ──► delivery pump ──► handler
//!                  │                                  ▲
//!                  └── waiter.trigger     error queue ┘ (client_error)
//! ```

use super::handlers::HandlerMap;
use super::waiter::EventWaiter;
use crate::protocol::codec::describe;
use crate::protocol::{Codec, Event, EventType, Payload};
use crate::transport::{FrameSink, FrameStream, Socket};
use crate::{Error, Result, TRACE_LOG_MAX_BYTES, safe_truncate};
use futures::{FutureExt, SinkExt, StreamExt};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite;

tokio::task_local! {
    /// Id of the connection whose delivery pump is running the current handler.
    static DELIVERING: u64;
}

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Counts events that were read but not yet fully handled.
#[derive(Debug)]
pub(crate) struct InFlight(watch::Sender<usize>);

impl Default for InFlight {
    fn default() -> Self {
        Self(watch::channel(0).0)
    }
}

impl InFlight {
    fn begin(&self) {
        self.0.send_modify(|n| *n += 1);
    }

    fn end(&self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }

    pub(crate) fn count(&self) -> usize {
        *self.0.borrow()
    }

    pub(crate) async fn drained(&self) {
        let mut rx = self.0.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

/// State shared between a client and its pumps.
pub(crate) struct Shared {
    pub(crate) id: u64,
    pub(crate) codec: Codec,
    pub(crate) handlers: HandlerMap,
    pub(crate) waiter: EventWaiter<Event>,
    pub(crate) in_flight: InFlight,
}

impl Shared {
    pub(crate) fn new(codec: Codec) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            codec,
            handlers: HandlerMap::default(),
            waiter: EventWaiter::new(),
            in_flight: InFlight::default(),
        }
    }

    /// Whether the caller is a handler running on this connection's delivery pump.
    pub(crate) fn in_delivery(&self) -> bool {
        DELIVERING.try_with(|id| *id == self.id).unwrap_or(false)
    }
}

/// Sends local faults to the delivery pump as `client_error` events.
#[derive(Clone)]
pub(crate) struct ErrorReporter(mpsc::Sender<Event>);

impl ErrorReporter {
    pub(crate) fn report(&self, message: String) {
        tracing::warn!("{message}");
        if let Err(mpsc::error::TrySendError::Full(_)) =
            self.0.try_send(Event::client_error(message))
        {
            tracing::warn!("Client error queue full, dropping report");
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct QueueSizes {
    pub(crate) send: usize,
    pub(crate) receive: usize,
    pub(crate) errors: usize,
}

/// Handles to a running connection's pumps.
pub(crate) struct Pumps {
    stop_reading: watch::Sender<bool>,
    shutdown: watch::Sender<bool>,
    send: JoinHandle<Result<()>>,
    receive: JoinHandle<()>,
    deliver: JoinHandle<()>,
}

impl Pumps {
    /// Start the pumps. Returns the handles and the outbound queue sender.
    pub(crate) fn spawn(
        socket: Socket,
        shared: &Arc<Shared>,
        sizes: QueueSizes,
    ) -> (Self, mpsc::Sender<String>) {
        let (outbound_tx, outbound_rx) = mpsc::channel(sizes.send.max(1));
        let (inbound_tx, inbound_rx) = mpsc::channel(sizes.receive.max(1));
        let (errors_tx, errors_rx) = mpsc::channel(sizes.errors.max(1));
        let (stop_reading, stop_reading_rx) = watch::channel(false);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let errors = ErrorReporter(errors_tx);

        let send = tokio::spawn(send_pump(
            socket.sink,
            outbound_rx,
            shutdown_rx.clone(),
            errors.clone(),
        ));
        let receive = tokio::spawn(receive_pump(
            socket.stream,
            inbound_tx,
            Arc::clone(shared),
            errors.clone(),
            stop_reading_rx,
        ));
        let deliver = tokio::spawn(delivery_pump(
            inbound_rx,
            errors_rx,
            Arc::clone(shared),
            errors,
            shutdown_rx,
        ));

        let pumps = Self {
            stop_reading,
            shutdown,
            send,
            receive,
            deliver,
        };
        (pumps, outbound_tx)
    }

    /// Stop reading from the socket and wait until the receive pump has exited.
    pub(crate) async fn stop_reading(&mut self) {
        self.stop_reading.send_replace(true);
        if let Err(err) = (&mut self.receive).await {
            tracing::warn!("Receive pump ended abnormally: {err}");
        }
    }

    /// Stop the send and delivery pumps. The send pump writes what is already
    /// queued, then closes the socket; its close result is returned. A send
    /// pump that has not finished within `flush_timeout` is aborted, which
    /// drops the socket.
    pub(crate) async fn shutdown(
        self,
        join_delivery: bool,
        flush_timeout: Duration,
    ) -> Result<()> {
        self.shutdown.send_replace(true);
        let mut send = self.send;
        let result = match tokio::time::timeout(flush_timeout, &mut send).await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                tracing::warn!("Send pump ended abnormally: {err}");
                Ok(())
            }
            Err(_) => {
                tracing::warn!(
                    "Socket writes did not finish within {flush_timeout:?}, dropping socket"
                );
                send.abort();
                Ok(())
            }
        };
        // A handler closing its own connection is running on the delivery pump.
        if join_delivery {
            if let Err(err) = self.deliver.await {
                tracing::warn!("Delivery pump ended abnormally: {err}");
            }
        }
        result
    }
}

async fn stopped(signal: &mut watch::Receiver<bool>) {
    // A dropped sender means the owning client is gone.
    let _ = signal.wait_for(|stop| *stop).await;
}

async fn write_frame(sink: &mut FrameSink, frame: String, errors: &ErrorReporter) {
    tracing::trace!("Sending frame: {}", safe_truncate(&frame, TRACE_LOG_MAX_BYTES));
    if let Err(err) = sink.send(frame).await {
        errors.report(format!("failed to write frame: {err}"));
    }
}

async fn send_pump(
    mut sink: FrameSink,
    mut outbound: mpsc::Receiver<String>,
    mut shutdown: watch::Receiver<bool>,
    errors: ErrorReporter,
) -> Result<()> {
    loop {
        tokio::select! {
            biased;
            () = stopped(&mut shutdown) => break,
            frame = outbound.recv() => match frame {
                Some(frame) => write_frame(&mut sink, frame, &errors).await,
                None => break,
            },
        }
    }

    outbound.close();
    while let Ok(frame) = outbound.try_recv() {
        write_frame(&mut sink, frame, &errors).await;
    }
    tracing::debug!("Send pump stopped, closing socket");
    match sink.close().await {
        Err(err) if !is_closed(&err) => Err(err),
        _ => Ok(()),
    }
}

fn is_closed(err: &Error) -> bool {
    matches!(
        err,
        Error::ConnectionClosed
            | Error::WebSocket(
                tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed
            )
    )
}

async fn receive_pump(
    mut stream: FrameStream,
    inbound: mpsc::Sender<Event>,
    shared: Arc<Shared>,
    errors: ErrorReporter,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let next = tokio::select! {
            biased;
            () = stopped(&mut stop) => break,
            next = stream.next() => next,
        };

        let event = match next {
            Some(Ok(raw)) => match shared.codec.decode(&raw) {
                Ok(event) => event,
                Err(err) => {
                    errors.report(format!("failed to decode frame: {err}"));
                    continue;
                }
            },
            Some(Err(err)) if is_closed(&err) => {
                remote_closed(&inbound, &shared, &mut stop).await;
                break;
            }
            None => {
                remote_closed(&inbound, &shared, &mut stop).await;
                break;
            }
            Some(Err(err)) => {
                errors.report(format!("failed to read frame: {err}"));
                shared.waiter.shutdown();
                break;
            }
        };

        tracing::debug!(
            "Received event: {}",
            safe_truncate(&describe(&event), TRACE_LOG_MAX_BYTES)
        );
        shared.waiter.trigger(event.event_type().as_str(), event.clone());
        if !enqueue(&inbound, &shared, &mut stop, event).await {
            break;
        }
    }
    tracing::debug!("Receive pump stopped");
}

async fn remote_closed(
    inbound: &mpsc::Sender<Event>,
    shared: &Shared,
    stop: &mut watch::Receiver<bool>,
) {
    tracing::info!("Connection closed by server");
    let closed = Event::new(Payload::Closed);
    shared.waiter.trigger(EventType::Closed.as_str(), closed.clone());
    shared.waiter.shutdown();
    enqueue(inbound, shared, stop, closed).await;
}

/// Queue an event for delivery, counting it as in flight. Gives up when told
/// to stop reading so a full queue cannot hold up `close`.
async fn enqueue(
    inbound: &mpsc::Sender<Event>,
    shared: &Shared,
    stop: &mut watch::Receiver<bool>,
    event: Event,
) -> bool {
    shared.in_flight.begin();
    let queued = tokio::select! {
        biased;
        sent = inbound.send(event) => sent.is_ok(),
        () = stopped(stop) => false,
    };
    if !queued {
        shared.in_flight.end();
    }
    queued
}

async fn delivery_pump(
    mut inbound: mpsc::Receiver<Event>,
    mut client_errors: mpsc::Receiver<Event>,
    shared: Arc<Shared>,
    errors: ErrorReporter,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut reading = true;
    loop {
        tokio::select! {
            biased;
            () = stopped(&mut shutdown) => break,
            Some(event) = client_errors.recv() => deliver(&shared, &errors, event).await,
            event = inbound.recv(), if reading => match event {
                Some(event) => {
                    deliver(&shared, &errors, event).await;
                    shared.in_flight.end();
                }
                None => reading = false,
            },
        }
    }
    tracing::debug!("Delivery pump stopped");
}

async fn deliver(shared: &Shared, errors: &ErrorReporter, event: Event) {
    let event_type = event.event_type();
    let Some(handler) = shared.handlers.get(&event_type) else {
        tracing::trace!("No handler registered for {event_type}");
        return;
    };

    let outcome = DELIVERING
        .scope(shared.id, AssertUnwindSafe(handler(event)).catch_unwind())
        .await;
    let failure = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(err)) => format!("handler for {event_type} failed: {err}"),
        Err(_) => format!("handler for {event_type} panicked"),
    };

    if event_type == EventType::ClientError {
        // Reporting again would loop through the same handler.
        tracing::warn!("{failure}");
    } else {
        errors.report(failure);
    }
}
