use crate::Result;
use crate::protocol::{Event, EventType};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Callback invoked by the delivery pump for one event type.
pub type EventHandler = Arc<dyn Fn(Event) -> BoxFuture<Result<()>> + Send + Sync>;

pub(crate) fn boxed<F, Fut>(handler: F) -> EventHandler
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |event| Box::pin(handler(event)))
}

/// At most one handler per event type. Registration replaces.
#[derive(Default)]
pub(crate) struct HandlerMap {
    handlers: RwLock<HashMap<EventType, EventHandler>>,
}

impl HandlerMap {
    pub(crate) fn insert(&self, event_type: EventType, handler: EventHandler) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(event_type, handler);
    }

    pub(crate) fn remove(&self, event_type: &EventType) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(event_type)
            .is_some()
    }

    pub(crate) fn get(&self, event_type: &EventType) -> Option<EventHandler> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .cloned()
    }

    pub(crate) fn contains(&self, event_type: &EventType) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(event_type)
    }
}

/// Routes each listed payload variant to a method of a channel handler trait.
///
/// `data` entries call `method(&event, &payload)`, `bare` entries call
/// `method(&event)`. A payload that does not match its tag (possible with a
/// custom registry) is reported as [`crate::Error::UnexpectedPayload`].
macro_rules! bind_handlers {
    (
        $client:expr, $handler:expr,
        data { $($variant:ident => $method:ident,)* }
        bare { $($bare:ident => $bare_method:ident,)* }
    ) => {{
        let client = $client;
        let handler = $handler;
        $({
            let handler = ::std::sync::Arc::clone(&handler);
            client.on_event($crate::protocol::EventType::$variant, move |event: $crate::protocol::Event| {
                let handler = ::std::sync::Arc::clone(&handler);
                async move {
                    match &event.payload {
                        $crate::protocol::Payload::$variant(data) => handler.$method(&event, data).await,
                        _ => Err($crate::Error::UnexpectedPayload(event.event_type())),
                    }
                }
            });
        })*
        $({
            let handler = ::std::sync::Arc::clone(&handler);
            client.on_event($crate::protocol::EventType::$bare, move |event: $crate::protocol::Event| {
                let handler = ::std::sync::Arc::clone(&handler);
                async move {
                    match &event.payload {
                        $crate::protocol::Payload::$bare => handler.$bare_method(&event).await,
                        _ => Err($crate::Error::UnexpectedPayload(event.event_type())),
                    }
                }
            });
        })*
    }};
}

/// Lifecycle and generic event methods shared by every channel facade.
macro_rules! facade_common {
    ($facade:ident) => {
        impl $facade {
            /// The underlying connection.
            #[must_use]
            pub const fn client(&self) -> &$crate::sdk::WebSocketClient {
                &self.ws
            }

            /// # Errors
            /// See [`WebSocketClient::connect`](crate::sdk::WebSocketClient::connect).
            pub async fn connect(&self) -> $crate::Result<()> {
                self.ws.connect().await
            }

            /// # Errors
            /// See [`WebSocketClient::close`](crate::sdk::WebSocketClient::close).
            pub async fn close(&self) -> $crate::Result<()> {
                self.ws.close().await
            }

            /// Resolves once [`close`](Self::close) has finished.
            pub async fn closed(&self) {
                self.ws.closed().await;
            }

            #[must_use]
            pub fn is_connected(&self) -> bool {
                self.ws.is_connected()
            }

            #[must_use]
            pub fn state(&self) -> $crate::sdk::ConnectionState {
                self.ws.state()
            }

            pub fn on_event<F, Fut>(&self, event_type: $crate::protocol::EventType, handler: F)
            where
                F: Fn($crate::protocol::Event) -> Fut + Send + Sync + 'static,
                Fut: ::std::future::Future<Output = $crate::Result<()>> + Send + 'static,
            {
                self.ws.on_event(event_type, handler);
            }

            pub fn remove_handler(&self, event_type: &$crate::protocol::EventType) -> bool {
                self.ws.remove_handler(event_type)
            }

            /// # Errors
            /// See [`WebSocketClient::wait_for_event`](crate::sdk::WebSocketClient::wait_for_event).
            pub async fn wait_for_event(
                &self,
                event_types: &[$crate::protocol::EventType],
                mode: $crate::sdk::WaitMode,
                timeout: ::std::time::Duration,
            ) -> $crate::Result<$crate::protocol::Event> {
                self.ws.wait_for_event(event_types, mode, timeout).await
            }
        }
    };
}

pub(crate) use {bind_handlers, facade_common};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Payload;

    #[tokio::test]
    async fn registration_replaces_previous_handler() {
        let map = HandlerMap::default();
        map.insert(EventType::Closed, boxed(|_| async { Ok(()) }));
        map.insert(
            EventType::Closed,
            boxed(|_| async { Err(crate::Error::handler("second")) }),
        );

        let handler = map.get(&EventType::Closed).unwrap();
        let result = handler(Event::new(Payload::Closed)).await;
        assert!(result.is_err());

        assert!(map.remove(&EventType::Closed));
        assert!(!map.contains(&EventType::Closed));
    }
}
