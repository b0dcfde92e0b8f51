use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::events::{Event, Payload};
use super::models::EventDetail;
use super::{EventRegistry, EventType};
use crate::{Error, Result};

/// Wire envelope shared by every frame in both directions.
#[derive(Debug, Serialize, Deserialize)]
struct Frame {
    event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<EventDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// Converts between JSON text frames and [`Event`]s using an [`EventRegistry`].
#[derive(Debug, Clone)]
pub struct Codec {
    registry: Arc<EventRegistry>,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(Arc::new(EventRegistry::standard()))
    }
}

impl Codec {
    #[must_use]
    pub const fn new(registry: Arc<EventRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// Decode one inbound frame.
    ///
    /// Unregistered tags are not an error: they come back as [`Payload::Unknown`].
    ///
    /// # Errors
    /// Returns [`Error::Serialization`] if the envelope is not valid JSON, or
    /// [`Error::Decode`] if `data` does not match the registered shape.
    #[allow(clippy::result_large_err)]
    pub fn decode(&self, raw: &[u8]) -> Result<Event> {
        let frame: Frame = serde_json::from_slice(raw)?;
        let payload = match self.registry.lookup(&frame.event_type) {
            Some(decoder) => decoder(frame.data).map_err(|source| Error::Decode {
                event_type: frame.event_type.clone(),
                source,
            })?,
            None => Payload::Unknown {
                event_type: frame.event_type,
                data: frame.data,
            },
        };
        Ok(Event {
            id: frame.id,
            detail: frame.detail,
            payload,
        })
    }

    /// Encode an event into its JSON text frame.
    ///
    /// # Errors
    /// Returns an error if the payload cannot be serialized.
    #[allow(clippy::result_large_err)]
    pub fn encode(&self, event: &Event) -> Result<String> {
        let frame = Frame {
            event_type: event.event_type(),
            id: event.id.clone(),
            detail: event.detail.clone(),
            data: event.payload.to_data()?,
        };
        Ok(serde_json::to_string(&frame)?)
    }
}

/// Log-friendly rendering of an event with audio chunks replaced by their size.
pub(crate) fn describe(event: &Event) -> String {
    let tag = event.event_type();
    let id = event.id.as_deref().unwrap_or("-");
    match event.payload.audio_len() {
        Some(len) => format!("{tag} id={id} audio=<{len} bytes base64>"),
        None => match event.payload.to_data() {
            Ok(Some(data)) => format!("{tag} id={id} data={data}"),
            _ => format!("{tag} id={id}"),
        },
    }
}
