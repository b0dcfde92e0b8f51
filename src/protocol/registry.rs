use serde_json::Value;
use std::collections::HashMap;

use super::EventType;
use super::events::{Payload, standard_decoders};

/// Turns the raw `data` object of a frame into a typed payload.
pub type PayloadDecoder = fn(Option<Value>) -> serde_json::Result<Payload>;

/// Maps wire tags to payload decoders.
///
/// Built once and shared read-only (usually behind an `Arc`) by the codec and
/// every client using it. Tags without an entry decode to [`Payload::Unknown`].
#[derive(Clone, Default)]
pub struct EventRegistry {
    decoders: HashMap<EventType, PayloadDecoder>,
}

impl EventRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry containing every tag this crate knows about.
    #[must_use]
    pub fn standard() -> Self {
        standard_decoders()
            .into_iter()
            .fold(Self::empty(), |registry, (tag, decoder)| registry.with(tag, decoder))
    }

    #[must_use]
    pub fn with(mut self, event_type: EventType, decoder: PayloadDecoder) -> Self {
        self.register(event_type, decoder);
        self
    }

    /// Add or replace the decoder for `event_type`.
    pub fn register(&mut self, event_type: EventType, decoder: PayloadDecoder) {
        self.decoders.insert(event_type, decoder);
    }

    #[must_use]
    pub fn lookup(&self, event_type: &EventType) -> Option<PayloadDecoder> {
        self.decoders.get(event_type).copied()
    }

    #[must_use]
    pub fn contains(&self, event_type: &EventType) -> bool {
        self.decoders.contains_key(event_type)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&str> = self.decoders.keys().map(EventType::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("EventRegistry").field("tags", &tags).finish()
    }
}
