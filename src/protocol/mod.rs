pub mod codec;
pub mod event_type;
pub mod events;
pub mod models;
pub mod registry;
pub mod validate;

pub use codec::Codec;
pub use event_type::EventType;
pub use events::{Event, Payload};
pub use registry::{EventRegistry, PayloadDecoder};
pub use validate::validate_client_event;
