use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::EventType;
use super::models::{
    Chat, ChatCancelData, ChatUpdateData, ClientErrorData, ErrorData, EventDetail,
    InputAudioBufferAppendData, InputTextBufferAppendData, Message, MessageCreateData,
    SentenceStartData, SpeechAudioCompletedData, SpeechAudioUpdateData, SpeechCreatedData,
    SpeechUpdateData, SubmitToolOutputsData, TranscriptData, TranscriptionsMessageData,
    TranscriptionsUpdateData,
};
use super::registry::PayloadDecoder;

/// A decoded frame: envelope metadata plus the typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: Option<String>,
    pub detail: Option<EventDetail>,
    pub payload: Payload,
}

impl Event {
    #[must_use]
    pub const fn new(payload: Payload) -> Self {
        Self {
            id: None,
            detail: None,
            payload,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: EventDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }

    /// Log id assigned by the server, useful when reporting issues.
    #[must_use]
    pub fn log_id(&self) -> Option<&str> {
        self.detail.as_ref().and_then(|d| d.log_id.as_deref())
    }

    #[must_use]
    pub fn client_error(message: impl Into<String>) -> Self {
        Self::new(Payload::ClientError(ClientErrorData::new(message)))
    }

    #[must_use]
    pub const fn chat(&self) -> Option<&Chat> {
        match &self.payload {
            Payload::ConversationChatCreated(chat)
            | Payload::ConversationChatInProgress(chat)
            | Payload::ConversationChatCompleted(chat)
            | Payload::ConversationChatFailed(chat)
            | Payload::ConversationChatCanceled(chat)
            | Payload::ConversationChatRequiresAction(chat) => Some(chat),
            _ => None,
        }
    }

    #[must_use]
    pub const fn message(&self) -> Option<&Message> {
        match &self.payload {
            Payload::ConversationMessageDelta(msg)
            | Payload::ConversationMessageCompleted(msg)
            | Payload::ConversationAudioDelta(msg)
            | Payload::ConversationAudioCompleted(msg) => Some(msg),
            _ => None,
        }
    }
}

impl From<Payload> for Event {
    fn from(payload: Payload) -> Self {
        Self::new(payload)
    }
}

/// Missing or `null` data decodes as an empty object. Payload fields all have
/// defaults, so an absent field reads as its zero value.
fn decode_data<T: DeserializeOwned>(data: Option<Value>) -> serde_json::Result<T> {
    match data {
        None | Some(Value::Null) => serde_json::from_value(Value::Object(Map::new())),
        Some(value) => serde_json::from_value(value),
    }
}

macro_rules! payloads {
    (
        bare { $($bare:ident,)* }
        data { $($variant:ident($ty:ty),)* }
    ) => {
        /// Typed payload of an [`Event`]. The variant determines the `event_type` tag.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Payload {
            $($bare,)*
            $($variant($ty),)*
            /// A tag with no registered decoder. `data` is kept as raw JSON.
            Unknown {
                event_type: EventType,
                data: Option<Value>,
            },
        }

        impl Payload {
            #[must_use]
            pub fn event_type(&self) -> EventType {
                match self {
                    $(Self::$bare => EventType::$bare,)*
                    $(Self::$variant(_) => EventType::$variant,)*
                    Self::Unknown { event_type, .. } => event_type.clone(),
                }
            }

            /// The `data` object as written on the wire. `None` for data-less events.
            ///
            /// # Errors
            /// Returns an error if the payload cannot be represented as JSON.
            pub fn to_data(&self) -> serde_json::Result<Option<Value>> {
                match self {
                    $(Self::$bare => Ok(None),)*
                    $(Self::$variant(data) => serde_json::to_value(data).map(Some),)*
                    Self::Unknown { data, .. } => Ok(data.clone()),
                }
            }
        }

        pub(crate) fn standard_decoders() -> Vec<(EventType, PayloadDecoder)> {
            vec![
                $((
                    EventType::$bare,
                    (|_: Option<Value>| -> serde_json::Result<Payload> { Ok(Payload::$bare) })
                        as PayloadDecoder,
                ),)*
                $((
                    EventType::$variant,
                    (|data: Option<Value>| -> serde_json::Result<Payload> {
                        decode_data::<$ty>(data).map(Payload::$variant)
                    }) as PayloadDecoder,
                ),)*
            ]
        }
    };
}

payloads! {
    bare {
        Closed,
        InputTextBufferComplete,
        InputTextBufferCompleted,
        TranscriptionsCreated,
        InputAudioBufferComplete,
        InputAudioBufferClear,
        InputAudioBufferCompleted,
        InputAudioBufferCleared,
        InputAudioBufferSpeechStarted,
        InputAudioBufferSpeechStopped,
        TranscriptionsMessageCompleted,
        ChatCreated,
        ConversationClear,
        ConversationCleared,
    }
    data {
        Error(ErrorData),
        ClientError(ClientErrorData),

        SpeechUpdate(SpeechUpdateData),
        SpeechUpdated(SpeechUpdateData),
        InputTextBufferAppend(InputTextBufferAppendData),
        SpeechCreated(SpeechCreatedData),
        SpeechAudioUpdate(SpeechAudioUpdateData),
        SpeechAudioCompleted(SpeechAudioCompletedData),

        TranscriptionsUpdate(TranscriptionsUpdateData),
        TranscriptionsUpdated(TranscriptionsUpdateData),
        InputAudioBufferAppend(InputAudioBufferAppendData),
        TranscriptionsMessageUpdate(TranscriptionsMessageData),

        ChatUpdate(ChatUpdateData),
        ChatUpdated(ChatUpdateData),
        ConversationMessageCreate(MessageCreateData),
        ConversationChatSubmitToolOutputs(SubmitToolOutputsData),
        ConversationChatCancel(ChatCancelData),
        ConversationChatCreated(Chat),
        ConversationChatInProgress(Chat),
        ConversationChatCompleted(Chat),
        ConversationChatFailed(Chat),
        ConversationChatCanceled(Chat),
        ConversationChatRequiresAction(Chat),
        ConversationMessageDelta(Message),
        ConversationMessageCompleted(Message),
        ConversationAudioDelta(Message),
        ConversationAudioCompleted(Message),
        ConversationAudioSentenceStart(SentenceStartData),
        ConversationAudioTranscriptUpdate(TranscriptData),
        ConversationAudioTranscriptCompleted(TranscriptData),
    }
}

impl Payload {
    /// Length of the base64 audio carried by this payload, if it is an audio chunk.
    #[must_use]
    pub fn audio_len(&self) -> Option<usize> {
        match self {
            Self::SpeechAudioUpdate(data) => Some(data.delta.len()),
            Self::InputAudioBufferAppend(data) => Some(data.delta.len()),
            Self::ConversationAudioDelta(msg) => Some(msg.content.len()),
            _ => None,
        }
    }
}
