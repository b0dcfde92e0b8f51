use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

macro_rules! event_types {
    ($($(#[$meta:meta])* $variant:ident => $tag:literal,)*) => {
        /// Wire-level `event_type` tag.
        ///
        /// Every tag this crate knows about has its own variant. Anything else the
        /// server sends is preserved verbatim in [`EventType::Other`].
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum EventType {
            $($(#[$meta])* $variant,)*
            Other(String),
        }

        impl EventType {
            /// All known tags, in declaration order.
            pub const KNOWN: &'static [Self] = &[$(Self::$variant,)*];

            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $tag,)*
                    Self::Other(tag) => tag,
                }
            }

            #[must_use]
            pub const fn is_known(&self) -> bool {
                !matches!(self, Self::Other(_))
            }
        }

        impl From<&str> for EventType {
            fn from(tag: &str) -> Self {
                match tag {
                    $($tag => Self::$variant,)*
                    other => Self::Other(other.to_string()),
                }
            }
        }
    };
}

event_types! {
    /// Local fault report raised by the SDK itself (transport, decode, handler).
    ClientError => "client_error",
    /// Local notification that the socket was closed by the remote side.
    Closed => "closed",
    /// Protocol-level error sent by the server.
    Error => "error",

    // speech
    SpeechUpdate => "speech.update",
    InputTextBufferAppend => "input_text_buffer.append",
    InputTextBufferComplete => "input_text_buffer.complete",
    SpeechCreated => "speech.created",
    SpeechUpdated => "speech.updated",
    InputTextBufferCompleted => "input_text_buffer.completed",
    SpeechAudioUpdate => "speech.audio.update",
    SpeechAudioCompleted => "speech.audio.completed",

    // transcriptions
    TranscriptionsUpdate => "transcriptions.update",
    InputAudioBufferAppend => "input_audio_buffer.append",
    InputAudioBufferComplete => "input_audio_buffer.complete",
    InputAudioBufferClear => "input_audio_buffer.clear",
    TranscriptionsCreated => "transcriptions.created",
    TranscriptionsUpdated => "transcriptions.updated",
    InputAudioBufferCompleted => "input_audio_buffer.completed",
    InputAudioBufferCleared => "input_audio_buffer.cleared",
    TranscriptionsMessageUpdate => "transcriptions.message.update",
    TranscriptionsMessageCompleted => "transcriptions.message.completed",

    // chat
    ChatUpdate => "chat.update",
    ConversationMessageCreate => "conversation.message.create",
    ConversationClear => "conversation.clear",
    ConversationChatSubmitToolOutputs => "conversation.chat.submit_tool_outputs",
    ConversationChatCancel => "conversation.chat.cancel",
    ChatCreated => "chat.created",
    ChatUpdated => "chat.updated",
    ConversationChatCreated => "conversation.chat.created",
    ConversationChatInProgress => "conversation.chat.in_progress",
    ConversationMessageDelta => "conversation.message.delta",
    ConversationAudioSentenceStart => "conversation.audio.sentence_start",
    ConversationAudioDelta => "conversation.audio.delta",
    ConversationMessageCompleted => "conversation.message.completed",
    ConversationAudioCompleted => "conversation.audio.completed",
    ConversationChatCompleted => "conversation.chat.completed",
    ConversationChatFailed => "conversation.chat.failed",
    ConversationCleared => "conversation.cleared",
    ConversationChatCanceled => "conversation.chat.canceled",
    ConversationAudioTranscriptUpdate => "conversation.audio_transcript.update",
    ConversationAudioTranscriptCompleted => "conversation.audio_transcript.completed",
    ConversationChatRequiresAction => "conversation.chat.requires_action",
    InputAudioBufferSpeechStarted => "input_audio_buffer.speech_started",
    InputAudioBufferSpeechStopped => "input_audio_buffer.speech_stopped",
}

impl EventType {
    /// Tags generated locally that must never be written to the socket.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::ClientError | Self::Closed)
    }
}

impl From<String> for EventType {
    fn from(tag: String) -> Self {
        match Self::from(tag.as_str()) {
            Self::Other(_) => Self::Other(tag),
            known => known,
        }
    }
}

impl FromStr for EventType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_parse_back_to_themselves() {
        for tag in EventType::KNOWN {
            assert_eq!(EventType::from(tag.as_str()), *tag);
        }
    }

    #[test]
    fn unknown_tags_are_preserved() {
        let tag = EventType::from("conversation.something_new");
        assert_eq!(tag, EventType::Other("conversation.something_new".to_string()));
        assert_eq!(tag.as_str(), "conversation.something_new");
        assert!(!tag.is_known());
    }

    #[test]
    fn serializes_as_wire_string() {
        let json = serde_json::to_string(&EventType::SpeechAudioCompleted).unwrap();
        assert_eq!(json, "\"speech.audio.completed\"");
        let back: EventType = serde_json::from_str("\"conversation.chat.failed\"").unwrap();
        assert_eq!(back, EventType::ConversationChatFailed);
    }

    #[test]
    fn local_tags() {
        assert!(EventType::ClientError.is_local());
        assert!(EventType::Closed.is_local());
        assert!(!EventType::Error.is_local());
    }
}
