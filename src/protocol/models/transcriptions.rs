use base64::Engine as _;
use base64::engine::general_purpose;
use serde::{Deserialize, Serialize};

use super::InputAudio;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TranscriptionsUpdateData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio: Option<InputAudio>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InputAudioBufferAppendData {
    /// Base64 encoded audio chunk.
    #[serde(default)]
    pub delta: String,
}

impl InputAudioBufferAppendData {
    #[must_use]
    pub fn from_audio(audio: &[u8]) -> Self {
        Self {
            delta: general_purpose::STANDARD.encode(audio),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TranscriptionsMessageData {
    #[serde(default)]
    pub content: String,
}
