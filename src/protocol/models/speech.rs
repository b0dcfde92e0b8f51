use base64::Engine as _;
use base64::engine::general_purpose;
use serde::{Deserialize, Serialize};

use super::OutputAudio;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SpeechUpdateData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_audio: Option<OutputAudio>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InputTextBufferAppendData {
    #[serde(default)]
    pub delta: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SpeechCreatedData {
    #[serde(default)]
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SpeechAudioUpdateData {
    /// Base64 encoded audio chunk.
    #[serde(default)]
    pub delta: String,
}

impl SpeechAudioUpdateData {
    /// Decode the audio chunk.
    ///
    /// # Errors
    /// Returns an error if `delta` is not valid base64.
    pub fn audio(&self) -> crate::Result<Vec<u8>> {
        Ok(general_purpose::STANDARD.decode(&self.delta)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SpeechAudioCompletedData {
    #[serde(default)]
    pub session_id: String,
}
