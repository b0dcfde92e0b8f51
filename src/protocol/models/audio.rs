use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InputAudio {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_depth: Option<u32>,
}

impl InputAudio {
    /// Raw PCM input with the given sample rate, mono, 16-bit.
    #[must_use]
    pub fn pcm(sample_rate: u32) -> Self {
        Self {
            format: Some("pcm".to_string()),
            codec: Some("pcm".to_string()),
            sample_rate: Some(sample_rate),
            channel: Some(1),
            bit_depth: Some(16),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LimitConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_frame_num: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PcmConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_size_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_config: Option<LimitConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OpusConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_cbr: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_size_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_config: Option<LimitConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OutputAudio {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcm_config: Option<PcmConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opus_config: Option<OpusConfig>,
    /// Relative speed, `-50..=100`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_rate: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
}

impl OutputAudio {
    #[must_use]
    pub fn pcm(sample_rate: u32) -> Self {
        Self {
            codec: Some("pcm".to_string()),
            pcm_config: Some(PcmConfig {
                sample_rate: Some(sample_rate),
                ..PcmConfig::default()
            }),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnDetectionType {
    ServerVad,
    ClientInterrupt,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnDetection {
    #[serde(rename = "type")]
    pub kind: TurnDetectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_padding_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silence_duration_ms: Option<u32>,
}

impl TurnDetection {
    #[must_use]
    pub const fn server_vad() -> Self {
        Self {
            kind: TurnDetectionType::ServerVad,
            prefix_padding_ms: None,
            silence_duration_ms: None,
        }
    }
}
