use super::client::WebSocketClient;
use super::handlers::{bind_handlers, facade_common};
use super::waiter::WaitMode;
use crate::Result;
use crate::protocol::models::{
    ClientErrorData, ErrorData, InputAudioBufferAppendData, TranscriptionsMessageData,
    TranscriptionsUpdateData,
};
use crate::protocol::{Event, EventType, Payload};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const TRANSCRIPTIONS_PATH: &str = "/v1/audio/transcriptions";

/// Query parameters for opening a transcriptions channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTranscriptionsRequest {
    pub bot_id: Option<String>,
    pub workflow_id: Option<String>,
    pub device_id: Option<String>,
}

impl CreateTranscriptionsRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn bot_id(mut self, bot_id: impl Into<String>) -> Self {
        self.bot_id = Some(bot_id.into());
        self
    }

    #[must_use]
    pub fn workflow_id(mut self, workflow_id: impl Into<String>) -> Self {
        self.workflow_id = Some(workflow_id.into());
        self
    }

    #[must_use]
    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub(crate) fn to_query(&self) -> BTreeMap<String, String> {
        [
            ("bot_id", &self.bot_id),
            ("workflow_id", &self.workflow_id),
            ("device_id", &self.device_id),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
        .collect()
    }
}

/// Speech-to-text channel: stream audio in, receive transcript updates.
#[derive(Clone, Debug)]
pub struct TranscriptionsClient {
    ws: WebSocketClient,
}

facade_common!(TranscriptionsClient);

impl TranscriptionsClient {
    #[must_use]
    pub const fn new(ws: WebSocketClient) -> Self {
        Self { ws }
    }

    /// # Errors
    /// Returns an error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn transcriptions_update(&self, data: TranscriptionsUpdateData) -> Result<()> {
        self.ws
            .send_event(&Event::new(Payload::TranscriptionsUpdate(data)))
    }

    /// Append raw audio; it is base64 encoded on the wire.
    ///
    /// # Errors
    /// Returns an error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn input_audio_buffer_append(&self, audio: &[u8]) -> Result<()> {
        self.ws.send_event(&Event::new(Payload::InputAudioBufferAppend(
            InputAudioBufferAppendData::from_audio(audio),
        )))
    }

    /// # Errors
    /// Returns an error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn input_audio_buffer_complete(&self) -> Result<()> {
        self.ws
            .send_event(&Event::new(Payload::InputAudioBufferComplete))
    }

    /// # Errors
    /// Returns an error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn input_audio_buffer_clear(&self) -> Result<()> {
        self.ws.send_event(&Event::new(Payload::InputAudioBufferClear))
    }

    /// # Errors
    /// Returns an error on timeout or if the connection ends first.
    pub async fn wait_for_transcriptions_created(&self, timeout: Duration) -> Result<Event> {
        self.ws
            .wait_for_event(&[EventType::TranscriptionsCreated], WaitMode::All, timeout)
            .await
    }

    /// Wait for the final transcript.
    ///
    /// # Errors
    /// Returns an error on timeout or if the connection ends first.
    pub async fn wait_for_transcription_completed(&self, timeout: Duration) -> Result<Event> {
        self.ws
            .wait_for_event(
                &[EventType::TranscriptionsMessageCompleted],
                WaitMode::All,
                timeout,
            )
            .await
    }

    /// Bind every method of `handler` to its event, replacing handlers
    /// previously registered for those events.
    pub fn register_handler<H: TranscriptionsEventHandler + 'static>(&self, handler: Arc<H>) {
        bind_handlers!(&self.ws, handler,
            data {
                TranscriptionsUpdated => on_transcriptions_updated,
                TranscriptionsMessageUpdate => on_transcriptions_message_update,
                Error => on_error,
                ClientError => on_client_error,
            }
            bare {
                TranscriptionsCreated => on_transcriptions_created,
                InputAudioBufferCompleted => on_input_audio_buffer_completed,
                InputAudioBufferCleared => on_input_audio_buffer_cleared,
                TranscriptionsMessageCompleted => on_transcriptions_message_completed,
                Closed => on_closed,
            }
        );
    }
}

/// Typed callbacks for the transcriptions channel. Every method defaults to a no-op.
#[async_trait]
pub trait TranscriptionsEventHandler: Send + Sync {
    async fn on_transcriptions_created(&self, _event: &Event) -> Result<()> {
        Ok(())
    }

    async fn on_transcriptions_updated(
        &self,
        _event: &Event,
        _data: &TranscriptionsUpdateData,
    ) -> Result<()> {
        Ok(())
    }

    async fn on_input_audio_buffer_completed(&self, _event: &Event) -> Result<()> {
        Ok(())
    }

    async fn on_input_audio_buffer_cleared(&self, _event: &Event) -> Result<()> {
        Ok(())
    }

    /// Partial or revised transcript text.
    async fn on_transcriptions_message_update(
        &self,
        _event: &Event,
        _data: &TranscriptionsMessageData,
    ) -> Result<()> {
        Ok(())
    }

    async fn on_transcriptions_message_completed(&self, _event: &Event) -> Result<()> {
        Ok(())
    }

    async fn on_error(&self, _event: &Event, _data: &ErrorData) -> Result<()> {
        Ok(())
    }

    async fn on_client_error(&self, _event: &Event, _data: &ClientErrorData) -> Result<()> {
        Ok(())
    }

    async fn on_closed(&self, _event: &Event) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_contains_only_set_fields() {
        let query = CreateTranscriptionsRequest::new()
            .bot_id("bot_1")
            .device_id("dev_1")
            .to_query();
        assert_eq!(query.len(), 2);
        assert_eq!(query["bot_id"], "bot_1");
        assert!(!query.contains_key("workflow_id"));
    }
}
