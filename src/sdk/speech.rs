use super::client::WebSocketClient;
use super::handlers::{bind_handlers, facade_common};
use super::waiter::WaitMode;
use crate::Result;
use crate::protocol::models::{
    ClientErrorData, ErrorData, InputTextBufferAppendData, SpeechAudioCompletedData,
    SpeechAudioUpdateData, SpeechCreatedData, SpeechUpdateData,
};
use crate::protocol::{Event, EventType, Payload};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub const SPEECH_PATH: &str = "/v1/audio/speech";

/// Text-to-speech channel: stream text in, receive audio chunks.
#[derive(Clone, Debug)]
pub struct SpeechClient {
    ws: WebSocketClient,
}

facade_common!(SpeechClient);

impl SpeechClient {
    #[must_use]
    pub const fn new(ws: WebSocketClient) -> Self {
        Self { ws }
    }

    /// # Errors
    /// Returns an error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn speech_update(&self, data: SpeechUpdateData) -> Result<()> {
        self.ws.send_event(&Event::new(Payload::SpeechUpdate(data)))
    }

    /// # Errors
    /// Returns an error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn input_text_buffer_append(&self, delta: impl Into<String>) -> Result<()> {
        self.ws
            .send_event(&Event::new(Payload::InputTextBufferAppend(InputTextBufferAppendData {
                delta: delta.into(),
            })))
    }

    /// Signal that all text has been appended.
    ///
    /// # Errors
    /// Returns an error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn input_text_buffer_complete(&self) -> Result<()> {
        self.ws.send_event(&Event::new(Payload::InputTextBufferComplete))
    }

    /// # Errors
    /// Returns an error on timeout or if the connection ends first.
    pub async fn wait_for_speech_created(&self, timeout: Duration) -> Result<Event> {
        self.ws
            .wait_for_event(&[EventType::SpeechCreated], WaitMode::All, timeout)
            .await
    }

    /// # Errors
    /// Returns an error on timeout or if the connection ends first.
    pub async fn wait_for_audio_completed(&self, timeout: Duration) -> Result<Event> {
        self.ws
            .wait_for_event(&[EventType::SpeechAudioCompleted], WaitMode::All, timeout)
            .await
    }

    /// Bind every method of `handler` to its event, replacing handlers
    /// previously registered for those events.
    pub fn register_handler<H: SpeechEventHandler + 'static>(&self, handler: Arc<H>) {
        bind_handlers!(&self.ws, handler,
            data {
                SpeechCreated => on_speech_created,
                SpeechUpdated => on_speech_updated,
                SpeechAudioUpdate => on_speech_audio_update,
                SpeechAudioCompleted => on_speech_audio_completed,
                Error => on_error,
                ClientError => on_client_error,
            }
            bare {
                InputTextBufferCompleted => on_input_text_buffer_completed,
                Closed => on_closed,
            }
        );
    }
}

/// Typed callbacks for the speech channel. Every method defaults to a no-op.
#[async_trait]
pub trait SpeechEventHandler: Send + Sync {
    async fn on_speech_created(&self, _event: &Event, _data: &SpeechCreatedData) -> Result<()> {
        Ok(())
    }

    async fn on_speech_updated(&self, _event: &Event, _data: &SpeechUpdateData) -> Result<()> {
        Ok(())
    }

    async fn on_input_text_buffer_completed(&self, _event: &Event) -> Result<()> {
        Ok(())
    }

    /// One chunk of synthesized audio; see [`SpeechAudioUpdateData::audio`].
    async fn on_speech_audio_update(
        &self,
        _event: &Event,
        _data: &SpeechAudioUpdateData,
    ) -> Result<()> {
        Ok(())
    }

    async fn on_speech_audio_completed(
        &self,
        _event: &Event,
        _data: &SpeechAudioCompletedData,
    ) -> Result<()> {
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
