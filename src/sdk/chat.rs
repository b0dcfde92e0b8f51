use super::client::WebSocketClient;
use super::handlers::{bind_handlers, facade_common};
use super::waiter::WaitMode;
use crate::Result;
use crate::protocol::models::{
    Chat, ChatCancelData, ChatUpdateData, ClientErrorData, ErrorData, InputAudioBufferAppendData,
    Message, MessageCreateData, SentenceStartData, SubmitToolOutputsData, ToolOutput,
    TranscriptData,
};
use crate::protocol::{Event, EventType, Payload};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const CHAT_PATH: &str = "/v1/chat";

/// Query parameters for opening a chat channel. `bot_id` is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChatRequest {
    pub bot_id: String,
    pub workflow_id: Option<String>,
    pub device_id: Option<String>,
}

impl CreateChatRequest {
    #[must_use]
    pub fn new(bot_id: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            workflow_id: None,
            device_id: None,
        }
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
        let mut query = BTreeMap::from([("bot_id".to_string(), self.bot_id.clone())]);
        if let Some(workflow_id) = &self.workflow_id {
            query.insert("workflow_id".to_string(), workflow_id.clone());
        }
        if let Some(device_id) = &self.device_id {
            query.insert("device_id".to_string(), device_id.clone());
        }
        query
    }
}

/// Bidirectional voice and text conversation with a bot.
#[derive(Clone, Debug)]
pub struct ChatClient {
    ws: WebSocketClient,
}

facade_common!(ChatClient);

impl ChatClient {
    #[must_use]
    pub const fn new(ws: WebSocketClient) -> Self {
        Self { ws }
    }

    #[allow(clippy::result_large_err)]
    fn send(&self, payload: Payload) -> Result<()> {
        self.ws.send_event(&Event::new(payload))
    }

    /// # Errors
    /// Returns an error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn chat_update(&self, data: ChatUpdateData) -> Result<()> {
        self.send(Payload::ChatUpdate(data))
    }

    /// Append raw audio; it is base64 encoded on the wire.
    ///
    /// # Errors
    /// Returns an error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn input_audio_buffer_append(&self, audio: &[u8]) -> Result<()> {
        self.send(Payload::InputAudioBufferAppend(
            InputAudioBufferAppendData::from_audio(audio),
        ))
    }

    /// # Errors
    /// Returns an error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn input_audio_buffer_complete(&self) -> Result<()> {
        self.send(Payload::InputAudioBufferComplete)
    }

    /// # Errors
    /// Returns an error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn input_audio_buffer_clear(&self) -> Result<()> {
        self.send(Payload::InputAudioBufferClear)
    }

    /// # Errors
    /// Returns an error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn conversation_message_create(&self, data: MessageCreateData) -> Result<()> {
        self.send(Payload::ConversationMessageCreate(data))
    }

    /// Send a plain text user message.
    ///
    /// # Errors
    /// Returns an error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.conversation_message_create(MessageCreateData::user_text(text))
    }

    /// # Errors
    /// Returns an error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn conversation_clear(&self) -> Result<()> {
        self.send(Payload::ConversationClear)
    }

    /// Answer the tool calls of a chat in `requires_action`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidClientEvent`] if `chat_id` or `outputs`
    /// is empty, or an error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn submit_tool_outputs(
        &self,
        chat_id: impl Into<String>,
        outputs: Vec<ToolOutput>,
    ) -> Result<()> {
        self.send(Payload::ConversationChatSubmitToolOutputs(
            SubmitToolOutputsData {
                chat_id: chat_id.into(),
                tool_outputs: outputs,
            },
        ))
    }

    /// # Errors
    /// Returns [`crate::Error::InvalidClientEvent`] if `chat_id` is empty, or an
    /// error if the event cannot be queued.
    #[allow(clippy::result_large_err)]
    pub fn cancel_chat(&self, chat_id: impl Into<String>) -> Result<()> {
        self.send(Payload::ConversationChatCancel(ChatCancelData {
            chat_id: chat_id.into(),
        }))
    }

    /// # Errors
    /// Returns an error on timeout or if the connection ends first.
    pub async fn wait_for_chat_created(&self, timeout: Duration) -> Result<Event> {
        self.ws
            .wait_for_event(&[EventType::ConversationChatCreated], WaitMode::All, timeout)
            .await
    }

    /// Wait for the chat to finish, successfully or not. Inspect the returned
    /// event's type to tell which.
    ///
    /// # Errors
    /// Returns an error on timeout or if the connection ends first.
    pub async fn wait_for_chat_completed(&self, timeout: Duration) -> Result<Event> {
        self.ws
            .wait_for_event(
                &[
                    EventType::ConversationChatCompleted,
                    EventType::ConversationChatFailed,
                ],
                WaitMode::Any,
                timeout,
            )
            .await
    }

    /// Bind every method of `handler` to its event, replacing handlers
    /// previously registered for those events.
    pub fn register_handler<H: ChatEventHandler + 'static>(&self, handler: Arc<H>) {
        bind_handlers!(&self.ws, handler,
            data {
                ChatUpdated => on_chat_updated,
                ConversationChatCreated => on_conversation_chat_created,
                ConversationChatInProgress => on_conversation_chat_in_progress,
                ConversationMessageDelta => on_conversation_message_delta,
                ConversationAudioSentenceStart => on_conversation_audio_sentence_start,
                ConversationAudioDelta => on_conversation_audio_delta,
                ConversationMessageCompleted => on_conversation_message_completed,
                ConversationAudioCompleted => on_conversation_audio_completed,
                ConversationChatCompleted => on_conversation_chat_completed,
                ConversationChatFailed => on_conversation_chat_failed,
                ConversationChatCanceled => on_conversation_chat_canceled,
                ConversationChatRequiresAction => on_conversation_chat_requires_action,
                ConversationAudioTranscriptUpdate => on_conversation_audio_transcript_update,
                ConversationAudioTranscriptCompleted => on_conversation_audio_transcript_completed,
                Error => on_error,
                ClientError => on_client_error,
            }
            bare {
                ChatCreated => on_chat_created,
                InputAudioBufferCompleted => on_input_audio_buffer_completed,
                InputAudioBufferCleared => on_input_audio_buffer_cleared,
                InputAudioBufferSpeechStarted => on_input_audio_buffer_speech_started,
                InputAudioBufferSpeechStopped => on_input_audio_buffer_speech_stopped,
                ConversationCleared => on_conversation_cleared,
                Closed => on_closed,
            }
        );
    }
}

/// Typed callbacks for the chat channel. Every method defaults to a no-op.
#[async_trait]
pub trait ChatEventHandler: Send + Sync {
    async fn on_chat_created(&self, _event: &Event) -> Result<()> {
        Ok(())
    }

    async fn on_chat_updated(&self, _event: &Event, _data: &ChatUpdateData) -> Result<()> {
        Ok(())
    }

    async fn on_conversation_chat_created(&self, _event: &Event, _chat: &Chat) -> Result<()> {
        Ok(())
    }

    async fn on_conversation_chat_in_progress(&self, _event: &Event, _chat: &Chat) -> Result<()> {
        Ok(())
    }

    /// Incremental text of the bot's reply.
    async fn on_conversation_message_delta(
        &self,
        _event: &Event,
        _message: &Message,
    ) -> Result<()> {
        Ok(())
    }

    async fn on_conversation_audio_sentence_start(
        &self,
        _event: &Event,
        _data: &SentenceStartData,
    ) -> Result<()> {
        Ok(())
    }

    /// One chunk of reply audio; see [`Message::audio`].
    async fn on_conversation_audio_delta(&self, _event: &Event, _message: &Message) -> Result<()> {
        Ok(())
    }

    async fn on_conversation_message_completed(
        &self,
        _event: &Event,
        _message: &Message,
    ) -> Result<()> {
        Ok(())
    }

    async fn on_conversation_audio_completed(
        &self,
        _event: &Event,
        _message: &Message,
    ) -> Result<()> {
        Ok(())
    }

    async fn on_conversation_chat_completed(&self, _event: &Event, _chat: &Chat) -> Result<()> {
        Ok(())
    }

    async fn on_conversation_chat_failed(&self, _event: &Event, _chat: &Chat) -> Result<()> {
        Ok(())
    }

    async fn on_conversation_chat_canceled(&self, _event: &Event, _chat: &Chat) -> Result<()> {
        Ok(())
    }

    /// The bot is waiting on tool results; answer with
    /// [`ChatClient::submit_tool_outputs`].
    async fn on_conversation_chat_requires_action(
        &self,
        _event: &Event,
        _chat: &Chat,
    ) -> Result<()> {
        Ok(())
    }

    async fn on_conversation_audio_transcript_update(
        &self,
        _event: &Event,
        _data: &TranscriptData,
    ) -> Result<()> {
        Ok(())
    }

    async fn on_conversation_audio_transcript_completed(
        &self,
        _event: &Event,
        _data: &TranscriptData,
    ) -> Result<()> {
        Ok(())
    }

    async fn on_input_audio_buffer_completed(&self, _event: &Event) -> Result<()> {
        Ok(())
    }

    async fn on_input_audio_buffer_cleared(&self, _event: &Event) -> Result<()> {
        Ok(())
    }

    async fn on_input_audio_buffer_speech_started(&self, _event: &Event) -> Result<()> {
        Ok(())
    }

    async fn on_input_audio_buffer_speech_stopped(&self, _event: &Event) -> Result<()> {
        Ok(())
    }

    async fn on_conversation_cleared(&self, _event: &Event) -> Result<()> {
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
