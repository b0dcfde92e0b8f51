use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose;
use coze_rt_rs::models::{
    Chat, ClientErrorData, Message, SpeechAudioUpdateData, SpeechUpdateData, ToolOutput,
    TranscriptionsMessageData,
};
use coze_rt_rs::{
    CN_BASE_URL, ChatEventHandler, CozeWebSockets, CreateChatRequest,
    CreateTranscriptionsRequest, Error, Event, EventType, MemoryConnector, MemoryPeer, Payload,
    Result, SpeechEventHandler, TokenAuth, TranscriptionsEventHandler,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(2);

fn coze() -> (CozeWebSockets, MemoryPeer) {
    let (connector, peer) = MemoryConnector::pair();
    let coze = CozeWebSockets::new(CN_BASE_URL, TokenAuth::new("pat_test"))
        .with_connector(Arc::new(connector));
    (coze, peer)
}

async fn next_frame(peer: &mut MemoryPeer) -> Value {
    let frame = tokio::time::timeout(TIMEOUT, peer.next_sent())
        .await
        .expect("frame in time")
        .expect("socket open");
    serde_json::from_str(&frame).expect("frame is json")
}

#[derive(Default)]
struct SpeechRecorder {
    audio: Mutex<Vec<u8>>,
    completed: Mutex<bool>,
}

#[async_trait]
impl SpeechEventHandler for SpeechRecorder {
    async fn on_speech_audio_update(
        &self,
        _event: &Event,
        data: &SpeechAudioUpdateData,
    ) -> Result<()> {
        self.audio.lock().unwrap().extend(data.audio()?);
        Ok(())
    }

    async fn on_speech_audio_completed(
        &self,
        _event: &Event,
        _data: &coze_rt_rs::models::SpeechAudioCompletedData,
    ) -> Result<()> {
        *self.completed.lock().unwrap() = true;
        Ok(())
    }
}

#[tokio::test]
async fn speech_streams_text_in_and_audio_out() {
    let (coze, mut peer) = coze();
    let speech = coze.speech();
    let recorder = Arc::new(SpeechRecorder::default());
    speech.register_handler(Arc::clone(&recorder));

    speech.connect().await.unwrap();
    let request = peer.last_request().unwrap();
    assert_eq!(request.url.as_str(), "wss://ws.coze.cn/v1/audio/speech");

    speech.speech_update(SpeechUpdateData::default()).unwrap();
    speech.input_text_buffer_append("hello").unwrap();
    speech.input_text_buffer_complete().unwrap();

    assert_eq!(next_frame(&mut peer).await["event_type"], "speech.update");
    assert_eq!(
        next_frame(&mut peer).await,
        json!({"event_type": "input_text_buffer.append", "data": {"delta": "hello"}})
    );
    assert_eq!(
        next_frame(&mut peer).await,
        json!({"event_type": "input_text_buffer.complete"})
    );

    let chunk = [1_u8, 2, 3, 4, 5, 6];
    peer.push(r#"{"event_type":"speech.created","id":"evt_1","data":{"session_id":"s_1"}}"#);
    for part in chunk.chunks(3) {
        peer.push(
            json!({
                "event_type": "speech.audio.update",
                "data": {"delta": general_purpose::STANDARD.encode(part)}
            })
            .to_string(),
        );
    }
    peer.push(r#"{"event_type":"speech.audio.completed","data":{"session_id":"s_1"}}"#);

    let created = speech.wait_for_speech_created(TIMEOUT).await.unwrap();
    assert_eq!(created.id.as_deref(), Some("evt_1"));
    speech.wait_for_audio_completed(TIMEOUT).await.unwrap();
    speech.close().await.unwrap();

    assert_eq!(*recorder.audio.lock().unwrap(), chunk);
    assert!(*recorder.completed.lock().unwrap());
}

#[derive(Default)]
struct TranscriptRecorder {
    text: Mutex<Vec<String>>,
}

#[async_trait]
impl TranscriptionsEventHandler for TranscriptRecorder {
    async fn on_transcriptions_message_update(
        &self,
        _event: &Event,
        data: &TranscriptionsMessageData,
    ) -> Result<()> {
        self.text.lock().unwrap().push(data.content.clone());
        Ok(())
    }
}

#[tokio::test]
async fn transcriptions_stream_audio_in_and_text_out() {
    let (coze, mut peer) = coze();
    let transcriptions =
        coze.transcriptions(&CreateTranscriptionsRequest::new().device_id("dev_1"));
    let recorder = Arc::new(TranscriptRecorder::default());
    transcriptions.register_handler(Arc::clone(&recorder));
    transcriptions.connect().await.unwrap();
    assert_eq!(
        peer.last_request().unwrap().url.as_str(),
        "wss://ws.coze.cn/v1/audio/transcriptions?device_id=dev_1"
    );

    transcriptions.input_audio_buffer_append(&[1, 2, 3]).unwrap();
    transcriptions.input_audio_buffer_complete().unwrap();
    assert_eq!(
        next_frame(&mut peer).await,
        json!({"event_type": "input_audio_buffer.append", "data": {"delta": "AQID"}})
    );
    assert_eq!(
        next_frame(&mut peer).await["event_type"],
        "input_audio_buffer.complete"
    );

    peer.push(r#"{"event_type":"transcriptions.created","id":"evt_1"}"#);
    peer.push(r#"{"event_type":"transcriptions.message.update","data":{"content":"hel"}}"#);
    peer.push(r#"{"event_type":"transcriptions.message.update","data":{"content":"hello"}}"#);
    peer.push(r#"{"event_type":"transcriptions.message.completed"}"#);

    transcriptions
        .wait_for_transcriptions_created(TIMEOUT)
        .await
        .unwrap();
    transcriptions
        .wait_for_transcription_completed(TIMEOUT)
        .await
        .unwrap();
    transcriptions.close().await.unwrap();

    assert_eq!(*recorder.text.lock().unwrap(), ["hel", "hello"]);
}

#[derive(Default)]
struct ToolRunner {
    replies: Mutex<String>,
    client_errors: Mutex<Vec<String>>,
    chat: Mutex<Option<coze_rt_rs::ChatClient>>,
}

#[async_trait]
impl ChatEventHandler for ToolRunner {
    async fn on_conversation_message_delta(&self, _event: &Event, message: &Message) -> Result<()> {
        self.replies.lock().unwrap().push_str(&message.content);
        Ok(())
    }

    async fn on_conversation_chat_requires_action(
        &self,
        _event: &Event,
        chat: &Chat,
    ) -> Result<()> {
        let outputs = chat
            .tool_calls()
            .iter()
            .map(|call| ToolOutput::new(call.id.clone(), "sunny"))
            .collect();
        let client = self.chat.lock().unwrap().clone().expect("chat client set");
        client.submit_tool_outputs(chat.id.clone(), outputs)
    }

    async fn on_client_error(&self, _event: &Event, data: &ClientErrorData) -> Result<()> {
        self.client_errors.lock().unwrap().push(data.message.clone());
        Ok(())
    }
}

#[tokio::test]
async fn chat_answers_tool_calls_from_a_handler() {
    let (coze, mut peer) = coze();
    let chat = coze.chat(&CreateChatRequest::new("bot_1"));
    let runner = Arc::new(ToolRunner::default());
    *runner.chat.lock().unwrap() = Some(chat.clone());
    chat.register_handler(Arc::clone(&runner));
    chat.connect().await.unwrap();
    assert_eq!(
        peer.last_request().unwrap().url.as_str(),
        "wss://ws.coze.cn/v1/chat?bot_id=bot_1"
    );

    chat.send_text("weather in Paris?").unwrap();
    assert_eq!(
        next_frame(&mut peer).await,
        json!({
            "event_type": "conversation.message.create",
            "data": {"role": "user", "content_type": "text", "content": "weather in Paris?"}
        })
    );

    peer.push(r#"{"event_type":"conversation.chat.created","data":{"id":"chat_1","conversation_id":"conv_1"}}"#);
    peer.push(
        json!({
            "event_type": "conversation.chat.requires_action",
            "data": {
                "id": "chat_1",
                "conversation_id": "conv_1",
                "status": "requires_action",
                "required_action": {
                    "type": "submit_tool_outputs",
                    "submit_tool_outputs": {"tool_calls": [
                        {"id": "call_1", "type": "function", "function": {"name": "weather", "arguments": "{}"}}
                    ]}
                }
            }
        })
        .to_string(),
    );

    assert_eq!(
        next_frame(&mut peer).await,
        json!({
            "event_type": "conversation.chat.submit_tool_outputs",
            "data": {"chat_id": "chat_1", "tool_outputs": [{"tool_call_id": "call_1", "output": "sunny"}]}
        })
    );

    peer.push(r#"{"event_type":"conversation.message.delta","data":{"content":"It is ","role":"assistant"}}"#);
    peer.push(r#"{"event_type":"conversation.message.delta","data":{"content":"sunny.","role":"assistant"}}"#);
    peer.push(r#"{"event_type":"conversation.chat.completed","data":{"id":"chat_1","conversation_id":"conv_1","status":"completed"}}"#);

    chat.wait_for_chat_created(TIMEOUT).await.unwrap();
    let done = chat.wait_for_chat_completed(TIMEOUT).await.unwrap();
    assert_eq!(done.event_type(), EventType::ConversationChatCompleted);

    // break the handler -> client reference cycle
    runner.chat.lock().unwrap().take();
    chat.close().await.unwrap();

    assert_eq!(*runner.replies.lock().unwrap(), "It is sunny.");
    assert!(runner.client_errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn chat_completion_wait_accepts_failure() {
    let (coze, peer) = coze();
    let chat = coze.chat(&CreateChatRequest::new("bot_1"));
    chat.connect().await.unwrap();

    peer.push(r#"{"event_type":"conversation.chat.failed","data":{"id":"chat_1","conversation_id":"conv_1","last_error":{"code":4001,"msg":"quota"}}}"#);
    let event = chat.wait_for_chat_completed(TIMEOUT).await.unwrap();
    assert_eq!(event.event_type(), EventType::ConversationChatFailed);
    assert_eq!(event.chat().unwrap().last_error.as_ref().unwrap().code, 4001);
    chat.close().await.unwrap();
}

#[tokio::test]
async fn chat_rejects_incomplete_requests_locally() {
    let (coze, mut peer) = coze();
    let chat = coze.chat(&CreateChatRequest::new("bot_1"));
    chat.connect().await.unwrap();

    assert!(matches!(
        chat.submit_tool_outputs("chat_1", Vec::new()),
        Err(Error::InvalidClientEvent(_))
    ));
    assert!(matches!(chat.cancel_chat(""), Err(Error::InvalidClientEvent(_))));

    chat.cancel_chat("chat_1").unwrap();
    chat.conversation_clear().unwrap();
    assert_eq!(
        next_frame(&mut peer).await,
        json!({"event_type": "conversation.chat.cancel", "data": {"chat_id": "chat_1"}})
    );
    assert_eq!(
        next_frame(&mut peer).await,
        json!({"event_type": "conversation.clear"})
    );
    chat.close().await.unwrap();
}

#[tokio::test]
async fn generic_handlers_see_unknown_events() {
    let (coze, peer) = coze();
    let speech = coze.speech();
    let seen = Arc::new(Mutex::new(None));
    {
        let seen = Arc::clone(&seen);
        speech.on_event(EventType::from("speech.future"), move |event: Event| {
            let seen = Arc::clone(&seen);
            async move {
                if let Payload::Unknown { data, .. } = event.payload {
                    *seen.lock().unwrap() = data;
                }
                Ok(())
            }
        });
    }
    speech.connect().await.unwrap();

    peer.push(r#"{"event_type":"speech.future","data":{"x":1}}"#);
    speech
        .wait_for_event(
            &[EventType::from("speech.future")],
            coze_rt_rs::WaitMode::Any,
            TIMEOUT,
        )
        .await
        .unwrap();
    speech.close().await.unwrap();
    assert_eq!(*seen.lock().unwrap(), Some(json!({"x": 1})));
}
