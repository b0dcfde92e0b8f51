use coze_rt_rs::models::{
    Chat, ChatStatus, ContentType, EventDetail, Message, MessageCreateData, OutputAudio, Role,
    SpeechAudioUpdateData, SpeechUpdateData, SubmitToolOutputsData, ToolOutput,
};
use coze_rt_rs::{Codec, Error, Event, EventRegistry, EventType, Payload};
use serde_json::{Value, json};
use std::sync::Arc;

fn round_trip(event: &Event) -> Event {
    let codec = Codec::default();
    let frame = codec.encode(event).expect("encodes");
    codec.decode(frame.as_bytes()).expect("decodes")
}

#[test]
fn outbound_events_survive_a_round_trip() {
    let events = [
        Event::new(Payload::SpeechUpdate(SpeechUpdateData {
            output_audio: Some(OutputAudio::pcm(24_000).voice("voice_1")),
        }))
        .with_id("evt_1"),
        Event::new(Payload::ConversationMessageCreate(MessageCreateData::user_text(
            "what's the weather?",
        ))),
        Event::new(Payload::ConversationChatSubmitToolOutputs(SubmitToolOutputsData {
            chat_id: "chat_1".to_string(),
            tool_outputs: vec![ToolOutput::new("call_1", "sunny")],
        })),
        Event::new(Payload::InputAudioBufferClear).with_detail(EventDetail {
            log_id: Some("log_1".to_string()),
            origin_message: None,
        }),
    ];
    for event in &events {
        assert_eq!(&round_trip(event), event);
    }
}

#[test]
fn unknown_tags_are_preserved() {
    let codec = Codec::default();
    let raw = json!({
        "event_type": "conversation.future_feature",
        "id": "evt_9",
        "data": {"anything": [1, 2, 3]}
    })
    .to_string();

    let event = codec.decode(raw.as_bytes()).unwrap();
    assert_eq!(
        event.event_type(),
        EventType::Other("conversation.future_feature".to_string())
    );
    match &event.payload {
        Payload::Unknown { data, .. } => assert_eq!(data, &Some(json!({"anything": [1, 2, 3]}))),
        other => panic!("unexpected payload: {other:?}"),
    }

    let encoded: Value = serde_json::from_str(&codec.encode(&event).unwrap()).unwrap();
    let original: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(encoded, original);
}

#[test]
fn malformed_frames_are_rejected() {
    let codec = Codec::default();
    assert!(matches!(codec.decode(b"not json"), Err(Error::Serialization(_))));
    assert!(matches!(codec.decode(br#"{"id":"evt_1"}"#), Err(Error::Serialization(_))));
    assert!(matches!(
        codec.decode(br#"{"event_type":"input_text_buffer.append","data":{"delta":5}}"#),
        Err(Error::Decode { .. })
    ));
}

#[test]
fn chat_events_decode_nested_state() {
    let codec = Codec::default();
    let raw = json!({
        "event_type": "conversation.chat.requires_action",
        "id": "evt_2",
        "detail": {"logid": "20250101"},
        "data": {
            "id": "chat_1",
            "conversation_id": "conv_1",
            "status": "requires_action",
            "required_action": {
                "type": "submit_tool_outputs",
                "submit_tool_outputs": {
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "weather", "arguments": "{\"city\":\"Paris\"}"}
                    }]
                }
            }
        }
    })
    .to_string();

    let event = codec.decode(raw.as_bytes()).unwrap();
    assert_eq!(event.log_id(), Some("20250101"));
    let chat: &Chat = event.chat().expect("chat payload");
    assert_eq!(chat.status, Some(ChatStatus::RequiresAction));
    let calls = chat.tool_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].function.as_ref().unwrap().name, "weather");
}

#[test]
fn message_delta_is_a_flat_message() {
    let codec = Codec::default();
    let raw = json!({
        "event_type": "conversation.message.delta",
        "data": {
            "id": "msg_1",
            "role": "assistant",
            "type": "answer",
            "content": "Hel",
            "content_type": "text",
            "chat_id": "chat_1"
        }
    })
    .to_string();

    let event = codec.decode(raw.as_bytes()).unwrap();
    let message: &Message = event.message().expect("message payload");
    assert_eq!(message.content, "Hel");
    assert_eq!(message.role, Some(Role::Assistant));
    assert_eq!(message.content_type, Some(ContentType::Text));
}

#[test]
fn unrecognised_enum_values_do_not_fail_decoding() {
    let codec = Codec::default();
    let raw = br#"{"event_type":"conversation.chat.completed","data":{"id":"c","conversation_id":"v","status":"archived"}}"#;
    let event = codec.decode(raw).unwrap();
    assert_eq!(event.chat().unwrap().status, Some(ChatStatus::Unknown));
}

#[test]
fn custom_registry_can_override_a_decoder() {
    let registry = EventRegistry::standard().with(EventType::SpeechCreated, |_| {
        Ok(Payload::Closed)
    });
    let codec = Codec::new(Arc::new(registry));
    let event = codec
        .decode(br#"{"event_type":"speech.created","data":{"session_id":"s"}}"#)
        .unwrap();
    assert_eq!(event.payload, Payload::Closed);
}

fn full_chat(status: &str) -> Value {
    json!({
        "id": "chat_1",
        "conversation_id": "conv_1",
        "bot_id": "bot_1",
        "status": status,
        "created_at": 1_700_000_000,
        "completed_at": 1_700_000_050,
        "failed_at": 1_700_000_060,
        "last_error": {"code": 4001, "msg": "quota"},
        "required_action": {
            "type": "submit_tool_outputs",
            "submit_tool_outputs": {"tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {"name": "weather", "arguments": "{\"city\":\"Paris\"}"}
            }]}
        },
        "usage": {"token_count": 30, "output_count": 20, "input_count": 10}
    })
}

fn full_message(content: &str) -> Value {
    json!({
        "id": "msg_1",
        "conversation_id": "conv_1",
        "bot_id": "bot_1",
        "chat_id": "chat_1",
        "role": "assistant",
        "type": "answer",
        "content": content,
        "content_type": "text"
    })
}

/// A `data` object with every field set, or `None` for data-less tags.
fn populated_data(tag: &EventType) -> Option<Value> {
    let output_audio = json!({
        "codec": "opus",
        "pcm_config": {"sample_rate": 24_000, "frame_size_ms": 20.0, "limit_config": {"period": 1, "max_frame_num": 22}},
        "opus_config": {"bitrate": 48_000, "use_cbr": true, "frame_size_ms": 60.0, "limit_config": {"period": 1, "max_frame_num": 18}},
        "speech_rate": 20,
        "voice_id": "voice_1"
    });
    let input_audio = json!({
        "format": "pcm", "codec": "pcm", "sample_rate": 16_000, "channel": 1, "bit_depth": 16
    });
    let data = match tag {
        EventType::Error => json!({"code": 4000, "msg": "bad request"}),
        EventType::ClientError => json!({"message": "failed to write frame"}),
        EventType::SpeechUpdate | EventType::SpeechUpdated => json!({"output_audio": output_audio}),
        EventType::InputTextBufferAppend => json!({"delta": "hello"}),
        EventType::SpeechCreated | EventType::SpeechAudioCompleted => {
            json!({"session_id": "sess_1"})
        }
        EventType::SpeechAudioUpdate | EventType::InputAudioBufferAppend => {
            json!({"delta": "AQID"})
        }
        EventType::TranscriptionsUpdate | EventType::TranscriptionsUpdated => {
            json!({"input_audio": input_audio})
        }
        EventType::TranscriptionsMessageUpdate
        | EventType::ConversationAudioTranscriptUpdate
        | EventType::ConversationAudioTranscriptCompleted => json!({"content": "hello there"}),
        EventType::ChatUpdate | EventType::ChatUpdated => json!({
            "chat_config": {
                "conversation_id": "conv_1",
                "user_id": "user_1",
                "meta_data": {"k": "v"},
                "custom_variables": {"name": "Ada"},
                "auto_save_history": true
            },
            "input_audio": input_audio,
            "output_audio": output_audio,
            "turn_detection": {"type": "server_vad", "prefix_padding_ms": 300, "silence_duration_ms": 500}
        }),
        EventType::ConversationMessageCreate => {
            json!({"role": "user", "content_type": "object_string", "content": "[]"})
        }
        EventType::ConversationChatSubmitToolOutputs => json!({
            "chat_id": "chat_1",
            "tool_outputs": [{"tool_call_id": "call_1", "output": "sunny"}]
        }),
        EventType::ConversationChatCancel => json!({"chat_id": "chat_1"}),
        EventType::ConversationChatCreated => full_chat("created"),
        EventType::ConversationChatInProgress => full_chat("in_progress"),
        EventType::ConversationChatCompleted => full_chat("completed"),
        EventType::ConversationChatFailed => full_chat("failed"),
        EventType::ConversationChatCanceled => full_chat("canceled"),
        EventType::ConversationChatRequiresAction => full_chat("requires_action"),
        EventType::ConversationMessageDelta | EventType::ConversationMessageCompleted => {
            full_message("Hello")
        }
        EventType::ConversationAudioDelta | EventType::ConversationAudioCompleted => {
            full_message("AQID")
        }
        EventType::ConversationAudioSentenceStart => json!({"text": "Hello."}),
        _ => return None,
    };
    Some(data)
}

#[test]
fn every_registered_event_survives_a_round_trip() {
    let codec = Codec::default();
    for (n, tag) in EventType::KNOWN.iter().enumerate() {
        let mut raw = json!({
            "event_type": tag.as_str(),
            "id": format!("evt_{n}"),
            "detail": {"logid": "log_1", "origin_message": "{}"}
        });
        if let Some(data) = populated_data(tag) {
            raw["data"] = data;
        }

        let event = codec.decode(raw.to_string().as_bytes()).unwrap();
        assert_eq!(&event.event_type(), tag);
        assert!(
            !matches!(event.payload, Payload::Unknown { .. }),
            "{tag} has no typed payload"
        );

        let frame = codec.encode(&event).unwrap();
        assert_eq!(codec.decode(frame.as_bytes()).unwrap(), event, "{tag}");
        let written: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(written, raw, "{tag} lost a field");
    }
}

#[test]
fn missing_fields_decode_as_zero_values() {
    let codec = Codec::default();
    for tag in EventType::KNOWN {
        for frame in [
            json!({"event_type": tag.as_str(), "data": {}}),
            json!({"event_type": tag.as_str()}),
        ] {
            let decoded = codec.decode(frame.to_string().as_bytes());
            assert!(decoded.is_ok(), "{tag}: {decoded:?}");
        }
    }

    let event = codec
        .decode(br#"{"event_type":"speech.audio.update","data":{}}"#)
        .unwrap();
    assert_eq!(event.payload, Payload::SpeechAudioUpdate(SpeechAudioUpdateData::default()));
}
