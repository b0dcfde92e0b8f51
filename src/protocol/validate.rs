use base64::Engine as _;
use base64::engine::general_purpose;

use super::events::{Event, Payload};
use crate::{Error, Result};

/// Reject outbound events the server would refuse or that only make sense locally.
///
/// # Errors
/// Returns [`Error::InvalidClientEvent`] describing the first problem found.
#[allow(clippy::result_large_err)]
pub fn validate_client_event(event: &Event) -> Result<()> {
    let event_type = event.event_type();
    if event_type.is_local() {
        return Err(Error::InvalidClientEvent(format!(
            "`{event_type}` is generated locally and cannot be sent"
        )));
    }

    match &event.payload {
        Payload::InputAudioBufferAppend(data) => {
            if let Err(err) = general_purpose::STANDARD.decode(&data.delta) {
                return Err(Error::InvalidClientEvent(format!(
                    "input_audio_buffer.append delta is not valid base64: {err}"
                )));
            }
        }
        Payload::ConversationChatSubmitToolOutputs(data) => {
            if data.chat_id.is_empty() {
                return Err(Error::InvalidClientEvent(
                    "conversation.chat.submit_tool_outputs requires a chat_id".to_string(),
                ));
            }
            if data.tool_outputs.is_empty() {
                return Err(Error::InvalidClientEvent(
                    "conversation.chat.submit_tool_outputs requires at least one output"
                        .to_string(),
                ));
            }
        }
        Payload::ConversationChatCancel(data) if data.chat_id.is_empty() => {
            return Err(Error::InvalidClientEvent(
                "conversation.chat.cancel requires a chat_id".to_string(),
            ));
        }
        _ => {}
    }
    Ok(())
}
