pub mod audio;
pub mod chat;
pub mod common;
pub mod speech;
pub mod transcriptions;

pub use audio::{
    InputAudio, LimitConfig, OpusConfig, OutputAudio, PcmConfig, TurnDetection, TurnDetectionType,
};
pub use chat::{
    Chat, ChatCancelData, ChatConfig, ChatError, ChatStatus, ChatUpdateData, ChatUsage, ContentType,
    FunctionCall, Message, MessageCreateData, MessageType, RequiredAction, Role, SentenceStartData,
    SubmitToolOutputsAction, SubmitToolOutputsData, ToolCall, ToolOutput, TranscriptData,
};
pub use common::{ClientErrorData, ErrorData, EventDetail};
pub use speech::{
    InputTextBufferAppendData, SpeechAudioCompletedData, SpeechAudioUpdateData, SpeechCreatedData,
    SpeechUpdateData,
};
pub use transcriptions::{
    InputAudioBufferAppendData, TranscriptionsMessageData, TranscriptionsUpdateData,
};
