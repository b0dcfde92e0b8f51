use super::auth::{Auth, TokenAuth};
use super::builder::{ClientOptions, ClientParts, Endpoint};
use super::chat::{CHAT_PATH, ChatClient, CreateChatRequest};
use super::client::WebSocketClient;
use super::speech::{SPEECH_PATH, SpeechClient};
use super::transcriptions::{
    CreateTranscriptionsRequest, TRANSCRIPTIONS_PATH, TranscriptionsClient,
};
use crate::protocol::EventRegistry;
use crate::transport::{Connector, WsConnector};
use crate::{CN_BASE_URL, Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Environment variable holding the access token for [`CozeWebSockets::from_env`].
pub const TOKEN_ENV: &str = "COZE_API_TOKEN";
/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "COZE_API_BASE";

/// Entry point: one configuration, many channels.
///
/// Each channel method returns a new, unconnected client.
///
/// ```no_run
/// # async fn run() -> coze_rt_rs::Result<()> {
/// use coze_rt_rs::{CN_BASE_URL, CozeWebSockets, TokenAuth};
///
/// let coze = CozeWebSockets::new(CN_BASE_URL, TokenAuth::new("pat_..."));
/// let speech = coze.speech();
/// speech.connect().await?;
/// speech.input_text_buffer_append("hello")?;
/// speech.input_text_buffer_complete()?;
/// speech.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CozeWebSockets {
    base_url: String,
    auth: Arc<dyn Auth>,
    options: ClientOptions,
    connector: Option<Arc<dyn Connector>>,
    registry: Arc<EventRegistry>,
}

impl CozeWebSockets {
    #[must_use]
    pub fn new(base_url: impl Into<String>, auth: impl Auth + 'static) -> Self {
        Self::with_shared_auth(base_url, Arc::new(auth))
    }

    #[must_use]
    pub fn with_shared_auth(base_url: impl Into<String>, auth: Arc<dyn Auth>) -> Self {
        Self {
            base_url: base_url.into(),
            auth,
            options: ClientOptions::default(),
            connector: None,
            registry: Arc::new(EventRegistry::standard()),
        }
    }

    /// Read the token from `COZE_API_TOKEN` and the base URL from
    /// `COZE_API_BASE`, defaulting to [`CN_BASE_URL`].
    ///
    /// # Errors
    /// Returns [`Error::Auth`] if the token variable is unset or empty.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Auth(format!("{TOKEN_ENV} is not set")))?;
        let base_url = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| CN_BASE_URL.to_string());
        Ok(Self::new(base_url, TokenAuth::new(token)))
    }

    #[must_use]
    pub const fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the default [`WsConnector`] for every channel created afterwards.
    #[must_use]
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Arc<EventRegistry>) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    #[must_use]
    pub fn speech(&self) -> SpeechClient {
        SpeechClient::new(self.client(SPEECH_PATH, BTreeMap::new()))
    }

    #[must_use]
    pub fn transcriptions(&self, request: &CreateTranscriptionsRequest) -> TranscriptionsClient {
        TranscriptionsClient::new(self.client(TRANSCRIPTIONS_PATH, request.to_query()))
    }

    #[must_use]
    pub fn chat(&self, request: &CreateChatRequest) -> ChatClient {
        ChatClient::new(self.client(CHAT_PATH, request.to_query()))
    }

    fn client(&self, path: &str, query: BTreeMap<String, String>) -> WebSocketClient {
        WebSocketClient::from_parts(ClientParts {
            endpoint: Endpoint {
                base_url: self.base_url.clone(),
                path: path.to_string(),
                query,
            },
            auth: Arc::clone(&self.auth),
            connector: self
                .connector
                .clone()
                .unwrap_or_else(|| Arc::new(WsConnector) as Arc<dyn Connector>),
            registry: Arc::clone(&self.registry),
            options: self.options,
        })
    }
}

impl std::fmt::Debug for CozeWebSockets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CozeWebSockets")
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
