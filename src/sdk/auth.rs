use crate::{Error, Result};
use async_trait::async_trait;

/// Supplies the bearer credential for each handshake.
///
/// Implementations may perform network I/O (for example an OAuth refresh).
#[async_trait]
pub trait Auth: Send + Sync {
    /// # Errors
    /// Returns an error if no token can be obtained; the connection is not opened.
    async fn token(&self) -> Result<String>;
}

/// A fixed personal access token.
#[derive(Clone)]
pub struct TokenAuth {
    token: String,
}

impl TokenAuth {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuth").field("token", &"<redacted>").finish()
    }
}

#[async_trait]
impl Auth for TokenAuth {
    async fn token(&self) -> Result<String> {
        if self.token.is_empty() {
            return Err(Error::Auth("access token is empty".to_string()));
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_auth_returns_token() {
        let auth = TokenAuth::new("pat_123");
        assert_eq!(auth.token().await.unwrap(), "pat_123");
        assert!(!format!("{auth:?}").contains("pat_123"));
    }

    #[tokio::test]
    async fn empty_token_is_rejected() {
        let err = TokenAuth::new("").token().await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
