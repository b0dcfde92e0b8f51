use crate::{Error, Result};
use std::collections::BTreeMap;
use tokio_tungstenite::tungstenite::http::HeaderMap;
use tokio_tungstenite::tungstenite::http::header::{
    AUTHORIZATION, HeaderName, HeaderValue, USER_AGENT,
};
use url::Url;

const CLIENT_USER_AGENT_HEADER: &str = "x-coze-client-user-agent";
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve the socket URL for `path` on the API at `base_url`.
///
/// `http`/`https` become `ws`/`wss`, the public API hosts are mapped to their
/// WebSocket hosts, and `query` is appended in key order.
///
/// # Errors
/// Returns an error if `base_url` does not parse or uses an unsupported scheme.
#[allow(clippy::result_large_err)]
pub fn build_url(base_url: &str, path: &str, query: &BTreeMap<String, String>) -> Result<Url> {
    let mut url = Url::parse(base_url)?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(Error::InvalidUrl(format!("unsupported scheme `{other}`"))),
    };
    url.set_scheme(scheme)
        .map_err(|()| Error::InvalidUrl(format!("cannot switch {base_url} to {scheme}")))?;

    let ws_host = match url.host_str() {
        Some("api.coze.cn") => Some("ws.coze.cn"),
        Some("api.coze.com") => Some("ws.coze.com"),
        _ => None,
    };
    if let Some(host) = ws_host {
        url.set_host(Some(host))?;
    }

    url.set_path(path);
    if query.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(query);
    }
    Ok(url)
}

/// Headers attached to every handshake.
///
/// # Errors
/// Returns an error if the token contains characters not allowed in a header.
#[allow(clippy::result_large_err)]
pub fn handshake_headers(token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
    headers.insert(USER_AGENT, HeaderValue::from_str(&user_agent())?);
    headers.insert(
        HeaderName::from_static(CLIENT_USER_AGENT_HEADER),
        HeaderValue::from_str(&client_user_agent())?,
    );
    Ok(headers)
}

fn user_agent() -> String {
    format!("coze-rt-rs/{SDK_VERSION} rust/{}", std::env::consts::OS)
}

fn client_user_agent() -> String {
    serde_json::json!({
        "version": SDK_VERSION,
        "lang": "rust",
        "lang_version": env!("CARGO_PKG_RUST_VERSION"),
        "os_name": std::env::consts::OS,
        "os_arch": std::env::consts::ARCH,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_scheme_and_api_host() {
        let url = build_url("https://api.coze.cn", "/v1/chat", &BTreeMap::new()).unwrap();
        assert_eq!(url.as_str(), "wss://ws.coze.cn/v1/chat");

        let url = build_url("https://api.coze.com/", "/v1/audio/speech", &BTreeMap::new()).unwrap();
        assert_eq!(url.as_str(), "wss://ws.coze.com/v1/audio/speech");

        let url = build_url("http://127.0.0.1:8080", "/v1/chat", &BTreeMap::new()).unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:8080/v1/chat");
    }

    #[test]
    fn query_is_sorted() {
        let query = BTreeMap::from([
            ("workflow_id".to_string(), "wf".to_string()),
            ("bot_id".to_string(), "b 1".to_string()),
        ]);
        let url = build_url("https://example.com", "/v1/chat", &query).unwrap();
        assert_eq!(url.query(), Some("bot_id=b+1&workflow_id=wf"));
    }

    #[test]
    fn rejects_unknown_scheme() {
        let err = build_url("ftp://example.com", "/v1/chat", &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn headers_carry_bearer_token() {
        let headers = handshake_headers("tok").unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
        assert!(headers.contains_key(USER_AGENT));
        let info: serde_json::Value =
            serde_json::from_str(headers[CLIENT_USER_AGENT_HEADER].to_str().unwrap()).unwrap();
        assert_eq!(info["lang"], "rust");
    }
}
