//! HTTP client for the OpenWeather API.
//!
//! Every request carries JSON `Content-Type`/`Accept` headers and the `appid`
//! query parameter taken from [`ApiConfig`]. Failures are collapsed into
//! [`ApiError`], whose `Display` is the message shown to the user.

use std::time::Duration;

use reqwest::{
    Client, RequestBuilder, StatusCode,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::Serialize;
use serde_json::Value;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const API_KEY_PARAM: &str = "appid";
const FALLBACK_MESSAGE: &str = "An error occurred";

/// Where to send requests and which key to authenticate them with.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Server error. Please try again later.")]
    Server,

    /// Any other error status; carries the upstream message.
    #[error("{0}")]
    Response(String),

    /// No response was received.
    #[error("Network error. Please check your internet connection.")]
    Network(#[source] reqwest::Error),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ApiError::Transport(err)
        } else if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
            ApiError::Network(err)
        } else {
            ApiError::Transport(err)
        }
    }

    fn from_status(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            return ApiError::Server;
        }

        ApiError::Response(error_message(body))
    }
}

/// Prefer the JSON `message` field, then the raw body, then a fixed fallback.
fn error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::String(message)) = map.get("message") {
            if !message.is_empty() {
                return message.clone();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        FALLBACK_MESSAGE.to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    config: ApiConfig,
    http: Client,
}

impl HttpClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn get<Q>(&self, path: &str, query: &Q) -> Result<Value, ApiError>
    where
        Q: Serialize + ?Sized,
    {
        self.send(self.http.get(self.url(path)).query(query)).await
    }

    pub async fn post<B>(&self, path: &str, body: &B) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    pub async fn put<B>(&self, path: &str, body: &B) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.http.put(self.url(path)).json(body)).await
    }

    pub async fn patch<B>(&self, path: &str, body: &B) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.http.patch(self.url(path)).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.send(self.http.delete(self.url(path))).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        #[cfg(debug_assertions)]
        tracing::debug!(api_key = %self.config.api_key, "injecting API key");

        let request = request.query(&[(API_KEY_PARAM, self.config.api_key.as_str())]);

        let response = request.send().await.map_err(ApiError::from_transport)?;
        let status = response.status();
        let url = response.url().path().to_string();

        if !status.is_success() {
            tracing::debug!(%status, path = %url, "request failed");
            // A response arrived, so an unreadable body still maps by status.
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let body = response.text().await.map_err(ApiError::from_transport)?;

        tracing::debug!(%status, path = %url, "request succeeded");
        Ok(parse_body(&body))
    }
}

fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }

    serde_json::from_str(body).unwrap_or_else(|err| {
        tracing::warn!("response body is not JSON: {err}");
        Value::Null
    })
}
