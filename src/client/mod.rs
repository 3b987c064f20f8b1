//! DigitalOcean v1 API client
//!
//! Every call is a GET or POST with the account's `client_id` and `api_key`
//! appended as query parameters. Responses are JSON envelopes; the resource
//! is pulled out of its key and anything carrying an `error_message` is
//! turned into [`ClientError::Api`].

mod endpoints;
mod models;

pub use endpoints::DropletAction;
pub use models::*;

use crate::config::ApiConfig;
use crate::CredentialRecord;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// API client errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Status code: {0}")]
    Status(u16),

    #[error("{0}")]
    Api(String),

    #[error("Empty json!")]
    EmptyResponse,

    #[error("Response is missing '{0}'")]
    MissingField(&'static str),

    #[error("Unexpected response shape: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// HTTP methods the API accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// Query parameters for a single call
pub(crate) type Params = Vec<(&'static str, String)>;

/// DigitalOcean API client
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    credentials: CredentialRecord,
}

impl Client {
    /// Create a client for the default API endpoint
    pub fn new(credentials: CredentialRecord) -> Result<Self, ClientError> {
        Self::with_config(credentials, &ApiConfig::default())
    }

    /// Create a client for a configured endpoint
    pub fn with_config(credentials: CredentialRecord, config: &ApiConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url())
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url(), e)))?;

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Issue a call and unwrap the JSON envelope
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        mut params: Params,
    ) -> Result<Value, ClientError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))?;

        debug!(?method, %url, "API request");

        params.push(("client_id", self.credentials.client_id.clone()));
        params.push(("api_key", self.credentials.api_key.expose().to_string()));

        let mut request = self.http.request(method.into(), url).query(&params);
        if method == Method::Post {
            request = request.header(reqwest::header::CONTENT_TYPE, "application/json");
        }

        let response = request.send().await.map_err(redact)?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), path, "API returned error status");
            return Err(ClientError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(redact)?;
        unwrap_envelope(parse_body(&body)?)
    }
}

/// The request URL carries the API key, so it never reaches error text
fn redact(e: reqwest::Error) -> ClientError {
    ClientError::Http(e.without_url())
}

/// An empty body counts as an empty envelope
fn parse_body(body: &[u8]) -> Result<Value, ClientError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ClientError::EmptyResponse);
    }

    serde_json::from_slice(body).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Reject empty bodies and API-level errors
fn unwrap_envelope(json: Value) -> Result<Value, ClientError> {
    let empty = match &json {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        return Err(ClientError::EmptyResponse);
    }

    if let Some(message) = json
        .get("error_message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
    {
        return Err(ClientError::Api(message.to_string()));
    }

    if json.get("status").and_then(Value::as_str) == Some("ERROR") {
        let message = json
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(ClientError::Api(message.to_string()));
    }

    Ok(json)
}

/// Pull a required resource out of the envelope
fn field<T: DeserializeOwned>(json: &mut Value, key: &'static str) -> Result<T, ClientError> {
    let value = json
        .get_mut(key)
        .map(Value::take)
        .filter(|v| !v.is_null())
        .ok_or(ClientError::MissingField(key))?;

    serde_json::from_value(value).map_err(|e| ClientError::Decode(format!("{}: {}", key, e)))
}

/// Pull a list out of the envelope; a missing key is an empty list
fn list<T: DeserializeOwned>(json: &mut Value, key: &'static str) -> Result<Vec<T>, ClientError> {
    match json.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => {
            serde_json::from_value(value).map_err(|e| ClientError::Decode(format!("{}: {}", key, e)))
        }
    }
}
