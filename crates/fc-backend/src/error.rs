//! Backend error handling
//!
//! The hosted API reports failures as JSON bodies whose message lives under
//! different keys depending on the service (`error_description` and `msg` for
//! auth, `message` for the REST layer). They are normalised here into the
//! `ProviderError` / `StoreError` types the core understands.

use fc_auth::ProviderError;
use fc_common::StoreError;
use reqwest::Response;
use thiserror::Error;

/// Failure building the client itself.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Invalid backend configuration: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

const MESSAGE_KEYS: &[&str] = &["error_description", "msg", "message", "error"];

/// Extract the human-readable message from an error body.
pub fn parse_error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in MESSAGE_KEYS {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                if !message.trim().is_empty() {
                    return message.to_string();
                }
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        body.to_string()
    }
}

async fn read_failure(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    (status, parse_error_message(status, &body))
}

pub(crate) async fn provider_ok(response: Response) -> Result<Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let (status, message) = read_failure(response).await;
    Err(ProviderError::new(Some(status), message))
}

pub(crate) async fn store_ok(response: Response) -> Result<Response, StoreError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let (status, message) = read_failure(response).await;
    Err(StoreError::rejected(status, message))
}

pub(crate) fn provider_transport(error: reqwest::Error) -> ProviderError {
    ProviderError::transport(error.to_string())
}

pub(crate) fn store_transport(error: reqwest::Error) -> StoreError {
    if error.is_decode() {
        StoreError::Decode(error.to_string())
    } else {
        StoreError::Transport(error.to_string())
    }
}

/// Account administration goes through the auth service but reports as a store.
pub(crate) fn provider_to_store(error: ProviderError) -> StoreError {
    match error.status {
        Some(status) => StoreError::rejected(status, error.message),
        None => StoreError::Transport(error.message),
    }
}
