//! HTTP client for the generative-language API
//!
//! Two call shapes, matching the two things the app needs: a history-based
//! chat completion and a stateless single-prompt completion (title synthesis
//! and credential probes). Any non-success outcome is an error, classified
//! just far enough for the conversation layer's wording to pick a message.

use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use tracing::debug;

use crate::api::{
    Content, ErrorEnvelope, GenerateRequest, GenerateResponse, Part, SystemInstruction,
};
use crate::utils::url::generate_content_url;

#[derive(Debug)]
pub enum ApiError {
    /// The API rejected the credential itself.
    InvalidCredential { message: String },

    /// The credential is out of quota.
    QuotaExceeded { message: String },

    /// Any other non-success status.
    Status { code: u16, message: String },

    /// Transport or decoding failure below the HTTP layer.
    Network(reqwest::Error),

    /// A success response that carried no text.
    EmptyResponse,
}

impl ApiError {
    pub(crate) fn from_status(code: u16, body: &str) -> Self {
        // Prefer the structured message when the body parses as the API's
        // error envelope.
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| body.to_string());

        match code {
            401 | 403 => ApiError::InvalidCredential { message },
            400 if message.contains("API key") => ApiError::InvalidCredential { message },
            429 => ApiError::QuotaExceeded { message },
            _ if message.to_lowercase().contains("quota") => ApiError::QuotaExceeded { message },
            _ => ApiError::Status { code, message },
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, ApiError::QuotaExceeded { .. })
    }

    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidCredential { .. } | ApiError::QuotaExceeded { .. }
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidCredential { message } => {
                write!(f, "API key rejected: {message}")
            }
            ApiError::QuotaExceeded { message } => {
                write!(f, "API quota exceeded: {message}")
            }
            ApiError::Status { code, message } => {
                write!(f, "API request failed with status {code}: {message}")
            }
            ApiError::Network(source) => write!(f, "API request failed: {source}"),
            ApiError::EmptyResponse => write!(f, "API response contained no text"),
        }
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ApiError::Network(source) => Some(source),
            _ => None,
        }
    }
}

/// The chat transport seam. The app talks to this trait; tests substitute a
/// scripted implementation.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Chat completion over an ordered turn history with a system
    /// instruction. An empty instruction is omitted from the request.
    async fn generate(
        &self,
        history: Vec<Content>,
        system_instruction: &str,
    ) -> Result<String, ApiError>;

    /// Stateless single-prompt completion.
    async fn generate_once(&self, prompt: &str) -> Result<String, ApiError>;
}

pub struct GenerativeClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GenerativeClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    async fn post(&self, request: &GenerateRequest) -> Result<String, ApiError> {
        let url = generate_content_url(&self.base_url, &self.model);
        debug!("requesting completion from {url}");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(ApiError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        let parsed = response
            .json::<GenerateResponse>()
            .await
            .map_err(ApiError::Network)?;
        parsed.text().ok_or(ApiError::EmptyResponse)
    }
}

#[async_trait]
impl ChatBackend for GenerativeClient {
    async fn generate(
        &self,
        history: Vec<Content>,
        system_instruction: &str,
    ) -> Result<String, ApiError> {
        let request = GenerateRequest {
            contents: history,
            system_instruction: (!system_instruction.is_empty()).then(|| SystemInstruction {
                parts: vec![Part {
                    text: system_instruction.to_string(),
                }],
            }),
        };
        self.post(&request).await
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, ApiError> {
        let request = GenerateRequest {
            contents: vec![Content::text("user", prompt)],
            system_instruction: None,
        };
        self.post(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_statuses_classify_as_invalid_credential() {
        assert!(matches!(
            ApiError::from_status(401, "nope"),
            ApiError::InvalidCredential { .. }
        ));
        assert!(matches!(
            ApiError::from_status(403, "forbidden"),
            ApiError::InvalidCredential { .. }
        ));
    }

    #[test]
    fn bad_request_mentioning_the_key_is_a_credential_failure() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            ApiError::from_status(400, body),
            ApiError::InvalidCredential { .. }
        ));
        // Plain 400s stay generic
        assert!(matches!(
            ApiError::from_status(400, "malformed request"),
            ApiError::Status { code: 400, .. }
        ));
    }

    #[test]
    fn quota_classifies_by_status_or_message() {
        assert!(ApiError::from_status(429, "slow down").is_quota_exceeded());
        let body = r#"{"error":{"message":"Quota exceeded for requests","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(ApiError::from_status(500, body).is_quota_exceeded());
    }

    #[test]
    fn envelope_message_is_preferred_over_the_raw_body() {
        let body = r#"{"error":{"code":503,"message":"try later","status":"UNAVAILABLE"}}"#;
        match ApiError::from_status(503, body) {
            ApiError::Status { code, message } => {
                assert_eq!(code, 503);
                assert_eq!(message, "try later");
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
