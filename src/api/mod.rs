use serde::{Deserialize, Serialize};

pub mod client;

pub use client::{ApiError, ChatBackend, GenerativeClient};

/// Model used when the CLI does not override it.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default generative-language API endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Part {
    pub text: String,
}

/// One turn of history as the API expects it: a role plus text parts.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Content {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Serialize, Debug)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(
        rename = "systemInstruction",
        skip_serializing_if = "Option::is_none"
    )]
    pub system_instruction: Option<SystemInstruction>,
}

#[derive(Deserialize, Debug)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[derive(Deserialize, Debug)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, or `None` when the response
    /// carried no text at all.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        if content.parts.is_empty() {
            return None;
        }
        Some(
            content
                .parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<String>(),
        )
    }
}

/// Error envelope returned by the API on non-success statuses.
#[derive(Deserialize, Debug)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Deserialize, Debug)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_system_instruction_in_camel_case() {
        let request = GenerateRequest {
            contents: vec![Content::text("user", "hi")],
            system_instruction: Some(SystemInstruction {
                parts: vec![Part {
                    text: "be brief".to_string(),
                }],
            }),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"systemInstruction\""));
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn request_omits_absent_system_instruction() {
        let request = GenerateRequest {
            contents: vec![Content::text("user", "hi")],
            system_instruction: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("systemInstruction"));
    }

    #[test]
    fn response_text_concatenates_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello"},{"text":" there"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello there"));
    }

    #[test]
    fn empty_responses_yield_no_text() {
        let response: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(response.text().is_none());
        let response: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[]}}]}"#).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn error_envelope_parses_api_errors() {
        let envelope: ErrorEnvelope = serde_json::from_str(
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .unwrap();
        assert_eq!(envelope.error.code, Some(429));
        assert_eq!(envelope.error.status.as_deref(), Some("RESOURCE_EXHAUSTED"));
    }
}
