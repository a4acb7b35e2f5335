use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::id::new_id;

/// Speaker of a chat turn. Serialized as the wire strings `"user"` and
/// `"model"`, which are also what the generative API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_model(self) -> bool {
        self == Role::Model
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "model" => Ok(Role::Model),
            _ => Err(format!("invalid chat role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// One chat turn. `text_content` is the conversational part only; any fenced
/// code in a model reply has been extracted into the workspace and is
/// referenced here by id. The references are lookup keys, not ownership: the
/// workspace may drop an artifact later without touching the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text_content: String,
    #[serde(default)]
    pub artifact_ids: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, text_content: impl Into<String>, artifact_ids: Vec<String>) -> Self {
        Self {
            id: new_id(),
            role,
            text_content: text_content.into(),
            artifact_ids,
            timestamp: Utc::now(),
        }
    }

    pub fn user(text_content: impl Into<String>) -> Self {
        Self::new(Role::User, text_content, Vec::new())
    }

    pub fn model(text_content: impl Into<String>, artifact_ids: Vec<String>) -> Self {
        Self::new(Role::Model, text_content, artifact_ids)
    }
}
