use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::message::Message;
use crate::utils::id::new_id;

/// Title given to a session before title synthesis has run.
pub const NEW_CHAT_TITLE: &str = "New Chat";

/// One conversation thread. Messages are append-only from the user's point
/// of view; error notices are appended with the model role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: new_id(),
            title: NEW_CHAT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// The session collection plus the active-session pointer.
///
/// The pointer is normalized on every mutation: it always names an existing
/// session, falling back to the first one, or to none when the list is empty.
#[derive(Debug, Default)]
pub struct SessionList {
    sessions: Vec<ChatSession>,
    active_id: Option<String>,
}

impl SessionList {
    pub fn new(sessions: Vec<ChatSession>, active_id: Option<String>) -> Self {
        let mut list = Self {
            sessions,
            active_id,
        };
        list.ensure_active();
        list
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&ChatSession> {
        let id = self.active_id.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn active_mut(&mut self) -> Option<&mut ChatSession> {
        let id = self.active_id.clone()?;
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Create a session, insert it at the head of the list, and make it
    /// active. Returns its id.
    pub fn open_new(&mut self) -> String {
        let session = ChatSession::new();
        let id = session.id.clone();
        self.sessions.insert(0, session);
        self.active_id = Some(id.clone());
        id
    }

    /// Switch the active pointer to an existing session. Returns false when
    /// the id names no session (pointer unchanged).
    pub fn switch_to(&mut self, id: &str) -> bool {
        if self.sessions.iter().any(|s| s.id == id) {
            self.active_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Re-point the active id at an existing session, preferring the first
    /// one when the current pointer is missing or dangling.
    pub fn ensure_active(&mut self) {
        let exists = self
            .active_id
            .as_deref()
            .map(|id| self.sessions.iter().any(|s| s.id == id))
            .unwrap_or(false);
        if !exists {
            self.active_id = self.sessions.first().map(|s| s.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sessions_start_untitled_and_empty() {
        let session = ChatSession::new();
        assert_eq!(session.title, NEW_CHAT_TITLE);
        assert!(session.messages.is_empty());
    }

    #[test]
    fn open_new_inserts_at_head_and_activates() {
        let mut list = SessionList::default();
        let first = list.open_new();
        let second = list.open_new();
        assert_eq!(list.sessions()[0].id, second);
        assert_eq!(list.sessions()[1].id, first);
        assert_eq!(list.active_id(), Some(second.as_str()));
    }

    #[test]
    fn switch_to_unknown_id_is_refused() {
        let mut list = SessionList::default();
        let id = list.open_new();
        assert!(!list.switch_to("nope"));
        assert_eq!(list.active_id(), Some(id.as_str()));
    }

    #[test]
    fn dangling_active_id_falls_back_to_first_session() {
        let a = ChatSession::new();
        let first_id = a.id.clone();
        let list = SessionList::new(vec![a], Some("gone".to_string()));
        assert_eq!(list.active_id(), Some(first_id.as_str()));
    }

    #[test]
    fn empty_list_has_no_active_session() {
        let list = SessionList::new(Vec::new(), Some("gone".to_string()));
        assert_eq!(list.active_id(), None);
        assert!(list.active().is_none());
    }
}
