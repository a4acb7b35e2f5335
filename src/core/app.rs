//! Application root state
//!
//! [`App`] owns every mutable slice: settings, the session list, the code
//! workspace, and the credential state. All mutations go through its
//! methods, and [`App::persist`] flushes the session/workspace slices back
//! to the store after each turn.

use std::sync::Arc;

use tracing::warn;

use crate::api::{ChatBackend, GenerativeClient};
use crate::auth::{self, Credential, CredentialStatus};
use crate::core::config::Settings;
use crate::core::conversation::{
    ConversationController, INVALID_KEY_MESSAGE, NO_KEY_MESSAGE, SERVICE_UNAVAILABLE_MESSAGE,
};
use crate::core::session::SessionList;
use crate::core::workspace::Workspace;
use crate::storage::{self, StorageError, StringStore};

pub struct App {
    pub settings: Settings,
    pub sessions: SessionList,
    pub workspace: Workspace,
    pub credential_status: CredentialStatus,
    pub(crate) sending_chat: Option<String>,
    pub(crate) credential: Option<Credential>,
    pub(crate) backend: Option<Arc<dyn ChatBackend>>,
    store: Box<dyn StringStore>,
    model: String,
    base_url: String,
}

impl App {
    /// Load all persisted slices from the store and resolve the credential.
    pub fn new(
        store: Box<dyn StringStore>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let model = model.into();
        let base_url = base_url.into();

        let settings = storage::load_settings(store.as_ref());
        let sessions = SessionList::new(
            storage::load_sessions(store.as_ref()),
            storage::load_active_session(store.as_ref()),
        );
        let workspace = Workspace::from_files(storage::load_code_files(store.as_ref()));

        let credential = auth::resolve_credential(store.as_ref());
        let backend = credential
            .as_ref()
            .map(|c| make_client(c.key(), &model, &base_url));

        Self {
            settings,
            sessions,
            workspace,
            credential_status: CredentialStatus::Unknown,
            sending_chat: None,
            credential,
            backend,
            store,
            model,
            base_url,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn backend(&self) -> Option<Arc<dyn ChatBackend>> {
        self.backend.clone()
    }

    /// Replace the chat backend. This is the dependency seam the tests use.
    pub fn install_backend(&mut self, backend: Arc<dyn ChatBackend>) {
        self.backend = Some(backend);
    }

    /// Build a client for a candidate key, e.g. for a validation probe.
    pub fn probe_client(&self, api_key: &str) -> Arc<dyn ChatBackend> {
        make_client(api_key, &self.model, &self.base_url)
    }

    pub fn conversation(&mut self) -> ConversationController<'_> {
        ConversationController::new(self)
    }

    /// Why chat is currently refused, or `None` when sends may proceed.
    ///
    /// A user-supplied key must have passed validation; an environment key
    /// is trusted as the server-configured default.
    pub fn unavailable_reason(&self) -> Option<&'static str> {
        match &self.credential {
            None => Some(NO_KEY_MESSAGE),
            Some(credential) if credential.is_user_supplied() => match self.credential_status {
                CredentialStatus::Valid => None,
                CredentialStatus::Invalid => Some(INVALID_KEY_MESSAGE),
                CredentialStatus::Unknown | CredentialStatus::Checking => {
                    Some(SERVICE_UNAVAILABLE_MESSAGE)
                }
            },
            Some(_) => None,
        }
    }

    /// Store a user-supplied key. The caller schedules the validation probe;
    /// until its verdict arrives the status is `Checking`.
    pub fn set_api_key(&mut self, api_key: String) -> Result<(), StorageError> {
        storage::save_api_key(self.store.as_ref(), &api_key)?;
        self.backend = Some(make_client(&api_key, &self.model, &self.base_url));
        self.credential = Some(Credential::Stored(api_key));
        self.credential_status = CredentialStatus::Checking;
        Ok(())
    }

    /// Forget the stored key, falling back to the environment if set there.
    pub fn clear_api_key(&mut self) -> Result<(), StorageError> {
        storage::clear_api_key(self.store.as_ref())?;
        self.credential = auth::resolve_credential(self.store.as_ref());
        self.backend = self
            .credential
            .as_ref()
            .map(|c| make_client(c.key(), &self.model, &self.base_url));
        self.credential_status = CredentialStatus::Unknown;
        Ok(())
    }

    pub fn apply_credential_verdict(&mut self, status: CredentialStatus) {
        self.credential_status = status;
    }

    /// Start a fresh conversation. The workspace is reset along with it.
    pub fn new_chat(&mut self) -> String {
        let id = self.sessions.open_new();
        self.workspace.reset();
        self.persist();
        id
    }

    /// Switch to another conversation. The workspace does not follow the
    /// session; it is cleared on every switch.
    pub fn switch_chat(&mut self, id: &str) -> bool {
        if !self.sessions.switch_to(id) {
            return false;
        }
        self.workspace.reset();
        self.persist();
        true
    }

    pub fn save_settings(&self) -> Result<(), StorageError> {
        storage::save_settings(self.store.as_ref(), &self.settings)
    }

    /// Flush sessions, code files, and the active-session pointer. Failures
    /// are logged, not fatal: the in-memory state stays authoritative.
    pub fn persist(&self) {
        if let Err(err) = storage::save_sessions(self.store.as_ref(), self.sessions.sessions()) {
            warn!("failed to persist sessions: {err}");
        }
        if let Err(err) = storage::save_code_files(self.store.as_ref(), self.workspace.files()) {
            warn!("failed to persist code files: {err}");
        }
        if let Err(err) =
            storage::save_active_session(self.store.as_ref(), self.sessions.active_id())
        {
            warn!("failed to persist active session: {err}");
        }
    }
}

fn make_client(api_key: &str, model: &str, base_url: &str) -> Arc<dyn ChatBackend> {
    Arc::new(GenerativeClient::new(api_key, model, base_url))
}
