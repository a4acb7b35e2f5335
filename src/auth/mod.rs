//! Credential handling
//!
//! The credential is an opaque string. It resolves from the store first and
//! the environment second; a user-supplied key must pass the validation
//! probe before chat is allowed, while an environment key is trusted as the
//! server-side default.
//!
//! Validation is debounced: each key change schedules a probe after a fixed
//! delay, and a newer change discards the pending timer. A probe already in
//! flight is never aborted; its verdict simply arrives late, as the last
//! scheduled verdict wins at the receiver.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::ChatBackend;
use crate::storage::{self, StringStore};

/// Environment variable consulted when no key is stored.
pub const CREDENTIAL_ENV_VAR: &str = "GEMINI_API_KEY";

/// Delay between a key change and its validation probe.
pub const VALIDATION_DEBOUNCE: Duration = Duration::from_millis(500);

/// Prompt used for the lightweight validation call.
const PROBE_PROMPT: &str = "test";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    Unknown,
    Checking,
    Valid,
    Invalid,
}

impl CredentialStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialStatus::Unknown => "unknown",
            CredentialStatus::Checking => "checking",
            CredentialStatus::Valid => "valid",
            CredentialStatus::Invalid => "invalid",
        }
    }
}

/// Where the effective credential came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Supplied by the user and persisted in the store.
    Stored(String),
    /// Taken from the environment (the server-configured default).
    Environment(String),
}

impl Credential {
    pub fn key(&self) -> &str {
        match self {
            Credential::Stored(key) | Credential::Environment(key) => key,
        }
    }

    pub fn is_user_supplied(&self) -> bool {
        matches!(self, Credential::Stored(_))
    }
}

/// Resolve the effective credential: stored key first, environment second.
pub fn resolve_credential(store: &dyn StringStore) -> Option<Credential> {
    if let Some(key) = storage::load_api_key(store) {
        return Some(Credential::Stored(key));
    }
    std::env::var(CREDENTIAL_ENV_VAR)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .map(Credential::Environment)
}

/// Debounced credential validation. Verdicts arrive on the channel handed
/// out at construction; the event loop drains it.
pub struct CredentialMonitor {
    tx: mpsc::UnboundedSender<CredentialStatus>,
    pending: Option<CancellationToken>,
    debounce: Duration,
}

impl CredentialMonitor {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CredentialStatus>) {
        Self::with_debounce(VALIDATION_DEBOUNCE)
    }

    pub fn with_debounce(
        debounce: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<CredentialStatus>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                pending: None,
                debounce,
            },
            rx,
        )
    }

    /// Schedule a probe against a backend built from the candidate key.
    /// Discards any probe still waiting out its debounce delay.
    pub fn schedule(&mut self, backend: Arc<dyn ChatBackend>) {
        self.cancel_pending();

        let token = CancellationToken::new();
        self.pending = Some(token.clone());
        let tx = self.tx.clone();
        let debounce = self.debounce;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(debounce) => {
                    let verdict = match backend.generate_once(PROBE_PROMPT).await {
                        Ok(_) => CredentialStatus::Valid,
                        Err(err) => {
                            debug!("credential probe failed: {err}");
                            CredentialStatus::Invalid
                        }
                    };
                    let _ = tx.send(verdict);
                }
            }
        });
    }

    /// Discard the pending timer, if any.
    pub fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, Content};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBackend {
        calls: Arc<AtomicUsize>,
        ok: bool,
    }

    #[async_trait]
    impl ChatBackend for CountingBackend {
        async fn generate(
            &self,
            _history: Vec<Content>,
            _system_instruction: &str,
        ) -> Result<String, ApiError> {
            unreachable!("probes use generate_once")
        }

        async fn generate_once(&self, _prompt: &str) -> Result<String, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.ok {
                Ok("ok".to_string())
            } else {
                Err(ApiError::InvalidCredential {
                    message: "bad key".to_string(),
                })
            }
        }
    }

    fn backend(calls: &Arc<AtomicUsize>, ok: bool) -> Arc<dyn ChatBackend> {
        Arc::new(CountingBackend {
            calls: calls.clone(),
            ok,
        })
    }

    #[tokio::test]
    async fn probe_verdicts_arrive_on_the_channel() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (mut monitor, mut rx) = CredentialMonitor::with_debounce(Duration::from_millis(1));
        monitor.schedule(backend(&calls, true));
        assert_eq!(rx.recv().await, Some(CredentialStatus::Valid));

        monitor.schedule(backend(&calls, false));
        assert_eq!(rx.recv().await, Some(CredentialStatus::Invalid));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rescheduling_discards_the_pending_probe() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (mut monitor, mut rx) = CredentialMonitor::with_debounce(Duration::from_millis(20));
        // Still inside the first debounce window when the second key arrives,
        // so only the second probe ever runs.
        monitor.schedule(backend(&calls, false));
        monitor.schedule(backend(&calls, true));
        assert_eq!(rx.recv().await, Some(CredentialStatus::Valid));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_pending_silences_the_timer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (mut monitor, mut rx) = CredentialMonitor::with_debounce(Duration::from_millis(5));
        monitor.schedule(backend(&calls, true));
        monitor.cancel_pending();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stored_keys_win_over_the_environment() {
        let store = crate::storage::MemoryStore::new();
        crate::storage::save_api_key(&store, "stored-key").unwrap();
        let credential = resolve_credential(&store).unwrap();
        assert_eq!(credential.key(), "stored-key");
        assert!(credential.is_user_supplied());
    }
}
