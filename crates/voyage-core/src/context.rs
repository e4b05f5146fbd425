//! Wiring of the session manager and repository, built once at startup.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{ApiClient, RemoteOperations};
use crate::auth::{
    CredentialStore, FileStore, KeyringStore, MemoryStore, SessionEvent, SessionManager,
};
use crate::config::{Config, CredentialBackend, PUSH_TOKEN_ENV};
use crate::notify::{Notifier, PushTokenSource, StaticPushToken, TracingNotifier};
use crate::repository::Repository;

/// Owns the session and repository for the lifetime of the application.
///
/// Must be created inside a Tokio runtime: it spawns the task that forwards
/// the push token after each sign-in. Dropping it stops that task.
pub struct Voyage {
    session: Arc<SessionManager>,
    repository: Repository,
    push_listener: JoinHandle<()>,
}

impl Voyage {
    pub fn new(
        remote: Arc<dyn RemoteOperations>,
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
        push: Arc<dyn PushTokenSource>,
    ) -> Self {
        let session = Arc::new(SessionManager::new(
            Arc::clone(&remote),
            store,
            Arc::clone(&notifier),
        ));
        let repository = Repository::new(remote, Arc::clone(&session), notifier, push);
        let push_listener = spawn_push_registration(&session, repository.clone());

        Self {
            session,
            repository,
            push_listener,
        }
    }

    /// Build the production stack: reqwest client, the configured token
    /// backend, tracing notifications and the push token from the environment.
    pub fn from_config(config: &Config) -> Result<Self> {
        let remote = Arc::new(ApiClient::from_config(config)?);
        let store: Arc<dyn CredentialStore> = match config.credential_backend {
            CredentialBackend::Keyring => Arc::new(KeyringStore::new()),
            CredentialBackend::File => Arc::new(FileStore::new(config.cache_dir()?)),
            CredentialBackend::Memory => Arc::new(MemoryStore::new()),
        };
        let push_token = std::env::var(PUSH_TOKEN_ENV)
            .ok()
            .filter(|token| !token.is_empty());

        Ok(Self::new(
            remote,
            store,
            Arc::new(TracingNotifier),
            Arc::new(StaticPushToken(push_token)),
        ))
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }
}

impl Drop for Voyage {
    fn drop(&mut self) {
        self.push_listener.abort();
    }
}

fn spawn_push_registration(session: &SessionManager, repository: Repository) -> JoinHandle<()> {
    let mut events = session.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::SignedIn(user)) => {
                    debug!(user_id = user.id, "Registering push token");
                    if let Some(outcome) = repository.register_device().await {
                        debug!(?outcome, "Push token registration finished");
                    }
                }
                Ok(SessionEvent::SignedOut) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session events lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
