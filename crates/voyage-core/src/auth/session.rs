//! Lifecycle of the single signed-in identity.
//!
//! States: `Unauthenticated -> Resolving -> Authenticated`, or back to
//! `Unauthenticated` when resolution fails. Only `sign_out` leaves
//! `Authenticated`. Sign-in, sign-up and lazy lookup from a stored token all
//! drive the same `SessionHandle`, and at most one lookup runs at a time.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::api::{bearer, ApiError, ApiResponse, FailureKind, RemoteOperations};
use crate::models::{LoginRequest, RegisterRequest, User};
use crate::notify::Notifier;

use super::credentials::CredentialStore;
use super::handle::{Identity, SessionHandle};

/// Buffer size for session event subscribers
const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(User),
    SignedOut,
}

/// Snapshot of the session for callers that do not want to wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Resolving,
    Authenticated(User),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unauthenticated,
    Resolving,
    Authenticated,
}

struct Inner {
    handle: SessionHandle,
    phase: Phase,
}

enum AuthRequest {
    Login(LoginRequest),
    Register(RegisterRequest),
}

impl AuthRequest {
    fn operation(&self) -> &'static str {
        match self {
            AuthRequest::Login(_) => "login",
            AuthRequest::Register(_) => "register",
        }
    }
}

/// Owns the session lock. Credential store writes happen under it so the
/// stored token and the phase always change together; sign-out reads the
/// token before taking it. Store backends are expected to answer quickly
/// (keychain or a small file), since `current_user` contends on the lock.
pub struct SessionManager {
    remote: Arc<dyn RemoteOperations>,
    store: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
    inner: Mutex<Inner>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(
        remote: Arc<dyn RemoteOperations>,
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            remote,
            store,
            notifier,
            inner: Mutex::new(Inner {
                handle: SessionHandle::new(),
                phase: Phase::Unauthenticated,
            }),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SessionState {
        let inner = self.inner.lock();
        match inner.phase {
            Phase::Unauthenticated => SessionState::Unauthenticated,
            Phase::Resolving => SessionState::Resolving,
            Phase::Authenticated => match inner.handle.peek() {
                Some(Identity::User(user)) => SessionState::Authenticated(user),
                _ => SessionState::Unauthenticated,
            },
        }
    }

    /// Start a login. The returned handle settles with the signed-in user,
    /// or is abandoned if the login fails.
    pub fn sign_in(self: &Arc<Self>, email: &str, password: &str) -> SessionHandle {
        self.authenticate(AuthRequest::Login(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }))
    }

    /// Start a registration. Same contract as [`SessionManager::sign_in`].
    pub fn sign_up(
        self: &Arc<Self>,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        password_confirm: &str,
    ) -> SessionHandle {
        self.authenticate(AuthRequest::Register(RegisterRequest {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password_confirm: password_confirm.to_string(),
        }))
    }

    /// Clear the stored token and reset to `Unauthenticated`.
    ///
    /// The remote logout call runs in the background and its outcome is
    /// ignored. Local state is cleared before this returns.
    pub fn sign_out(&self) {
        let token = self.stored_token();
        let previous = {
            let mut inner = self.inner.lock();
            self.clear_locked(&mut inner)
        };
        self.finish_sign_out(token, previous);
    }

    /// Sign out only while `handle` is still the live session.
    ///
    /// A rejection that arrives for a session the user has since left must
    /// not end the one they started afterwards. Returns whether a sign-out
    /// happened.
    pub(crate) fn sign_out_if_current(&self, handle: &SessionHandle) -> bool {
        let token = self.stored_token();
        let previous = {
            let mut inner = self.inner.lock();
            if !inner.handle.same_as(handle) {
                debug!("Session already replaced, ignoring rejection");
                return false;
            }
            self.clear_locked(&mut inner)
        };
        self.finish_sign_out(token, previous);
        true
    }

    /// The live session handle, or `None` when nobody is signed in and no
    /// token is stored.
    ///
    /// An authenticated or in-flight handle is returned as is. Otherwise a
    /// stored token starts a lookup; callers arriving while it runs share it.
    pub fn current_user(self: &Arc<Self>) -> Option<SessionHandle> {
        let (handle, token) = {
            let mut inner = self.inner.lock();
            if inner.phase != Phase::Unauthenticated {
                return Some(inner.handle.clone());
            }

            let token = match self.store.get() {
                Ok(Some(token)) if !token.is_empty() => token,
                Ok(_) => return None,
                Err(e) => {
                    warn!(error = %e, "Failed to read stored token");
                    return None;
                }
            };

            // A degraded result from an earlier attempt stays on its own handle
            if !inner.handle.is_pending() {
                inner.handle = SessionHandle::new();
            }
            inner.phase = Phase::Resolving;
            (inner.handle.clone(), token)
        };

        debug!("Resolving current user from stored token");
        let this = Arc::clone(self);
        let attempt = handle.clone();
        tokio::spawn(async move { this.resolve(attempt, token).await });
        Some(handle)
    }

    fn authenticate(self: &Arc<Self>, request: AuthRequest) -> SessionHandle {
        let handle = SessionHandle::new();
        let previous = {
            let mut inner = self.inner.lock();
            inner.phase = Phase::Resolving;
            std::mem::replace(&mut inner.handle, handle.clone())
        };
        previous.abandon();

        let this = Arc::clone(self);
        let attempt = handle.clone();
        tokio::spawn(async move { this.complete_authentication(attempt, request).await });
        handle
    }

    async fn complete_authentication(self: Arc<Self>, handle: SessionHandle, request: AuthRequest) {
        let operation = request.operation();
        let result = match &request {
            AuthRequest::Login(body) => self.remote.login(body).await,
            AuthRequest::Register(body) => self.remote.register(body).await,
        };

        match result {
            Ok(ApiResponse::Success { body: user, .. }) => self.accept(&handle, operation, user),
            Ok(ApiResponse::Failure { status: 401, body }) => {
                debug!(operation, body = %body, "Credentials rejected");
                self.notifier.invalid_credentials();
                if self.sign_out_if_current(&handle) {
                    info!("Token expired. Logging out user");
                } else {
                    handle.abandon();
                }
            }
            Ok(ApiResponse::Failure { status, body }) => {
                let error = ApiError::from_status(status, &body);
                self.notifier.report_error(operation, &error);
                self.reset_attempt(&handle);
            }
            Err(error) => {
                self.notifier.report_error(operation, &error);
                self.reset_attempt(&handle);
            }
        }
    }

    fn accept(&self, handle: &SessionHandle, operation: &str, user: User) {
        let token = match user.token.as_deref() {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => {
                let error = ApiError::InvalidResponse("response carried no token".to_string());
                self.notifier.report_error(operation, &error);
                self.reset_attempt(handle);
                return;
            }
        };

        {
            let mut inner = self.inner.lock();
            if !inner.handle.same_as(handle) {
                debug!("Sign-in superseded, discarding result");
                return;
            }
            if let Err(e) = self.store.set(Some(&token)) {
                warn!(error = %e, "Failed to persist token");
            }
            inner.phase = Phase::Authenticated;
            handle.settle(Identity::User(user.clone()));
        }

        info!(user_id = user.id, "Signed in");
        let _ = self.events.send(SessionEvent::SignedIn(user));
    }

    async fn resolve(self: Arc<Self>, handle: SessionHandle, token: String) {
        let mut unauthorized = false;
        let identity = match self.remote.current_user(&bearer(&token)).await {
            Ok(ApiResponse::Success { body: mut user, .. }) => {
                user.token = Some(token.clone());
                Identity::User(user)
            }
            Ok(ApiResponse::Failure { status, body }) => {
                let error = ApiError::from_status(status, &body);
                warn!(status, error = %error, "Current user lookup rejected");
                unauthorized = error.kind() == FailureKind::Authorization;
                Identity::Degraded {
                    reason: error.to_string(),
                }
            }
            Err(error) => {
                self.notifier.report_error("current_user", &error);
                Identity::Degraded {
                    reason: error.to_string(),
                }
            }
        };

        // A rejected token is cleared before waiters wake, so nobody can
        // start another lookup with it.
        let signed_out = {
            let mut inner = self.inner.lock();
            let current = inner.handle.same_as(&handle);
            let signed_out = current && unauthorized;
            if signed_out {
                self.clear_locked(&mut inner);
            } else if current {
                inner.phase = match identity {
                    Identity::User(_) => Phase::Authenticated,
                    Identity::Degraded { .. } => Phase::Unauthenticated,
                };
            }
            handle.settle(identity);
            signed_out
        };

        if signed_out {
            info!("Stored token rejected, logging out user");
            self.finish_sign_out(Some(token), handle);
        }
    }

    fn stored_token(&self) -> Option<String> {
        match self.store.get() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        }
    }

    /// Forget the stored token and install a fresh handle. Returns the
    /// handle being replaced.
    fn clear_locked(&self, inner: &mut Inner) -> SessionHandle {
        if let Err(e) = self.store.set(None) {
            warn!(error = %e, "Failed to clear stored token");
        }
        inner.phase = Phase::Unauthenticated;
        std::mem::replace(&mut inner.handle, SessionHandle::new())
    }

    fn finish_sign_out(&self, token: Option<String>, previous: SessionHandle) {
        match token {
            Some(token) => self.spawn_remote_logout(token),
            None => debug!("No stored token, skipping remote logout"),
        }
        previous.abandon();
        let _ = self.events.send(SessionEvent::SignedOut);
        debug!("Signed out");
    }

    /// Drop a failed attempt: back to `Unauthenticated` with a fresh handle.
    fn reset_attempt(&self, handle: &SessionHandle) {
        {
            let mut inner = self.inner.lock();
            if inner.handle.same_as(handle) {
                inner.phase = Phase::Unauthenticated;
                inner.handle = SessionHandle::new();
            }
        }
        handle.abandon();
    }

    /// Fire-and-forget; failures are logged at debug and otherwise ignored.
    fn spawn_remote_logout(&self, token: String) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                debug!("No async runtime, skipping remote logout");
                return;
            }
        };

        let remote = Arc::clone(&self.remote);
        runtime.spawn(async move {
            match remote.logout(&bearer(&token)).await {
                Ok(ApiResponse::Success { .. }) => debug!("Logged out successfully"),
                Ok(ApiResponse::Failure { status, .. }) => {
                    debug!(status, "Remote logout rejected")
                }
                Err(e) => debug!(error = %e, "Remote logout failed"),
            }
        });
    }
}
