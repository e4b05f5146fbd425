//! Completion-gated single-value broadcast for the current identity.
//!
//! A `SessionHandle` starts pending, then settles exactly once. Observers
//! that await it before it settles all wake with the same value; observers
//! arriving later read the cached value immediately. A pending handle can
//! instead be abandoned when the session is reset, which wakes waiters
//! with `None`.

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::User;

/// Terminal value of a resolution attempt.
///
/// `Degraded` is how a failed identity lookup is reported: as a value the
/// caller has to inspect, not as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(User),
    Degraded { reason: String },
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::User(user) => Some(user),
            Identity::Degraded { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Identity::Degraded { .. })
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Pending,
    Settled(Identity),
    Abandoned,
}

#[derive(Debug, Clone)]
pub struct SessionHandle {
    slot: Arc<watch::Sender<Slot>>,
}

impl SessionHandle {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(Slot::Pending);
        Self { slot: Arc::new(tx) }
    }

    /// Settle with `identity`. Returns false if the handle was already
    /// settled or abandoned, in which case nothing changes.
    pub(crate) fn settle(&self, identity: Identity) -> bool {
        self.slot.send_if_modified(move |slot| {
            if matches!(slot, Slot::Pending) {
                *slot = Slot::Settled(identity);
                true
            } else {
                false
            }
        })
    }

    /// Wake pending waiters with `None`. No effect on a settled handle.
    pub(crate) fn abandon(&self) -> bool {
        self.slot.send_if_modified(|slot| {
            if matches!(slot, Slot::Pending) {
                *slot = Slot::Abandoned;
                true
            } else {
                false
            }
        })
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.slot.borrow(), Slot::Pending)
    }

    /// The settled value, without waiting.
    pub fn peek(&self) -> Option<Identity> {
        match &*self.slot.borrow() {
            Slot::Settled(identity) => Some(identity.clone()),
            _ => None,
        }
    }

    /// Wait for the terminal value. `None` means the handle was abandoned.
    pub async fn resolved(&self) -> Option<Identity> {
        let mut rx = self.slot.subscribe();
        let slot = rx
            .wait_for(|slot| !matches!(slot, Slot::Pending))
            .await
            .ok()?
            .clone();
        match slot {
            Slot::Settled(identity) => Some(identity),
            _ => None,
        }
    }

    /// Whether both handles observe the same underlying slot.
    pub fn same_as(&self, other: &SessionHandle) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> User {
        User {
            id,
            first_name: "Test".into(),
            last_name: "Rider".into(),
            email: format!("rider{}@example.com", id),
            token: Some("tok".into()),
        }
    }

    #[tokio::test]
    async fn test_waiters_before_settle_receive_value() {
        let handle = SessionHandle::new();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let h = handle.clone();
                tokio::spawn(async move { h.resolved().await })
            })
            .collect();
        tokio::task::yield_now().await;

        assert!(handle.settle(Identity::User(user(1))));
        for waiter in waiters {
            assert_eq!(waiter.await.unwrap(), Some(Identity::User(user(1))));
        }
    }

    #[tokio::test]
    async fn test_late_observer_gets_cached_value() {
        let handle = SessionHandle::new();
        handle.settle(Identity::User(user(2)));
        assert_eq!(handle.resolved().await, Some(Identity::User(user(2))));
        assert_eq!(handle.peek(), Some(Identity::User(user(2))));
    }

    #[tokio::test]
    async fn test_settles_only_once() {
        let handle = SessionHandle::new();
        assert!(handle.settle(Identity::User(user(1))));
        assert!(!handle.settle(Identity::User(user(2))));
        assert!(!handle.abandon());
        assert_eq!(handle.resolved().await, Some(Identity::User(user(1))));
    }

    #[tokio::test]
    async fn test_abandon_wakes_waiters_with_none() {
        let handle = SessionHandle::new();
        let h = handle.clone();
        let waiter = tokio::spawn(async move { h.resolved().await });
        tokio::task::yield_now().await;

        assert!(handle.abandon());
        assert_eq!(waiter.await.unwrap(), None);
        assert!(!handle.settle(Identity::User(user(1))));
        assert!(!handle.is_pending());
    }

    #[test]
    fn test_degraded_identity_is_distinct_from_pending() {
        let handle = SessionHandle::new();
        assert!(handle.is_pending());
        assert_eq!(handle.peek(), None);

        handle.settle(Identity::Degraded {
            reason: "timeout".into(),
        });
        let identity = handle.peek().unwrap();
        assert!(identity.is_degraded());
        assert!(identity.user().is_none());
        assert!(!handle.is_pending());
    }

    #[test]
    fn test_same_as() {
        let a = SessionHandle::new();
        let b = a.clone();
        let c = SessionHandle::new();
        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
    }
}
