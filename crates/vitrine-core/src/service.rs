//! Engine lifecycle state management.
//!
//! Provides [`EngineState`] and [`StateHandle`] for tracking where a search
//! engine is in its lifecycle:
//!
//! ```text
//! uninitialized → ready → (indexing | querying) → ready
//! ```
//!
//! Operations enter `indexing` or `querying` through [`StateHandle::enter`],
//! which returns a guard that puts the engine back to `ready` when dropped.
//!
//! # Usage
//!
//! ```rust
//! use vitrine_core::service::{EngineState, StateHandle};
//!
//! let handle = StateHandle::new("elasticsearch");
//! assert_eq!(handle.state(), EngineState::Uninitialized);
//!
//! handle.set_state(EngineState::Ready);
//! {
//!     let _guard = handle.enter(EngineState::Querying);
//!     assert_eq!(handle.state(), EngineState::Querying);
//! }
//! assert!(handle.state().is_ready());
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::error::{Error, Result};

// ============================================================================
// EngineState
// ============================================================================

/// State of a search engine in its lifecycle.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineState {
    /// Engine has been constructed but not pinged yet.
    Uninitialized,
    /// Engine is idle and accepting requests.
    Ready,
    /// Engine is writing to the index (schema, documents, cleanup).
    Indexing,
    /// Engine is running a search.
    Querying,
    /// The availability check failed.
    Failed(String),
}

impl EngineState {
    /// Returns `true` if the engine is idle and ready.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns `true` if the engine can serve requests.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Ready | Self::Querying | Self::Indexing)
    }

    /// Returns `true` while an indexing operation is in progress.
    pub fn is_indexing(&self) -> bool {
        matches!(self, Self::Indexing)
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Ready => write!(f, "ready"),
            Self::Indexing => write!(f, "indexing"),
            Self::Querying => write!(f, "querying"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

// ============================================================================
// StateHandle
// ============================================================================

/// Thread-safe handle for observing and updating engine state.
///
/// Cheap to clone (Arc internals). State changes are broadcast
/// to all subscribers via a watch channel.
#[derive(Clone)]
pub struct StateHandle {
    inner: Arc<StateHandleInner>,
}

struct StateHandleInner {
    name: String,
    tx: watch::Sender<EngineState>,
    created_at: Instant,
}

impl StateHandle {
    /// Create a new handle for the named engine.
    ///
    /// Initial state is [`EngineState::Uninitialized`].
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(EngineState::Uninitialized);
        Self {
            inner: Arc::new(StateHandleInner {
                name: name.into(),
                tx,
                created_at: Instant::now(),
            }),
        }
    }

    /// Engine name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        self.inner.tx.borrow().clone()
    }

    /// Update the state. All subscribers are notified.
    pub fn set_state(&self, state: EngineState) {
        let previous = self.inner.tx.send_replace(state.clone());
        if previous != state {
            log::info!("Engine '{}' {previous} -> {state}", self.inner.name);
        }
    }

    /// Enter a transient state until the returned guard is dropped.
    pub fn enter(&self, state: EngineState) -> StateGuard {
        self.set_state(state.clone());
        StateGuard {
            handle: self.clone(),
            entered: state,
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.inner.tx.subscribe()
    }

    /// Wait until the engine reaches Ready, Failed, or timeout.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let mut rx = self.subscribe();
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let mut state = rx.borrow_and_update().clone();
        loop {
            match state {
                EngineState::Ready => return Ok(()),
                EngineState::Failed(reason) => {
                    return Err(Error::unavailable(&self.inner.name, reason));
                }
                _ => {}
            }

            tokio::select! {
                _ = &mut deadline => {
                    return Err(Error::unavailable(
                        &self.inner.name,
                        format!("not ready after {timeout:?} (state: {})", self.state()),
                    ));
                }
                result = rx.changed() => {
                    if result.is_err() {
                        return Err(Error::unavailable(&self.inner.name, "state channel closed"));
                    }
                    state = rx.borrow_and_update().clone();
                }
            }
        }
    }

    /// Elapsed time since the handle was created.
    pub fn elapsed(&self) -> Duration {
        self.inner.created_at.elapsed()
    }
}

impl fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHandle")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

/// Puts the engine back to `Ready` when dropped, unless something else
/// changed the state in the meantime.
#[must_use = "the state is restored as soon as the guard is dropped"]
pub struct StateGuard {
    handle: StateHandle,
    entered: EngineState,
}

impl Drop for StateGuard {
    fn drop(&mut self) {
        if self.handle.state() == self.entered {
            self.handle.set_state(EngineState::Ready);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_state_display() {
        assert_eq!(EngineState::Uninitialized.to_string(), "uninitialized");
        assert_eq!(EngineState::Ready.to_string(), "ready");
        assert_eq!(EngineState::Indexing.to_string(), "indexing");
        assert_eq!(EngineState::Querying.to_string(), "querying");
        assert_eq!(
            EngineState::Failed("no route".to_string()).to_string(),
            "failed: no route"
        );
    }

    #[test]
    fn test_engine_state_predicates() {
        assert!(EngineState::Ready.is_ready());
        assert!(!EngineState::Querying.is_ready());

        assert!(EngineState::Querying.is_available());
        assert!(EngineState::Indexing.is_available());
        assert!(!EngineState::Uninitialized.is_available());
        assert!(!EngineState::Failed("x".into()).is_available());

        assert!(EngineState::Indexing.is_indexing());
        assert!(!EngineState::Ready.is_indexing());
    }

    #[test]
    fn test_handle_initial_state() {
        let handle = StateHandle::new("test");
        assert_eq!(handle.name(), "test");
        assert_eq!(handle.state(), EngineState::Uninitialized);
    }

    #[test]
    fn test_guard_restores_ready() {
        let handle = StateHandle::new("test");
        handle.set_state(EngineState::Ready);

        let guard = handle.enter(EngineState::Indexing);
        assert_eq!(handle.state(), EngineState::Indexing);
        drop(guard);
        assert_eq!(handle.state(), EngineState::Ready);
    }

    #[test]
    fn test_guard_keeps_later_failure() {
        let handle = StateHandle::new("test");
        handle.set_state(EngineState::Ready);

        let guard = handle.enter(EngineState::Querying);
        handle.set_state(EngineState::Failed("gone".to_string()));
        drop(guard);
        assert_eq!(handle.state(), EngineState::Failed("gone".to_string()));
    }

    #[test]
    fn test_clone_shares_state() {
        let handle1 = StateHandle::new("shared");
        let handle2 = handle1.clone();

        handle1.set_state(EngineState::Ready);
        assert_eq!(handle2.state(), EngineState::Ready);
    }

    #[tokio::test]
    async fn test_wait_ready_success() {
        let handle = StateHandle::new("test");
        let h = handle.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            h.set_state(EngineState::Ready);
        });

        let result = handle.wait_ready(Duration::from_secs(1)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_wait_ready_timeout() {
        let handle = StateHandle::new("slow");

        let result = handle.wait_ready(Duration::from_millis(50)).await;
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }));
        assert!(err.to_string().contains("not ready after"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_wait_ready_already_failed() {
        let handle = StateHandle::new("broken");
        handle.set_state(EngineState::Failed("refused".to_string()));

        let result = handle.wait_ready(Duration::from_millis(50)).await;
        assert!(result.unwrap_err().to_string().contains("refused"));
    }

    #[test]
    fn test_handle_debug() {
        let handle = StateHandle::new("debug-test");
        let debug = format!("{:?}", handle);
        assert!(debug.contains("debug-test"));
        assert!(debug.contains("StateHandle"));
    }

    fn _assert_send_sync<T: Send + Sync>() {}
    #[test]
    fn test_handle_send_sync() {
        _assert_send_sync::<StateHandle>();
        _assert_send_sync::<EngineState>();
    }
}
