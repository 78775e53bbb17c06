//! Bridge lifecycle.
//!
//! `Running` -> `ShuttingDown` happens once, on the first close request.
//! `Closed` is set by the router after every owned session has closed.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    ShuttingDown,
    Closed,
}

/// Shared handle on the bridge's phase.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<Phase>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Phase::Running);
        Self { tx: Arc::new(tx) }
    }

    pub fn phase(&self) -> Phase {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.tx.subscribe()
    }

    /// Move from `Running` to `ShuttingDown`.
    ///
    /// Returns `true` only for the call that made the transition.
    pub fn request_shutdown(&self) -> bool {
        self.tx.send_if_modified(|phase| {
            if *phase == Phase::Running {
                *phase = Phase::ShuttingDown;
                true
            } else {
                false
            }
        })
    }

    pub fn mark_closed(&self) {
        self.tx.send_replace(Phase::Closed);
    }

    /// Resolves once the phase is `Closed`.
    pub async fn wait_closed(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so this can't fail.
        let _ = rx.wait_for(|phase| *phase == Phase::Closed).await;
    }
}

/// Marks the lifecycle closed when dropped, so waiters are released even if
/// the router task ends early or panics.
pub struct ClosedGuard(pub Lifecycle);

impl Drop for ClosedGuard {
    fn drop(&mut self) {
        self.0.mark_closed();
    }
}
