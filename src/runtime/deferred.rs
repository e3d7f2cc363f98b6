//! Bounded wait before finalizing a prepared navigation.
//!
//! A host that wants to avoid flashing a placeholder can hold a prepared
//! navigation until some resource is ready, but never longer than the commit
//! window, and can cut the wait short at any time. Whichever happens first
//! wins; the caller then finalizes.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;

/// What ended a [`DeferredCommit::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitTrigger {
    Ready,
    WindowElapsed,
    Cancelled,
}

pub struct DeferredCommit {
    window: Duration,
    cancel: oneshot::Receiver<()>,
}

/// Ends the wait immediately. Dropping it without calling
/// [`cancel`](CommitCanceller::cancel) has no effect.
pub struct CommitCanceller {
    sender: oneshot::Sender<()>,
}

impl CommitCanceller {
    pub fn cancel(self) {
        let _ = self.sender.send(());
    }
}

impl DeferredCommit {
    pub fn new(window: Duration) -> (Self, CommitCanceller) {
        let (sender, cancel) = oneshot::channel();
        (Self { window, cancel }, CommitCanceller { sender })
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub async fn wait<F>(self, ready: F) -> CommitTrigger
    where
        F: Future<Output = ()>,
    {
        let Self { window, cancel } = self;
        tokio::select! {
            biased;
            Ok(()) = cancel => CommitTrigger::Cancelled,
            _ = ready => CommitTrigger::Ready,
            _ = tokio::time::sleep(window) => CommitTrigger::WindowElapsed,
        }
    }
}
