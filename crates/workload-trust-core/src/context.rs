//! Per-request deadline and cancellation

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{Result, TrustError};

/// Deadline and cancellation signal for one inbound request
///
/// Cloning shares the cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels every [`RequestContext`] derived from it
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl RequestContext {
    /// No deadline, never cancelled
    pub fn background() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().deadline(Instant::now() + timeout)
    }

    /// Set or tighten the deadline
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// Attach a fresh cancellation signal and return its handle
    pub fn cancellable(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancel = Some(rx);
        (self, CancelHandle { tx })
    }

    pub fn deadline_at(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.map(|d| Instant::now() >= d).unwrap_or(false)
    }

    /// Drive `operation` until it finishes, the deadline elapses or the
    /// request is cancelled
    ///
    /// An already cancelled or expired context never polls `operation`.
    pub async fn run<F, T>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(TrustError::Cancelled);
        }
        if self.is_expired() {
            return Err(TrustError::Timeout(
                "request deadline elapsed before the hop started".into(),
            ));
        }

        let started = Instant::now();
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(TrustError::Cancelled),
            _ = self.expired() => Err(TrustError::Timeout(format!(
                "no answer from downstream within {}ms",
                started.elapsed().as_millis()
            ))),
            result = operation => result,
        }
    }

    async fn cancelled(&self) {
        let Some(rx) = &self.cancel else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            // Sender gone without cancelling: the request can no longer be
            // cancelled.
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }

    async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}
