//! Graceful shutdown coordination via `CancellationToken`.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How long tasks get to wind down before being abandoned.
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Coordinates graceful shutdown across server tasks.
///
/// Every long-lived task holds a clone of the token; cancelling it reaches
/// them all at their next wait point.
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a coordinator in the running state.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Get a clone of the cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Initiate shutdown. Idempotent.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Whether shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel everything and wait up to `timeout` for the given tasks.
    pub async fn drain(&self, handles: Vec<JoinHandle<()>>, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(DEFAULT_DRAIN_TIMEOUT);
        self.trigger();
        info!(
            task_count = handles.len(),
            timeout_secs = timeout.as_secs(),
            "waiting for tasks to wind down"
        );
        let all = futures::future::join_all(handles);
        if tokio::time::timeout(timeout, all).await.is_err() {
            warn!("shutdown timed out after {timeout:?}, abandoning remaining tasks");
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
