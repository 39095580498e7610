//! Graceful shutdown coordination via `CancellationToken`.
//!
//! On `SIGTERM`/`SIGINT`: stop accepting new connections, let in-flight
//! requests drain, then exit without waiting on the bounded blocking-task
//! pool (`spawn_blocking` calls made by the store gateway and the Converse
//! SDK path are not tracked here, matching the "close the worker pool
//! without waiting" posture).

use tokio_util::sync::CancellationToken;

pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn shutdown(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
