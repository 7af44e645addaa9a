//! Delayed "this may take a while" notice tied to a request

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::types::StatusState;

/// Shows a message once `delay` has passed, unless dropped first.
/// Dropping the guard aborts the timer.
pub struct DelayedNotice {
    handle: JoinHandle<()>,
}

impl DelayedNotice {
    pub fn schedule(status: Arc<Mutex<StatusState>>, delay: Duration, text: &'static str) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut status = status.lock().await;
            // Settlement resets activity under this same lock
            if status.activity {
                tracing::debug!("Request still running, showing delayed notice");
                status.message = Some(text.to_string());
            }
        });
        Self { handle }
    }

    pub fn cancel(self) {}
}

impl Drop for DelayedNotice {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
