//! Detached background tasks.
//!
//! Fire-and-forget work (intervention persistence, analytics) goes through
//! [`spawn_logged`] so failures are logged instead of vanishing and the call
//! sites stay honest about never awaiting the result.

use std::fmt::Display;
use std::future::Future;

use tokio::task::JoinHandle;
use tracing::warn;

/// Spawn `future` detached from the caller.
///
/// The task's error, if any, is logged at `warn` under `label`. The caller
/// gets the join handle back (tests await it) but is free to drop it;
/// dropping the handle does not cancel the task.
pub fn spawn_logged<F, E>(label: &'static str, future: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = future.await {
            warn!("background task '{}' failed: {}", label, err);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn runs_the_future_to_completion() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let handle = spawn_logged("test-task", async move {
            flag.store(true, Ordering::SeqCst);
            Ok::<(), String>(())
        });
        handle.await.unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn swallows_errors() {
        let handle = spawn_logged("failing-task", async { Err("boom".to_string()) });
        // The join itself succeeds; the error was logged inside the task.
        handle.await.unwrap();
    }
}
