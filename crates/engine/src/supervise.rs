//! Detached task spawning with panic isolation.
//!
//! The body runs in its own Tokio task. A second task watches its
//! [`JoinHandle`](tokio::task::JoinHandle); if the body panics, the panic
//! message is logged and handed to a recovery future. The host process
//! never observes the panic.

use std::any::Any;
use std::future::Future;

use tokio::task::JoinHandle;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Spawn `body` detached. `recover` runs only when `body` panics.
///
/// The returned handle completes after the body and any recovery are done.
pub fn spawn_supervised<F, R, RF>(task: &'static str, body: F, recover: R) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
    R: FnOnce(String) -> RF + Send + 'static,
    RF: Future<Output = ()> + Send + 'static,
{
    let handle = tokio::spawn(body);
    tokio::spawn(async move {
        match handle.await {
            Ok(()) => {}
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic().as_ref());
                tracing::error!(task, panic = %message, "Background task panicked");
                recover(message).await;
            }
            Err(e) => {
                tracing::warn!(task, error = %e, "Background task was cancelled");
            }
        }
    })
}

/// [`spawn_supervised`] with logging as the only recovery.
pub fn spawn_logged<F>(task: &'static str, body: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    spawn_supervised(task, body, |_| async {})
}
