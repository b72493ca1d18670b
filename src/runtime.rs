//! Process run state and signal handling

use std::sync::Arc;

use tokio::sync::watch;

/// Whether the process is still meant to be serving.
///
/// Components that retry in the background (the database connector) hold a
/// clone and give up once the state is stopped.
#[derive(Clone, Debug)]
pub struct RunState {
    running: Arc<watch::Sender<bool>>,
}

impl RunState {
    pub fn new() -> Self {
        let (running, _) = watch::channel(true);
        Self {
            running: Arc::new(running),
        }
    }

    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    pub fn stop(&self) {
        self.running.send_replace(false);
    }

    /// Resolves once `stop` has been called
    pub async fn stopped(&self) {
        let mut receiver = self.running.subscribe();
        // The sender lives in `self`, so this only fails if it is dropped mid-wait
        let _ = receiver.wait_for(|running| !running).await;
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                tracing::info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        tracing::info!("Received Ctrl+C, shutting down...");
    }
}
