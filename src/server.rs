//! HTTP server lifecycle

use std::net::SocketAddr;

use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

use crate::{api, AppState};

/// Owned handle on the running HTTP listener
pub struct WebServer {
    state: AppState,
    running: Option<Running>,
}

struct Running {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl WebServer {
    pub fn new(state: AppState) -> Self {
        Self { state, running: None }
    }

    /// Bind the configured address and serve in the background
    pub async fn start(&mut self) -> anyhow::Result<SocketAddr> {
        let server = &self.state.config.server;
        let addr = SocketAddr::new(server.host.parse()?, server.port);

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let app = api::router(self.state.clone());

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    signal.await.ok();
                })
                .await
        });

        tracing::info!("Server listening on http://{}", local_addr);

        self.running = Some(Running { shutdown, task });
        Ok(local_addr)
    }

    /// Stop accepting connections and wait for in-flight requests
    pub async fn stop(&mut self) -> anyhow::Result<()> {
        if let Some(Running { shutdown, task }) = self.running.take() {
            shutdown.send(()).ok();
            task.await??;
            tracing::info!("Server stopped");
        }
        Ok(())
    }
}
