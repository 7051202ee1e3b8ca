//! Web 服务器
//! 后台任务负责 serve，主任务等待退出信号后发起优雅关闭

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::api;
use crate::config::Config;
use crate::metrics::Metrics;
use crate::state::AppState;

/// How long in-flight requests get after a shutdown signal.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Web 服务器
pub struct WebServer {
    config: Config,
    state: Arc<AppState>,
}

impl WebServer {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let metrics = Arc::new(Metrics::new().context("failed to register metrics")?);
        let state = AppState::from_config(&config, metrics).context("failed to build HTTP client")?;
        Ok(Self {
            config,
            state: Arc::new(state),
        })
    }

    /// 启动服务器，直到收到 SIGINT/SIGTERM
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    pub async fn run_until<F>(self, signal: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", self.config.listen_addr))?;

        info!(
            source = self.state.credentials.kind(),
            upstream = %self.state.exchanger.url(),
            allowed_origin = ?self.state.cors.allow_origin(),
            "Starting server"
        );

        serve(listener, api::build_routes(self.state), signal, SHUTDOWN_TIMEOUT).await
    }
}

/// Serve `app` on a background task until `signal` resolves, then drain for at most `grace`.
///
/// Returns an error if the server stops on its own before the signal, or if
/// draining does not finish within `grace`.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    signal: F,
    grace: Duration,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });
    info!(%addr, "Server listening");

    tokio::select! {
        result = &mut server => {
            return match result {
                Ok(Ok(())) => Err(anyhow!("server stopped without a shutdown signal")),
                Ok(Err(e)) => Err(e).context("server error"),
                Err(e) => Err(e).context("server task failed"),
            };
        }
        _ = signal => {
            info!("Shutting down server...");
        }
    }

    let _ = stop_tx.send(());

    match tokio::time::timeout(grace, &mut server).await {
        Ok(Ok(Ok(()))) => {
            info!("Server stopped");
            Ok(())
        }
        Ok(Ok(Err(e))) => Err(e).context("server shutdown error"),
        Ok(Err(e)) => Err(e).context("server task failed during shutdown"),
        Err(_) => {
            warn!(
                grace_secs = grace.as_secs(),
                "Shutdown deadline exceeded, closing remaining connections"
            );
            // Connections still open are dropped with the runtime when the process exits.
            server.abort();
            Err(anyhow!(
                "graceful shutdown did not finish within {}s",
                grace.as_secs()
            ))
        }
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(error = %error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
            return;
        }
        info!("Received SIGINT (Ctrl+C)");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("Received SIGTERM");
            }
            Err(error) => {
                warn!(error = %error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
