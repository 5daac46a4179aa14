use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use iqs_core::AgentState;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::query_log::QueryLogLayer;
use crate::routes;
use crate::state::AppState;

/// How long in-flight queries may run on after shutdown was requested.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("listener failed: {0}")]
    Listener(#[from] std::io::Error),
    #[error("server stopped before shutdown was requested")]
    UnexpectedExit,
}

/// Query server bound to a single [`AgentState`].
pub struct Server {
    agent: Arc<dyn AgentState>,
    shutdown_grace: Duration,
}

impl Server {
    /// Stores the agent; no network resource is acquired until [`Server::serve`].
    pub fn new(agent: impl AgentState) -> Self {
        Self::from_shared(Arc::new(agent))
    }

    pub fn from_shared(agent: Arc<dyn AgentState>) -> Self {
        Self {
            agent,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::intercepts::router())
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(QueryLogLayer::new()),
            )
            .with_state(AppState {
                agent: self.agent.clone(),
            })
    }

    /// Serve queries on `listener` until `shutdown` is cancelled.
    ///
    /// After cancellation no new connections are accepted and in-flight
    /// queries get up to the grace period to finish. Returns `Ok(())` only
    /// for a shutdown triggered by `shutdown`.
    pub async fn serve(
        self,
        shutdown: CancellationToken,
        listener: TcpListener,
    ) -> Result<(), ServeError> {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "Interception query service listening");

        let server = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => {
                result?;
                if shutdown.is_cancelled() {
                    return Ok(());
                }
                tracing::error!(%addr, "Interception query service stopped unexpectedly");
                return Err(ServeError::UnexpectedExit);
            }
            () = shutdown.cancelled() => {}
        }

        tracing::info!(%addr, grace = ?self.shutdown_grace, "Draining in-flight queries");
        match tokio::time::timeout(self.shutdown_grace, server).await {
            Ok(result) => {
                result?;
                tracing::info!(%addr, "Interception query service stopped");
                Ok(())
            }
            Err(_) => {
                tracing::warn!(%addr, "Grace period elapsed with queries still in flight");
                Ok(())
            }
        }
    }
}
