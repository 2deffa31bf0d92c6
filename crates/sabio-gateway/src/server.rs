use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;

use crate::error::GatewayError;
use crate::router::build_router;
use sabio_core::AnswerQuery;

pub(crate) struct AppState<Q> {
    pub pipeline: Arc<Q>,
    pub started_at: Instant,
}

// derive(Clone) would require Q: Clone; the Arc makes that unnecessary.
impl<Q> Clone for AppState<Q> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            started_at: self.started_at,
        }
    }
}

pub struct GatewayServer<Q> {
    addr: SocketAddr,
    max_body_size: usize,
    pipeline: Arc<Q>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<Q: AnswerQuery + 'static> GatewayServer<Q> {
    #[must_use]
    pub fn new(
        bind: &str,
        port: u16,
        pipeline: Arc<Q>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        if bind == "0.0.0.0" {
            tracing::warn!("gateway binding to 0.0.0.0 — ensure this is intended for production");
        }

        Self {
            addr,
            max_body_size: 1_048_576,
            pipeline,
            shutdown_rx,
        }
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Start the HTTP gateway server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let state = AppState {
            pipeline: self.pipeline,
            started_at: Instant::now(),
        };

        let router = build_router(state, self.max_body_size);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind(self.addr.to_string(), e))?;
        tracing::info!("gateway listening on {}", self.addr);

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow_and_update() {
                    if shutdown_rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                tracing::info!("gateway shutting down");
            })
            .await
            .map_err(|e| GatewayError::Server(format!("{e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sabio_core::PipelineError;

    struct StubPipeline;

    impl AnswerQuery for StubPipeline {
        async fn answer(&self, _query: &str) -> Result<String, PipelineError> {
            Ok("ok".into())
        }
    }

    #[test]
    fn server_builder_chain() {
        let (_stx, srx) = watch::channel(false);
        let server =
            GatewayServer::new("127.0.0.1", 8090, Arc::new(StubPipeline), srx)
                .with_max_body_size(512);
        assert_eq!(server.max_body_size, 512);
    }

    #[test]
    fn server_invalid_bind_fallback() {
        let (_stx, srx) = watch::channel(false);
        let server = GatewayServer::new("not_an_ip", 9999, Arc::new(StubPipeline), srx);
        assert_eq!(server.addr.port(), 9999);
    }
}
