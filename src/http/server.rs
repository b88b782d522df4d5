//! HTTP server.
//!
//! Serves a built router on a bound listener until the shutdown broadcast
//! fires, then drains in-flight requests.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Run until `shutdown` fires. Peer addresses are made available to
    /// handlers through `ConnectInfo<SocketAddr>`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!(address = %addr, "HTTP server draining");
            })
            .await?;

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }
}
