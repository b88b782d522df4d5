//! Stat gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                     STAT GATEWAY                      │
//!                    │                                                       │
//!   Client Request   │  ┌─────────┐   ┌───────────┐   ┌───────────────────┐ │
//!   ─────────────────┼─▶│ trace + │──▶│ telemetry │──▶│ admission gate    │ │
//!                    │  │ req id  │   │ layers    │   │ rate → IP → geo   │ │
//!                    │  └─────────┘   └─────┬─────┘   └─────────┬─────────┘ │
//!                    │                      │                   ▼           │
//!                    │                      │          ┌──────────────────┐ │
//!   Client Response  │                      │          │ proxy routes     │─┼──▶ Content API
//!   ◀────────────────┼──────────────────────┤          └──────────────────┘ │
//!                    │                      ▼                               │
//!                    │             ┌─────────────────┐   ┌───────────────┐  │
//!                    │             │ telemetry queue │──▶│ document      │  │
//!                    │             │ + summary flush │   │ store         │◀─┼── blocklists
//!                    │             └─────────────────┘   └───────────────┘  │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use stat_gateway::admin::{setup_admin_router, AdminState};
use stat_gateway::config::load_or_default;
use stat_gateway::lifecycle::{build_collaborators, wait_for_signal, Shutdown};
use stat_gateway::observability::{logging, metrics};
use stat_gateway::telemetry::SummaryFlusher;
use stat_gateway::{GatewayServer, Pipeline};

/// How long the telemetry writer may keep draining after shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "stat-gateway", version, about = "Request admission and telemetry gateway")]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "stat-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit = config.rate_limit.enabled,
        blocklist = config.blocklist.enabled,
        telemetry = config.telemetry.enabled,
        store = ?config.store.kind,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let collaborators = build_collaborators(&config)?;
    let (pipeline, writer) = Pipeline::new(&config, collaborators);
    let shutdown = Shutdown::new();

    let limiter = pipeline.limiter();
    let eviction_every = Duration::from_secs(config.rate_limit.eviction_interval_secs);
    let eviction_age = pipeline.eviction_age();
    let eviction_rx = shutdown.subscribe();
    let eviction_task = tokio::spawn(async move {
        limiter.run_eviction(eviction_every, eviction_age, eviction_rx).await;
    });

    let writer_task = tokio::spawn(writer.run());
    let summary_task = tokio::spawn(
        SummaryFlusher::new(
            pipeline.recorder(),
            Duration::from_secs(config.telemetry.summary_interval_secs),
        )
        .run(shutdown.subscribe()),
    );

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let router = setup_admin_router(AdminState::new(
            pipeline.recorder(),
            pipeline.limiter(),
            config.admin.api_key.clone(),
        ));
        tracing::info!(address = %config.admin.bind_address, "Admin API enabled");
        Some(tokio::spawn(
            GatewayServer::new(router).run(listener, shutdown.subscribe()),
        ))
    } else {
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = tokio::spawn(GatewayServer::new(pipeline.router()).run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    tracing::info!("Shutdown signal received");
    shutdown.trigger();

    server.await??;
    if let Some(admin) = admin_task {
        admin.await??;
    }
    eviction_task.await?;
    summary_task.await?;

    // The writer finishes once every recorder handle is gone.
    drop(pipeline);
    if tokio::time::timeout(DRAIN_TIMEOUT, writer_task).await.is_err() {
        tracing::warn!("Telemetry writer did not drain in time");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
