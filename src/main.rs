use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use chutecast::config::parse_cli_args;
use chutecast::server;
use chutecast::RoomHub;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let config = parse_cli_args();
    let hub = Arc::new(RoomHub::new(config.room.clone()));

    // Background sweep for abandoned rooms.
    let sweeper = hub.clone();
    let sweep_interval = Duration::from_secs(config.room.sweep_interval_secs.max(1));
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(sweep_interval);
        tick.tick().await; // first tick fires immediately; skip it
        loop {
            tick.tick().await;
            sweeper.sweep_idle().await;
        }
    });

    let app = server::router(hub);
    let listener = match tokio::net::TcpListener::bind(&config.net.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {}: {e}", config.net.bind_addr);
            std::process::exit(1);
        }
    };
    tracing::info!("listening on {}", config.net.bind_addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("server error: {e}");
    }

    tracing::info!("server stopped");
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
