// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use yieldway_server::{api::router, config::Config, state::AppState};

#[tokio::main]
async fn main() {
    init_tracing();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("configuration error: {e}");
        std::process::exit(1);
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .unwrap_or_else(|e| {
            eprintln!("invalid bind address: {e}");
            std::process::exit(1);
        });

    let state = AppState::from_config(config).unwrap_or_else(|e| {
        eprintln!("startup error: {e}");
        std::process::exit(1);
    });

    // Repair any transfer interrupted by the previous shutdown before
    // taking traffic.
    match state.transfers().sweep_incomplete().await {
        Ok(0) => {}
        Ok(repaired) => tracing::info!(repaired, "repaired interrupted transfers at startup"),
        Err(e) => tracing::error!(error = %e, "startup transfer sweep failed"),
    }

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap_or_else(|e| {
        eprintln!("failed to bind {addr}: {e}");
        std::process::exit(1);
    });

    tracing::info!("YieldWay server listening on http://{addr} (docs at /docs)");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let format = std::env::var("LOG_FORMAT").unwrap_or_default();

    if format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
