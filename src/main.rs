use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use citycare_core::{CityCare, CoreConfig};

/// Main entry point for the CityCare backend
///
/// Loads every collection from the data directory, then serves the REST API until Ctrl-C.
///
/// # Environment Variables
/// - `CITYCARE_REST_ADDR`: REST server address (default: "0.0.0.0:8000")
/// - `CITYCARE_DATA_DIR`: Directory holding the JSON collections (default: "data")
/// - `CITYCARE_DOCTOR_PIN`: Shared PIN for doctor logins (default: "1234")
/// - `CITYCARE_CORS_ORIGINS`: Comma-separated allowed browser origins
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, loading or binding fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("citycare_run=info".parse()?)
                .add_directive("citycare_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("CITYCARE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());

    let cfg = CoreConfig::from_values(
        std::env::var("CITYCARE_DATA_DIR").ok(),
        std::env::var("CITYCARE_DOCTOR_PIN").ok(),
        std::env::var("CITYCARE_CORS_ORIGINS").ok(),
    )?;
    tracing::info!("++ Data directory {}", cfg.data_dir().display());

    let app = CityCare::open(Arc::new(cfg))?;
    let counts = app.counts()?;
    tracing::info!(
        "++ Loaded {} patients, {} appointments, {} alerts",
        counts.patients,
        counts.appointments,
        counts.alerts
    );

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    tracing::info!("++ Starting CityCare REST on {}", rest_addr);

    axum::serve(listener, api_rest::router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- CityCare REST stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
