use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pollutant_predictor::{config::ServiceConfig, service, Pipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ServiceConfig::from_env()?;
    tracing::info!("config: {:?}", cfg);

    // Nothing is served unless schema, model and stations all load.
    let pipeline = Pipeline::init(&cfg)?;

    let app = service::router(Arc::new(pipeline));

    tracing::info!("listening on {}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
