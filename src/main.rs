use anyhow::Result;
use std::sync::Arc;

use datavision_services::config::Config;
use datavision_services::{app, logging, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging()?;

    let config = Config::from_env()?;
    let addr = config.bind_addr;
    let state = Arc::new(AppState::new(config));

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
