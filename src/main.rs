//! # Microblog
//!
//! Entry point: initializes logging, loads configuration, opens the database
//! and search index, then serves the HTTP API.

use anyhow::Result;
use tracing::info;

use microblog::config::Settings;
use microblog::presentation::http::handlers::health::init_server_start;
use microblog::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    microblog::telemetry::init_tracing();
    init_server_start();

    info!("Starting microblog...");

    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
