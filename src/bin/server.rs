use anyhow::Context;
use trivia_api::db::{establish_connection, run_migrations};
use trivia_api::server::app::run_server;
use trivia_api::settings::Settings;
use trivia_api::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Invalid configuration")?;
    init_tracing();

    let pool = establish_connection(&settings.database_path)
        .await
        .with_context(|| format!("Cannot open database {}", settings.database_path))?;

    tracing::info!("Running db migrations...");
    run_migrations(&pool).await?;

    run_server(pool, &settings.listen_addr).await
}
