use std::path::Path;

use anyhow::Result;
use conduit_auth::TokenService;
use conduit_api::seed;
use conduit_common::{Database, DatabaseConfig};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Preparing Conduit database");

    let db_config = DatabaseConfig::from_env()?;
    let database = Database::open(&db_config).await?;

    // Check database connectivity
    if database.health_check().await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database.migrate().await?;
    info!("Schema is up to date");

    if let Ok(path) = std::env::var("SEED_FILE") {
        let inserted = seed::seed(&database, Path::new(&path)).await?;
        info!("Seeded {} users from {}", inserted, path);
    }

    if !TokenService::global().has_secret() {
        warn!("JWT_SECRET is not set, token operations will fail");
    }

    database.close().await;
    info!("Database ready");

    Ok(())
}
