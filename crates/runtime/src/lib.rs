use anyhow::{Context, Result};
use sqlx::SqlitePool;
use staybook_auth::Authenticator;
use staybook_config::AppConfig;
use staybook_database::initialize_database;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::TRACE)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Long-lived handles shared by every entrypoint.
#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub authenticator: Authenticator,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to prepare database")?;
        info!(url = %config.database.url, "database ready");

        let authenticator = Authenticator::new(db_pool.clone(), config.auth.clone());

        // Payments and task queue settings are loaded but have no consumer yet.
        info!(
            configured = config.payments.is_configured(),
            base_url = %config.payments.chapa_base_url,
            "payment gateway settings loaded"
        );
        info!(
            broker = %config.tasks.broker_url,
            result_backend = %config.tasks.result_backend,
            "task queue settings loaded"
        );

        Ok(Self {
            db_pool,
            authenticator,
        })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
