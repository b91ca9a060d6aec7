use anyhow::Context;
use clap::{Parser, Subcommand};
use staybook_auth::NewAccount;
use staybook_config::{load as load_config, AppConfig};
use staybook_database::{ProfileRepository, Role};
use staybook_gateway::{build_router, AppState};
use staybook_runtime::{telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "staybook")]
#[command(about = "Staybook rental marketplace backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Register an account and give it the admin role
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;
    let config = load_config().context("failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(&config).await,
        Commands::Migrate => migrate(&config).await,
        Commands::CreateAdmin {
            username,
            email,
            password,
        } => create_admin(&config, username, email, password).await,
    }
}

async fn run_server(config: &AppConfig) -> anyhow::Result<()> {
    info!("starting Staybook backend");

    let services = BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")?;

    let state = AppState::new(
        services.db_pool.clone(),
        services.authenticator.clone(),
        config.pagination.clone(),
    );
    let app = build_router(state, &config.http);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(staybook_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    services.db_pool.close().await;
    info!("backend shut down");
    Ok(())
}

async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let services = BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")?;
    services.db_pool.close().await;

    println!("Database at {} is up to date", config.database.url);
    Ok(())
}

async fn create_admin(
    config: &AppConfig,
    username: String,
    email: String,
    password: String,
) -> anyhow::Result<()> {
    let services = BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")?;

    let account = NewAccount {
        username,
        email,
        password,
        first_name: None,
        last_name: None,
    };

    let mut tx = services
        .db_pool
        .begin()
        .await
        .context("failed to open transaction")?;
    let user = services
        .authenticator
        .register_in(&mut tx, &account)
        .await
        .context("failed to register admin account")?;
    let profile = ProfileRepository::provision_in(&mut tx, user.id, Role::Admin)
        .await
        .context("failed to provision admin profile")?;
    tx.commit().await.context("failed to save admin account")?;

    info!(user_id = user.id, "admin account created");
    println!(
        "Created admin '{}' with public id {}",
        profile.username, profile.public_id
    );

    services.db_pool.close().await;
    Ok(())
}
