//! Wardkey API server binary.
//!
//! Reads configuration from the environment (and `.env`), runs migrations,
//! then serves the HTTP API until interrupted.

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use wardkey_api::config::ApiConfig;

/// CLI arguments. Each overrides the matching environment variable.
#[derive(Parser, Debug)]
#[command(name = "wardkey_api_server", about = "Wardkey API server")]
struct Args {
    /// Address to listen on (overrides `BIND_ADDR`).
    #[arg(long)]
    bind: Option<String>,

    /// PostgreSQL connection URL (overrides `DATABASE_URL`).
    #[arg(long)]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    max_connections: u32,

    /// Skip embedded migrations at startup.
    #[arg(long, default_value_t = false)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wardkey_api=debug,wardkey_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(url) = args.database_url {
        config.pg_connection_url = url;
    }
    if !config.expose_auth_failure_reasons {
        info!("card login failures collapse to 401");
    }

    info!(
        bind_addr = %config.bind_addr,
        max_connections = args.max_connections,
        version = wardkey_core::version(),
        "starting wardkey_api_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.pg_connection_url)
        .await?;

    if args.skip_migrations {
        warn!("skipping database migrations");
    } else {
        info!("running database migrations");
        wardkey_api::migrate(&pool).await?;
    }

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;

    let app = wardkey_api::router(wardkey_api::AppState::from_pool(pool, config));

    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
            }
        })
        .await?;

    Ok(())
}
