// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use chrono::Utc;
use clap::Parser;
use cli::{Cli, Commands};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use wardkey_core::auth::queries;
use wardkey_core::config::secret::generate_secret;

mod cli;
mod logging;

/// Shortest secret `SigningSecret` accepts.
const MIN_SECRET_LENGTH: usize = 32;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();

    match &args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Commands::GenerateSecret { length } => {
            if *length < MIN_SECRET_LENGTH {
                return Err(Error::Custom(format!(
                    "secret length must be at least {MIN_SECRET_LENGTH}, got {length}"
                )));
            }
            println!("{}", generate_secret(*length));
        }
        Commands::ProvisionCard { uid, principal_id } => {
            let uid = card_uid(uid)?;
            block_on(async {
                let pool = connect(args.database_url.as_deref()).await?;
                let principal = queries::find_principal_by_id(&pool, *principal_id)
                    .await?
                    .ok_or_else(|| Error::Custom(format!("principal {principal_id} not found")))?;
                if !principal.active {
                    log::warn!(
                        "principal {} is inactive; the card will not authenticate",
                        principal.id
                    );
                }
                let credential =
                    queries::provision_credential(&pool, uid, principal.id, Utc::now()).await?;
                log::info!(
                    "card provisioned for {} ({})",
                    principal.display_name,
                    principal.role
                );
                println!("{}", credential.id);
                Ok::<_, Error>(())
            })?;
        }
        Commands::DeactivateCard { uid } => {
            let uid = card_uid(uid)?;
            block_on(async {
                let pool = connect(args.database_url.as_deref()).await?;
                if !queries::deactivate_credential(&pool, uid).await? {
                    return Err(Error::Custom("no card with that UID".into()));
                }
                log::info!("card deactivated");
                Ok::<_, Error>(())
            })?;
        }
        Commands::DeactivatePrincipal { id } => {
            block_on(async {
                let pool = connect(args.database_url.as_deref()).await?;
                if !queries::deactivate_principal(&pool, *id).await? {
                    return Err(Error::Custom(format!("principal {id} not found")));
                }
                log::info!("principal {id} deactivated");
                Ok::<_, Error>(())
            })?;
        }
    }

    Ok(())
}

fn card_uid(raw: &str) -> Result<&str> {
    let uid = raw.trim();
    if uid.is_empty() {
        return Err(Error::Custom("card UID must not be empty".into()));
    }
    Ok(uid)
}

fn block_on<F: std::future::Future<Output = Result<()>>>(fut: F) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(fut)
}

async fn connect(database_url: Option<&str>) -> Result<PgPool> {
    let url = database_url.ok_or_else(|| {
        Error::Custom("no database configured: pass --database-url or set DATABASE_URL".into())
    })?;
    log::debug!("connecting to database");
    Ok(PgPoolOptions::new().max_connections(1).connect(url).await?)
}
