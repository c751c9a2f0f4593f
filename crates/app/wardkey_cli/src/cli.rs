use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Length of a generated signing secret.
pub const DEFAULT_SECRET_LENGTH: usize = 64;

#[derive(Parser, Debug)]
#[command(name = "wardkey", version, about = "Wardkey operator tool")]
pub struct Cli {
    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the version.
    Version,

    /// Print a random secret for `SESSION_SIGNING_SECRET`.
    GenerateSecret {
        #[arg(long, default_value_t = DEFAULT_SECRET_LENGTH)]
        length: usize,
    },

    /// Issue a card to a principal.
    ProvisionCard {
        /// Card UID as read by the scanner.
        #[arg(long)]
        uid: String,

        #[arg(long)]
        principal_id: Uuid,
    },

    /// Deactivate a lost or returned card. Cards are never deleted.
    DeactivateCard {
        #[arg(long)]
        uid: String,
    },

    /// Deactivate a principal. Outstanding session tokens stop working.
    DeactivatePrincipal {
        #[arg(long)]
        id: Uuid,
    },
}
