use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use storage::models::{CompetitionStatus, CreditType};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(name = "pitchside-ops")]
#[command(about = "Pitchside ledger operations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Add credits to one of a user's pools
    GrantCredits {
        #[arg(long)]
        user: Uuid,

        #[arg(long, value_enum)]
        pool: Pool,

        #[arg(long)]
        amount: Decimal,

        #[arg(long)]
        reason: Option<String>,
    },
    /// Move a competition to its next status
    SetStatus {
        competition: Uuid,

        #[arg(value_enum)]
        status: Status,
    },
    /// Rank a finished competition and pay out prizes
    Settle { competition: Uuid },
    /// Cancel card-paid entries whose checkout was never completed
    ExpirePending {
        #[arg(long, default_value_t = 60)]
        older_than_minutes: i64,

        #[arg(long)]
        dry_run: bool,
    },
    /// Give a user the admin role
    PromoteAdmin { user: Uuid },
}

#[derive(Clone, Copy, ValueEnum)]
enum Pool {
    Referral,
    Winnings,
    Purchased,
}

impl From<Pool> for CreditType {
    fn from(pool: Pool) -> Self {
        match pool {
            Pool::Referral => CreditType::Referral,
            Pool::Winnings => CreditType::Winnings,
            Pool::Purchased => CreditType::Purchased,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Status {
    Live,
    Finished,
}

impl From<Status> for CompetitionStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Live => CompetitionStatus::Live,
            Status::Finished => CompetitionStatus::Finished,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("pitchside_ops={},storage={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&cli.database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::GrantCredits {
            user,
            pool: credit_pool,
            amount,
            reason,
        } => {
            commands::grant_credits(&pool, user, credit_pool.into(), amount, reason).await?;
        }
        Commands::SetStatus {
            competition,
            status,
        } => {
            commands::set_status(&pool, competition, status.into()).await?;
        }
        Commands::Settle { competition } => {
            commands::settle(&pool, competition).await?;
        }
        Commands::ExpirePending {
            older_than_minutes,
            dry_run,
        } => {
            commands::expire_pending(&pool, older_than_minutes, dry_run).await?;
        }
        Commands::PromoteAdmin { user } => {
            commands::promote_admin(&pool, user).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_grant() {
        let user = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "pitchside-ops",
            "--database-url",
            "postgres://localhost/pitchside",
            "grant-credits",
            "--user",
            &user.to_string(),
            "--pool",
            "winnings",
            "--amount",
            "12.50",
        ])
        .unwrap();

        match cli.command {
            Commands::GrantCredits {
                user: parsed,
                pool,
                amount,
                reason,
            } => {
                assert_eq!(parsed, user);
                assert_eq!(CreditType::from(pool), CreditType::Winnings);
                assert_eq!(amount, Decimal::new(1250, 2));
                assert!(reason.is_none());
            }
            _ => panic!("expected grant-credits"),
        }
    }

    #[test]
    fn test_cli_rejects_scheduled_status() {
        let result = Cli::try_parse_from([
            "pitchside-ops",
            "--database-url",
            "postgres://localhost/pitchside",
            "set-status",
            &Uuid::new_v4().to_string(),
            "scheduled",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_expire_pending_defaults() {
        let cli = Cli::try_parse_from([
            "pitchside-ops",
            "--database-url",
            "postgres://localhost/pitchside",
            "expire-pending",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Commands::ExpirePending {
                older_than_minutes: 60,
                dry_run: false
            }
        ));
    }
}
