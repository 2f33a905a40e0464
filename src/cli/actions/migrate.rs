use crate::MIGRATOR;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub dsn: SecretString,
    pub revert: bool,
}

/// Apply pending migrations, or undo the latest applied one with `--revert`.
/// # Errors
/// Returns an error if the database is unreachable or a migration fails.
pub async fn execute(args: Args) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(args.dsn.expose_secret())
        .await
        .context("Failed to connect to database")?;

    if args.revert {
        let applied = applied_versions(&pool).await?;
        match revert_target(&applied) {
            Some(target) => {
                MIGRATOR
                    .undo(&pool, target)
                    .await
                    .context("Failed to revert migration")?;
                info!(version = ?applied.first(), "migration reverted");
            }
            None => info!("no applied migrations to revert"),
        }
    } else {
        MIGRATOR
            .run(&pool)
            .await
            .context("Failed to apply migrations")?;
        info!("migrations applied");
    }

    pool.close().await;

    Ok(())
}

/// Applied migration versions, newest first.
async fn applied_versions(pool: &PgPool) -> Result<Vec<i64>> {
    let exists: bool =
        sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await?;
    if !exists {
        return Ok(Vec::new());
    }

    Ok(sqlx::query_scalar(
        "SELECT version FROM _sqlx_migrations WHERE success ORDER BY version DESC",
    )
    .fetch_all(pool)
    .await?)
}

/// Version to undo down to so that only the newest applied migration is reverted.
fn revert_target(applied: &[i64]) -> Option<i64> {
    let (_latest, rest) = applied.split_first()?;
    Some(rest.first().copied().unwrap_or(0))
}
