//! Map parsed command-line arguments to an executable [`Action`].

use crate::cli::actions::{Action, migrate, server};
use crate::cli::commands::{self, database};
use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use secrecy::SecretString;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or the subcommand is unknown.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((commands::server::NAME, sub)) => server_args(sub).map(Action::Server),
        Some((commands::migrate::NAME, sub)) => Ok(Action::Migrate(migrate::Args {
            dsn: dsn(sub)?,
            revert: sub.get_flag(commands::migrate::ARG_REVERT),
        })),
        Some((name, _)) => bail!("unknown subcommand: {name}"),
        None => bail!("missing subcommand"),
    }
}

fn server_args(matches: &ArgMatches) -> Result<server::Args> {
    use commands::server::{ARG_BCRYPT_COST, ARG_DB_MAX_CONNECTIONS, ARG_JWT_SECRET, ARG_PORT};

    let jwt_secret = matches
        .get_one::<String>(ARG_JWT_SECRET)
        .cloned()
        .context("missing required argument: --jwt-secret")?;

    Ok(server::Args {
        port: matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080),
        dsn: dsn(matches)?,
        jwt_secret: SecretString::from(jwt_secret),
        bcrypt_cost: matches
            .get_one::<u32>(ARG_BCRYPT_COST)
            .copied()
            .unwrap_or(bcrypt::DEFAULT_COST),
        max_connections: matches
            .get_one::<u32>(ARG_DB_MAX_CONNECTIONS)
            .copied()
            .unwrap_or(5),
    })
}

fn dsn(matches: &ArgMatches) -> Result<SecretString> {
    matches
        .get_one::<String>(database::ARG_DSN)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --dsn")
}
