use super::database;
use clap::{Arg, Command};

pub const NAME: &str = "server";

pub const ARG_PORT: &str = "port";
pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_BCRYPT_COST: &str = "bcrypt-cost";
pub const ARG_DB_MAX_CONNECTIONS: &str = "db-max-connections";

#[must_use]
pub fn command() -> Command {
    let command = Command::new(NAME)
        .about("Start the HTTP API")
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("ACCOUNTS_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long("jwt-secret")
                .help("Shared HS256 secret used to verify bearer tokens")
                .env("ACCOUNTS_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_BCRYPT_COST)
                .long("bcrypt-cost")
                .help("bcrypt work factor for new password digests")
                .default_value("12")
                .env("ACCOUNTS_BCRYPT_COST")
                .value_parser(clap::value_parser!(u32).range(4..=31)),
        )
        .arg(
            Arg::new(ARG_DB_MAX_CONNECTIONS)
                .long("db-max-connections")
                .help("Maximum number of pooled database connections")
                .default_value("5")
                .env("ACCOUNTS_DB_MAX_CONNECTIONS")
                .value_parser(clap::value_parser!(u32).range(1..)),
        );

    database::with_args(command)
}
