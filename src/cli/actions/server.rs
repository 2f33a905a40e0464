use crate::{
    account::CredentialHasher,
    api::{self, ServerConfig, handlers::auth::TokenVerifier},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: SecretString,
    pub jwt_secret: SecretString,
    pub bcrypt_cost: u32,
    pub max_connections: u32,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let hasher = CredentialHasher::new(args.bcrypt_cost).context("invalid --bcrypt-cost")?;
    let verifier = TokenVerifier::new(&args.jwt_secret);

    debug!(
        port = args.port,
        bcrypt_cost = hasher.cost(),
        max_connections = args.max_connections,
        "starting server"
    );

    api::new(ServerConfig {
        port: args.port,
        dsn: args.dsn,
        max_connections: args.max_connections,
        hasher,
        verifier,
    })
    .await
}
