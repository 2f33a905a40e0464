pub mod migrate;
pub mod server;

#[derive(Debug)]
pub enum Action {
    Server(server::Args),
    Migrate(migrate::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        match self {
            Self::Server(args) => server::execute(args).await,
            Self::Migrate(args) => migrate::execute(args).await,
        }
    }
}
