use super::database;
use clap::{Arg, ArgAction, Command};

pub const NAME: &str = "migrate";

pub const ARG_REVERT: &str = "revert";

#[must_use]
pub fn command() -> Command {
    let command = Command::new(NAME)
        .about("Apply pending schema migrations")
        .arg(
            Arg::new(ARG_REVERT)
                .long("revert")
                .help("Undo the most recently applied migration instead")
                .action(ArgAction::SetTrue),
        );

    database::with_args(command)
}
