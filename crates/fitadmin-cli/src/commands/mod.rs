pub mod auth_cmd;
pub mod common;
pub mod completions;
pub mod config;
pub mod create;
pub mod dashboard;
pub mod delete;
pub mod edit;
pub mod list;
pub mod show;

use clap::CommandFactory;

use crate::cli::{Cli, Commands};
use crate::commands::common::Console;
use crate::error::CliError;

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let profile = cli.profile.as_deref();
    match cli.command {
        Some(Commands::Dashboard { json }) => {
            dashboard::run_dashboard(&Console::open(profile)?, json).await
        }
        Some(Commands::List { filter, page, json }) => {
            list::run_list(&Console::open(profile)?, filter.into(), page, json).await
        }
        Some(Commands::Show { kind, id }) => {
            show::run_show(&Console::open(profile)?, kind, &id).await
        }
        Some(Commands::Create { kind, input }) => {
            create::run_create(&Console::open(profile)?, kind, &input).await
        }
        Some(Commands::Edit {
            kind,
            id,
            input,
            clear_image,
        }) => edit::run_edit(&Console::open(profile)?, kind, &id, &input, clear_image).await,
        Some(Commands::Delete { kind, id }) => {
            delete::run_delete(&Console::open(profile)?, kind, &id).await
        }
        Some(Commands::Completions { shell, output }) => {
            completions::run_completions(shell, output.as_deref())
        }
        Some(Commands::Config { command }) => config::run_config(command, profile),
        Some(Commands::Auth { command }) => auth_cmd::run_auth(command, profile).await,
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}
