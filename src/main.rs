use anyhow::Context;
use clap::Parser;
use pocket_ledger::args::{Args, BudgetAction, Command, UserArgs};
use pocket_ledger::commands::Credentials;
use pocket_ledger::{commands, Config, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

const PASSWORD_ENV: &str = "POCKET_PASSWORD";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().pocket_home().path();

    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),

        Command::Register(user) => {
            let config = Config::load(home).await?;
            commands::register(&config, &credentials(user)?)
                .await?
                .print()
        }

        Command::Add(add_args) => {
            let config = Config::load(home).await?;
            let credentials = credentials(&add_args.user)?;
            commands::add(&config, &credentials, add_args.clone())
                .await?
                .print()
        }

        Command::List(user) => {
            let config = Config::load(home).await?;
            commands::list(&config, &credentials(user)?).await?.print()
        }

        Command::Report(report_args) => {
            let config = Config::load(home).await?;
            let credentials = credentials(&report_args.user)?;
            commands::report(&config, &credentials, &report_args.period)
                .await?
                .print()
        }

        Command::Budget(budget_args) => {
            let config = Config::load(home).await?;
            let credentials = credentials(&budget_args.user)?;
            match &budget_args.action {
                BudgetAction::Set(set_args) => {
                    commands::set_budget(&config, &credentials, set_args.clone())
                        .await?
                        .print()
                }
                BudgetAction::List(list_args) => {
                    commands::list_budgets(&config, &credentials, list_args)
                        .await?
                        .print()
                }
            }
        }

        Command::Backup => commands::backup(&Config::load(home).await?)
            .await?
            .print(),

        Command::Restore(restore_args) => {
            let config = Config::load(home).await?;
            commands::restore(&config, &restore_args.name)
                .await?
                .print()
        }
    };
    Ok(())
}

/// Pairs the username with a password read from `POCKET_PASSWORD`, or prompted for without echo.
fn credentials(user: &UserArgs) -> Result<Credentials> {
    let secret = match std::env::var(PASSWORD_ENV) {
        Ok(secret) => {
            debug!("Using the password from {PASSWORD_ENV}");
            secret
        }
        Err(_) => rpassword::prompt_password(format!("Password for {}: ", user.username))
            .context("Unable to read the password")?,
    };
    Ok(Credentials::new(&user.username, secret))
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this package only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
