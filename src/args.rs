//! These structs provide the CLI interface for the pocket CLI.

use crate::model::{Amount, Kind};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// pocket: A personal finance ledger for the command line.
///
/// Record income and expenses, set monthly spending limits per category, and get monthly and
/// yearly reports. Everything is stored in a local SQLite database under --pocket-home.
///
/// Start with `pocket init`, then `pocket register`. Commands that read or write the ledger need
/// --username (or POCKET_USER) and a password, which is read from POCKET_PASSWORD or prompted for.
#[derive(Debug, Parser, Clone)]
#[command(version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, its configuration file and an empty database.
    ///
    /// By default the data directory is $HOME/pocket. Pass --pocket-home or set POCKET_HOME to
    /// put it somewhere else.
    Init,
    /// Register a new user.
    Register(UserArgs),
    /// Record an income or expense transaction.
    ///
    /// If the transaction is an expense and puts its category over the budget set for that
    /// month, an alert is printed. The transaction is recorded either way.
    Add(AddArgs),
    /// List all of your transactions, newest first.
    List(UserArgs),
    /// Show income, expenses and savings for a month or a year.
    Report(ReportArgs),
    /// Set or list monthly spending limits.
    Budget(BudgetArgs),
    /// Copy the database into the backups directory.
    Backup,
    /// Replace the database with a backup. The current database is backed up first.
    Restore(RestoreArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where pocket data and configuration is held. Defaults to ~/pocket
    #[arg(long, env = "POCKET_HOME", default_value_t = default_pocket_home())]
    pocket_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, pocket_home: PathBuf) -> Self {
        Self {
            log_level,
            pocket_home: pocket_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn pocket_home(&self) -> &DisplayPath {
        &self.pocket_home
    }
}

/// Identifies the user a command acts for. The password is never taken as a flag.
#[derive(Debug, Parser, Clone)]
pub struct UserArgs {
    /// Your pocket username.
    #[arg(long, env = "POCKET_USER")]
    pub username: String,
}

/// Args for the `pocket add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    #[clap(flatten)]
    pub user: UserArgs,

    /// The amount, e.g. 12.50 or 1,250.00
    #[arg(long, allow_hyphen_values = true)]
    pub amount: String,

    /// A free-form label such as Food, Rent or Salary. Matching is exact and case-sensitive.
    #[arg(long)]
    pub category: String,

    /// Whether this is income or an expense.
    #[arg(long, value_enum, ignore_case = true)]
    pub kind: Kind,

    /// The date of the transaction as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    pub date: Option<String>,
}

/// Args for the `pocket report` command.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    #[clap(flatten)]
    pub user: UserArgs,

    #[command(subcommand)]
    pub period: ReportPeriod,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReportPeriod {
    /// Totals for one month.
    Monthly(MonthArgs),
    /// Totals for one year.
    Yearly(YearArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct MonthArgs {
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..=9999))]
    pub year: i32,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: u32,
}

#[derive(Debug, Parser, Clone)]
pub struct YearArgs {
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..=9999))]
    pub year: i32,
}

/// Args for the `pocket budget` command.
#[derive(Debug, Parser, Clone)]
pub struct BudgetArgs {
    #[clap(flatten)]
    pub user: UserArgs,

    #[command(subcommand)]
    pub action: BudgetAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum BudgetAction {
    /// Set the spending limit for a category in one month.
    ///
    /// Setting a limit again for the same category and month replaces the one in effect.
    Set(SetBudgetArgs),
    /// List the limits configured for a year, or for one month of it.
    List(ListBudgetArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct SetBudgetArgs {
    /// The category the limit applies to.
    #[arg(long)]
    pub category: String,

    /// The most you want to spend in the category that month.
    #[arg(long, allow_hyphen_values = true)]
    pub limit: Amount,

    #[clap(flatten)]
    pub period: MonthArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct ListBudgetArgs {
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..=9999))]
    pub year: i32,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}

/// Args for the `pocket restore` command.
#[derive(Debug, Parser, Clone)]
pub struct RestoreArgs {
    /// A file name in the backups directory, e.g. pocket.sqlite.2025-08-01-001, or a path to a
    /// backup file.
    pub name: String,
}

fn default_pocket_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("pocket"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --pocket-home or POCKET_HOME instead of relying on the default \
                pocket home directory.",
            );
            PathBuf::from("pocket")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
