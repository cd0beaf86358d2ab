pub mod args;
mod backup;
pub mod commands;
mod config;
mod db;
mod error;
mod identity;
pub mod ledger;
pub mod model;
mod utils;

#[cfg(test)]
mod test;

pub use backup::{Backup, Restored};
pub use config::Config;
pub use error::{error_type, Error, ErrorType, Result};
pub use identity::{Identity, Registration};
