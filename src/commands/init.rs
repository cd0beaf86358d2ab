use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Creates the data directory, its backups subdirectory, an initial `config.json` with default
/// settings, and an empty database.
///
/// # Arguments
/// - `pocket_home` - The directory that will be the root of data directory, e.g. `$HOME/pocket`
///
/// # Errors
/// - Returns an error if any file operations fail.
/// - Returns an error if `pocket_home` already holds a database.
pub async fn init(pocket_home: &Path) -> Result<Out<PathBuf>> {
    let config = Config::create(pocket_home)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    let root = config.root().to_path_buf();
    config.db().close().await;
    Ok(Out::new(
        format!("Successfully created the pocket directory at {}", root.display()),
        root,
    ))
}
