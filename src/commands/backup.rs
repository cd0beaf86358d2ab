use crate::backup::Restored;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use std::path::PathBuf;

/// Copies the database into the backups directory.
pub async fn backup(config: &Config) -> Result<Out<PathBuf>> {
    let path = config
        .backup()
        .copy_sqlite()
        .await
        .pub_result(ErrorType::Backup)?;
    Ok(Out::new(format!("Backup created: {}", path.display()), path))
}

/// Replaces the database with the backup called `name`. `config` holds a closed database
/// afterwards and must not be used again.
pub async fn restore(config: &Config, name: &str) -> Result<Out<Restored>> {
    let restored = config
        .backup()
        .restore(config.db(), name)
        .await
        .pub_result(ErrorType::Backup)?;
    Ok(Out::new(
        format!(
            "Database restored from {}. The previous database was saved as {}",
            restored.source.display(),
            restored.snapshot.display()
        ),
        restored,
    ))
}
