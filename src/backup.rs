//! Backup and restore of the SQLite database file.

use crate::db::Db;
use crate::{utils, Config, Result};
use anyhow::{bail, Context};
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Prefix for SQLite backup files.
pub const SQLITE: &str = "pocket.sqlite";

/// Prefix for the snapshot taken of the live database right before a restore overwrites it.
pub const PRE_RESTORE: &str = "pre-restore.sqlite";

/// The result of a successful restore.
#[derive(Debug, Clone, Serialize)]
pub struct Restored {
    /// The backup file that was copied over the live database.
    pub source: PathBuf,
    /// Where the previous live database was saved.
    pub snapshot: PathBuf,
}

/// Manages backup file creation, rotation and restore.
///
/// The `Backup` struct is immutable and owns copies of the paths and settings it needs.
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
    sqlite_path: PathBuf,
}

impl Backup {
    /// Creates a new `Backup` instance from a `Config`.
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
            sqlite_path: config.sqlite_path().to_path_buf(),
        }
    }

    /// Copies the SQLite database file to the backups directory.
    ///
    /// The filename format is `pocket.sqlite.YYYY-MM-DD-NNN` where NNN is a sequence number.
    /// Automatically rotates old backups, keeping only `backup_copies` files.
    ///
    /// Returns the path to the created backup file.
    pub async fn copy_sqlite(&self) -> Result<PathBuf> {
        self.copy_with_prefix(SQLITE).await
    }

    /// Replaces the live database with the backup called `name`.
    ///
    /// `name` is either a file name inside the backups directory or a path to a backup file. The
    /// live database is copied to a `pre-restore.sqlite.*` snapshot first. `db` is closed before
    /// the file is overwritten, so the caller must not use it afterwards.
    ///
    /// If the restored file is not a pocket database, for example an empty file or some other
    /// SQLite file, the snapshot is put back and an error is returned.
    pub(crate) async fn restore(&self, db: &Db, name: &str) -> Result<Restored> {
        let source = self.find(name)?;
        let source = utils::canonicalize(&source).await?;
        let live = utils::canonicalize(&self.sqlite_path).await?;
        if source == live {
            bail!("Cannot restore the live database onto itself");
        }

        db.close().await;
        let snapshot = self.copy_with_prefix(PRE_RESTORE).await?;
        debug!("Saved the live database to {}", snapshot.display());

        utils::copy(&source, &self.sqlite_path).await?;
        match Db::load_existing(&self.sqlite_path).await {
            Ok(restored) => restored.close().await,
            Err(e) => {
                warn!("The restored database is unusable, putting the previous one back");
                utils::copy(&snapshot, &self.sqlite_path).await?;
                return Err(e).with_context(|| {
                    format!("'{}' is not a usable pocket database", source.display())
                });
            }
        }

        Ok(Restored { source, snapshot })
    }

    /// Resolves a backup name to an existing file.
    fn find(&self, name: &str) -> Result<PathBuf> {
        if name.trim().is_empty() {
            bail!("A backup name is required");
        }
        let in_backups = self.backups_dir.join(name);
        if in_backups.is_file() {
            return Ok(in_backups);
        }
        let as_path = Path::new(name);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }
        bail!(
            "No backup named '{name}' in '{}'",
            self.backups_dir.display()
        )
    }

    async fn copy_with_prefix(&self, prefix: &str) -> Result<PathBuf> {
        let date = today();
        let seq = self.next_sequence_number(prefix, &date).await?;
        let filename = format!("{prefix}.{date}-{seq:03}");
        let path = self.backups_dir.join(&filename);

        utils::copy(&self.sqlite_path, &path)
            .await
            .context("Unable to copy the database into the backups directory")?;

        self.rotate(prefix).await?;

        Ok(path)
    }

    /// Scans the backups directory for existing files with the given prefix and date,
    /// and returns the next sequence number.
    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Result<u32> {
        let mut max_seq: u32 = 0;

        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(seq) = parse_sequence_number(&name, prefix, date) {
                max_seq = max_seq.max(seq);
            }
        }

        Ok(max_seq + 1)
    }

    /// Rotates old backup files, keeping only `backup_copies` files with the given prefix.
    async fn rotate(&self, prefix: &str) -> Result<()> {
        let mut files: Vec<(PathBuf, String)> = Vec::new();

        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_backup_file(&name, prefix) {
                files.push((entry.path(), name));
            }
        }

        // Names sort by date, then sequence number.
        files.sort_by(|a, b| a.1.cmp(&b.1));

        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (path, name) in files.into_iter().take(to_delete) {
            debug!("Removing old backup {name}");
            utils::remove(&path).await?;
        }

        Ok(())
    }
}

/// Returns today's date in YYYY-MM-DD format.
fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parses the sequence number from a backup filename of the form `{prefix}.{date}-{NNN}`.
/// Returns None if the filename doesn't match.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    let expected_start = format!("{prefix}.{date}-");
    let seq = filename.strip_prefix(&expected_start)?;
    if seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    seq.parse().ok()
}

/// Checks if a filename is `{prefix}.YYYY-MM-DD-NNN`.
fn is_backup_file(filename: &str, prefix: &str) -> bool {
    let Some(rest) = filename.strip_prefix(&format!("{prefix}.")) else {
        return false;
    };
    match rest.rsplit_once('-') {
        Some((date, seq)) => {
            date.len() == 10
                && !seq.is_empty()
                && seq.bytes().all(|b| b.is_ascii_digit())
                && chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
        }
        None => false,
    }
}
