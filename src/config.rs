//! Configuration file handling for pocket.
//!
//! The configuration file is stored at `$POCKET_HOME/config.json` and contains settings for the
//! application such as how many backups to keep and, optionally, where the database lives.

use crate::backup::Backup;
use crate::db::Db;
use crate::identity::Identity;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "pocket";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const BACKUPS: &str = ".backups";
const CONFIG_JSON: &str = "config.json";
const POCKET_SQLITE: &str = "pocket.sqlite";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$POCKET_HOME` and from there it loads `$POCKET_HOME/config.json`. It owns the
/// database handle, which every command receives through it.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
}

impl Config {
    /// Creates the data directory, its backups subdirectory, an initial `config.json` with default
    /// settings, and a new database with the current schema.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    /// - Returns an error if a database already exists in the directory.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the pocket home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile::default();
        let sqlite_path = resolve(&root, config_file.sqlite_path());
        if sqlite_path.exists() {
            bail!(
                "A pocket database already exists at '{}'",
                sqlite_path.display()
            );
        }
        config_file.save(&config_path).await?;

        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create SQLite DB")?;

        Ok(Self {
            root,
            backups,
            config_path,
            config_file,
            db,
            sqlite_path,
        })
    }

    /// This will
    /// - validate that `pocket_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the backups directory exists
    /// - open the database, migrating its schema if needed
    pub async fn load(pocket_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = pocket_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Pocket home is missing, run 'pocket init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let backups = root.join(BACKUPS);
        if !backups.is_dir() {
            bail!("The backups directory is missing '{}'", backups.display())
        }

        let sqlite_path = resolve(&root, config_file.sqlite_path());
        let db = Db::load(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")?;

        Ok(Self {
            root,
            backups,
            config_path,
            config_file,
            db,
            sqlite_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    /// Creates the identity provider backed by this configuration's database.
    pub fn identity(&self) -> Identity {
        Identity::new(self.db.clone())
    }
}

/// Returns `p` unchanged if it is absolute, otherwise joins it onto `root`.
fn resolve(root: &Path, p: PathBuf) -> PathBuf {
    if p.is_absolute() {
        return p;
    }
    root.join(p)
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "pocket",
///   "config_version": 1,
///   "backup_copies": 5,
///   "sqlite_path": "pocket.sqlite"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "pocket"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Number of database backup copies to keep
    backup_copies: u32,

    /// Path to the SQLite database (optional, relative to config.json or absolute)
    /// Defaults to $POCKET_HOME/pocket.sqlite if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    sqlite_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            backup_copies: BACKUP_COPIES,
            sqlite_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.backup_copies > 0,
            "backup_copies in the config file must be at least 1"
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the database path. A relative path is relative to the config file's directory.
    fn sqlite_path(&self) -> PathBuf {
        self.sqlite_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(POCKET_SQLITE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("pocket_home");

        let config = Config::create(&home_dir).await.unwrap();

        assert!(config.backups().is_dir());
        assert!(config.config_path().is_file());
        assert!(config.sqlite_path().is_file());
        assert_eq!(config.sqlite_path(), config.root().join(POCKET_SQLITE));
        assert_eq!(config.backup_copies(), BACKUP_COPIES);
    }

    #[tokio::test]
    async fn test_config_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path()).await.unwrap();
        let err = Config::create(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_config_load_after_create() {
        let dir = TempDir::new().unwrap();
        let created = Config::create(dir.path()).await.unwrap();
        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(created.root(), loaded.root());
        assert_eq!(created.sqlite_path(), loaded.sqlite_path());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("nope")).await;
        assert!(result.unwrap_err().to_string().contains("pocket init"));
    }

    #[tokio::test]
    async fn test_config_load_missing_database() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path()).await.unwrap();
        config.db().close().await;
        tokio::fs::remove_file(config.sqlite_path()).await.unwrap();
        assert!(Config::load(dir.path()).await.is_err());
    }

    #[test]
    fn test_config_file_default() {
        let config = ConfigFile::default();
        assert_eq!(config.app_name, "pocket");
        assert_eq!(config.backup_copies, 5);
        assert_eq!(config.sqlite_path(), PathBuf::from(POCKET_SQLITE));
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("sqlite_path"));
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let original = ConfigFile {
            backup_copies: 7,
            sqlite_path: Some(PathBuf::from("data/ledger.sqlite")),
            ..ConfigFile::default()
        };

        original.save(&config_path).await.unwrap();
        let loaded = ConfigFile::load(&config_path).await.unwrap();

        assert_eq!(original, loaded);
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "wrong_app",
            "config_version": 1,
            "backup_copies": 5
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_load_zero_backups() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{ "app_name": "pocket", "config_version": 1, "backup_copies": 0 }"#;
        utils::write(&config_path, json).await.unwrap();
        assert!(ConfigFile::load(&config_path).await.is_err());
    }

    #[test]
    fn test_resolve() {
        let root = Path::new("/home/me/pocket");
        assert_eq!(
            resolve(root, PathBuf::from("pocket.sqlite")),
            PathBuf::from("/home/me/pocket/pocket.sqlite")
        );
        assert_eq!(
            resolve(root, PathBuf::from("/data/ledger.sqlite")),
            PathBuf::from("/data/ledger.sqlite")
        );
    }
}
