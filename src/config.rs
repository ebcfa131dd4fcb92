//! Configuration file handling for SmartCash.
//!
//! The configuration file is stored at `$SMARTCASH_HOME/config.json` and contains settings such as
//! the active environment, backup settings and the currency symbol used for display.

use crate::backup::Backup;
use crate::db::Db;
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const APP_NAME: &str = "smartcash";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const CURRENCY_SYMBOL: &str = "$";
const BACKUPS: &str = ".backups";
const CONFIG_JSON: &str = "config.json";

/// Selects which database file is active. Staging lets you try things out without touching
/// production data.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Production,
    Staging,
}

serde_plain::derive_display_from_serialize!(Environment);
serde_plain::derive_fromstr_from_deserialize!(Environment);

impl Environment {
    /// The name of this environment's database file within `$SMARTCASH_HOME`.
    pub fn sqlite_file(&self) -> &'static str {
        match self {
            Environment::Production => "smartcash.sqlite",
            Environment::Staging => "smartcash-staging.sqlite",
        }
    }
}

/// Changes to apply with `Config::update`. `None` leaves a setting as it is.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct Settings {
    pub environment: Option<Environment>,
    pub backup_copies: Option<u32>,
    pub currency_symbol: Option<String>,
    pub backup_dir: Option<PathBuf>,
}

impl Settings {
    pub fn is_empty(&self) -> bool {
        self == &Settings::default()
    }
}

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$SMARTCASH_HOME` and from there it loads `$SMARTCASH_HOME/config.json`. It holds
/// the open database for the active environment.
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
    /// Creates the data directory, its backups subdirectory, an initial `config.json` with
    /// default settings and the production database.
    ///
    /// # Errors
    /// - Returns an error if `dir` already holds a configuration or if any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the smartcash home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A configuration already exists at '{}'",
                config_path.display()
            );
        }

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let sqlite_path = root.join(config_file.environment.sqlite_file());
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
    /// - validate that `smartcash_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the backups directory exists
    /// - load the active environment's database, creating it if this environment has never been
    ///   used
    pub async fn load(smartcash_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = smartcash_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("SmartCash home is missing, run 'smartcash init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let backups = resolve(&root, config_file.backup_dir.as_deref());
        if !backups.is_dir() {
            bail!("The backups directory is missing '{}'", backups.display())
        }

        let sqlite_path = root.join(config_file.environment.sqlite_file());
        let db = open_db(&sqlite_path).await?;

        Ok(Self {
            root,
            backups,
            config_path,
            config_file,
            db,
            sqlite_path,
        })
    }

    /// Applies `settings`, saves `config.json` and, when the environment changes, switches to
    /// that environment's database. On error `self` is left unchanged.
    pub async fn update(&mut self, settings: &Settings) -> Result<()> {
        let mut file = self.config_file.clone();
        if let Some(copies) = settings.backup_copies {
            ensure!(copies > 0, "backup_copies must be at least 1");
            file.backup_copies = copies;
        }
        if let Some(symbol) = &settings.currency_symbol {
            file.currency_symbol = symbol.trim().to_string();
        }
        let mut backups = None;
        if let Some(dir) = &settings.backup_dir {
            let path = resolve(&self.root, Some(dir));
            utils::make_dir(&path).await?;
            file.backup_dir = Some(dir.clone());
            backups = Some(path);
        }
        if let Some(environment) = settings.environment {
            file.environment = environment;
        }

        let mut switch = None;
        if file.environment != self.config_file.environment {
            let sqlite_path = self.root.join(file.environment.sqlite_file());
            let db = open_db(&sqlite_path).await?;
            switch = Some((db, sqlite_path));
        }

        if let Err(e) = file.save(&self.config_path).await {
            if let Some((db, _)) = switch {
                db.close().await;
            }
            return Err(e);
        }

        if let Some((db, sqlite_path)) = switch {
            self.db.close().await;
            self.db = db;
            self.sqlite_path = sqlite_path;
            info!("Switched to the {} environment", file.environment);
        }
        if let Some(path) = backups {
            self.backups = path;
        }
        self.config_file = file;
        Ok(())
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

    pub fn environment(&self) -> Environment {
        self.config_file.environment
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    pub fn currency_symbol(&self) -> &str {
        &self.config_file.currency_symbol
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }
}

async fn open_db(sqlite_path: &Path) -> Result<Db> {
    if sqlite_path.exists() {
        Db::load(sqlite_path)
            .await
            .context("Unable to load SQLite DB")
    } else {
        debug!("Creating {}", sqlite_path.display());
        Db::init(sqlite_path)
            .await
            .context("Unable to create SQLite DB")
    }
}

/// Returns `p` if it is absolute, otherwise resolves it against `root`. `None` is the default
/// backups directory.
fn resolve(root: &Path, p: Option<&Path>) -> PathBuf {
    match p {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => root.join(p),
        None => root.join(BACKUPS),
    }
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

fn default_currency_symbol() -> String {
    CURRENCY_SYMBOL.to_string()
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "smartcash",
///   "config_version": 1,
///   "environment": "production",
///   "backup_copies": 5,
///   "currency_symbol": "R$",
///   "backup_dir": "/mnt/usb/smartcash-backups"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "smartcash"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Which database file is active
    #[serde(default)]
    environment: Environment,

    /// Number of backup copies to keep
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,

    /// Shown in front of amounts in command output
    #[serde(default = "default_currency_symbol")]
    currency_symbol: String,

    /// Where backups are written (optional, relative to $SMARTCASH_HOME or absolute)
    /// Defaults to $SMARTCASH_HOME/.backups if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    backup_dir: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            environment: Environment::default(),
            backup_copies: BACKUP_COPIES,
            currency_symbol: CURRENCY_SYMBOL.to_string(),
            backup_dir: None,
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
        let content = utils::read(path).await?;
        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.config_version == CONFIG_VERSION,
            "Unsupported config_version {} in config file, expected {CONFIG_VERSION}",
            config.config_version
        );
        ensure!(
            config.backup_copies > 0,
            "backup_copies must be at least 1 in config file"
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path as pretty JSON.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path.as_ref(), data)
            .await
            .context("Unable to write config file")
    }
}
