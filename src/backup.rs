//! Backup management for the SQLite database file.
//!
//! Backups are plain copies of the active database named `{db_file}.YYYY-MM-DD-NNN`, where `NNN`
//! is a per-day sequence number. Before a restore overwrites the database, a safety copy named
//! `pre-restore.{db_file}.YYYY-MM-DD-NNN` is taken.

use crate::db::Db;
use crate::{utils, Config, Result};
use anyhow::{ensure, Context};
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Prefix added to the database file name for the safety copy taken before a restore.
pub const PRE_RESTORE: &str = "pre-restore";

/// Manages backup file creation, rotation and restoration.
///
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
    sqlite_path: PathBuf,
    db: Db,
}

impl Backup {
    /// Creates a new `Backup` instance from a `Config`.
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
            sqlite_path: config.sqlite_path().to_path_buf(),
            db: config.db().clone(),
        }
    }

    /// Copies the active database file to the backups directory and rotates old copies, keeping
    /// `backup_copies` files.
    ///
    /// Returns the path to the created backup file.
    pub async fn create(&self) -> Result<PathBuf> {
        let prefix = self.prefix();
        self.copy_to_backups(&prefix).await
    }

    /// Returns the backups of the active database, oldest first.
    pub async fn list(&self) -> Result<Vec<PathBuf>> {
        let prefix = self.prefix();
        Ok(self
            .scan(&prefix)
            .await?
            .into_iter()
            .map(|(path, _)| path)
            .collect())
    }

    /// Replaces the active database with `file`.
    ///
    /// `file` may be a path or the name of a file in the backups directory. The file must be a
    /// database that this build can load. A `pre-restore` copy of the current database is taken
    /// first and its path is returned. The pool held by the `Config` is closed, so the `Config`
    /// must be loaded again before further use.
    pub async fn restore(&self, file: &Path) -> Result<PathBuf> {
        let source = self.resolve(file);
        ensure!(
            source.is_file(),
            "The backup file '{}' does not exist",
            source.display()
        );
        let source = utils::canonicalize(&source).await?;
        let target = utils::canonicalize(&self.sqlite_path).await?;
        ensure!(
            source != target,
            "Cannot restore the active database onto itself"
        );

        // Refuse anything that is not a loadable database before touching the live file
        let candidate = Db::load(&source)
            .await
            .with_context(|| format!("'{}' is not a valid backup", source.display()))?;
        candidate.close().await;

        let safety = self.copy_to_backups(&self.pre_restore_prefix()).await?;
        info!("Saved the current database to {}", safety.display());

        self.db.close().await;
        utils::copy(&source, &self.sqlite_path).await?;

        let restored = Db::load(&self.sqlite_path)
            .await
            .context("The restored database could not be loaded")?;
        restored.close().await;
        debug!(
            "Restored {} from {}",
            self.sqlite_path.display(),
            source.display()
        );
        Ok(safety)
    }

    async fn copy_to_backups(&self, prefix: &str) -> Result<PathBuf> {
        let date = today();
        let seq = self.next_sequence_number(prefix, &date).await?;
        let filename = format!("{prefix}.{date}-{seq:03}");
        let path = self.backups_dir.join(&filename);

        utils::copy(&self.sqlite_path, &path).await?;
        debug!("Copied database to {}", path.display());

        self.rotate(prefix).await?;

        Ok(path)
    }

    /// Returns the next sequence number for `date` among the backups with `prefix`.
    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Result<u32> {
        let max_seq = self
            .scan(prefix)
            .await?
            .into_iter()
            .filter(|(_, (d, _))| d == date)
            .map(|(_, (_, seq))| seq)
            .max()
            .unwrap_or(0);
        Ok(max_seq + 1)
    }

    /// Deletes the oldest backups with `prefix` until only `backup_copies` remain.
    async fn rotate(&self, prefix: &str) -> Result<()> {
        let files = self.scan(prefix).await?;
        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (path, _) in files.into_iter().take(to_delete) {
            utils::remove(&path).await?;
            debug!("Rotated out {}", path.display());
        }
        Ok(())
    }

    /// Finds the backups with `prefix`, sorted by date and sequence number.
    async fn scan(&self, prefix: &str) -> Result<Vec<(PathBuf, (String, u32))>> {
        let mut files = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(key) = parse_backup_name(&name, prefix) {
                files.push((entry.path(), key));
            }
        }
        files.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(files)
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() || file.exists() {
            file.to_path_buf()
        } else {
            self.backups_dir.join(file)
        }
    }

    fn prefix(&self) -> String {
        db_file_name(&self.sqlite_path)
    }

    fn pre_restore_prefix(&self) -> String {
        format!("{PRE_RESTORE}.{}", self.prefix())
    }
}

fn db_file_name(p: &Path) -> String {
    p.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Returns today's date in YYYY-MM-DD format.
fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Splits `{prefix}.YYYY-MM-DD-NNN` into its date and sequence number.
/// Returns None if the filename doesn't match the expected pattern.
fn parse_backup_name(filename: &str, prefix: &str) -> Option<(String, u32)> {
    let rest = filename.strip_prefix(prefix)?.strip_prefix('.')?;
    let (date, seq) = rest.rsplit_once('-')?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    if seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((date.to_string(), seq.parse().ok()?))
}
