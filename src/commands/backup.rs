//! Backup command handlers.

use crate::args::RestoreArgs;
use crate::commands::{plural, Out};
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use std::path::PathBuf;

/// Copies the active database into the backups directory, rotating out the oldest copies.
pub async fn backup_create(config: Config) -> Result<Out<PathBuf>> {
    let count = config
        .db()
        .count_transactions()
        .await
        .pub_result(ErrorType::Database)?;
    let path = config
        .backup()
        .create()
        .await
        .pub_result(ErrorType::Filesystem)?;
    let message = format!(
        "Created backup {} holding {}",
        path.display(),
        plural(count as usize, "transaction", "transactions")
    );
    Ok(Out::new(message, path))
}

/// Lists the backups of the active database, oldest first.
pub async fn backup_list(config: Config) -> Result<Out<Vec<PathBuf>>> {
    let files = config
        .backup()
        .list()
        .await
        .pub_result(ErrorType::Filesystem)?;
    let mut message = format!(
        "{} of {} in {}",
        plural(files.len(), "backup", "backups"),
        config.environment(),
        config.backups().display()
    );
    for f in &files {
        message.push_str("\n  ");
        message.push_str(&f.file_name().unwrap_or_default().to_string_lossy());
    }
    Ok(Out::new(message, files))
}

/// Replaces the active database with a backup. The current database is saved as a `pre-restore`
/// backup first and the path of that copy is returned.
pub async fn backup_restore(config: Config, args: RestoreArgs) -> Result<Out<PathBuf>> {
    let safety = config
        .backup()
        .restore(args.file())
        .await
        .pub_result(ErrorType::Filesystem)?;
    let message = format!(
        "Restored {} from {}. The previous database was saved to {}",
        config.sqlite_path().display(),
        args.file().display(),
        safety.display()
    );
    Ok(Out::new(message, safety))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_backup_commands() {
        let env = TestEnv::new().await;
        let rice = env.seed_product("Rice", "4").await;
        env.seed_transaction("2025-01-05", rice.id(), "1").await;

        let out = backup_create(env.config()).await.unwrap();
        let saved = out.structure().unwrap().clone();
        assert!(saved.is_file());
        assert!(out.message().ends_with("holding 1 transaction"));

        env.seed_transaction("2025-01-06", rice.id(), "1").await;
        let out = backup_list(env.config()).await.unwrap();
        assert_eq!(out.structure().unwrap(), &vec![saved.clone()]);
        assert!(out.message().starts_with("1 backup of production"));

        let out = backup_restore(env.config(), RestoreArgs::new(&saved))
            .await
            .unwrap();
        assert!(out.structure().unwrap().is_file());

        let config = env.reload().await;
        assert_eq!(config.db().count_transactions().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_backup_restore_missing_file() {
        let env = TestEnv::new().await;
        let e = backup_restore(env.config(), RestoreArgs::new("missing"))
            .await
            .unwrap_err();
        assert_eq!(e.to_string(), "filesystem error");
        assert!(format!("{e:#}").contains("does not exist"));
    }
}
