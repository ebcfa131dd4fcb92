use crate::args::ConfigArgs;
use crate::commands::Out;
use crate::config::Environment;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use serde::Serialize;
use std::path::PathBuf;

/// The settings in effect after `configure`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ConfigView {
    pub environment: Environment,
    pub sqlite_path: PathBuf,
    pub backups: PathBuf,
    pub backup_copies: u32,
    pub currency_symbol: String,
}

impl From<&Config> for ConfigView {
    fn from(c: &Config) -> Self {
        Self {
            environment: c.environment(),
            sqlite_path: c.sqlite_path().to_path_buf(),
            backups: c.backups().to_path_buf(),
            backup_copies: c.backup_copies(),
            currency_symbol: c.currency_symbol().to_string(),
        }
    }
}

/// Shows the current settings, first applying and saving any that `args` sets. Switching the
/// environment creates that environment's database if it does not exist yet.
pub async fn configure(mut config: Config, args: ConfigArgs) -> Result<Out<ConfigView>> {
    let settings = args.settings();
    let changed = !settings.is_empty();
    if changed {
        config
            .update(&settings)
            .await
            .pub_result(ErrorType::Config)?;
    }

    let view = ConfigView::from(&config);
    let message = format!(
        "{}\n  environment:     {}\n  database:        {}\n  backups:         {}\n  \
         backup copies:   {}\n  currency symbol: {}",
        if changed { "Settings saved" } else { "Settings" },
        view.environment,
        view.sqlite_path.display(),
        view.backups.display(),
        view.backup_copies,
        view.currency_symbol
    );
    Ok(Out::new(message, view))
}
