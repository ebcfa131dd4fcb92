use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory with:
/// - an initial `config.json` file with default settings
/// - the `.backups` directory
/// - the production database, seeded with the default categories
///
/// # Errors
/// - Returns an error if the directory already holds a configuration or a file operation fails.
pub async fn init(smartcash_home: &Path) -> Result<Out<()>> {
    let config = Config::create(smartcash_home)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the smartcash directory at {}",
        config.root().display()
    )
    .into())
}
