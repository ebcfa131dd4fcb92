//! Command handlers for the smartcash CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod backup;
mod category;
mod configure;
mod dashboard;
mod init;
mod product;
mod transaction;

use crate::Error;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use backup::{backup_create, backup_list, backup_restore};
pub use category::{category_add, category_delete, category_list, category_update};
pub use configure::{configure, ConfigView};
pub use dashboard::{breakdown, history, MonthView};
pub use init::init;
pub use product::{product_add, product_delete, product_list, product_update};
pub use transaction::{transaction_add, transaction_delete, transaction_list, transaction_show};

const FOREIGN_KEY_FAILED: &str = "FOREIGN KEY constraint failed";

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Replaces a foreign key failure anywhere in the chain of `e` with `message`. Other errors are
/// returned unchanged.
fn on_foreign_key(e: Error, message: impl FnOnce() -> String) -> Error {
    if e.chain().any(|c| c.to_string().contains(FOREIGN_KEY_FAILED)) {
        anyhow::anyhow!(message())
    } else {
        e
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}
