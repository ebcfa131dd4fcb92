//! SmartCash: a personal expense tracker.
//!
//! Purchases are recorded as transactions made of items, each item being a product bought at a
//! quantity and price, each product belonging to a category. The `aggregate` module turns the
//! recorded transactions into the monthly history and per-category breakdown shown by the
//! dashboard commands.

pub mod aggregate;
pub mod args;
mod backup;
pub mod commands;
mod config;
mod db;
mod error;
pub mod model;
mod utils;


pub use backup::Backup;
pub use config::{Config, Environment, Settings};
pub use error::{Error, ErrorType, Result};
pub use utils::parse_date;
