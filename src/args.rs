//! These structs provide the CLI interface for the smartcash CLI.

use crate::config::{Environment, Settings};
use crate::model::{Amount, NewItem};
use crate::utils::parse_date;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// smartcash: A command-line tool for tracking personal expenses.
///
/// Record your purchases as transactions made of items. Each item is a product, bought at some
/// quantity and price, and each product belongs to a category. The history and breakdown
/// commands show how much you spent per month and per category.
///
/// Run `smartcash init` first to create the data directory.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, the configuration file and the database.
    ///
    /// The database starts with a few categories (Food, Transport, Leisure, Health, Education and
    /// Housing) which you can rename or delete.
    Init,
    /// Add, list, update or delete categories.
    Category(CategoryArgs),
    /// Add, list, update or delete products.
    Product(ProductArgs),
    /// Record, list, show or delete transactions.
    Transaction(TransactionArgs),
    /// Show the total spent in each month, most recent first.
    History,
    /// Show what was bought in one month, totalled by category.
    Breakdown(BreakdownArgs),
    /// Create, list or restore database backups.
    Backup(BackupArgs),
    /// Show or change settings.
    Config(ConfigArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where smartcash data and configuration is held. Defaults to ~/smartcash
    #[arg(long, env = "SMARTCASH_HOME", default_value_t = default_smartcash_home())]
    smartcash_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, smartcash_home: PathBuf) -> Self {
        Self {
            log_level,
            smartcash_home: smartcash_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn smartcash_home(&self) -> &DisplayPath {
        &self.smartcash_home
    }
}

// Categories

#[derive(Debug, Parser, Clone)]
pub struct CategoryArgs {
    #[command(subcommand)]
    action: CategorySubcommand,
}

impl CategoryArgs {
    pub fn action(&self) -> &CategorySubcommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategorySubcommand {
    /// Add a category.
    Add(CategoryAddArgs),
    /// List all categories.
    List,
    /// Rename a category or change its icon.
    Update(CategoryUpdateArgs),
    /// Delete a category. Categories that products still use cannot be deleted.
    Delete(IdArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct CategoryAddArgs {
    /// The category name, up to 50 characters.
    #[arg(long)]
    name: String,

    /// An icon reference, e.g. "fa-solid fa-utensils".
    #[arg(long, default_value = "")]
    icon: String,
}

impl CategoryAddArgs {
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }
}

#[derive(Debug, Parser, Clone)]
pub struct CategoryUpdateArgs {
    /// The id of the category to change.
    #[arg(long)]
    id: i64,

    /// A new name.
    #[arg(long)]
    name: Option<String>,

    /// A new icon reference.
    #[arg(long)]
    icon: Option<String>,
}

impl CategoryUpdateArgs {
    pub fn new(id: i64, name: Option<String>, icon: Option<String>) -> Self {
        Self { id, name, icon }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }
}

/// Identifies a single record.
#[derive(Debug, Parser, Clone, Copy)]
pub struct IdArgs {
    #[arg(long)]
    id: i64,
}

impl IdArgs {
    pub fn new(id: i64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> i64 {
        self.id
    }
}

// Products

#[derive(Debug, Parser, Clone)]
pub struct ProductArgs {
    #[command(subcommand)]
    action: ProductSubcommand,
}

impl ProductArgs {
    pub fn action(&self) -> &ProductSubcommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProductSubcommand {
    /// Add a product.
    Add(ProductAddArgs),
    /// List products with their categories.
    List(ProductListArgs),
    /// Change a product's name, price or category. Past purchases keep the price they were made at.
    Update(ProductUpdateArgs),
    /// Delete a product. Products that appear in a transaction cannot be deleted.
    Delete(IdArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct ProductAddArgs {
    /// The product name, up to 50 characters.
    #[arg(long)]
    name: String,

    /// The current unit price, used when a purchase does not state one.
    #[arg(long)]
    price: Amount,

    /// The id of the product's category.
    #[arg(long)]
    category_id: i64,
}

impl ProductAddArgs {
    pub fn new(name: impl Into<String>, price: Amount, category_id: i64) -> Self {
        Self {
            name: name.into(),
            price,
            category_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Amount {
        self.price
    }

    pub fn category_id(&self) -> i64 {
        self.category_id
    }
}

#[derive(Debug, Parser, Clone, Copy, Default)]
pub struct ProductListArgs {
    /// Only list the products of this category.
    #[arg(long)]
    category_id: Option<i64>,
}

impl ProductListArgs {
    pub fn new(category_id: Option<i64>) -> Self {
        Self { category_id }
    }

    pub fn category_id(&self) -> Option<i64> {
        self.category_id
    }
}

#[derive(Debug, Parser, Clone)]
pub struct ProductUpdateArgs {
    /// The id of the product to change.
    #[arg(long)]
    id: i64,

    /// A new name.
    #[arg(long)]
    name: Option<String>,

    /// A new unit price.
    #[arg(long)]
    price: Option<Amount>,

    /// The id of a new category.
    #[arg(long)]
    category_id: Option<i64>,
}

impl ProductUpdateArgs {
    pub fn new(
        id: i64,
        name: Option<String>,
        price: Option<Amount>,
        category_id: Option<i64>,
    ) -> Self {
        Self {
            id,
            name,
            price,
            category_id,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn price(&self) -> Option<Amount> {
        self.price
    }

    pub fn category_id(&self) -> Option<i64> {
        self.category_id
    }
}

// Transactions

#[derive(Debug, Parser, Clone)]
pub struct TransactionArgs {
    #[command(subcommand)]
    action: TransactionSubcommand,
}

impl TransactionArgs {
    pub fn action(&self) -> &TransactionSubcommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum TransactionSubcommand {
    /// Record a purchase of one or more items.
    Add(TransactionAddArgs),
    /// List transactions, most recent first.
    List(TransactionListArgs),
    /// Show a transaction and its items.
    Show(IdArgs),
    /// Delete a transaction and its items.
    Delete(IdArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct TransactionAddArgs {
    /// When the purchase was made: YYYY-MM-DD, "YYYY-MM-DD HH:MM:SS" or YYYY-MM-DDTHH:MM:SS.
    /// Defaults to now.
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDateTime>,

    /// An item as PRODUCT_ID:QUANTITY or PRODUCT_ID:QUANTITY@UNIT_PRICE. Without a unit price the
    /// product's current price is used. Repeat for each item.
    #[arg(long = "item", required = true)]
    items: Vec<NewItem>,
}

impl TransactionAddArgs {
    pub fn new(date: Option<NaiveDateTime>, items: Vec<NewItem>) -> Self {
        Self { date, items }
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.date
    }

    pub fn items(&self) -> &[NewItem] {
        &self.items
    }
}

#[derive(Debug, Parser, Clone, Copy, Default)]
pub struct TransactionListArgs {
    /// Only list the transactions of this month, 1 to 12.
    #[arg(long, requires = "year")]
    month: Option<u32>,

    /// The year of --month.
    #[arg(long, requires = "month")]
    year: Option<i32>,
}

impl TransactionListArgs {
    pub fn new(month: Option<u32>, year: Option<i32>) -> Self {
        Self { month, year }
    }

    /// The (year, month) to filter on, when both are given.
    pub fn period(&self) -> Option<(i32, u32)> {
        self.year.zip(self.month)
    }
}

// Dashboard

#[derive(Debug, Parser, Clone, Copy, Default)]
pub struct BreakdownArgs {
    /// The month, 1 to 12. Defaults to the current month if it has purchases, otherwise the most
    /// recent month that does.
    #[arg(long, requires = "year")]
    month: Option<u32>,

    /// The year of --month.
    #[arg(long, requires = "month")]
    year: Option<i32>,
}

impl BreakdownArgs {
    pub fn new(month: Option<u32>, year: Option<i32>) -> Self {
        Self { month, year }
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }
}

// Backups

#[derive(Debug, Parser, Clone)]
pub struct BackupArgs {
    #[command(subcommand)]
    action: BackupSubcommand,
}

impl BackupArgs {
    pub fn action(&self) -> &BackupSubcommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum BackupSubcommand {
    /// Copy the active database into the backups directory.
    Create,
    /// List the backups of the active database, oldest first.
    List,
    /// Replace the active database with a backup. A copy of the current database is saved first.
    Restore(RestoreArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct RestoreArgs {
    /// A path, or the name of a file in the backups directory.
    file: PathBuf,
}

impl RestoreArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

// Settings

#[derive(Debug, Parser, Clone, Default)]
pub struct ConfigArgs {
    /// Switch the active database: production or staging.
    #[arg(long)]
    environment: Option<Environment>,

    /// How many backups to keep.
    #[arg(long)]
    backup_copies: Option<u32>,

    /// The symbol shown in front of amounts, e.g. "R$".
    #[arg(long)]
    currency_symbol: Option<String>,

    /// Where to write backups, absolute or relative to the smartcash home.
    #[arg(long)]
    backup_dir: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn new(settings: Settings) -> Self {
        Self {
            environment: settings.environment,
            backup_copies: settings.backup_copies,
            currency_symbol: settings.currency_symbol,
            backup_dir: settings.backup_dir,
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            environment: self.environment,
            backup_copies: self.backup_copies,
            currency_symbol: self.currency_symbol.clone(),
            backup_dir: self.backup_dir.clone(),
        }
    }
}

fn default_smartcash_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("smartcash"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --smartcash-home or SMARTCASH_HOME instead of relying on the \
                default home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("smartcash")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
