//! This module is responsible for reading, writing and managing the SQLite database.
//!
//! The database runs in `DELETE` journal mode so that it is always a single file that can be
//! copied for backups. Money, quantities and dates are stored as `TEXT` and parsed on the way out.

use crate::aggregate::TransactionStore;
use crate::model::{
    validate_name, Amount, Category, Item, NewItem, Product, Transaction, DEFAULT_CATEGORIES,
};
use crate::utils::DATE_TIME_FORMAT;
use crate::Result;
use anyhow::{bail, ensure, Context};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Executor, SqlitePool};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// The schema version written by `init` and required by `load`.
pub(crate) const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = include_str!("schema.sql");

const SELECT_PRODUCTS: &str = "SELECT p.id, p.name, p.unit_price, p.category_id, c.name, c.icon \
     FROM products p JOIN categories c ON c.id = p.category_id";

const SELECT_ITEMS: &str = "SELECT i.id, i.transaction_id, i.quantity, i.unit_price, i.total, \
     p.id, p.name, p.unit_price, p.category_id, c.name, c.icon \
     FROM items i \
     JOIN products p ON p.id = i.product_id \
     JOIN categories c ON c.id = p.category_id";

type ProductRow = (i64, String, String, i64, String, String);
type ItemRow = (
    i64,
    i64,
    String,
    String,
    String,
    i64,
    String,
    String,
    i64,
    String,
    String,
);

#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema and seeds the default categories
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at '{}'", path.display());
        }
        let db = Self::connect(path, true).await?;

        let mut tx = db
            .pool
            .begin()
            .await
            .context("Failed to begin schema transaction")?;
        tx.execute(SCHEMA)
            .await
            .context("Failed to create the database schema")?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(SCHEMA_VERSION)
            .execute(&mut *tx)
            .await
            .context("Failed to record the schema version")?;
        for &(name, icon) in DEFAULT_CATEGORIES {
            sqlx::query("INSERT INTO categories (name, icon) VALUES (?, ?)")
                .bind(name)
                .bind(icon)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to seed category '{name}'"))?;
        }
        tx.commit()
            .await
            .context("Failed to commit schema transaction")?;

        debug!("Created database at {}", path.display());
        Ok(db)
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Creates a SQLite connection pool
    /// - Validates that the schema version is the one this build understands
    pub(crate) async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        let db = Self::connect(path, false).await?;

        let (version,): (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(&db.pool)
            .await
            .with_context(|| {
                format!("Unable to read the schema version of '{}'", path.display())
            })?;
        if version != SCHEMA_VERSION {
            db.close().await;
            bail!(
                "Unsupported schema version {version} in '{}', expected {SCHEMA_VERSION}",
                path.display()
            );
        }

        debug!("Loaded database at {}", path.display());
        Ok(db)
    }

    async fn connect(path: &Path, create: bool) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create)
            .journal_mode(SqliteJournalMode::Delete)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open SQLite database '{}'", path.display()))?;
        Ok(Self { pool })
    }

    /// Closes every connection in the pool. The file can be replaced once this returns.
    pub(crate) async fn close(&self) {
        self.pool.close().await;
    }

    // Categories

    pub(crate) async fn insert_category(&self, name: &str, icon: &str) -> Result<Category> {
        let name = validate_name("category", name)?;
        let icon = icon.trim();
        let id = sqlx::query("INSERT INTO categories (name, icon) VALUES (?, ?)")
            .bind(&name)
            .bind(icon)
            .execute(&self.pool)
            .await
            .context("Failed to insert category")?
            .last_insert_rowid();
        debug!("Inserted category {id} '{name}'");
        Ok(Category::new(id, name, icon))
    }

    /// Returns every category ordered by name.
    pub(crate) async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows: Vec<(i64, String, String)> =
            sqlx::query_as("SELECT id, name, icon FROM categories ORDER BY name, id")
                .fetch_all(&self.pool)
                .await
                .context("Failed to query categories")?;
        Ok(rows
            .into_iter()
            .map(|(id, name, icon)| Category::new(id, name, icon))
            .collect())
    }

    pub(crate) async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let row: Option<(i64, String, String)> =
            sqlx::query_as("SELECT id, name, icon FROM categories WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Failed to query category {id}"))?;
        Ok(row.map(|(id, name, icon)| Category::new(id, name, icon)))
    }

    pub(crate) async fn update_category(
        &self,
        id: i64,
        name: Option<&str>,
        icon: Option<&str>,
    ) -> Result<Category> {
        let mut category = self
            .get_category(id)
            .await?
            .with_context(|| format!("Category {id} does not exist"))?;
        if let Some(name) = name {
            category.name = validate_name("category", name)?;
        }
        if let Some(icon) = icon {
            category.icon = icon.trim().to_string();
        }
        sqlx::query("UPDATE categories SET name = ?, icon = ? WHERE id = ?")
            .bind(&category.name)
            .bind(&category.icon)
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to update category {id}"))?;
        Ok(category)
    }

    /// Deletes a category. Fails while any product references it.
    pub(crate) async fn delete_category(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete category {id}"))?;
        ensure!(result.rows_affected() > 0, "Category {id} does not exist");
        Ok(())
    }

    // Products

    pub(crate) async fn insert_product(
        &self,
        name: &str,
        unit_price: Amount,
        category_id: i64,
    ) -> Result<Product> {
        let name = validate_name("product", name)?;
        ensure!(!unit_price.is_negative(), "A product price cannot be negative");
        let id = sqlx::query("INSERT INTO products (name, unit_price, category_id) VALUES (?, ?, ?)")
            .bind(&name)
            .bind(unit_price.to_storage_string())
            .bind(category_id)
            .execute(&self.pool)
            .await
            .context("Failed to insert product")?
            .last_insert_rowid();
        debug!("Inserted product {id} '{name}'");
        self.get_product(id)
            .await?
            .with_context(|| format!("Product {id} vanished after insert"))
    }

    /// Returns every product with its category, ordered by name.
    pub(crate) async fn list_products(&self) -> Result<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCTS} ORDER BY p.name, p.id"))
            .fetch_all(&self.pool)
            .await
            .context("Failed to query products")?;
        rows.into_iter().map(product_from_row).collect()
    }

    pub(crate) async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!("{SELECT_PRODUCTS} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to query product {id}"))?;
        row.map(product_from_row).transpose()
    }

    pub(crate) async fn update_product(
        &self,
        id: i64,
        name: Option<&str>,
        unit_price: Option<Amount>,
        category_id: Option<i64>,
    ) -> Result<Product> {
        let mut product = self
            .get_product(id)
            .await?
            .with_context(|| format!("Product {id} does not exist"))?;
        if let Some(name) = name {
            product.name = validate_name("product", name)?;
        }
        if let Some(price) = unit_price {
            ensure!(!price.is_negative(), "A product price cannot be negative");
            product.unit_price = price;
        }
        if let Some(category_id) = category_id {
            product.category_id = category_id;
        }
        sqlx::query("UPDATE products SET name = ?, unit_price = ?, category_id = ? WHERE id = ?")
            .bind(&product.name)
            .bind(product.unit_price.to_storage_string())
            .bind(product.category_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to update product {id}"))?;
        self.get_product(id)
            .await?
            .with_context(|| format!("Product {id} vanished after update"))
    }

    /// Deletes a product. Fails while any item references it.
    pub(crate) async fn delete_product(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete product {id}"))?;
        ensure!(result.rows_affected() > 0, "Product {id} does not exist");
        Ok(())
    }

    // Transactions

    /// Records a purchase made at `date` in a single database transaction.
    ///
    /// An item without a unit price is bought at its product's current price. Item totals and the
    /// transaction total are computed here.
    pub(crate) async fn insert_transaction(
        &self,
        date: NaiveDateTime,
        items: &[NewItem],
    ) -> Result<Transaction> {
        ensure!(!items.is_empty(), "A transaction needs at least one item");

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let mut lines = Vec::with_capacity(items.len());
        let mut total = Amount::ZERO;
        for new_item in items {
            ensure!(
                new_item.quantity > Decimal::ZERO,
                "The quantity of product {} must be greater than zero",
                new_item.product_id
            );
            let row: Option<ProductRow> =
                sqlx::query_as(&format!("{SELECT_PRODUCTS} WHERE p.id = ?"))
                    .bind(new_item.product_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .with_context(|| format!("Failed to query product {}", new_item.product_id))?;
            let product = row
                .map(product_from_row)
                .transpose()?
                .with_context(|| format!("Product {} does not exist", new_item.product_id))?;
            let unit_price = new_item.unit_price.unwrap_or(product.unit_price);
            ensure!(!unit_price.is_negative(), "A unit price cannot be negative");
            let item_total = unit_price
                .checked_mul(new_item.quantity)
                .with_context(|| format!("The total for product {} is too large", product.id))?;
            total = total
                .checked_add(item_total)
                .context("The transaction total is too large")?;
            lines.push((product, new_item.quantity, unit_price, item_total));
        }

        let id = sqlx::query("INSERT INTO transactions (date, total) VALUES (?, ?)")
            .bind(date.format(DATE_TIME_FORMAT).to_string())
            .bind(total.to_storage_string())
            .execute(&mut *tx)
            .await
            .context("Failed to insert transaction")?
            .last_insert_rowid();

        let mut saved = Vec::with_capacity(lines.len());
        for (product, quantity, unit_price, item_total) in lines {
            let item_id = sqlx::query(
                "INSERT INTO items (transaction_id, product_id, quantity, unit_price, total) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(product.id)
            .bind(quantity.normalize().to_string())
            .bind(unit_price.to_storage_string())
            .bind(item_total.to_storage_string())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert item for product {}", product.id))?
            .last_insert_rowid();
            saved.push(Item::new(item_id, id, product, quantity, unit_price));
        }

        tx.commit().await.context("Failed to commit transaction")?;
        debug!("Inserted transaction {id} with {} items", saved.len());
        Ok(Transaction::new(id, date, saved))
    }

    /// Returns the transaction with its items, products and categories populated.
    pub(crate) async fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let row: Option<(i64, String, String)> =
            sqlx::query_as("SELECT id, date, total FROM transactions WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Failed to query transaction {id}"))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let rows: Vec<ItemRow> =
            sqlx::query_as(&format!("{SELECT_ITEMS} WHERE i.transaction_id = ? ORDER BY i.id"))
                .bind(id)
                .fetch_all(&self.pool)
                .await
                .with_context(|| format!("Failed to query items of transaction {id}"))?;
        let items = rows.into_iter().map(item_from_row).collect::<Result<_>>()?;
        transaction_from_row(row, items).map(Some)
    }

    /// Deletes a transaction and its items.
    pub(crate) async fn delete_transaction(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete transaction {id}"))?;
        ensure!(result.rows_affected() > 0, "Transaction {id} does not exist");
        Ok(())
    }

    /// Returns every transaction, newest first, with items, products and categories populated.
    pub(crate) async fn fetch_transactions(&self) -> Result<Vec<Transaction>> {
        let rows: Vec<(i64, String, String)> =
            sqlx::query_as("SELECT id, date, total FROM transactions ORDER BY date DESC, id DESC")
                .fetch_all(&self.pool)
                .await
                .context("Failed to query transactions")?;
        let item_rows: Vec<ItemRow> =
            sqlx::query_as(&format!("{SELECT_ITEMS} ORDER BY i.transaction_id, i.id"))
                .fetch_all(&self.pool)
                .await
                .context("Failed to query items")?;

        let mut items: HashMap<i64, Vec<Item>> = HashMap::new();
        for row in item_rows {
            let item = item_from_row(row)?;
            items.entry(item.transaction_id).or_default().push(item);
        }

        let transactions = rows
            .into_iter()
            .map(|row| {
                let these = items.remove(&row.0).unwrap_or_default();
                transaction_from_row(row, these)
            })
            .collect::<Result<Vec<_>>>()?;
        debug!("Fetched {} transactions", transactions.len());
        Ok(transactions)
    }

    /// Returns the number of rows in the transactions table.
    pub(crate) async fn count_transactions(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count transactions")?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[async_trait]
impl TransactionStore for Db {
    async fn fetch_all(&self) -> Result<Vec<Transaction>> {
        self.fetch_transactions().await
    }
}

fn parse_decimal(column: &str, s: &str) -> Result<Decimal> {
    Decimal::from_str(s).with_context(|| format!("Invalid {column} '{s}' in database"))
}

fn parse_amount(column: &str, s: &str) -> Result<Amount> {
    parse_decimal(column, s).map(Amount::from)
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT)
        .with_context(|| format!("Invalid date '{s}' in database"))
}

fn product_from_row(row: ProductRow) -> Result<Product> {
    let (id, name, unit_price, category_id, category_name, icon) = row;
    Ok(Product::new(
        id,
        name,
        parse_amount("unit_price", &unit_price)?,
        Category::new(category_id, category_name, icon),
    ))
}

fn item_from_row(row: ItemRow) -> Result<Item> {
    let (id, transaction_id, quantity, unit_price, total, pid, pname, pprice, cid, cname, icon) =
        row;
    let product = product_from_row((pid, pname, pprice, cid, cname, icon))?;
    let mut item = Item::new(
        id,
        transaction_id,
        product,
        parse_decimal("quantity", &quantity)?,
        parse_amount("unit_price", &unit_price)?,
    );
    item.total = parse_amount("total", &total)?;
    Ok(item)
}

fn transaction_from_row(row: (i64, String, String), items: Vec<Item>) -> Result<Transaction> {
    let (id, date, total) = row;
    Ok(Transaction {
        id,
        date: parse_timestamp(&date)?,
        total: parse_amount("total", &total)?,
        items,
    })
}
