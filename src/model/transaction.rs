use crate::model::{Amount, Product};
use anyhow::{bail, Context};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A single recorded purchase event.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub(crate) id: i64,
    pub(crate) date: NaiveDateTime,
    /// The sum of the item totals. Maintained by the store when the transaction is written.
    pub(crate) total: Amount,
    pub(crate) items: Vec<Item>,
}

impl Transaction {
    /// Creates a transaction whose `total` is the sum of the `items` totals.
    pub fn new(id: i64, date: NaiveDateTime, items: Vec<Item>) -> Self {
        let total = items.iter().map(|i| i.total).sum();
        Self {
            id,
            date,
            total,
            items,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

/// One line within a transaction, linking a product, a quantity and a price.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Item {
    pub(crate) id: i64,
    pub(crate) transaction_id: i64,
    pub(crate) product_id: i64,
    pub(crate) quantity: Decimal,
    pub(crate) unit_price: Amount,
    /// Always `quantity * unit_price`.
    pub(crate) total: Amount,
    /// Populated by the store when the item is read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) product: Option<Product>,
}

impl Item {
    /// Creates an item for `product`, computing the line total. The total saturates at the
    /// `Decimal` bounds; the store rejects items whose total would overflow before calling this.
    pub fn new(
        id: i64,
        transaction_id: i64,
        product: Product,
        quantity: Decimal,
        unit_price: Amount,
    ) -> Self {
        Self {
            id,
            transaction_id,
            product_id: product.id(),
            quantity,
            unit_price,
            total: unit_price.saturating_mul(quantity),
            product: Some(product),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn transaction_id(&self) -> i64 {
        self.transaction_id
    }

    pub fn product_id(&self) -> i64 {
        self.product_id
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit_price(&self) -> Amount {
        self.unit_price
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    pub fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }
}

/// A request to purchase a product, as given on the command line:
/// `PRODUCT_ID:QUANTITY` or `PRODUCT_ID:QUANTITY@UNIT_PRICE`.
///
/// When `unit_price` is `None` the product's current price is used.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct NewItem {
    pub product_id: i64,
    pub quantity: Decimal,
    pub unit_price: Option<Amount>,
}

impl NewItem {
    pub fn new(product_id: i64, quantity: Decimal, unit_price: Option<Amount>) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }
}

impl FromStr for NewItem {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (product, rest) = s
            .split_once(':')
            .with_context(|| format!("Invalid item '{s}', expected PRODUCT_ID:QUANTITY[@PRICE]"))?;
        let product_id: i64 = product
            .trim()
            .parse()
            .with_context(|| format!("Invalid product id '{product}'"))?;
        let (quantity, unit_price) = match rest.split_once('@') {
            Some((q, p)) => (
                q,
                Some(Amount::from_str(p).with_context(|| format!("Invalid unit price '{p}'"))?),
            ),
            None => (rest, None),
        };
        let quantity = Decimal::from_str(quantity.trim())
            .with_context(|| format!("Invalid quantity '{quantity}'"))?;
        if quantity.is_sign_negative() || quantity.is_zero() {
            bail!("The quantity must be greater than zero, got '{quantity}'");
        }
        if unit_price.is_some_and(|p| p.is_negative()) {
            bail!("The unit price cannot be negative");
        }
        Ok(Self {
            product_id,
            quantity,
            unit_price,
        })
    }
}

impl Display for NewItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.product_id, self.quantity)?;
        if let Some(p) = self.unit_price {
            write!(f, "@{}", p.to_storage_string())?;
        }
        Ok(())
    }
}
