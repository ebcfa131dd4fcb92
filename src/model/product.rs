use crate::model::{Amount, Category};
use serde::{Deserialize, Serialize};

/// A purchasable thing (a consumable) with a unit price and a category.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Product {
    pub(crate) id: i64,
    pub(crate) name: String,
    /// The current price, used as the default unit price when the product is purchased.
    pub(crate) unit_price: Amount,
    pub(crate) category_id: i64,
    /// Populated by the store when the product is read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) category: Option<Category>,
}

impl Product {
    pub fn new(id: i64, name: impl Into<String>, unit_price: Amount, category: Category) -> Self {
        Self {
            id,
            name: name.into(),
            unit_price,
            category_id: category.id(),
            category: Some(category),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> Amount {
        self.unit_price
    }

    pub fn category_id(&self) -> i64 {
        self.category_id
    }

    pub fn category(&self) -> Option<&Category> {
        self.category.as_ref()
    }
}
