//! Derived, presentation-ready aggregates. These are never persisted.

use crate::model::{Amount, Category, Item};
use chrono::NaiveDateTime;
use serde::Serialize;

/// The total of all transactions within one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthlySummary {
    pub(crate) year: i32,
    pub(crate) month: u32,
    /// `MM/YYYY`, derived from `month` and `year`.
    pub(crate) label: String,
    pub(crate) total: Amount,
    /// The month's total relative to the largest month, from 0 to 100.
    pub(crate) height: f64,
}

impl MonthlySummary {
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

/// The total of all items of one category within one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CategorySummary {
    pub(crate) category: Category,
    /// A hex color such as `#2196F3`.
    pub(crate) color: &'static str,
    pub(crate) total: Amount,
}

impl CategorySummary {
    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn color(&self) -> &'static str {
        self.color
    }

    pub fn total(&self) -> Amount {
        self.total
    }
}

/// An item paired with the date of the transaction it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthItem {
    pub(crate) date: NaiveDateTime,
    pub(crate) item: Item,
}

impl MonthItem {
    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    pub fn item(&self) -> &Item {
        &self.item
    }
}

/// What was bought in one month: the raw items, most recent first, and the per-category totals
/// ordered by category name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoryBreakdown {
    pub(crate) items: Vec<MonthItem>,
    pub(crate) categories: Vec<CategorySummary>,
}

impl CategoryBreakdown {
    pub fn items(&self) -> &[MonthItem] {
        &self.items
    }

    pub fn categories(&self) -> &[CategorySummary] {
        &self.categories
    }

    /// The sum of every category total.
    pub fn total(&self) -> Amount {
        self.categories.iter().map(|c| c.total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
