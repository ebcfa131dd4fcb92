//! Monthly aggregation for the dashboard.
//!
//! Groups transactions by calendar month, computes monthly totals with a normalized bar height,
//! and breaks a single month down by product category. Every function in this module is a pure
//! function of its arguments; the transactions are supplied by a `TransactionStore`.

use crate::model::{
    Amount, Category, CategoryBreakdown, CategorySummary, Item, MonthItem, MonthlySummary,
    Transaction,
};
use crate::Result;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// The bar height given to every month when no month has a positive total, so that the bars
/// remain visible.
pub const EMPTY_BAR_HEIGHT: f64 = 5.0;

/// Display colors for category summaries, assigned by position.
pub const PALETTE: [&str; 6] = [
    "#2196F3", // blue
    "#F44336", // red
    "#8BC34A", // green
    "#FF9800", // orange
    "#9C27B0", // purple
    "#00BCD4", // cyan
];

/// Read-only access to the recorded transactions.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Returns every transaction with its items, each item's product and each product's
    /// category populated.
    async fn fetch_all(&self) -> Result<Vec<Transaction>>;
}

/// Errors raised by `category_breakdown` and `check_month`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AggregateError {
    /// The month was not in `1..=12`.
    InvalidMonth(u32),
    /// The year was not positive.
    InvalidYear(i32),
    /// An item was supplied without its product.
    MissingProduct { item_id: i64 },
    /// A product was supplied without its category.
    MissingCategory { product_id: i64 },
}

impl Display for AggregateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateError::InvalidMonth(m) => {
                write!(f, "Invalid month {m}, expected a value from 1 to 12")
            }
            AggregateError::InvalidYear(y) => {
                write!(f, "Invalid year {y}, expected a positive value")
            }
            AggregateError::MissingProduct { item_id } => {
                write!(f, "Item {item_id} was loaded without its product")
            }
            AggregateError::MissingCategory { product_id } => {
                write!(f, "Product {product_id} was loaded without its category")
            }
        }
    }
}

impl Error for AggregateError {}

/// Computes one `MonthlySummary` per calendar month that has at least one transaction, most
/// recent month first.
///
/// Transactions are grouped on the numeric (year, month) of their date. A month's `height` is its
/// total as a percentage of the largest monthly total, or `EMPTY_BAR_HEIGHT` for every month when
/// no month has a positive total. Monthly totals saturate at the `Decimal` bounds.
pub fn monthly_history(transactions: &[Transaction]) -> Vec<MonthlySummary> {
    let mut totals: BTreeMap<(i32, u32), Amount> = BTreeMap::new();
    for transaction in transactions {
        let key = (transaction.date.year(), transaction.date.month());
        let total = totals.entry(key).or_default();
        *total = total.saturating_add(transaction.total);
    }

    let max_total = totals.values().copied().max().unwrap_or_default();

    totals
        .into_iter()
        .rev()
        .map(|((year, month), total)| MonthlySummary {
            year,
            month,
            label: month_label(year, month),
            total,
            height: bar_height(total, max_total),
        })
        .collect()
}

/// Collects the items bought in the given month and totals them by category.
///
/// Items are ordered by the date of their transaction, most recent first. Category summaries are
/// ordered by category name and are colored from `PALETTE` by position. Category totals saturate
/// at the `Decimal` bounds.
///
/// # Errors
/// - `InvalidMonth` / `InvalidYear` when the month or year is out of range.
/// - `MissingProduct` / `MissingCategory` when an item in the month was not fully loaded.
pub fn category_breakdown(
    transactions: &[Transaction],
    month: u32,
    year: i32,
) -> std::result::Result<CategoryBreakdown, AggregateError> {
    check_month(month, year)?;

    let mut in_month: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.date.year() == year && t.date.month() == month)
        .collect();
    in_month.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));

    let mut items = Vec::new();
    let mut by_category: BTreeMap<i64, (&Category, Amount)> = BTreeMap::new();
    for transaction in in_month {
        let mut lines: Vec<&Item> = transaction.items.iter().collect();
        lines.sort_by_key(|item| item.id);
        for item in lines {
            let category = item_category(item)?;
            let entry = by_category
                .entry(category.id)
                .or_insert((category, Amount::ZERO));
            entry.1 = entry.1.saturating_add(item.total);
            items.push(MonthItem {
                date: transaction.date,
                item: item.clone(),
            });
        }
    }

    let mut totals: Vec<(&Category, Amount)> = by_category.into_values().collect();
    totals.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    let categories = totals
        .into_iter()
        .enumerate()
        .map(|(ix, (category, total))| CategorySummary {
            category: category.clone(),
            color: PALETTE[ix % PALETTE.len()],
            total,
        })
        .collect();

    Ok(CategoryBreakdown { items, categories })
}

/// Checks that `month` is in `1..=12` and `year` is positive.
pub fn check_month(month: u32, year: i32) -> std::result::Result<(), AggregateError> {
    if !(1..=12).contains(&month) {
        return Err(AggregateError::InvalidMonth(month));
    }
    if year <= 0 {
        return Err(AggregateError::InvalidYear(year));
    }
    Ok(())
}

/// Picks the month a dashboard should open on: `today`'s month when it has transactions,
/// otherwise the most recent month in `history`.
pub fn default_month(history: &[MonthlySummary], today: NaiveDate) -> Option<(i32, u32)> {
    history
        .iter()
        .find(|m| m.year == today.year() && m.month == today.month())
        .or_else(|| history.first())
        .map(|m| (m.year, m.month))
}

fn month_label(year: i32, month: u32) -> String {
    format!("{month:02}/{year:04}")
}

fn bar_height(total: Amount, max_total: Amount) -> f64 {
    if !max_total.is_positive() {
        return EMPTY_BAR_HEIGHT;
    }
    total
        .value()
        .checked_div(max_total.value())
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|pct| pct.to_f64())
        .unwrap_or_default()
        .clamp(0.0, 100.0)
}

fn item_category(item: &Item) -> std::result::Result<&Category, AggregateError> {
    let product = item
        .product
        .as_ref()
        .ok_or(AggregateError::MissingProduct { item_id: item.id })?;
    product
        .category
        .as_ref()
        .ok_or(AggregateError::MissingCategory {
            product_id: product.id,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Product;
    use chrono::NaiveDateTime;
    use std::collections::HashSet;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(s: &str) -> NaiveDateTime {
        crate::utils::parse_date(s).unwrap()
    }

    fn food() -> Category {
        Category::new(1, "Food", "fa-solid fa-utensils")
    }

    fn transport() -> Category {
        Category::new(2, "Transport", "fa-solid fa-car")
    }

    fn product(id: i64, name: &str, price: &str, category: Category) -> Product {
        Product::new(id, name, dec(price).into(), category)
    }

    /// A transaction with one item per `(product, quantity, unit_price)`.
    fn transaction(id: i64, when: &str, lines: Vec<(Product, &str, &str)>) -> Transaction {
        let items = lines
            .into_iter()
            .enumerate()
            .map(|(ix, (p, qty, price))| {
                Item::new(id * 100 + ix as i64, id, p, dec(qty), dec(price).into())
            })
            .collect();
        Transaction::new(id, date(when), items)
    }

    /// T1 (2025-01-05, Rice 1x100), T2 (2025-01-20, Bus 1x50), T3 (2025-02-10, Rice 1x30).
    fn scenario() -> Vec<Transaction> {
        let rice = product(1, "Rice", "100", food());
        let bus = product(2, "Bus", "50", transport());
        vec![
            transaction(1, "2025-01-05", vec![(rice.clone(), "1", "100")]),
            transaction(2, "2025-01-20", vec![(bus, "1", "50")]),
            transaction(3, "2025-02-10", vec![(rice, "1", "30")]),
        ]
    }

    #[test]
    fn test_history_scenario() {
        let history = monthly_history(&scenario());
        assert_eq!(history.len(), 2);

        assert_eq!((history[0].year(), history[0].month()), (2025, 2));
        assert_eq!(history[0].label(), "02/2025");
        assert_eq!(history[0].total().value(), dec("30"));
        assert_eq!(history[0].height(), 20.0);

        assert_eq!((history[1].year(), history[1].month()), (2025, 1));
        assert_eq!(history[1].label(), "01/2025");
        assert_eq!(history[1].total().value(), dec("150"));
        assert_eq!(history[1].height(), 100.0);
    }

    #[test]
    fn test_history_empty() {
        assert!(monthly_history(&[]).is_empty());
    }

    #[test]
    fn test_history_all_zero_uses_empty_bar_height() {
        let t = vec![
            Transaction::new(1, date("2024-03-01"), vec![]),
            Transaction::new(2, date("2024-04-01"), vec![]),
        ];
        let history = monthly_history(&t);
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|m| m.height() == EMPTY_BAR_HEIGHT));
    }

    #[test]
    fn test_history_saturates_large_totals() {
        let rice = product(1, "Rice", "1", food());
        let huge = "50000000000000000000000000000";
        let t = vec![
            transaction(1, "2025-03-01", vec![(rice.clone(), "1", huge)]),
            transaction(2, "2025-03-02", vec![(rice.clone(), "1", huge)]),
            transaction(3, "2025-04-02", vec![(rice, "1", huge)]),
        ];
        let history = monthly_history(&t);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].total().value(), Decimal::MAX);
        assert_eq!(history[1].height(), 100.0);
        assert!(history[0].height() > 60.0 && history[0].height() < 65.0);

        let breakdown = category_breakdown(&t, 3, 2025).unwrap();
        assert_eq!(breakdown.categories()[0].total().value(), Decimal::MAX);
    }

    #[test]
    fn test_history_orders_across_years() {
        let rice = product(1, "Rice", "1", food());
        let t = vec![
            transaction(1, "2023-12-31 23:59:59", vec![(rice.clone(), "1", "1")]),
            transaction(2, "2024-01-01", vec![(rice.clone(), "1", "2")]),
            transaction(3, "2023-11-15", vec![(rice.clone(), "1", "3")]),
            transaction(4, "2024-01-31", vec![(rice, "1", "4")]),
        ];
        let keys: Vec<(i32, u32)> = monthly_history(&t)
            .iter()
            .map(|m| (m.year(), m.month()))
            .collect();
        assert_eq!(keys, vec![(2024, 1), (2023, 12), (2023, 11)]);
    }

    #[test]
    fn test_history_properties() {
        let rice = product(1, "Rice", "1", food());
        let dates = [
            "2024-01-03", "2024-01-28", "2024-02-14", "2024-05-01", "2024-05-31", "2023-05-20",
            "2022-12-01", "2024-02-29",
        ];
        let t: Vec<Transaction> = dates
            .iter()
            .enumerate()
            .map(|(ix, d)| {
                let price = format!("{}.25", ix * 7 + 1);
                transaction(ix as i64 + 1, d, vec![(rice.clone(), "2", price.as_str())])
            })
            .collect();

        let history = monthly_history(&t);

        // Totals equal the sum of the transaction totals in each month
        for m in &history {
            let expected: Amount = t
                .iter()
                .filter(|x| x.date().year() == m.year() && x.date().month() == m.month())
                .map(|x| x.total())
                .sum();
            assert_eq!(m.total(), expected);
        }

        // Strictly descending and therefore unique
        for pair in history.windows(2) {
            assert!((pair[0].year(), pair[0].month()) > (pair[1].year(), pair[1].month()));
        }

        // Heights are bounded and the largest month is at 100
        assert!(history.iter().all(|m| (0.0..=100.0).contains(&m.height())));
        assert!(history.iter().any(|m| m.height() == 100.0));

        // Deterministic
        assert_eq!(history, monthly_history(&t));
    }

    #[test]
    fn test_breakdown_scenario() {
        let breakdown = category_breakdown(&scenario(), 1, 2025).unwrap();

        let item_transactions: Vec<i64> = breakdown
            .items()
            .iter()
            .map(|i| i.item().transaction_id())
            .collect();
        assert_eq!(item_transactions, vec![2, 1]);
        assert_eq!(breakdown.items()[0].date(), date("2025-01-20"));

        let cats: Vec<(&str, Decimal)> = breakdown
            .categories()
            .iter()
            .map(|c| (c.category().name(), c.total().value()))
            .collect();
        assert_eq!(cats, vec![("Food", dec("100")), ("Transport", dec("50"))]);
        assert_eq!(breakdown.total().value(), dec("150"));
    }

    #[test]
    fn test_breakdown_groups_products_by_category() {
        let rice = product(1, "Rice", "5", food());
        let beans = product(2, "Beans", "7", food());
        let bus = product(3, "Bus", "4.5", transport());
        let t = vec![
            transaction(1, "2025-03-02", vec![(rice, "2", "5"), (bus.clone(), "1", "4.5")]),
            transaction(2, "2025-03-09", vec![(beans, "3", "7"), (bus, "2", "4.5")]),
        ];

        let breakdown = category_breakdown(&t, 3, 2025).unwrap();
        assert_eq!(breakdown.items().len(), 4);
        assert_eq!(breakdown.categories().len(), 2);
        assert_eq!(breakdown.categories()[0].category().name(), "Food");
        assert_eq!(breakdown.categories()[0].total().value(), dec("31"));
        assert_eq!(breakdown.categories()[1].total().value(), dec("13.5"));

        // The category totals add up to the item totals
        let items_total: Amount = breakdown.items().iter().map(|i| i.item().total()).sum();
        assert_eq!(breakdown.total(), items_total);

        // No category appears twice
        let ids: HashSet<i64> = breakdown
            .categories()
            .iter()
            .map(|c| c.category().id())
            .collect();
        assert_eq!(ids.len(), breakdown.categories().len());
    }

    #[test]
    fn test_breakdown_orders_items_within_same_date() {
        let rice = product(1, "Rice", "1", food());
        let t = vec![
            transaction(1, "2025-03-02 10:00:00", vec![(rice.clone(), "1", "1")]),
            transaction(2, "2025-03-02 10:00:00", vec![(rice.clone(), "1", "1")]),
            transaction(3, "2025-03-01 09:00:00", vec![(rice.clone(), "1", "1"), (rice, "1", "2")]),
        ];
        let b = category_breakdown(&t, 3, 2025).unwrap();
        let ids: Vec<i64> = b.items().iter().map(|i| i.item().id()).collect();
        assert_eq!(ids, vec![200, 100, 300, 301]);
    }

    #[test]
    fn test_breakdown_empty_month() {
        let b = category_breakdown(&scenario(), 7, 2025).unwrap();
        assert!(b.is_empty());
        assert!(b.categories().is_empty());
        assert!(category_breakdown(&[], 1, 2025).unwrap().is_empty());
    }

    #[test]
    fn test_breakdown_invalid_arguments() {
        assert_eq!(
            category_breakdown(&scenario(), 0, 2025),
            Err(AggregateError::InvalidMonth(0))
        );
        assert_eq!(
            category_breakdown(&scenario(), 13, 2025),
            Err(AggregateError::InvalidMonth(13))
        );
        assert_eq!(
            category_breakdown(&scenario(), 1, 0),
            Err(AggregateError::InvalidYear(0))
        );
        assert_eq!(
            category_breakdown(&scenario(), 1, -2025),
            Err(AggregateError::InvalidYear(-2025))
        );
    }

    #[test]
    fn test_breakdown_missing_references() {
        let mut t = scenario();
        t[0].items[0].product = None;
        assert_eq!(
            category_breakdown(&t, 1, 2025),
            Err(AggregateError::MissingProduct { item_id: 100 })
        );

        let mut t = scenario();
        if let Some(p) = t[1].items[0].product.as_mut() {
            p.category = None;
        }
        let e = category_breakdown(&t, 1, 2025).unwrap_err();
        assert_eq!(e, AggregateError::MissingCategory { product_id: 2 });
        assert!(e.to_string().contains("without its category"));

        // Other months are not affected by the broken item
        assert!(category_breakdown(&t, 2, 2025).is_ok());
    }

    #[test]
    fn test_breakdown_colors_cycle_by_position() {
        let names = ["A", "B", "C", "D", "E", "F", "G", "H"];
        let lines: Vec<(Product, &str, &str)> = names
            .iter()
            .enumerate()
            .map(|(ix, n)| {
                let c = Category::new(ix as i64 + 10, *n, "");
                (product(ix as i64 + 1, n, "1", c), "1", "1")
            })
            .collect();
        let t = vec![transaction(1, "2025-06-01", lines)];

        let first = category_breakdown(&t, 6, 2025).unwrap();
        assert_eq!(first.categories().len(), names.len());
        for (ix, c) in first.categories().iter().enumerate() {
            assert_eq!(c.color(), PALETTE[ix % PALETTE.len()]);
        }
        assert_eq!(first.categories()[6].color(), first.categories()[0].color());

        let second = category_breakdown(&t, 6, 2025).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_breakdown_same_name_categories_stay_separate() {
        let a = Category::new(5, "Food", "");
        let b = Category::new(3, "Food", "");
        let t = vec![transaction(
            1,
            "2025-01-01",
            vec![
                (product(1, "X", "1", a), "1", "1"),
                (product(2, "Y", "2", b), "1", "2"),
            ],
        )];
        let cats = category_breakdown(&t, 1, 2025).unwrap().categories().to_vec();
        let ids: Vec<i64> = cats.iter().map(|c| c.category().id()).collect();
        assert_eq!(ids, vec![3, 5]);
    }

    #[test]
    fn test_default_month() {
        let history = monthly_history(&scenario());
        let jan = NaiveDate::from_ymd_opt(2025, 1, 28).unwrap();
        assert_eq!(default_month(&history, jan), Some((2025, 1)));

        let later = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(default_month(&history, later), Some((2025, 2)));

        assert_eq!(default_month(&[], later), None);
    }

    struct MemoryStore(Vec<Transaction>);

    #[async_trait]
    impl TransactionStore for MemoryStore {
        async fn fetch_all(&self) -> Result<Vec<Transaction>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_aggregate_from_store() {
        let store: Box<dyn TransactionStore> = Box::new(MemoryStore(scenario()));
        let transactions = store.fetch_all().await.unwrap();
        assert_eq!(monthly_history(&transactions).len(), 2);
        assert_eq!(
            category_breakdown(&transactions, 2, 2025)
                .unwrap()
                .categories()
                .len(),
            1
        );
    }
}
