//! The dashboard views: the monthly history and the category breakdown of one month.

use crate::aggregate::{self, TransactionStore};
use crate::args::BreakdownArgs;
use crate::commands::{plural, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{CategoryBreakdown, MonthlySummary};
use crate::{Config, Result};
use chrono::Local;
use serde::Serialize;

/// The widest history bar, drawn for a month at height 100.
const BAR_WIDTH: f64 = 30.0;

/// The breakdown of one month, as returned by `breakdown`.
#[derive(Debug, Clone, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub breakdown: CategoryBreakdown,
}

/// Shows the total spent in each month that has purchases, most recent first, with a bar scaled
/// to the largest month.
pub async fn history(config: Config) -> Result<Out<Vec<MonthlySummary>>> {
    let transactions = config
        .db()
        .fetch_all()
        .await
        .pub_result(ErrorType::Database)?;
    let history = aggregate::monthly_history(&transactions);
    if history.is_empty() {
        return Ok(Out::new("No transactions have been recorded yet", history));
    }

    let symbol = config.currency_symbol();
    let totals: Vec<String> = history.iter().map(|m| m.total().with_symbol(symbol)).collect();
    let width = totals.iter().map(|t| t.len()).max().unwrap_or_default();

    let mut lines = vec![format!(
        "Spending by month ({})",
        plural(history.len(), "month", "months")
    )];
    lines.extend(history.iter().zip(&totals).map(|(m, total)| {
        let bar = "#".repeat((m.height() / 100.0 * BAR_WIDTH).round() as usize);
        format!("  {}  {total:>width$}  {bar}", m.label())
    }));
    Ok(Out::new(lines.join("\n"), history))
}

/// Shows the items bought in one month, most recent first, and the total of each category.
///
/// Without a month in `args`, the current month is shown if it has purchases, otherwise the most
/// recent month that does.
pub async fn breakdown(config: Config, args: BreakdownArgs) -> Result<Out<MonthView>> {
    let transactions = config
        .db()
        .fetch_all()
        .await
        .pub_result(ErrorType::Database)?;

    let (year, month) = match (args.year(), args.month()) {
        (Some(year), Some(month)) => (year, month),
        _ => {
            let history = aggregate::monthly_history(&transactions);
            match aggregate::default_month(&history, Local::now().date_naive()) {
                Some(ym) => ym,
                None => {
                    return Ok("No transactions have been recorded yet".into());
                }
            }
        }
    };

    let breakdown = aggregate::category_breakdown(&transactions, month, year)
        .pub_result(ErrorType::Request)?;
    let message = render_breakdown(&breakdown, year, month, config.currency_symbol());
    Ok(Out::new(
        message,
        MonthView {
            year,
            month,
            breakdown,
        },
    ))
}

fn render_breakdown(breakdown: &CategoryBreakdown, year: i32, month: u32, symbol: &str) -> String {
    let title = format!("Spending in {month:02}/{year:04}");
    if breakdown.is_empty() {
        return format!("{title}: nothing was bought this month");
    }

    let mut lines = vec![
        format!("{title}: {}", breakdown.total().with_symbol(symbol)),
        String::new(),
        "By category".to_string(),
    ];
    lines.extend(breakdown.categories().iter().map(|c| {
        format!(
            "  {} {:<20} {:>14}",
            c.color(),
            c.category().name(),
            c.total().with_symbol(symbol)
        )
    }));

    lines.push(String::new());
    lines.push(format!(
        "Items ({})",
        plural(breakdown.items().len(), "item", "items")
    ));
    lines.extend(breakdown.items().iter().map(|line| {
        let item = line.item();
        let (product, category) = item
            .product()
            .map(|p| (p.name(), p.category().map(|c| c.name()).unwrap_or_default()))
            .unwrap_or_default();
        format!(
            "  {}  {:<20} {:<12} {} x {} = {}",
            line.date().format("%Y-%m-%d"),
            product,
            category,
            item.quantity().normalize(),
            item.unit_price().with_symbol(symbol),
            item.total().with_symbol(symbol)
        )
    }));
    lines.join("\n")
}
