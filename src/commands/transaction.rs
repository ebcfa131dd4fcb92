//! Transaction command handlers.

use crate::aggregate::{self, TransactionStore};
use crate::args::{IdArgs, TransactionAddArgs, TransactionListArgs};
use crate::commands::{plural, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::Transaction;
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::Datelike;

/// Records a purchase.
///
/// The date defaults to now. Items that do not state a unit price are bought at the product's
/// current price. The transaction and its items are written atomically.
///
/// # Errors
/// - Returns an error if a product does not exist or no items are given.
/// - Returns an error if a database operation fails.
pub async fn transaction_add(config: Config, args: TransactionAddArgs) -> Result<Out<Transaction>> {
    let date = args.date().unwrap_or_else(utils::now);
    let transaction = config
        .db()
        .insert_transaction(date, args.items())
        .await
        .pub_result(ErrorType::Database)?;
    let message = format!(
        "Recorded transaction {} with {} for {}",
        transaction.id(),
        plural(transaction.items().len(), "item", "items"),
        transaction.total().with_symbol(config.currency_symbol())
    );
    Ok(Out::new(message, transaction))
}

/// Lists the transactions, most recent first. With a month in `args`, only the transactions
/// dated in that calendar month are listed.
///
/// # Errors
/// - Returns an error if the month or year is out of range.
/// - Returns an error if a database operation fails.
pub async fn transaction_list(
    config: Config,
    args: TransactionListArgs,
) -> Result<Out<Vec<Transaction>>> {
    let period = args.period();
    if let Some((year, month)) = period {
        aggregate::check_month(month, year).pub_result(ErrorType::Request)?;
    }
    let transactions: Vec<Transaction> = config
        .db()
        .fetch_all()
        .await
        .pub_result(ErrorType::Database)?
        .into_iter()
        .filter(|t| period.map_or(true, |p| (t.date().year(), t.date().month()) == p))
        .collect();

    let symbol = config.currency_symbol();
    let mut lines = vec![match period {
        Some((year, month)) => format!(
            "{} in {month:02}/{year:04}",
            plural(transactions.len(), "transaction", "transactions")
        ),
        None => plural(transactions.len(), "transaction", "transactions"),
    }];
    lines.extend(transactions.iter().map(|t| {
        format!(
            "  {:>4}  {}  {:<9} {:>14}",
            t.id(),
            t.date().format(utils::DATE_TIME_FORMAT),
            plural(t.items().len(), "item", "items"),
            t.total().with_symbol(symbol)
        )
    }));
    Ok(Out::new(lines.join("\n"), transactions))
}

/// Shows a transaction and its items.
pub async fn transaction_show(config: Config, args: IdArgs) -> Result<Out<Transaction>> {
    let id = args.id();
    let transaction = config
        .db()
        .get_transaction(id)
        .await
        .and_then(|t| t.with_context(|| format!("Transaction {id} does not exist")))
        .pub_result(ErrorType::Database)?;

    let symbol = config.currency_symbol();
    let mut lines = vec![format!(
        "Transaction {} on {}: {}",
        transaction.id(),
        transaction.date().format(utils::DATE_TIME_FORMAT),
        transaction.total().with_symbol(symbol)
    )];
    lines.extend(transaction.items().iter().map(|item| {
        let (product, category) = item
            .product()
            .map(|p| (p.name(), p.category().map(|c| c.name()).unwrap_or_default()))
            .unwrap_or_default();
        format!(
            "  {:<20} {:<12} {} x {} = {}",
            product,
            category,
            item.quantity().normalize(),
            item.unit_price().with_symbol(symbol),
            item.total().with_symbol(symbol)
        )
    }));
    Ok(Out::new(lines.join("\n"), transaction))
}

/// Deletes a transaction together with its items.
pub async fn transaction_delete(config: Config, args: IdArgs) -> Result<Out<i64>> {
    let id = args.id();
    config
        .db()
        .delete_transaction(id)
        .await
        .pub_result(ErrorType::Database)?;
    Ok(Out::new(format!("Deleted transaction {id}"), id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewItem;
    use crate::test::TestEnv;
    use crate::utils::parse_date;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_transaction_lifecycle() {
        let env = TestEnv::new().await;
        let rice = env.seed_product("Rice", "4").await;
        let bus = env.seed_product_in("Bus", "2.5", "Transport").await;

        let args = TransactionAddArgs::new(
            Some(parse_date("2025-01-05 08:15:00").unwrap()),
            vec![
                NewItem::from_str(&format!("{}:2", rice.id())).unwrap(),
                NewItem::from_str(&format!("{}:1@3", bus.id())).unwrap(),
            ],
        );
        let out = transaction_add(env.config(), args).await.unwrap();
        assert_eq!(
            out.message(),
            "Recorded transaction 1 with 2 items for $ 11.00"
        );
        let id = out.structure().unwrap().id();

        let out = transaction_show(env.config(), IdArgs::new(id)).await.unwrap();
        assert!(out.message().starts_with("Transaction 1 on 2025-01-05 08:15:00: $ 11.00"));
        assert!(out.message().contains("Transport"));

        let out = transaction_list(env.config(), TransactionListArgs::default())
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().len(), 1);
        assert!(out.message().starts_with("1 transaction"));

        transaction_delete(env.config(), IdArgs::new(id)).await.unwrap();
        let e = transaction_show(env.config(), IdArgs::new(id))
            .await
            .unwrap_err();
        assert!(format!("{e:#}").contains("Transaction 1 does not exist"));
    }

    #[tokio::test]
    async fn test_transaction_add_defaults_to_now() {
        let env = TestEnv::new().await;
        let rice = env.seed_product("Rice", "4").await;
        let before = utils::now();
        let args = TransactionAddArgs::new(
            None,
            vec![NewItem::from_str(&format!("{}:1", rice.id())).unwrap()],
        );
        let out = transaction_add(env.config(), args).await.unwrap();
        assert!(out.structure().unwrap().date() >= before);
    }

    #[tokio::test]
    async fn test_transaction_add_unknown_product() {
        let env = TestEnv::new().await;
        let args = TransactionAddArgs::new(None, vec![NewItem::from_str("77:1").unwrap()]);
        let e = transaction_add(env.config(), args).await.unwrap_err();
        assert!(format!("{e:#}").contains("Product 77 does not exist"));
    }

    #[tokio::test]
    async fn test_transaction_list_filters_by_month() {
        let env = TestEnv::new().await;
        let rice = env.seed_product("Rice", "4").await;
        env.seed_transaction("2024-03-31 23:59:59", rice.id(), "1").await;
        env.seed_transaction("2025-03-01", rice.id(), "1").await;
        env.seed_transaction("2025-03-31 23:59:59", rice.id(), "2").await;
        env.seed_transaction("2025-04-01", rice.id(), "1").await;

        let out = transaction_list(env.config(), TransactionListArgs::new(Some(3), Some(2025)))
            .await
            .unwrap();
        let dates: Vec<String> = out
            .structure()
            .unwrap()
            .iter()
            .map(|t| t.date().format("%Y-%m-%d").to_string())
            .collect();
        assert_eq!(dates, vec!["2025-03-31", "2025-03-01"]);
        assert!(out.message().starts_with("2 transactions in 03/2025"));

        let out = transaction_list(env.config(), TransactionListArgs::new(Some(6), Some(2025)))
            .await
            .unwrap();
        assert!(out.structure().unwrap().is_empty());

        let out = transaction_list(env.config(), TransactionListArgs::default())
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().len(), 4);

        let e = transaction_list(env.config(), TransactionListArgs::new(Some(0), Some(2025)))
            .await
            .unwrap_err();
        assert_eq!(e.to_string(), "request error");
        assert!(format!("{e:#}").contains("Invalid month 0"));
    }
}
