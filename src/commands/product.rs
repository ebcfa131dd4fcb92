//! Product command handlers.

use crate::args::{IdArgs, ProductAddArgs, ProductListArgs, ProductUpdateArgs};
use crate::commands::{on_foreign_key, plural, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::Product;
use crate::{Config, Result};
use anyhow::Context;

/// Adds a product and returns it with its new id.
///
/// # Errors
/// - Returns an error if the category does not exist (foreign key constraint).
/// - Returns an error if the name is invalid or the price is negative.
pub async fn product_add(config: Config, args: ProductAddArgs) -> Result<Out<Product>> {
    let category_id = args.category_id();
    let product = config
        .db()
        .insert_product(args.name(), args.price(), category_id)
        .await
        .map_err(|e| missing_category(e, category_id))
        .pub_result(ErrorType::Database)?;
    let message = format!(
        "Added product {}: {} at {}",
        product.id(),
        product.name(),
        product.unit_price().with_symbol(config.currency_symbol())
    );
    Ok(Out::new(message, product))
}

/// Lists the products with their categories, ordered by name. With a category in `args`, only
/// that category's products are listed.
///
/// # Errors
/// - Returns an error if the category does not exist.
/// - Returns an error if a database operation fails.
pub async fn product_list(config: Config, args: ProductListArgs) -> Result<Out<Vec<Product>>> {
    let category = match args.category_id() {
        Some(id) => Some(
            config
                .db()
                .get_category(id)
                .await
                .and_then(|c| c.with_context(|| format!("Category {id} does not exist")))
                .pub_result(ErrorType::Database)?,
        ),
        None => None,
    };
    let products: Vec<Product> = config
        .db()
        .list_products()
        .await
        .pub_result(ErrorType::Database)?
        .into_iter()
        .filter(|p| category.as_ref().map_or(true, |c| p.category_id() == c.id()))
        .collect();

    let symbol = config.currency_symbol();
    let mut message = plural(products.len(), "product", "products");
    if let Some(c) = &category {
        message.push_str(&format!(" in {}", c.name()));
    }
    for p in &products {
        let category = p.category().map(|c| c.name()).unwrap_or_default();
        message.push_str(&format!(
            "\n  {:>4}  {:<20} {:<14} {:>12}",
            p.id(),
            p.name(),
            category,
            p.unit_price().with_symbol(symbol)
        ));
    }
    Ok(Out::new(message, products))
}

/// Changes a product's name, price or category. Items already recorded keep the price they were
/// bought at.
pub async fn product_update(config: Config, args: ProductUpdateArgs) -> Result<Out<Product>> {
    let product = config
        .db()
        .update_product(args.id(), args.name(), args.price(), args.category_id())
        .await
        .map_err(|e| missing_category(e, args.category_id().unwrap_or_default()))
        .pub_result(ErrorType::Database)?;
    let message = format!("Updated product {}: {}", product.id(), product.name());
    Ok(Out::new(message, product))
}

/// Deletes a product. Products that appear in any transaction cannot be deleted.
pub async fn product_delete(config: Config, args: IdArgs) -> Result<Out<i64>> {
    let id = args.id();
    config
        .db()
        .delete_product(id)
        .await
        .map_err(|e| {
            on_foreign_key(e, || {
                format!(
                    "Cannot delete product {id}: it was bought in at least one transaction. \
                     Delete those transactions first."
                )
            })
        })
        .pub_result(ErrorType::Database)?;
    Ok(Out::new(format!("Deleted product {id}"), id))
}

fn missing_category(e: crate::Error, category_id: i64) -> crate::Error {
    on_foreign_key(e, || {
        format!(
            "Category {category_id} does not exist. \
             Run 'smartcash category list' to see the available categories."
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use crate::test::TestEnv;
    use std::str::FromStr;

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_product_lifecycle() {
        let env = TestEnv::new().await;
        let food = env.category("Food").await;
        let out = product_add(
            env.config(),
            ProductAddArgs::new("Rice", amount("4.5"), food.id()),
        )
        .await
        .unwrap();
        assert_eq!(out.message(), "Added product 1: Rice at $ 4.50");
        let id = out.structure().unwrap().id();

        let args = ProductUpdateArgs::new(id, None, Some(amount("5")), None);
        let out = product_update(env.config(), args).await.unwrap();
        assert_eq!(out.structure().unwrap().unit_price(), amount("5"));

        let out = product_list(env.config(), ProductListArgs::default())
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().len(), 1);
        assert!(out.message().contains("Food"));

        product_delete(env.config(), IdArgs::new(id)).await.unwrap();
        let out = product_list(env.config(), ProductListArgs::default())
            .await
            .unwrap();
        assert!(out.structure().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_product_add_unknown_category() {
        let env = TestEnv::new().await;
        let e = product_add(env.config(), ProductAddArgs::new("Rice", amount("1"), 404))
            .await
            .unwrap_err();
        assert!(format!("{e:#}").contains("Category 404 does not exist"));
    }

    #[tokio::test]
    async fn test_product_delete_in_use() {
        let env = TestEnv::new().await;
        let rice = env.seed_product("Rice", "4").await;
        env.seed_transaction("2025-01-05", rice.id(), "1").await;
        let e = product_delete(env.config(), IdArgs::new(rice.id()))
            .await
            .unwrap_err();
        assert!(format!("{e:#}").contains("bought in at least one transaction"));
    }

    #[tokio::test]
    async fn test_product_list_filters_by_category() {
        let env = TestEnv::new().await;
        env.seed_product("Rice", "4").await;
        let bus = env.seed_product_in("Bus", "2.5", "Transport").await;
        env.seed_product_in("Taxi", "20", "Transport").await;

        let args = ProductListArgs::new(Some(bus.category_id()));
        let out = product_list(env.config(), args).await.unwrap();
        let names: Vec<&str> = out.structure().unwrap().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Bus", "Taxi"]);
        assert!(out.message().starts_with("2 products in Transport"));

        let out = product_list(env.config(), ProductListArgs::default())
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().len(), 3);

        let e = product_list(env.config(), ProductListArgs::new(Some(404)))
            .await
            .unwrap_err();
        assert!(format!("{e:#}").contains("Category 404 does not exist"));
    }
}
