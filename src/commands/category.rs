//! Category command handlers.

use crate::args::{CategoryAddArgs, CategoryUpdateArgs, IdArgs};
use crate::commands::{on_foreign_key, plural, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::Category;
use crate::{Config, Result};

/// Adds a category and returns it with its new id.
pub async fn category_add(config: Config, args: CategoryAddArgs) -> Result<Out<Category>> {
    let category = config
        .db()
        .insert_category(args.name(), args.icon())
        .await
        .pub_result(ErrorType::Database)?;
    let message = format!(
        "Added category {}: {}",
        category.id(),
        category.name()
    );
    Ok(Out::new(message, category))
}

/// Lists every category ordered by name.
pub async fn category_list(config: Config) -> Result<Out<Vec<Category>>> {
    let categories = config
        .db()
        .list_categories()
        .await
        .pub_result(ErrorType::Database)?;
    let mut message = plural(categories.len(), "category", "categories");
    for c in &categories {
        message.push_str(&format!("\n  {:>4}  {:<20} {}", c.id(), c.name(), c.icon()));
    }
    Ok(Out::new(message, categories))
}

/// Renames a category or changes its icon.
pub async fn category_update(config: Config, args: CategoryUpdateArgs) -> Result<Out<Category>> {
    let category = config
        .db()
        .update_category(args.id(), args.name(), args.icon())
        .await
        .pub_result(ErrorType::Database)?;
    let message = format!("Updated category {}: {}", category.id(), category.name());
    Ok(Out::new(message, category))
}

/// Deletes a category.
///
/// Due to `ON DELETE RESTRICT`, a category cannot be deleted while products reference it. Those
/// products must be moved to another category or deleted first.
pub async fn category_delete(config: Config, args: IdArgs) -> Result<Out<i64>> {
    let id = args.id();
    config
        .db()
        .delete_category(id)
        .await
        .map_err(|e| {
            on_foreign_key(e, || {
                format!(
                    "Cannot delete category {id}: products still use it. \
                     Move those products to another category first."
                )
            })
        })
        .pub_result(ErrorType::Database)?;
    Ok(Out::new(format!("Deleted category {id}"), id))
}
