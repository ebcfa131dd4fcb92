//! Types that represent the core data model, such as `Transaction` and `Category`, and the
//! summaries derived from them.
mod amount;
mod category;
mod product;
mod summary;
mod transaction;

pub use amount::{Amount, AmountError};
pub(crate) use category::{validate_name, DEFAULT_CATEGORIES};
pub use category::{Category, MAX_NAME_LEN};
pub use product::Product;
pub use summary::{CategoryBreakdown, CategorySummary, MonthItem, MonthlySummary};
pub use transaction::{Item, NewItem, Transaction};
