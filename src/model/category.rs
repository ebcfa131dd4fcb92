use crate::Result;
use anyhow::ensure;
use serde::{Deserialize, Serialize};

/// The longest name allowed for a category or a product.
pub const MAX_NAME_LEN: usize = 50;

/// A user-defined grouping label for products, e.g. "Food" or "Transport".
#[derive(Default, Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Category {
    pub(crate) id: i64,
    pub(crate) name: String,
    /// A display icon reference such as `fa-solid fa-utensils`. May be empty.
    pub(crate) icon: String,
}

impl Category {
    pub fn new(id: i64, name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            icon: icon.into(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }
}

/// The categories written into a freshly created database.
pub(crate) const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Food", "fa-solid fa-utensils"),
    ("Transport", "fa-solid fa-car"),
    ("Leisure", "fa-solid fa-gamepad"),
    ("Health", "fa-solid fa-heart-pulse"),
    ("Education", "fa-solid fa-book"),
    ("Housing", "fa-solid fa-house"),
];

/// Trims `name` and checks that it is non-empty and no longer than `MAX_NAME_LEN` characters.
pub(crate) fn validate_name(kind: &str, name: &str) -> Result<String> {
    let name = name.trim();
    ensure!(!name.is_empty(), "A {kind} name cannot be empty");
    ensure!(
        name.chars().count() <= MAX_NAME_LEN,
        "A {kind} name cannot be longer than {MAX_NAME_LEN} characters, got '{name}'"
    );
    Ok(name.to_string())
}
