use super::money::Money;
use serde::{Deserialize, Serialize};

/// Snapshot of a catalog entry as resolved at aggregation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Opaque catalog identifier.
    pub id: String,
    pub name: String,
    pub price: Money,
    pub category: String,
    pub available: bool,
}

impl MenuItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: Money,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            category: category.into(),
            available: true,
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}
