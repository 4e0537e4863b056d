use crate::domain::menu::MenuItem;
use crate::domain::money::Money;
use crate::error::{OrderError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct MenuRow {
    id: String,
    name: String,
    price: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    available: Option<bool>,
}

impl TryFrom<MenuRow> for MenuItem {
    type Error = OrderError;

    fn try_from(row: MenuRow) -> Result<Self> {
        let id = row.id.trim().to_string();
        if id.is_empty() {
            return Err(OrderError::ValidationError(
                "Menu item id must not be empty".to_string(),
            ));
        }
        Ok(MenuItem {
            id,
            name: row.name,
            price: row.price.parse::<Money>()?,
            category: row.category.unwrap_or_default(),
            available: row.available.unwrap_or(true),
        })
    }
}

/// Reads menu items from a CSV source with the header
/// `id, name, price, category, available`.
///
/// `category` and `available` may be left empty; `available` defaults to true.
pub struct MenuReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> MenuReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily yields one result per row, so a bad row does not hide the rest.
    pub fn items(self) -> impl Iterator<Item = Result<MenuItem>> {
        self.reader.into_deserialize().map(|result| {
            result
                .map_err(OrderError::from)
                .and_then(|row: MenuRow| MenuItem::try_from(row))
        })
    }
}
