use crate::domain::money::Money;
use crate::domain::promotion::Promotion;
use crate::error::{OrderError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
struct PromotionRow {
    promo_code: String,
    discount_percent: String,
    #[serde(default)]
    min_order_amount: Option<String>,
    valid_until: NaiveDate,
    #[serde(default)]
    active: Option<bool>,
}

impl TryFrom<PromotionRow> for Promotion {
    type Error = OrderError;

    fn try_from(row: PromotionRow) -> Result<Self> {
        let discount_percent = Decimal::from_str(row.discount_percent.trim()).map_err(|e| {
            OrderError::ValidationError(format!(
                "invalid discount percent `{}`: {e}",
                row.discount_percent
            ))
        })?;
        let min_order_amount = match row.min_order_amount.as_deref() {
            Some(amount) => amount.parse::<Money>()?,
            None => Money::ZERO,
        };
        let mut promotion = Promotion::new(
            &row.promo_code,
            discount_percent,
            min_order_amount,
            row.valid_until,
        )?;
        promotion.active = row.active.unwrap_or(true);
        Ok(promotion)
    }
}

/// Reads promotions from a CSV source with the header
/// `promo_code, discount_percent, min_order_amount, valid_until, active`.
///
/// Dates are `YYYY-MM-DD`.
pub struct PromotionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> PromotionReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn promotions(self) -> impl Iterator<Item = Result<Promotion>> {
        self.reader.into_deserialize().map(|result| {
            result
                .map_err(OrderError::from)
                .and_then(|row: PromotionRow| Promotion::try_from(row))
        })
    }
}
