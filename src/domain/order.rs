use super::menu::MenuItem;
use super::money::{Currency, Money};
use super::promotion::PromotionOutcome;
use crate::error::OrderError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub Uuid);

impl OrderId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for OrderId {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| OrderError::ValidationError(format!("invalid order id `{s}`: {e}")))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

impl OrderStatus {
    /// `Pending` may move to `Paid` or `Cancelled`; both are terminal.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Paid) | (OrderStatus::Pending, OrderStatus::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(status)
    }
}

/// A requested item and how many of it. Quantity is always at least one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub item_id: String,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(item_id: impl Into<String>, quantity: i64) -> Result<Self, OrderError> {
        let item_id = item_id.into();
        match u32::try_from(quantity) {
            Ok(quantity) if quantity >= 1 => Ok(Self { item_id, quantity }),
            _ => Err(OrderError::InvalidQuantity {
                item_id,
                quantity: quantity.to_string(),
            }),
        }
    }

    /// Accepts any JSON number that denotes a positive whole quantity (`2` or `2.0`).
    pub fn from_json_quantity(
        item_id: impl Into<String>,
        quantity: &serde_json::Number,
    ) -> Result<Self, OrderError> {
        let item_id = item_id.into();
        let whole = quantity.as_i64().or_else(|| {
            quantity
                .as_f64()
                .filter(|q| q.fract() == 0.0 && *q >= 1.0 && *q <= f64::from(u32::MAX))
                .map(|q| q as i64)
        });
        match whole {
            Some(q) => Self::new(item_id, q),
            None => Err(OrderError::InvalidQuantity {
                item_id,
                quantity: quantity.to_string(),
            }),
        }
    }
}

/// An order line priced from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

impl LineItem {
    /// Prices `quantity` units of `item`. Fails if the line total is out of range.
    pub fn priced(item: &MenuItem, quantity: u32) -> Result<Self, OrderError> {
        Ok(Self {
            item_id: item.id.clone(),
            name: item.name.clone(),
            unit_price: item.price,
            quantity,
            line_total: item.price.times(quantity)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: Option<String>,
    pub lines: Vec<LineItem>,
    pub subtotal: Money,
    pub promotion: Option<PromotionOutcome>,
    pub total: Money,
    pub currency: Currency,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn discount(&self) -> Money {
        self.promotion
            .as_ref()
            .map(PromotionOutcome::discount)
            .unwrap_or(Money::ZERO)
    }

    pub fn transition(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if self.status.can_transition_to(next) {
            self.status = next;
            Ok(())
        } else {
            Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            })
        }
    }
}
