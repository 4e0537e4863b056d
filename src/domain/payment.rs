use super::money::{Currency, Money};
use super::order::OrderId;
use crate::error::OrderError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub Uuid);

impl PaymentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    QrTransfer,
    CashOnDelivery,
}

impl PaymentMethod {
    /// Methods settled by scanning a code the customer's banking app reads.
    pub fn is_scannable(&self) -> bool {
        matches!(self, PaymentMethod::QrTransfer)
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "card" => Ok(Self::Card),
            "qr" | "qr_transfer" => Ok(Self::QrTransfer),
            "cod" | "cash_on_delivery" => Ok(Self::CashOnDelivery),
            other => Err(OrderError::ValidationError(format!(
                "unsupported payment method `{other}` (expected card|qr_transfer|cash_on_delivery)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
}

/// Confirmation artifact for a settled order. One per order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Money,
    pub currency: Currency,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    /// Opaque payload for a presentation layer to render as a scannable code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_payload: Option<String>,
}

/// Builds the payload string encoded into a payment QR code.
///
/// The format is `selforder:pay?merchant=..&order=..&amount=..&currency=..`.
pub fn qr_payload(merchant_id: &str, order_id: OrderId, amount: Money, currency: &Currency) -> String {
    format!("selforder:pay?merchant={merchant_id}&order={order_id}&amount={amount}&currency={currency}")
}
