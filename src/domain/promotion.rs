use super::money::{Money, RoundingPolicy};
use crate::error::OrderError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A percentage discount identified by a case-insensitive code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    /// Normalized (trimmed, upper-case) code.
    pub code: String,
    pub discount_percent: Decimal,
    pub min_order_amount: Money,
    /// Last day (inclusive) on which the promotion can be used.
    pub valid_until: NaiveDate,
    pub active: bool,
}

impl Promotion {
    pub fn new(
        code: &str,
        discount_percent: Decimal,
        min_order_amount: Money,
        valid_until: NaiveDate,
    ) -> Result<Self, OrderError> {
        let code = Self::normalize_code(code);
        if code.is_empty() {
            return Err(OrderError::ValidationError(
                "Promotion code must not be empty".to_string(),
            ));
        }
        if discount_percent < Decimal::ZERO || discount_percent > Decimal::ONE_HUNDRED {
            return Err(OrderError::ValidationError(format!(
                "Discount percent must be within 0..=100, got {discount_percent}"
            )));
        }
        Ok(Self {
            code,
            discount_percent,
            min_order_amount,
            valid_until,
            active: true,
        })
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }

    /// Checks whether the promotion can be applied to `subtotal` on `today`.
    pub fn check(&self, subtotal: Money, today: NaiveDate) -> Result<(), PromotionRejection> {
        if !self.active {
            Err(PromotionRejection::Inactive)
        } else if self.valid_until < today {
            Err(PromotionRejection::Expired)
        } else if subtotal < self.min_order_amount {
            Err(PromotionRejection::BelowMinimum)
        } else {
            Ok(())
        }
    }
}

/// Why a promotion code did not reduce the order total.
///
/// These are reported next to a zero discount; they never fail the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionRejection {
    NotFound,
    Inactive,
    Expired,
    BelowMinimum,
}

impl fmt::Display for PromotionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            PromotionRejection::NotFound => "promotion not found",
            PromotionRejection::Inactive => "promotion inactive",
            PromotionRejection::Expired => "promotion expired",
            PromotionRejection::BelowMinimum => "below minimum order amount",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    pub code: String,
    pub percent: Decimal,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PromotionOutcome {
    Applied(AppliedDiscount),
    Rejected {
        code: String,
        reason: PromotionRejection,
    },
}

impl PromotionOutcome {
    /// Evaluates `code` against the looked-up `promotion` (if any).
    ///
    /// The discount is rounded with `policy` and never exceeds `subtotal`.
    /// Only an out-of-range discount amount is an error; an unusable code is
    /// a `Rejected` outcome.
    pub fn evaluate(
        code: &str,
        promotion: Option<&Promotion>,
        subtotal: Money,
        today: NaiveDate,
        policy: &RoundingPolicy,
    ) -> Result<Self, OrderError> {
        let code = Promotion::normalize_code(code);
        let Some(promotion) = promotion else {
            return Ok(PromotionOutcome::Rejected {
                code,
                reason: PromotionRejection::NotFound,
            });
        };

        let outcome = match promotion.check(subtotal, today) {
            Ok(()) => {
                let amount = subtotal
                    .percent(promotion.discount_percent)?
                    .round(policy)
                    .min(subtotal);
                PromotionOutcome::Applied(AppliedDiscount {
                    code: promotion.code.clone(),
                    percent: promotion.discount_percent,
                    amount,
                })
            }
            Err(reason) => PromotionOutcome::Rejected { code, reason },
        };
        Ok(outcome)
    }

    pub fn discount(&self) -> Money {
        match self {
            PromotionOutcome::Applied(applied) => applied.amount,
            PromotionOutcome::Rejected { .. } => Money::ZERO,
        }
    }

    pub fn rejection(&self) -> Option<PromotionRejection> {
        match self {
            PromotionOutcome::Applied(_) => None,
            PromotionOutcome::Rejected { reason, .. } => Some(*reason),
        }
    }
}
