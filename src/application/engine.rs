use crate::config::AppConfig;
use crate::domain::customer::CustomerSession;
use crate::domain::menu::MenuItem;
use crate::domain::money::{Currency, Money, RoundingPolicy};
use crate::domain::order::{LineItem, Order, OrderId, OrderLine, OrderStatus};
use crate::domain::payment::{PaymentId, PaymentMethod, PaymentRecord, PaymentStatus, qr_payload};
use crate::domain::ports::{CatalogStoreBox, OrderStoreBox, PromotionStoreBox, SessionStoreBox};
use crate::domain::promotion::{Promotion, PromotionOutcome, PromotionRejection};
use crate::error::{OrderError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Pricing and payment settings the engine applies to every order.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub currency: Currency,
    pub rounding: RoundingPolicy,
    pub merchant_id: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for EngineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            currency: config.pricing.currency.clone(),
            rounding: config.pricing.rounding_policy(),
            merchant_id: config.payment.merchant_id.clone(),
        }
    }
}

/// Input to [`OrderEngine::aggregate`].
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    /// Caller-chosen id. Re-submitting with the same id returns the stored order.
    pub order_id: Option<OrderId>,
    pub lines: Vec<OrderLine>,
    pub promotion_code: Option<String>,
    pub customer: Option<String>,
}

impl CheckoutRequest {
    pub fn new(lines: Vec<OrderLine>) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }

    pub fn with_promotion(mut self, code: impl Into<String>) -> Self {
        self.promotion_code = Some(code.into());
        self
    }

    pub fn for_customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = Some(customer.into());
        self
    }

    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }
}

/// Input to [`OrderEngine::confirm_payment`].
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub amount: Money,
    pub currency: Currency,
    pub method: PaymentMethod,
}

/// Result of looking a promotion code up without placing an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotionCheck {
    pub code: String,
    pub promotion: Option<Promotion>,
    pub applicable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<PromotionRejection>,
}

/// Prices orders, applies promotions and confirms payments.
///
/// Every collaborator is a port handed in at construction. The engine keeps no
/// state of its own, so one instance can serve concurrent requests.
pub struct OrderEngine {
    catalog: CatalogStoreBox,
    promotions: PromotionStoreBox,
    orders: OrderStoreBox,
    sessions: SessionStoreBox,
    settings: EngineSettings,
}

impl OrderEngine {
    /// Creates a new `OrderEngine` over the given stores.
    ///
    /// # Arguments
    ///
    /// * `catalog` - Menu items orders are priced from.
    /// * `promotions` - Promotion codes looked up at checkout.
    /// * `orders` - Durable store for orders and their payments.
    /// * `sessions` - Customer sessions gathered during a conversation.
    /// * `settings` - Currency, rounding and merchant id.
    pub fn new(
        catalog: CatalogStoreBox,
        promotions: PromotionStoreBox,
        orders: OrderStoreBox,
        sessions: SessionStoreBox,
        settings: EngineSettings,
    ) -> Self {
        Self {
            catalog,
            promotions,
            orders,
            sessions,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Prices `request` against the catalog and persists it as a pending order.
    ///
    /// # Arguments
    ///
    /// * `request` - Lines, optional promotion code, customer and order id.
    ///
    /// # Errors
    ///
    /// Validation errors for empty orders, unknown or unavailable items and
    /// out-of-range amounts; nothing is written in those cases. An unusable
    /// promotion is not an error and is reported on the order instead.
    pub async fn aggregate(&self, request: CheckoutRequest) -> Result<Order> {
        self.aggregate_at(request, Utc::now()).await
    }

    /// Same as [`aggregate`](Self::aggregate) with an explicit clock reading.
    ///
    /// Promotion expiry is judged against the UTC date of `now`.
    pub async fn aggregate_at(&self, request: CheckoutRequest, now: DateTime<Utc>) -> Result<Order> {
        if let Some(order_id) = request.order_id
            && let Some(existing) = self.orders.get_order(order_id).await?
        {
            info!(event_name = "order.replayed", order_id = %order_id, "returning stored order");
            return Ok(existing);
        }

        if request.lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let mut lines = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    item_id: line.item_id.clone(),
                    quantity: line.quantity.to_string(),
                });
            }
            let item = self
                .catalog
                .get_item(&line.item_id)
                .await?
                .ok_or_else(|| OrderError::ItemNotFound(line.item_id.clone()))?;
            if !item.available {
                return Err(OrderError::ItemUnavailable(item.id));
            }
            lines.push(LineItem::priced(&item, line.quantity)?);
        }

        let rounding = &self.settings.rounding;
        let subtotal = Money::total(lines.iter().map(|line| line.line_total))?.round(rounding);

        let promotion = match request
            .promotion_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
        {
            Some(code) => {
                let found = self.promotions.get_promotion(code).await?;
                let outcome = PromotionOutcome::evaluate(
                    code,
                    found.as_ref(),
                    subtotal,
                    now.date_naive(),
                    rounding,
                )?;
                if let Some(reason) = outcome.rejection() {
                    info!(
                        event_name = "promotion.rejected",
                        code = %code,
                        reason = %reason,
                        "promotion not applied"
                    );
                }
                Some(outcome)
            }
            None => None,
        };

        let discount = promotion
            .as_ref()
            .map(PromotionOutcome::discount)
            .unwrap_or(Money::ZERO);

        let order = Order {
            id: request.order_id.unwrap_or_else(OrderId::generate),
            customer: request
                .customer
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            lines,
            subtotal,
            promotion,
            total: subtotal.saturating_sub(discount),
            currency: self.settings.currency.clone(),
            status: OrderStatus::Pending,
            created_at: now,
        };

        match self.orders.insert_order(order.clone()).await {
            Ok(()) => {
                info!(
                    event_name = "order.aggregated",
                    order_id = %order.id,
                    subtotal = %order.subtotal,
                    discount = %discount,
                    total = %order.total,
                    "order saved"
                );
                Ok(order)
            }
            // Lost a race against a retry carrying the same caller-chosen id.
            Err(OrderError::DuplicateOrder(order_id)) if request.order_id.is_some() => {
                info!(event_name = "order.replayed", order_id = %order_id, "returning stored order");
                self.orders
                    .get_order(order_id)
                    .await?
                    .ok_or(OrderError::DuplicateOrder(order_id))
            }
            Err(e) => {
                warn!(event_name = "order.save_failed", order_id = %order.id, error = %e, "order not saved");
                Err(e)
            }
        }
    }

    /// Records a full payment for a pending order and marks it paid.
    ///
    /// # Arguments
    ///
    /// * `request` - Order id, amount and currency (both must match the order), method.
    ///
    /// Safe to call again after a failure: an existing payment for the order is
    /// returned instead of creating a second one.
    pub async fn confirm_payment(&self, request: PaymentRequest) -> Result<PaymentRecord> {
        let order = self
            .orders
            .get_order(request.order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(request.order_id))?;

        if request.amount != order.total {
            return Err(OrderError::AmountMismatch {
                expected: order.total,
                actual: request.amount,
            });
        }
        if request.currency != order.currency {
            return Err(OrderError::CurrencyMismatch {
                expected: order.currency.to_string(),
                actual: request.currency.to_string(),
            });
        }

        if let Some(existing) = self.orders.payment_for_order(order.id).await? {
            return self.complete_replayed_payment(&order, existing).await;
        }

        if !order.status.can_transition_to(OrderStatus::Paid) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Paid,
            });
        }

        let record = PaymentRecord {
            id: PaymentId::generate(),
            order_id: order.id,
            amount: order.total,
            currency: order.currency.clone(),
            method: request.method,
            status: PaymentStatus::Paid,
            created_at: Utc::now(),
            qr_payload: request.method.is_scannable().then(|| {
                qr_payload(
                    &self.settings.merchant_id,
                    order.id,
                    order.total,
                    &order.currency,
                )
            }),
        };

        match self.orders.insert_payment(record.clone()).await {
            Ok(()) => {}
            Err(OrderError::DuplicatePayment(_)) => {
                let existing = self
                    .orders
                    .payment_for_order(order.id)
                    .await?
                    .ok_or(OrderError::DuplicatePayment(order.id))?;
                return self.complete_replayed_payment(&order, existing).await;
            }
            Err(e) => {
                warn!(event_name = "payment.save_failed", order_id = %order.id, error = %e, "payment not saved");
                return Err(e);
            }
        }

        self.mark_paid(order.id).await?;
        info!(
            event_name = "payment.confirmed",
            order_id = %order.id,
            payment_id = %record.id,
            amount = %record.amount,
            "payment confirmed"
        );
        Ok(record)
    }

    async fn complete_replayed_payment(
        &self,
        order: &Order,
        existing: PaymentRecord,
    ) -> Result<PaymentRecord> {
        // an earlier attempt saved the payment but not the status change
        if order.status == OrderStatus::Pending {
            self.mark_paid(order.id).await?;
        }
        info!(
            event_name = "payment.replayed",
            order_id = %order.id,
            payment_id = %existing.id,
            "returning stored payment"
        );
        Ok(existing)
    }

    /// Moves an order to `paid`. Another attempt having done it first counts as success.
    async fn mark_paid(&self, order_id: OrderId) -> Result<()> {
        match self
            .orders
            .update_order_status(order_id, OrderStatus::Paid)
            .await
        {
            Ok(()) | Err(OrderError::InvalidTransition { from: OrderStatus::Paid, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Fetches a stored order.
    ///
    /// # Arguments
    ///
    /// * `order_id` - Id returned by [`aggregate`](Self::aggregate).
    ///
    /// # Errors
    ///
    /// `OrderNotFound` when no order has that id.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    /// Every catalog item, available or not, sorted by name.
    pub async fn menu(&self) -> Result<Vec<MenuItem>> {
        self.catalog.list_items().await
    }

    /// Reports whether `code` would apply to an order of `subtotal` today.
    ///
    /// Without a subtotal the minimum-order gate is not evaluated.
    pub async fn check_promotion(&self, code: &str, subtotal: Option<Money>) -> Result<PromotionCheck> {
        let normalized = Promotion::normalize_code(code);
        if normalized.is_empty() {
            return Err(OrderError::ValidationError(
                "Promotion code must not be empty".to_string(),
            ));
        }
        let promotion = self.promotions.get_promotion(&normalized).await?;
        let reason = match &promotion {
            None => Some(PromotionRejection::NotFound),
            Some(promo) => {
                let subtotal = subtotal.unwrap_or(promo.min_order_amount);
                promo.check(subtotal, Utc::now().date_naive()).err()
            }
        };
        Ok(PromotionCheck {
            code: normalized,
            promotion,
            applicable: reason.is_none(),
            reason,
        })
    }

    /// A returning customer's orders, newest first.
    ///
    /// # Arguments
    ///
    /// * `customer` - Name or email; matched case-insensitively as a substring.
    /// * `limit` - Maximum number of orders, usually [`DEFAULT_HISTORY_LIMIT`].
    pub async fn order_history(&self, customer: &str, limit: usize) -> Result<Vec<Order>> {
        if customer.trim().is_empty() {
            return Err(OrderError::ValidationError(
                "Provide a customer name or email to look up order history".to_string(),
            ));
        }
        self.orders.orders_for_customer(customer, limit).await
    }

    /// Starts and stores a customer session.
    ///
    /// # Arguments
    ///
    /// * `name`, `email`, `phone` - Contact details; at least one must be non-blank.
    pub async fn collect_customer_info(
        &self,
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<CustomerSession> {
        let session = CustomerSession::start(name, email, phone)?;
        self.sessions.put_session(session.clone()).await?;
        info!(event_name = "customer.collected", session_id = %session.session_id, "customer info stored");
        Ok(session)
    }

    /// Looks up a session started by [`collect_customer_info`](Self::collect_customer_info).
    pub async fn session(&self, session_id: Uuid) -> Result<Option<CustomerSession>> {
        self.sessions.get_session(session_id).await
    }
}
