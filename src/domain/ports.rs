use super::customer::CustomerSession;
use super::menu::MenuItem;
use super::order::{Order, OrderId, OrderStatus};
use super::payment::PaymentRecord;
use super::promotion::Promotion;
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Read access to the menu.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Retrieves a menu item by its id.
    ///
    /// # Arguments
    ///
    /// * `item_id` - Exact catalog id, e.g. `burger`.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the id is not on the menu.
    async fn get_item(&self, item_id: &str) -> Result<Option<MenuItem>>;
    /// All items, sorted by name.
    async fn list_items(&self) -> Result<Vec<MenuItem>>;
}

/// Read access to promotion codes.
#[async_trait]
pub trait PromotionStore: Send + Sync {
    /// Looks a promotion up by code, ignoring case and surrounding whitespace.
    async fn get_promotion(&self, code: &str) -> Result<Option<Promotion>>;
}

/// Durable record of orders and their payments.
///
/// Each write is atomic: a failed call leaves nothing observable behind.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Stores a new order.
    ///
    /// # Errors
    ///
    /// `DuplicateOrder` if the id is already taken.
    async fn insert_order(&self, order: Order) -> Result<()>;
    /// Retrieves an order by id, or `Ok(None)`.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;
    /// Moves an order to `status`.
    ///
    /// # Arguments
    ///
    /// * `order_id` - The order to update.
    /// * `status` - Target status; must be reachable from the current one.
    ///
    /// # Errors
    ///
    /// `OrderNotFound` for an unknown id, `InvalidTransition` when the current
    /// status does not allow the move.
    async fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()>;
    /// Stores the payment for an existing order.
    ///
    /// # Errors
    ///
    /// `OrderNotFound` for an unknown order, `DuplicatePayment` if the order
    /// already has a payment.
    async fn insert_payment(&self, payment: PaymentRecord) -> Result<()>;
    /// The payment recorded for an order, if any.
    async fn payment_for_order(&self, order_id: OrderId) -> Result<Option<PaymentRecord>>;
    /// Orders whose customer contains `customer` (case-insensitive), newest first.
    ///
    /// # Arguments
    ///
    /// * `customer` - Name or email fragment to match.
    /// * `limit` - Maximum number of orders returned.
    async fn orders_for_customer(&self, customer: &str, limit: usize) -> Result<Vec<Order>>;
}

/// Customer sessions keyed by session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts or replaces a session.
    async fn put_session(&self, session: CustomerSession) -> Result<()>;
    async fn get_session(&self, session_id: Uuid) -> Result<Option<CustomerSession>>;
}

pub type CatalogStoreBox = Box<dyn CatalogStore>;
pub type PromotionStoreBox = Box<dyn PromotionStore>;
pub type OrderStoreBox = Box<dyn OrderStore>;
pub type SessionStoreBox = Box<dyn SessionStore>;
