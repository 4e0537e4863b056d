use crate::domain::customer::CustomerSession;
use crate::domain::menu::MenuItem;
use crate::domain::order::{Order, OrderId, OrderStatus};
use crate::domain::payment::PaymentRecord;
use crate::domain::ports::{CatalogStore, OrderStore, PromotionStore, SessionStore};
use crate::domain::promotion::Promotion;
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory menu keyed by item id.
///
/// Usually seeded once from the menu CSV and then only read.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    items: Arc<RwLock<HashMap<String, MenuItem>>>,
}

impl InMemoryCatalog {
    /// Creates a new, empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = MenuItem>) -> Self {
        let items = items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();
        Self {
            items: Arc::new(RwLock::new(items)),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn get_item(&self, item_id: &str) -> Result<Option<MenuItem>> {
        let items = self.items.read().await;
        Ok(items.get(item_id).cloned())
    }

    async fn list_items(&self) -> Result<Vec<MenuItem>> {
        let items = self.items.read().await;
        let mut menu: Vec<MenuItem> = items.values().cloned().collect();
        menu.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(menu)
    }
}

/// Promotions keyed by normalized code.
#[derive(Default, Clone)]
pub struct InMemoryPromotionStore {
    promotions: Arc<RwLock<HashMap<String, Promotion>>>,
}

impl InMemoryPromotionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_promotions(promotions: impl IntoIterator<Item = Promotion>) -> Self {
        let promotions = promotions
            .into_iter()
            .map(|promo| (Promotion::normalize_code(&promo.code), promo))
            .collect();
        Self {
            promotions: Arc::new(RwLock::new(promotions)),
        }
    }

    pub async fn upsert(&self, promotion: Promotion) {
        let code = Promotion::normalize_code(&promotion.code);
        self.promotions.write().await.insert(code, promotion);
    }
}

#[async_trait]
impl PromotionStore for InMemoryPromotionStore {
    async fn get_promotion(&self, code: &str) -> Result<Option<Promotion>> {
        let promotions = self.promotions.read().await;
        Ok(promotions.get(&Promotion::normalize_code(code)).cloned())
    }
}

#[derive(Default)]
struct OrderTables {
    orders: HashMap<OrderId, Order>,
    payments: HashMap<OrderId, PaymentRecord>,
}

/// Orders and payments behind a single lock, so every write is atomic.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    tables: Arc<RwLock<OrderTables>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn payment_count(&self) -> usize {
        self.tables.read().await.payments.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert_order(&self, order: Order) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.orders.contains_key(&order.id) {
            return Err(OrderError::DuplicateOrder(order.id));
        }
        tables.orders.insert(order.id, order);
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(&order_id).cloned())
    }

    async fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .get_mut(&order_id)
            .ok_or(OrderError::OrderNotFound(order_id))?;
        order.transition(status)
    }

    async fn insert_payment(&self, payment: PaymentRecord) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.orders.contains_key(&payment.order_id) {
            return Err(OrderError::OrderNotFound(payment.order_id));
        }
        if tables.payments.contains_key(&payment.order_id) {
            return Err(OrderError::DuplicatePayment(payment.order_id));
        }
        tables.payments.insert(payment.order_id, payment);
        Ok(())
    }

    async fn payment_for_order(&self, order_id: OrderId) -> Result<Option<PaymentRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.payments.get(&order_id).cloned())
    }

    async fn orders_for_customer(&self, customer: &str, limit: usize) -> Result<Vec<Order>> {
        let needle = customer.trim().to_lowercase();
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|order| {
                order
                    .customer
                    .as_deref()
                    .is_some_and(|c| c.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(limit);
        Ok(orders)
    }
}

#[derive(Default, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, CustomerSession>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put_session(&self, session: CustomerSession) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.session_id, session);
        Ok(())
    }

    async fn get_session(&self, session_id: Uuid) -> Result<Option<CustomerSession>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&session_id).cloned())
    }
}
