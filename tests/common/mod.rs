#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use selforder::application::engine::{EngineSettings, OrderEngine};
use selforder::domain::menu::MenuItem;
use selforder::domain::money::Money;
use selforder::domain::order::{Order, OrderId, OrderStatus};
use selforder::domain::payment::PaymentRecord;
use selforder::domain::ports::{OrderStore, OrderStoreBox};
use selforder::domain::promotion::Promotion;
use selforder::error::{OrderError, Result};
use selforder::infrastructure::in_memory::{
    InMemoryCatalog, InMemoryOrderStore, InMemoryPromotionStore, InMemorySessionStore,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub fn money(value: Decimal) -> Money {
    Money::new(value).unwrap()
}

pub fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::with_items([
        MenuItem::new("burger", "Burger", money(dec!(5.00)), "mains"),
        MenuItem::new("fries", "Fries", money(dec!(2.50)), "sides"),
        MenuItem::new("soda", "Soda", money(dec!(1.35)), "drinks"),
        MenuItem::new("shake", "Shake", money(dec!(3.25)), "drinks").unavailable(),
    ])
}

pub fn promotions() -> InMemoryPromotionStore {
    let far_future = NaiveDate::from_ymd_opt(2099, 12, 31).unwrap();
    InMemoryPromotionStore::with_promotions([
        Promotion::new("SAVE20", dec!(20), money(dec!(10.00)), far_future).unwrap(),
        Promotion::new("BIG20", dec!(20), money(dec!(20.00)), far_future).unwrap(),
        Promotion::new(
            "OLD10",
            dec!(10),
            Money::ZERO,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        )
        .unwrap(),
        Promotion::new("OFF5", dec!(5), Money::ZERO, far_future)
            .unwrap()
            .inactive(),
    ])
}

pub fn engine_with(orders: OrderStoreBox) -> OrderEngine {
    OrderEngine::new(
        Box::new(catalog()),
        Box::new(promotions()),
        orders,
        Box::new(InMemorySessionStore::new()),
        EngineSettings::default(),
    )
}

pub fn engine() -> OrderEngine {
    engine_with(Box::new(InMemoryOrderStore::new()))
}

/// Wraps an in-memory store and fails selected writes once, after which it
/// behaves normally. It can also stall once right after a payment is written.
#[derive(Clone, Default)]
pub struct FlakyOrderStore {
    pub inner: InMemoryOrderStore,
    fail_order_insert: Arc<AtomicBool>,
    stall_after_payment_insert: Arc<AtomicBool>,
    fail_payment_insert: Arc<AtomicBool>,
    fail_status_update: Arc<AtomicBool>,
}

impl FlakyOrderStore {
    pub fn fail_next_order_insert(&self) {
        self.fail_order_insert.store(true, Ordering::SeqCst);
    }

    /// The next payment write lands, then the call sleeps for 100ms before returning.
    pub fn stall_next_payment_insert(&self) {
        self.stall_after_payment_insert.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_payment_insert(&self) {
        self.fail_payment_insert.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_status_update(&self) {
        self.fail_status_update.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderStore for FlakyOrderStore {
    async fn insert_order(&self, order: Order) -> Result<()> {
        if self.fail_order_insert.swap(false, Ordering::SeqCst) {
            return Err(OrderError::persistence("order write lost"));
        }
        self.inner.insert_order(order).await
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        self.inner.get_order(order_id).await
    }

    async fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        if self.fail_status_update.swap(false, Ordering::SeqCst) {
            return Err(OrderError::persistence("status update lost"));
        }
        self.inner.update_order_status(order_id, status).await
    }

    async fn insert_payment(&self, payment: PaymentRecord) -> Result<()> {
        if self.fail_payment_insert.swap(false, Ordering::SeqCst) {
            return Err(OrderError::persistence("payment write lost"));
        }
        self.inner.insert_payment(payment).await?;
        if self.stall_after_payment_insert.swap(false, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        Ok(())
    }

    async fn payment_for_order(&self, order_id: OrderId) -> Result<Option<PaymentRecord>> {
        self.inner.payment_for_order(order_id).await
    }

    async fn orders_for_customer(&self, customer: &str, limit: usize) -> Result<Vec<Order>> {
        self.inner.orders_for_customer(customer, limit).await
    }
}
