use crate::domain::order::{Order, OrderId, OrderStatus};
use crate::domain::payment::PaymentRecord;
use crate::domain::ports::OrderStore;
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Column Family for storing orders, keyed by order id.
pub const CF_ORDERS: &str = "orders";
/// Column Family for storing payment records, keyed by payment id.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family mapping order id to payment id.
pub const CF_PAYMENTS_BY_ORDER: &str = "payments_by_order";

/// A persistent order store using RocksDB.
///
/// Orders and payments live in separate Column Families. A payment and its
/// order index entry are written in one `WriteBatch`. Read-check-write
/// sequences are serialized through `write_lock` so duplicate ids are
/// rejected rather than overwritten.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_ORDERS, CF_PAYMENTS, CF_PAYMENTS_BY_ORDER]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| OrderError::persistence(format!("{name} column family not found")))
    }

    fn read<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        let handle = self.cf(cf)?;
        match self.db.get_cf(handle, key)? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes).map_err(|e| {
                    OrderError::persistence(format!("Deserialization error in {cf}: {e}"))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value)
            .map_err(|e| OrderError::persistence(format!("Serialization error: {e}")))
    }

    fn put_order(&self, order: &Order) -> Result<()> {
        let handle = self.cf(CF_ORDERS)?;
        self.db
            .put_cf(handle, order.id.0.as_bytes(), Self::encode(order)?)?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| OrderError::persistence("RocksDB write lock poisoned"))
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn insert_order(&self, order: Order) -> Result<()> {
        let _guard = self.lock()?;
        if self
            .read::<Order>(CF_ORDERS, order.id.0.as_bytes())?
            .is_some()
        {
            return Err(OrderError::DuplicateOrder(order.id));
        }
        self.put_order(&order)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        self.read(CF_ORDERS, order_id.0.as_bytes())
    }

    async fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let _guard = self.lock()?;
        let mut order: Order = self
            .read(CF_ORDERS, order_id.0.as_bytes())?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        order.transition(status)?;
        self.put_order(&order)
    }

    async fn insert_payment(&self, payment: PaymentRecord) -> Result<()> {
        let _guard = self.lock()?;
        let order_key = payment.order_id.0.as_bytes();
        if self.read::<Order>(CF_ORDERS, order_key)?.is_none() {
            return Err(OrderError::OrderNotFound(payment.order_id));
        }
        let index = self.cf(CF_PAYMENTS_BY_ORDER)?;
        if self.db.get_pinned_cf(index, order_key)?.is_some() {
            return Err(OrderError::DuplicatePayment(payment.order_id));
        }

        let payments = self.cf(CF_PAYMENTS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(payments, payment.id.0.as_bytes(), Self::encode(&payment)?);
        batch.put_cf(index, order_key, payment.id.0.as_bytes());
        self.db.write(batch)?;
        Ok(())
    }

    async fn payment_for_order(&self, order_id: OrderId) -> Result<Option<PaymentRecord>> {
        let index = self.cf(CF_PAYMENTS_BY_ORDER)?;
        match self.db.get_cf(index, order_id.0.as_bytes())? {
            Some(payment_key) => self.read(CF_PAYMENTS, &payment_key),
            None => Ok(None),
        }
    }

    async fn orders_for_customer(&self, customer: &str, limit: usize) -> Result<Vec<Order>> {
        let needle = customer.trim().to_lowercase();
        let handle = self.cf(CF_ORDERS)?;

        let mut orders = Vec::new();
        for item in self.db.iterator_cf(handle, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let order: Order = serde_json::from_slice(&value).map_err(|e| {
                OrderError::persistence(format!("Failed to deserialize order: {e}"))
            })?;
            if order
                .customer
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle))
            {
                orders.push(order);
            }
        }

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(limit);
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::menu::MenuItem;
    use crate::domain::money::{Currency, Money};
    use crate::domain::order::LineItem;
    use crate::domain::payment::{PaymentId, PaymentMethod, PaymentStatus};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn sample_order(customer: &str) -> Order {
        let item = MenuItem::new("burger", "Burger", Money::new(dec!(5.00)).unwrap(), "mains");
        let line = LineItem::priced(&item, 2).unwrap();
        Order {
            id: OrderId::generate(),
            customer: Some(customer.to_string()),
            subtotal: line.line_total,
            total: line.line_total,
            lines: vec![line],
            promotion: None,
            currency: Currency::new("USD").unwrap(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_ORDERS).is_some());
        assert!(store.db.cf_handle(CF_PAYMENTS).is_some());
        assert!(store.db.cf_handle(CF_PAYMENTS_BY_ORDER).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_order_lifecycle() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let order = sample_order("ana");

        store.insert_order(order.clone()).await.unwrap();
        assert!(matches!(
            store.insert_order(order.clone()).await,
            Err(OrderError::DuplicateOrder(_))
        ));
        assert_eq!(store.get_order(order.id).await.unwrap(), Some(order.clone()));

        let payment = PaymentRecord {
            id: PaymentId::generate(),
            order_id: order.id,
            amount: order.total,
            currency: order.currency.clone(),
            method: PaymentMethod::Card,
            status: PaymentStatus::Paid,
            created_at: Utc::now(),
            qr_payload: None,
        };
        store.insert_payment(payment.clone()).await.unwrap();
        assert!(matches!(
            store.insert_payment(payment.clone()).await,
            Err(OrderError::DuplicatePayment(_))
        ));
        assert_eq!(
            store.payment_for_order(order.id).await.unwrap(),
            Some(payment)
        );

        store
            .update_order_status(order.id, OrderStatus::Paid)
            .await
            .unwrap();
        let stored = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_rocksdb_history_survives_reopen() {
        let dir = tempdir().unwrap();
        let order = sample_order("Ana");
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            store.insert_order(order.clone()).await.unwrap();
        }

        let reopened = RocksDBStore::open(dir.path()).unwrap();
        let history = reopened.orders_for_customer("ana", 10).await.unwrap();
        assert_eq!(history, vec![order]);
    }
}
