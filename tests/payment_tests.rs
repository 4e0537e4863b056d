mod common;

use common::{FlakyOrderStore, engine, engine_with, money};
use rust_decimal_macros::dec;
use selforder::application::engine::{CheckoutRequest, OrderEngine, PaymentRequest};
use selforder::domain::money::Currency;
use selforder::domain::order::{Order, OrderLine, OrderStatus};
use selforder::domain::payment::PaymentMethod;
use selforder::domain::ports::OrderStore;
use selforder::error::{ErrorKind, OrderError};

async fn pending_order(engine: &OrderEngine) -> Order {
    engine
        .aggregate(
            CheckoutRequest::new(vec![
                OrderLine::new("burger", 2).unwrap(),
                OrderLine::new("fries", 1).unwrap(),
            ])
            .with_promotion("SAVE20"),
        )
        .await
        .unwrap()
}

fn full_payment(order: &Order, method: PaymentMethod) -> PaymentRequest {
    PaymentRequest {
        order_id: order.id,
        amount: order.total,
        currency: order.currency.clone(),
        method,
    }
}

#[tokio::test]
async fn test_amount_mismatch_leaves_order_pending() {
    let engine = engine();
    let order = pending_order(&engine).await;
    let mut request = full_payment(&order, PaymentMethod::Card);
    request.amount = money(dec!(12.50));

    let err = engine.confirm_payment(request).await.unwrap_err();

    assert!(matches!(err, OrderError::AmountMismatch { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);
    let stored = engine.get_order(order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_currency_mismatch() {
    let engine = engine();
    let order = pending_order(&engine).await;
    let mut request = full_payment(&order, PaymentMethod::Card);
    request.currency = Currency::new("EUR").unwrap();

    assert!(matches!(
        engine.confirm_payment(request).await,
        Err(OrderError::CurrencyMismatch { .. })
    ));
}

#[tokio::test]
async fn test_cash_on_delivery_marks_paid() {
    let engine = engine();
    let order = pending_order(&engine).await;

    let payment = engine
        .confirm_payment(full_payment(&order, PaymentMethod::CashOnDelivery))
        .await
        .unwrap();

    assert_eq!(payment.amount.value(), dec!(10.00));
    assert!(payment.qr_payload.is_none());
    assert_eq!(
        engine.get_order(order.id).await.unwrap().status,
        OrderStatus::Paid
    );
}

#[tokio::test]
async fn test_retry_after_failed_payment_write() {
    let store = FlakyOrderStore::default();
    let engine = engine_with(Box::new(store.clone()));
    let order = pending_order(&engine).await;

    store.fail_next_payment_insert();
    let err = engine
        .confirm_payment(full_payment(&order, PaymentMethod::Card))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infrastructure);
    assert_eq!(store.inner.payment_count().await, 0);
    assert_eq!(
        store.get_order(order.id).await.unwrap().unwrap().status,
        OrderStatus::Pending
    );

    engine
        .confirm_payment(full_payment(&order, PaymentMethod::Card))
        .await
        .unwrap();
    assert_eq!(store.inner.payment_count().await, 1);
}

#[tokio::test]
async fn test_retry_after_failed_status_update_reuses_payment() {
    let store = FlakyOrderStore::default();
    let engine = engine_with(Box::new(store.clone()));
    let order = pending_order(&engine).await;

    store.fail_next_status_update();
    assert!(
        engine
            .confirm_payment(full_payment(&order, PaymentMethod::QrTransfer))
            .await
            .is_err()
    );
    assert_eq!(store.inner.payment_count().await, 1);

    let retried = engine
        .confirm_payment(full_payment(&order, PaymentMethod::QrTransfer))
        .await
        .unwrap();
    let stored = store.payment_for_order(order.id).await.unwrap().unwrap();

    assert_eq!(retried.id, stored.id);
    assert_eq!(store.inner.payment_count().await, 1);
    assert_eq!(
        store.get_order(order.id).await.unwrap().unwrap().status,
        OrderStatus::Paid
    );
}

#[tokio::test]
async fn test_concurrent_payments_record_once() {
    let store = FlakyOrderStore::default();
    let engine = std::sync::Arc::new(engine_with(Box::new(store.clone())));
    let order = pending_order(&engine).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            let request = full_payment(&order, PaymentMethod::Card);
            tokio::spawn(async move { engine.confirm_payment(request).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.dedup();

    assert_eq!(ids.len(), 1);
    assert_eq!(store.inner.payment_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_replay_marking_paid_first_does_not_fail_the_writer() {
    let store = FlakyOrderStore::default();
    let engine = std::sync::Arc::new(engine_with(Box::new(store.clone())));
    let order = pending_order(&engine).await;
    store.stall_next_payment_insert();

    let writer = {
        let engine = engine.clone();
        let request = full_payment(&order, PaymentMethod::Card);
        tokio::spawn(async move { engine.confirm_payment(request).await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let replay = engine
        .confirm_payment(full_payment(&order, PaymentMethod::Card))
        .await
        .unwrap();
    let written = writer.await.unwrap().unwrap();

    assert_eq!(written.id, replay.id);
    assert_eq!(store.inner.payment_count().await, 1);
    assert_eq!(
        engine.get_order(order.id).await.unwrap().status,
        OrderStatus::Paid
    );
}

#[tokio::test]
async fn test_unknown_order() {
    let engine = engine();
    let order = pending_order(&engine).await;
    let mut request = full_payment(&order, PaymentMethod::Card);
    request.order_id = selforder::domain::order::OrderId::generate();

    assert!(matches!(
        engine.confirm_payment(request).await,
        Err(OrderError::OrderNotFound(_))
    ));
}
