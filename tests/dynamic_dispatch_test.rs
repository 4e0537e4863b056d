mod common;

use common::{catalog, engine_with, promotions};
use selforder::application::engine::{CheckoutRequest, DEFAULT_HISTORY_LIMIT};
use selforder::domain::order::OrderLine;
use selforder::domain::ports::{CatalogStoreBox, OrderStoreBox, PromotionStoreBox};
use selforder::infrastructure::in_memory::InMemoryOrderStore;
use std::sync::Arc;

#[tokio::test]
async fn test_stores_as_trait_objects() {
    let catalog: CatalogStoreBox = Box::new(catalog());
    let promotions: PromotionStoreBox = Box::new(promotions());

    // Verify Send + Sync by spawning tasks
    let catalog_handle = tokio::spawn(async move { catalog.get_item("burger").await.unwrap() });
    let promo_handle =
        tokio::spawn(async move { promotions.get_promotion(" save20 ").await.unwrap() });

    assert_eq!(catalog_handle.await.unwrap().unwrap().name, "Burger");
    assert_eq!(promo_handle.await.unwrap().unwrap().code, "SAVE20");
}

#[tokio::test]
async fn test_engine_shared_across_tasks() {
    let orders: OrderStoreBox = Box::new(InMemoryOrderStore::new());
    let engine = Arc::new(engine_with(orders));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let request = CheckoutRequest::new(vec![OrderLine::new("fries", 1).unwrap()])
                    .for_customer(format!("guest-{}", i % 2));
                engine.aggregate(request).await.unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let history = engine
        .order_history("GUEST-0", DEFAULT_HISTORY_LIMIT)
        .await
        .unwrap();
    assert_eq!(history.len(), 8);
    assert!(
        history
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at)
    );

    let limited = engine.order_history("guest", 3).await.unwrap();
    assert_eq!(limited.len(), 3);
}
