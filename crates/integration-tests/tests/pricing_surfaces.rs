//! Every checkout surface must agree on the same breakdown.
//!
//! The cart page, shipping step, payment step and quotation summary are
//! separate engine entry points; on identical inputs they must return
//! identical numbers, because they all delegate to the one pricing function.

use std::time::Duration;

use rust_decimal::Decimal;

use campo_fresco_cart::engine::CartEngine;
use campo_fresco_cart::error::CartError;
use campo_fresco_core::types::{PaymentPolicy, ShippingPolicy};
use campo_fresco_integration_tests::{
    InMemoryBackend, InMemoryCatalog, key, server_line, snapshot_with_weight,
};

type Engine = CartEngine<InMemoryBackend, InMemoryCatalog>;

async fn engine_with_oil(quantity: u32) -> Engine {
    let catalog = InMemoryCatalog::new();
    catalog.insert(
        key("aceite-oliva", Some("500ml")),
        snapshot_with_weight(15990, 20, 500),
    );
    let engine = CartEngine::new(InMemoryBackend::new(), catalog, Duration::ZERO);
    engine
        .add_to_cart(key("aceite-oliva", Some("500ml")), quantity)
        .await
        .unwrap();
    engine
}

fn shipping() -> ShippingPolicy {
    ShippingPolicy {
        base_cost: Decimal::from(5000),
        extra_cost_per_kg: None,
        free_shipping_threshold: Some(Decimal::from(50000)),
    }
}

#[tokio::test]
async fn test_all_surfaces_agree_on_identical_inputs() {
    let engine = engine_with_oil(2).await;
    let shipping = shipping();
    let payment = PaymentPolicy::with_commission(Decimal::from(5));

    let cart_page = engine.cart_summary().await.unwrap();
    let shipping_page = engine.shipping_step(&shipping).await.unwrap();
    let payment_page = engine
        .payment_step(Some(&shipping), &payment)
        .await
        .unwrap();

    assert_eq!(cart_page, engine.quotation_summary(None, None).await.unwrap());
    assert_eq!(
        shipping_page,
        engine.quotation_summary(Some(&shipping), None).await.unwrap()
    );
    assert_eq!(
        payment_page,
        engine
            .quotation_summary(Some(&shipping), Some(&payment))
            .await
            .unwrap()
    );

    // Same inputs twice: same numbers (no hidden state anywhere).
    assert_eq!(cart_page, engine.cart_summary().await.unwrap());
}

#[tokio::test]
async fn test_checkout_walkthrough_numbers() {
    // 2 x 500 ml olive oil at 15990; base 5000, free shipping from 50000.
    let engine = engine_with_oil(2).await;
    let shipping = shipping();

    let cart_page = engine.cart_summary().await.unwrap();
    assert_eq!(cart_page.subtotal, Decimal::from(31980));
    assert_eq!(cart_page.shipping_cost, Decimal::ZERO); // no method chosen yet
    assert_eq!(cart_page.total, Decimal::from(31980));

    let shipping_page = engine.shipping_step(&shipping).await.unwrap();
    assert_eq!(shipping_page.subtotal, Decimal::from(31980));
    assert_eq!(shipping_page.shipping_cost, Decimal::from(5000)); // below threshold
    assert_eq!(shipping_page.total, Decimal::from(36980));

    let payment = PaymentPolicy::with_commission(Decimal::from(5));
    let payment_page = engine
        .payment_step(Some(&shipping), &payment)
        .await
        .unwrap();
    assert_eq!(payment_page.payment_commission, Decimal::from(1849)); // 5% of 36980
    assert_eq!(payment_page.total, Decimal::from(38829));
}

#[tokio::test]
async fn test_free_shipping_applies_at_the_threshold() {
    // 4 x 15990 = 63960 >= 50000.
    let engine = engine_with_oil(4).await;

    let breakdown = engine.shipping_step(&shipping()).await.unwrap();
    assert_eq!(breakdown.subtotal, Decimal::from(63960));
    assert_eq!(breakdown.shipping_cost, Decimal::ZERO);
    assert_eq!(breakdown.total, Decimal::from(63960));
}

#[tokio::test]
async fn test_unpriced_line_blocks_every_surface() {
    // A server-held line whose variant the catalog no longer knows: the
    // snapshot refresh after login finds nothing, so no surface may price
    // the cart (never silently at zero).
    let backend = InMemoryBackend::with_cart(vec![server_line("descatalogado", None, 1)]);
    let engine = CartEngine::new(backend, InMemoryCatalog::new(), Duration::ZERO);
    engine.reconcile_at_login().await.unwrap();

    let err = engine.cart_summary().await.unwrap_err();
    assert!(matches!(err, CartError::Pricing(_)));

    let err = engine.shipping_step(&shipping()).await.unwrap_err();
    assert!(matches!(err, CartError::Pricing(_)));
}
