//! Integration tests for quantity edits driven through the engine.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use campo_fresco_cart::engine::CartEngine;
use campo_fresco_cart::updater::{QuantityEdit, QuantityOutcome};
use campo_fresco_integration_tests::{
    InMemoryBackend, InMemoryCatalog, key, server_line, snapshot,
};

type Engine = CartEngine<InMemoryBackend, InMemoryCatalog>;

/// An authenticated session holding one server-backed line of `lomo/1kg`.
async fn server_backed_engine(backend: InMemoryBackend, stock: u32) -> Engine {
    let catalog = InMemoryCatalog::new();
    catalog.insert(key("lomo", Some("1kg")), snapshot(12990, stock));

    let engine = CartEngine::new(backend, catalog, Duration::ZERO);
    engine.reconcile_at_login().await.unwrap();
    engine
}

#[tokio::test(start_paused = true)]
async fn test_rapid_increments_send_a_single_mutation() {
    let gate = Arc::new(Notify::new());
    let backend = InMemoryBackend::with_cart(vec![server_line("lomo", Some("1kg"), 2)])
        .gate_updates(Arc::clone(&gate));
    let engine = server_backed_engine(backend.clone(), 10).await;
    let line = key("lomo", Some("1kg"));

    let first = tokio::spawn({
        let engine = engine.clone();
        let line = line.clone();
        async move { engine.update_quantity(&line, QuantityEdit::Increment(1)).await }
    });

    // Let the first edit park on the gated backend call.
    tokio::task::yield_now().await;

    // Second rapid click: dropped, not queued.
    let second = engine
        .update_quantity(&line, QuantityEdit::Increment(1))
        .await
        .unwrap();
    assert_eq!(second, QuantityOutcome::RejectedInFlight);

    gate.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first, QuantityOutcome::Applied { quantity: 3 });

    // Exactly one mutation reached the wire, and both sides agree.
    assert_eq!(backend.update_calls(), 1);
    assert_eq!(
        backend.products().first().map(|line| line.quantity),
        Some(3)
    );
    assert_eq!(
        engine.store().line(&line).await.map(|l| l.quantity),
        Some(3)
    );
}

#[tokio::test]
async fn test_set_is_absolute_on_both_sides() {
    let backend = InMemoryBackend::with_cart(vec![server_line("lomo", Some("1kg"), 10)]);
    let engine = server_backed_engine(backend.clone(), 20).await;
    let line = key("lomo", Some("1kg"));

    let outcome = engine
        .update_quantity(&line, QuantityEdit::Set(4))
        .await
        .unwrap();

    // 4, never 14.
    assert_eq!(outcome, QuantityOutcome::Applied { quantity: 4 });
    assert_eq!(engine.store().line(&line).await.map(|l| l.quantity), Some(4));
    assert_eq!(
        backend.products().first().map(|line| line.quantity),
        Some(4)
    );
}

#[tokio::test]
async fn test_edits_above_stock_are_clamped_and_reported() {
    let backend = InMemoryBackend::with_cart(vec![server_line("lomo", Some("1kg"), 2)]);
    let engine = server_backed_engine(backend.clone(), 5).await;
    let line = key("lomo", Some("1kg"));

    let outcome = engine
        .update_quantity(&line, QuantityEdit::Set(9))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        QuantityOutcome::Clamped {
            requested: 9,
            applied: 5
        }
    );
    assert_eq!(engine.store().line(&line).await.map(|l| l.quantity), Some(5));
    assert_eq!(
        backend.products().first().map(|line| line.quantity),
        Some(5)
    );
}

#[tokio::test]
async fn test_add_to_cart_clamps_to_available_stock() {
    let backend = InMemoryBackend::new();
    let catalog = InMemoryCatalog::new();
    catalog.insert(key("aceite-oliva", Some("500ml")), snapshot(15990, 3));
    let engine = CartEngine::new(backend, catalog, Duration::ZERO);

    let outcome = engine
        .add_to_cart(key("aceite-oliva", Some("500ml")), 5)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        QuantityOutcome::Clamped {
            requested: 5,
            applied: 3
        }
    );
    let lines = engine.store().lines().await;
    assert_eq!(lines.first().map(|l| l.quantity), Some(3));
}

#[tokio::test]
async fn test_add_to_cart_folds_into_the_existing_line() {
    let backend = InMemoryBackend::new();
    let catalog = InMemoryCatalog::new();
    catalog.insert(key("aceite-oliva", Some("500ml")), snapshot(15990, 10));
    let engine = CartEngine::new(backend, catalog, Duration::ZERO);

    engine
        .add_to_cart(key("aceite-oliva", Some("500ml")), 2)
        .await
        .unwrap();
    engine
        .add_to_cart(key("aceite-oliva", Some("500ml")), 1)
        .await
        .unwrap();

    let lines = engine.store().lines().await;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines.first().map(|l| l.quantity), Some(3));
}

#[tokio::test]
async fn test_order_completion_empties_both_carts() {
    let backend = InMemoryBackend::with_cart(vec![server_line("lomo", Some("1kg"), 2)]);
    let engine = server_backed_engine(backend.clone(), 10).await;

    engine.complete_order().await;

    assert!(engine.store().is_empty().await);
    assert!(backend.products().is_empty());
}
