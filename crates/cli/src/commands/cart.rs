//! Backend cart inspection and mutation commands.
//!
//! These talk straight to the backend cart API with the configured
//! credentials; they are operator tooling, not a shopping session.

use campo_fresco_cart::backend::{
    AddLineRequest, CartBackend, HttpCartBackend, QuantityAction, UpdateQuantityRequest,
};
use campo_fresco_cart::config::EngineConfig;
use campo_fresco_core::types::{LineKey, ProductId, VariantId};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn client() -> Result<HttpCartBackend> {
    let config = EngineConfig::from_env()?;
    Ok(HttpCartBackend::new(&config)?)
}

/// Print the server-held cart, one line per row.
pub async fn show() -> Result<()> {
    let backend = client()?;
    let cart = backend.fetch_cart().await?;

    if cart.products.is_empty() {
        println!("(empty cart)");
        return Ok(());
    }

    for line in &cart.products {
        let key = LineKey::new(line.product_id.clone(), line.variant_id.clone());
        println!("{key}\tx{}", line.quantity);
    }
    Ok(())
}

/// Add units of a variant to the server cart.
pub async fn add(product: &str, variant: Option<&str>, quantity: u32) -> Result<()> {
    let backend = client()?;
    backend
        .add_line(&AddLineRequest {
            product_id: ProductId::new(product),
            quantity,
            variant_id: variant.map(VariantId::new),
        })
        .await?;

    tracing::info!("added {product} x{quantity}");
    Ok(())
}

/// Set a line's absolute quantity on the server cart.
pub async fn set_quantity(product: &str, variant: Option<&str>, quantity: u32) -> Result<()> {
    let backend = client()?;
    backend
        .update_quantity(
            &ProductId::new(product),
            &UpdateQuantityRequest {
                variant_id: variant.map(VariantId::new),
                quantity,
                action: QuantityAction::Set,
            },
        )
        .await?;

    tracing::info!("set {product} to x{quantity}");
    Ok(())
}

/// Remove a line from the server cart.
pub async fn remove(product: &str, variant: Option<&str>) -> Result<()> {
    let backend = client()?;
    let key = LineKey::new(ProductId::new(product), variant.map(VariantId::new));
    backend.remove_line(&key).await?;

    tracing::info!("removed {key}");
    Ok(())
}

/// Remove every line from the server cart.
pub async fn clear() -> Result<()> {
    let backend = client()?;
    backend.clear_cart().await?;

    tracing::info!("cart cleared");
    Ok(())
}
