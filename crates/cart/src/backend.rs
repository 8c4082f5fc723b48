//! Backend cart API client.
//!
//! The backend owns the server-side cart record for an authenticated user;
//! this module speaks its JSON-over-HTTP contract. Every mutation carries the
//! product (and variant, when present) so a retried request lands on the same
//! line rather than creating a new one.
//!
//! [`CartBackend`] is the seam the integration tests fake; [`HttpCartBackend`]
//! is the production implementation.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use campo_fresco_core::types::{CartLine, LineKey, ProductId, VariantId};

use crate::config::EngineConfig;

/// Errors that can occur when talking to the backend cart API.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to build the client.
    #[error("client setup error: {0}")]
    Setup(String),
}

// =============================================================================
// Wire Types
// =============================================================================

/// The server-held cart, as the backend reports it.
///
/// Lines arrive without prices or stock; those are catalog concerns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCart {
    /// Lines currently on the server-side record.
    pub products: Vec<ServerCartLine>,
}

/// One line of the server-held cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCartLine {
    /// Product this line references.
    pub product_id: ProductId,
    /// Variant, when the product has several.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    /// Unit count.
    pub quantity: u32,
}

/// Body for adding a line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLineRequest {
    /// Product to add.
    pub product_id: ProductId,
    /// Unit count to add.
    pub quantity: u32,
    /// Variant, when the product has several.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
}

impl AddLineRequest {
    /// Build the add request for a cart line.
    #[must_use]
    pub fn from_line(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            variant_id: line.variant_id.clone(),
        }
    }
}

/// How a quantity mutation applies its magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityAction {
    /// Raise the quantity by `quantity` units.
    Increment,
    /// Lower the quantity by `quantity` units.
    Decrement,
    /// Assign `quantity` as the absolute count.
    Set,
}

/// Body for mutating a line's quantity, keyed by product in the URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    /// Variant, when the product has several.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    /// Step size for increment/decrement, absolute count for set.
    pub quantity: u32,
    /// How `quantity` applies.
    pub action: QuantityAction,
}

// =============================================================================
// CartBackend Trait
// =============================================================================

/// Operations the backend cart API offers.
///
/// The engine is generic over this trait so tests can substitute an
/// in-memory backend with controllable failures.
pub trait CartBackend: Send + Sync {
    /// Fetch the current server-held cart.
    async fn fetch_cart(&self) -> Result<ServerCart, BackendError>;

    /// Add a line (or more units of an existing line).
    async fn add_line(&self, request: &AddLineRequest) -> Result<(), BackendError>;

    /// Mutate one line's quantity.
    async fn update_quantity(
        &self,
        product_id: &ProductId,
        request: &UpdateQuantityRequest,
    ) -> Result<(), BackendError>;

    /// Remove one line.
    async fn remove_line(&self, key: &LineKey) -> Result<(), BackendError>;

    /// Remove every line.
    async fn clear_cart(&self) -> Result<(), BackendError>;
}

// =============================================================================
// HttpCartBackend
// =============================================================================

/// `reqwest`-based client for the backend cart API.
#[derive(Clone)]
pub struct HttpCartBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCartBackend {
    /// Create a new backend cart API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build or the token is
    /// not a valid header value.
    pub fn new(config: &EngineConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| BackendError::Setup(format!("invalid API token: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert("Authorization", auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.cart_api_url.as_str().trim_end_matches('/').to_owned(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Map non-success statuses to `BackendError::Api`.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(BackendError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl CartBackend for HttpCartBackend {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<ServerCart, BackendError> {
        let response = self.client.get(self.endpoint("/cart")).send().await?;
        // No server-held cart yet is an empty cart, not an error.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(ServerCart::default());
        }
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    async fn add_line(&self, request: &AddLineRequest) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.endpoint("/cart/products"))
            .json(request)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(product_id = %product_id))]
    async fn update_quantity(
        &self,
        product_id: &ProductId,
        request: &UpdateQuantityRequest,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .patch(self.endpoint(&format!("/cart/products/{product_id}")))
            .json(request)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn remove_line(&self, key: &LineKey) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("/cart/products/{}", key.product));
        let mut request = self.client.delete(url);
        if let Some(variant) = &key.variant {
            request = request.query(&[("variantId", variant.as_str())]);
        }
        let response = request.send().await?;
        Self::check(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<(), BackendError> {
        let response = self.client.delete(self.endpoint("/cart")).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
