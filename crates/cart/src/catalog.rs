//! Product catalog client.
//!
//! The catalog owns product prices, stock and weights; the cart only consumes
//! per-variant snapshots. Snapshots are cached with `moka` (5-minute TTL) the
//! same way product data is cached elsewhere in the stack - a stale ceiling is
//! acceptable because the backend re-validates every mutation.

use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{debug, instrument};

use campo_fresco_core::types::{LineKey, VariantSnapshot};

use crate::config::EngineConfig;

/// Snapshot cache TTL.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Snapshot cache capacity.
const CACHE_CAPACITY: u64 = 1000;

/// Errors that can occur when fetching variant snapshots.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The variant is unknown to the catalog.
    #[error("variant not found: {0}")]
    NotFound(String),

    /// Failed to build the client.
    #[error("client setup error: {0}")]
    Setup(String),
}

/// Source of per-variant price/stock snapshots.
///
/// The engine is generic over this trait so tests can serve snapshots from
/// memory.
pub trait ProductCatalog: Send + Sync {
    /// Fetch the snapshot for one variant.
    async fn variant_snapshot(&self, key: &LineKey) -> Result<VariantSnapshot, CatalogError>;
}

/// `reqwest`-based catalog client with an in-memory snapshot cache.
#[derive(Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, VariantSnapshot>,
}

impl HttpCatalog {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build or the token is
    /// not a valid header value.
    pub fn new(config: &EngineConfig) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| CatalogError::Setup(format!("invalid API token: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert("Authorization", auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.http_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            client,
            base_url: config
                .catalog_api_url
                .as_str()
                .trim_end_matches('/')
                .to_owned(),
            cache,
        })
    }

    /// Drop the cached snapshot for one variant.
    pub async fn invalidate(&self, key: &LineKey) {
        self.cache.invalidate(&key.to_string()).await;
    }

    /// Drop every cached snapshot.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

impl ProductCatalog for HttpCatalog {
    #[instrument(skip(self), fields(key = %key))]
    async fn variant_snapshot(&self, key: &LineKey) -> Result<VariantSnapshot, CatalogError> {
        let cache_key = key.to_string();

        // Check cache
        if let Some(snapshot) = self.cache.get(&cache_key).await {
            debug!("Cache hit for variant snapshot");
            return Ok(snapshot);
        }

        let url = format!("{}/variants/{}", self.base_url, key.product);
        let mut request = self.client.get(url);
        if let Some(variant) = &key.variant {
            request = request.query(&[("variantId", variant.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(cache_key));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let snapshot: VariantSnapshot = response.json().await?;

        // Cache the result
        self.cache.insert(cache_key, snapshot.clone()).await;

        Ok(snapshot)
    }
}
