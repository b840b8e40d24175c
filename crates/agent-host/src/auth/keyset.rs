//! Key set cache for public signing keys.
//!
//! Fetches the JWKS (JSON Web Key Set) published at the authority's
//! `/.well-known/jwks.json` endpoint and holds it in a single shared slot.
//! There is no TTL: staleness is only resolved by an explicit [`KeySetCache::clear`]
//! (the validator does this once when a token references an unknown `kid`).
//!
//! # Concurrency
//!
//! Concurrent first-access calls may each fetch before either populates the
//! slot. The fetch is an idempotent read-and-store, so the duplicate work is
//! accepted and the final state converges.

use crate::observability::metrics::record_keyset_fetch;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;

/// A single JSON Web Key from the key set.
///
/// Only RSA signing keys are consumed; `n` and `e` carry the public key
/// material in base64url encoding.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type (always "RSA" for RS256).
    pub kty: String,

    /// Key ID - selects which key verifies a given token.
    pub kid: String,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,

    /// Algorithm (should be "RS256").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
}

/// The published key set: an unordered collection of signing keys.
#[derive(Debug, Clone, Deserialize)]
pub struct KeySet {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

impl KeySet {
    /// Look up a key by `kid`. First match wins; at most one key is
    /// consulted per lookup even if the set carries duplicates.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid == kid)
    }
}

/// Failure fetching or parsing the key set.
///
/// This is a distinct failure class from "token invalid": it signals an
/// operational problem with the remote authority and is propagated to the
/// caller rather than collapsed into a rejection.
#[derive(Debug, Error)]
pub enum KeySetError {
    /// Network failure reaching the discovery endpoint.
    #[error("Key set fetch failed: {0}")]
    Fetch(String),

    /// Endpoint responded but the document was not a valid key set.
    #[error("Key set response invalid: {0}")]
    Parse(String),
}

/// Single-slot cache over the remote key set.
pub struct KeySetCache {
    /// URL to the JWKS discovery endpoint.
    jwks_url: String,

    /// HTTP client for fetching the key set.
    http_client: reqwest::Client,

    /// The shared slot. `None` until the first successful fetch.
    cache: RwLock<Option<KeySet>>,
}

impl KeySetCache {
    /// Create a new cache fetching from `jwks_url` with the given per-fetch
    /// timeout.
    #[must_use]
    pub fn new(jwks_url: String, fetch_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "agent.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            cache: RwLock::new(None),
        }
    }

    /// Return the key set, fetching it on first use.
    ///
    /// Two calls without an intervening [`clear`](Self::clear) perform at
    /// most one network fetch.
    ///
    /// # Errors
    ///
    /// Returns `KeySetError` if the slot is empty and the fetch fails or the
    /// response cannot be parsed. The error is fatal for the current
    /// validation attempt; there is no automatic retry.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<KeySet, KeySetError> {
        {
            let cache = self.cache.read().await;
            if let Some(keys) = cache.as_ref() {
                tracing::debug!(target: "agent.auth.jwks", "Key set cache hit");
                return Ok(keys.clone());
            }
        }

        let fresh = self.fetch().await?;

        let mut cache = self.cache.write().await;
        *cache = Some(fresh.clone());

        Ok(fresh)
    }

    /// Discard the cached key set; the next [`get`](Self::get) re-fetches.
    ///
    /// Used for key-rotation recovery and testing.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
        tracing::debug!(target: "agent.auth.jwks", "Key set cache cleared");
    }

    /// Fetch the key set from the discovery endpoint.
    async fn fetch(&self) -> Result<KeySet, KeySetError> {
        tracing::debug!(target: "agent.auth.jwks", url = %self.jwks_url, "Fetching key set");

        let result = self.fetch_inner().await;
        match &result {
            Ok(_) => record_keyset_fetch("success"),
            Err(_) => record_keyset_fetch("error"),
        }
        result
    }

    async fn fetch_inner(&self) -> Result<KeySet, KeySetError> {
        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "agent.auth.jwks", error = %e, "Failed to fetch key set");
                KeySetError::Fetch(e.to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "agent.auth.jwks",
                status = %response.status(),
                "Key set endpoint returned error"
            );
            return Err(KeySetError::Fetch(format!(
                "discovery endpoint returned {}",
                response.status()
            )));
        }

        let keys: KeySet = response.json().await.map_err(|e| {
            tracing::error!(target: "agent.auth.jwks", error = %e, "Failed to parse key set response");
            KeySetError::Parse(e.to_string())
        })?;

        tracing::info!(
            target: "agent.auth.jwks",
            key_count = keys.keys.len(),
            "Key set fetched"
        );

        Ok(keys)
    }
}
