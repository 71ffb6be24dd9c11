//! Rate-limited, caching Nominatim client.
//!
//! The only component that talks to the network. Every request goes:
//! cache lookup, then the rate limiter, then the transport, then (on a
//! parsable success) the cache. Transient failures are retried with
//! exponential backoff; failures are never cached.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::cache::{cache_key, CacheKey, CacheStats, ResponseCache};
use super::limiter::RateLimiter;
use super::params::{ReverseParams, SearchParams};
use super::transport::{ReqwestTransport, Transport, TransportResponse};
use crate::config::GeocoderConfig;
use crate::error::{GeocodeError, Result};
use crate::models::{OsmId, RawPlace, ReverseBody};

const DEFAULT_FORMAT: &str = "jsonv2";

type CachedBody = Arc<Value>;
type Parser<T> = fn(&Value) -> Result<T>;

/// Backoff schedule for retryable failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_backoff)
    }
}

/// Result of one dispatch.
enum Attempt<T> {
    Done(T),
    /// Worth retrying; the error is surfaced once retries run out.
    Retry(GeocodeError),
    Fail(GeocodeError),
}

/// Async client for the Nominatim search, reverse and lookup endpoints.
pub struct NominatimClient {
    base_url: Url,
    email: Option<String>,
    transport: Arc<dyn Transport>,
    cache: Arc<ResponseCache<CachedBody>>,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl NominatimClient {
    /// Create a client backed by reqwest.
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.user_agent, config.timeout())
            .map_err(|e| GeocodeError::ServiceUnavailable(e.to_string()))?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: &GeocoderConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url).map_err(|e| {
            GeocodeError::validation(format!("Invalid base URL '{}': {}", config.base_url, e))
        })?;
        // Url::join replaces the last path segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            email: config.email.clone().filter(|e| !e.trim().is_empty()),
            transport,
            cache: Arc::new(ResponseCache::new(
                config.cache_ttl(),
                config.cache_max_entries,
            )),
            limiter: RateLimiter::new(config.min_interval()),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: config.retry_base_delay(),
                max_backoff: config.max_backoff(),
            },
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn since_last_dispatch(&self) -> Option<Duration> {
        self.limiter.since_last_dispatch()
    }

    /// Forward geocode: free text to candidate places.
    pub async fn search(&self, query: &str, params: &SearchParams) -> Result<Vec<RawPlace>> {
        self.request("search", params.to_query(query), parse_places)
            .await
    }

    /// Reverse geocode: nearest place at the given detail level.
    pub async fn reverse(&self, lat: f64, lon: f64, params: &ReverseParams) -> Result<RawPlace> {
        self.request("reverse", params.to_query(lat, lon), parse_reverse)
            .await
            .map_err(|e| match e {
                GeocodeError::NotFound(_) => GeocodeError::NotFound(format!(
                    "No place found at ({}, {}) for zoom {}",
                    lat, lon, params.zoom.0
                )),
                other => other,
            })
    }

    /// Batch fetch by provider ids (`N123`, `W456`, `R789`).
    pub async fn lookup(&self, ids: &[OsmId]) -> Result<Vec<RawPlace>> {
        let joined = ids
            .iter()
            .map(OsmId::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.request("lookup", vec![("osm_ids", joined)], parse_places)
            .await
    }

    async fn request<T>(
        &self,
        endpoint: &'static str,
        mut params: Vec<(&'static str, String)>,
        parse: Parser<T>,
    ) -> Result<T>
    where
        T: Send + 'static,
    {
        params.push(("format", DEFAULT_FORMAT.to_string()));
        params.push(("addressdetails", "1".to_string()));
        if let Some(email) = &self.email {
            params.push(("email", email.clone()));
        }

        let key = cache_key(endpoint, params.iter().map(|(k, v)| (*k, v.as_str())));
        if let Some(body) = self.cache.get(&key) {
            debug!("Cache hit for {} ({})", endpoint, key);
            return parse(&body);
        }
        debug!("Cache miss for {} ({})", endpoint, key);

        let mut url = self
            .base_url
            .join(endpoint)
            .map_err(|e| GeocodeError::validation(format!("Invalid endpoint URL: {}", e)))?;
        url.query_pairs_mut().extend_pairs(params.iter());

        let mut attempt = 0;
        loop {
            self.limiter.acquire().await;

            match self.dispatch(url.clone(), key, parse).await {
                Attempt::Done(value) => return Ok(value),
                Attempt::Fail(err) => return Err(err),
                Attempt::Retry(err) if attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    attempt += 1;
                    warn!(
                        "Nominatim {} failed ({}), retrying in {:?} (attempt {}/{})",
                        endpoint, err, delay, attempt, self.retry.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Attempt::Retry(GeocodeError::ServiceBusy { .. }) => {
                    return Err(GeocodeError::ServiceBusy {
                        attempts: attempt + 1,
                    })
                }
                Attempt::Retry(err) => return Err(err),
            }
        }
    }

    /// Send one request and, on success, cache the body.
    ///
    /// Runs on its own task: once dispatched, the call completes and fills
    /// the cache even if the caller has gone away.
    async fn dispatch<T>(&self, url: Url, key: CacheKey, parse: Parser<T>) -> Attempt<T>
    where
        T: Send + 'static,
    {
        let transport = Arc::clone(&self.transport);
        let cache = Arc::clone(&self.cache);

        let task = tokio::spawn(async move {
            let response = match transport.get(&url).await {
                Ok(response) => response,
                Err(e) if e.is_transient() => {
                    return Attempt::Retry(GeocodeError::ServiceUnavailable(e.to_string()))
                }
                Err(e) => return Attempt::Fail(GeocodeError::ServiceUnavailable(e.to_string())),
            };

            if let Some(failure) = classify_status(&response) {
                return failure;
            }

            let body: Value = match serde_json::from_str(&response.body) {
                Ok(body) => body,
                Err(e) => {
                    return Attempt::Fail(GeocodeError::Upstream(format!("invalid JSON: {}", e)))
                }
            };

            match parse(&body) {
                Ok(value) => {
                    cache.put(key, Arc::new(body));
                    Attempt::Done(value)
                }
                Err(e) => Attempt::Fail(e),
            }
        });

        match task.await {
            Ok(attempt) => attempt,
            Err(e) => Attempt::Fail(GeocodeError::ServiceUnavailable(format!(
                "dispatch task failed: {}",
                e
            ))),
        }
    }
}

fn classify_status<T>(response: &TransportResponse) -> Option<Attempt<T>> {
    if response.is_success() {
        return None;
    }
    let snippet: String = response.body.chars().take(200).collect();
    let failure = match response.status {
        429 => Attempt::Retry(GeocodeError::ServiceBusy { attempts: 1 }),
        502..=504 => Attempt::Retry(GeocodeError::ServiceUnavailable(format!(
            "HTTP {}",
            response.status
        ))),
        404 => Attempt::Fail(GeocodeError::NotFound(format!("HTTP 404: {}", snippet))),
        400 => Attempt::Fail(GeocodeError::Upstream(format!(
            "request rejected (HTTP 400): {}",
            snippet
        ))),
        status => Attempt::Fail(GeocodeError::ServiceUnavailable(format!(
            "HTTP {}: {}",
            status, snippet
        ))),
    };
    Some(failure)
}

fn parse_places(body: &Value) -> Result<Vec<RawPlace>> {
    let items = match body {
        Value::Array(items) => items.clone(),
        Value::Object(map) if map.contains_key("error") => {
            return Err(GeocodeError::Upstream(format!("error body: {}", body)))
        }
        Value::Object(_) => vec![body.clone()],
        other => {
            return Err(GeocodeError::Upstream(format!(
                "expected a list of places, got {}",
                other
            )))
        }
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| GeocodeError::Upstream(format!("malformed place: {}", e)))
        })
        .collect()
}

fn parse_reverse(body: &Value) -> Result<RawPlace> {
    let parsed: ReverseBody = serde_json::from_value(body.clone())
        .map_err(|e| GeocodeError::Upstream(format!("malformed reverse result: {}", e)))?;
    match parsed {
        ReverseBody::Place(place) => Ok(*place),
        ReverseBody::Miss { error } => Err(GeocodeError::NotFound(error)),
    }
}
