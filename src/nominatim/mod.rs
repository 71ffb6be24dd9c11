//! Upstream access: rate limiting, response caching and the HTTP client.

pub mod cache;
pub mod client;
pub mod limiter;
pub mod params;
pub mod transport;

pub use cache::{cache_key, CacheKey, CacheStats, ResponseCache};
pub use client::{NominatimClient, RetryPolicy};
pub use limiter::RateLimiter;
pub use params::{ReverseParams, SearchParams, ZoomLevel};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportResponse};
