//! Geocoding orchestrator.
//!
//! Validates inputs, drives the [`NominatimClient`] (often several times per
//! operation) and shapes raw upstream records into typed results.

mod batch;
mod discovery;
mod geocoding;
pub mod validate;

use chrono::Utc;

use crate::config::GeocoderConfig;
use crate::error::Result;
use crate::models::{GeocodeRecord, GeocoderStatus, RawPlace};
use crate::nominatim::NominatimClient;

pub use discovery::NEARBY_ZOOMS;

/// Default result count for forward geocoding.
pub const DEFAULT_GEOCODE_LIMIT: u32 = 1;

/// Default result count for nearby discovery.
pub const DEFAULT_NEARBY_LIMIT: u32 = 10;

/// Options for forward geocoding.
#[derive(Debug, Clone, Default)]
pub struct GeocodeOptions {
    pub limit: Option<u32>,
    pub country_codes: Vec<String>,
    pub language: Option<String>,
}

/// Options for nearby discovery.
#[derive(Debug, Clone, Default)]
pub struct NearbyOptions {
    pub limit: Option<u32>,
    /// Keep only places whose category or type is listed
    pub categories: Vec<String>,
}

pub struct Geocoder {
    client: NominatimClient,
    max_limit: u32,
    batch_max: usize,
}

impl Geocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = NominatimClient::new(config)?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: NominatimClient, config: &GeocoderConfig) -> Self {
        Self {
            client,
            max_limit: config.max_limit.max(1),
            batch_max: config.batch_max.max(1),
        }
    }

    pub fn client(&self) -> &NominatimClient {
        &self.client
    }

    pub fn max_limit(&self) -> u32 {
        self.max_limit
    }

    pub fn batch_max(&self) -> usize {
        self.batch_max
    }

    /// Cache counters and limiter state. Never touches the network.
    pub fn status(&self) -> GeocoderStatus {
        GeocoderStatus {
            base_url: self.client.base_url().to_string(),
            cache: self.client.cache_stats(),
            since_last_dispatch_secs: self
                .client
                .since_last_dispatch()
                .map(|d| d.as_secs_f64()),
            checked_at: Utc::now(),
        }
    }
}

fn into_records(raw: Vec<RawPlace>) -> Result<Vec<GeocodeRecord>> {
    raw.into_iter().map(GeocodeRecord::try_from).collect()
}
