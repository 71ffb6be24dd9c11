//! Nominatim gateway - rate-limited, caching geocoding over OpenStreetMap Nominatim
//!
//! This library provides the upstream client, the geocoding orchestrator and
//! the tool registry used by the `serve` binary.

pub mod config;
pub mod error;
pub mod geocoder;
pub mod geometry;
pub mod models;
pub mod nominatim;
pub mod tools;

pub use error::{ErrorDescriptor, ErrorKind, GeocodeError};
pub use geocoder::{GeocodeOptions, Geocoder, NearbyOptions};
pub use models::{Bbox, GeoPoint, GeocodeRecord, OsmId, OsmType};
