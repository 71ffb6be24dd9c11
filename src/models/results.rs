//! Derived results produced by orchestrator operations.

use serde::{Deserialize, Serialize};

use super::place::{Bbox, GeoPoint, GeocodeRecord, OsmType};
use crate::error::ErrorDescriptor;
use crate::nominatim::CacheStats;

/// Bounding box of a named place, ready for area-based tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BboxResult {
    pub place_name: String,
    pub bbox: Bbox,
    /// `[lon, lat]` of the matched place
    pub center: [f64; 2],
    pub area_km2: f64,
}

/// A place discovered around a query point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyItem {
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
    pub distance_m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osm_type: Option<OsmType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,
}

impl NearbyItem {
    pub fn from_record(record: GeocodeRecord, distance_m: f64) -> Self {
        Self {
            display_name: record.display_name,
            lat: record.lat,
            lon: record.lon,
            distance_m,
            category: record.category,
            place_type: record.place_type,
            osm_type: record.osm_type,
            importance: record.importance,
        }
    }

    /// Match against either the OSM category ("tourism") or type ("museum").
    pub fn matches_any(&self, categories: &[String]) -> bool {
        categories.iter().any(|c| {
            self.category.as_deref() == Some(c.as_str())
                || self.place_type.as_deref() == Some(c.as_str())
        })
    }
}

/// Outcome of one query in a batch, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Resolved {
        query: String,
        results: Vec<GeocodeRecord>,
    },
    Failed {
        query: String,
        error: ErrorDescriptor,
    },
}

impl BatchOutcome {
    pub fn query(&self) -> &str {
        match self {
            BatchOutcome::Resolved { query, .. } | BatchOutcome::Failed { query, .. } => query,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Resolved { .. })
    }
}

/// A waypoint resolved to a single place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteWaypoint {
    pub query: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub bbox: Bbox,
}

impl RouteWaypoint {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Outcome of one waypoint, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WaypointOutcome {
    Resolved(RouteWaypoint),
    Failed { query: String, error: ErrorDescriptor },
}

impl WaypointOutcome {
    pub fn waypoint(&self) -> Option<&RouteWaypoint> {
        match self {
            WaypointOutcome::Resolved(wp) => Some(wp),
            WaypointOutcome::Failed { .. } => None,
        }
    }
}

/// Leg between two consecutive resolved waypoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteLeg {
    /// Input positions of the two waypoints
    pub from_index: usize,
    pub to_index: usize,
    pub from_name: String,
    pub to_name: String,
    pub distance_m: f64,
    /// Distance from the first resolved waypoint to the end of this leg
    pub cumulative_m: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResult {
    pub waypoints: Vec<WaypointOutcome>,
    pub legs: Vec<RouteLeg>,
    pub total_distance_m: f64,
    /// Union of all resolved waypoint boxes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Bbox>,
}

/// Labelled coordinate for distance calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPoint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl NamedPoint {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Pairwise haversine distances, metres.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceMatrix {
    pub points: Vec<NamedPoint>,
    pub distances: Vec<Vec<f64>>,
}

/// Snapshot of a geocoder's shared state.
#[derive(Debug, Clone, Serialize)]
pub struct GeocoderStatus {
    pub base_url: String,
    pub cache: CacheStats,
    /// Time since the last upstream dispatch; `None` before the first one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_last_dispatch_secs: Option<f64>,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}
