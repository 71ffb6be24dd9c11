//! Normalized place records returned by the orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::GeocodeError;

/// Type of OSM object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsmType {
    Node,
    Way,
    Relation,
}

impl OsmType {
    /// Single-letter prefix used by the lookup endpoint (`N`, `W`, `R`).
    pub fn prefix(&self) -> char {
        match self {
            OsmType::Node => 'N',
            OsmType::Way => 'W',
            OsmType::Relation => 'R',
        }
    }

    fn from_prefix(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'N' => Some(OsmType::Node),
            'W' => Some(OsmType::Way),
            'R' => Some(OsmType::Relation),
            _ => None,
        }
    }

    /// Parse the provider's spelled-out type ("node", "way", "relation").
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "node" => Some(OsmType::Node),
            "way" => Some(OsmType::Way),
            "relation" => Some(OsmType::Relation),
            _ => None,
        }
    }
}

impl std::fmt::Display for OsmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OsmType::Node => write!(f, "node"),
            OsmType::Way => write!(f, "way"),
            OsmType::Relation => write!(f, "relation"),
        }
    }
}

/// Provider-native entity identifier, e.g. `R146656`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OsmId {
    pub osm_type: OsmType,
    pub id: u64,
}

impl std::fmt::Display for OsmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.osm_type.prefix(), self.id)
    }
}

impl FromStr for OsmId {
    type Err = GeocodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || {
            GeocodeError::validation(format!(
                "Invalid OSM id '{}': expected N, W or R followed by digits",
                s
            ))
        };
        let mut chars = s.chars();
        let osm_type = chars.next().and_then(OsmType::from_prefix).ok_or_else(invalid)?;
        let id = chars.as_str().parse::<u64>().map_err(|_| invalid())?;
        Ok(Self { osm_type, id })
    }
}

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Bounding box in canonical `[west, south, east, north]` order.
///
/// Serializes as a four-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Bbox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl From<[f64; 4]> for Bbox {
    fn from([west, south, east, north]: [f64; 4]) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }
}

impl From<Bbox> for [f64; 4] {
    fn from(b: Bbox) -> Self {
        [b.west, b.south, b.east, b.north]
    }
}

/// Normalized forward or reverse geocode result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeRecord {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
    pub bbox: Bbox,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub osm_type: Option<OsmType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub osm_id: Option<u64>,

    /// Relevance score (0.0 to 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,

    /// Specificity rank (0 = continent .. 30 = building)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_rank: Option<u8>,

    /// Main OSM tag key, e.g. "amenity" or "place"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Main OSM tag value, e.g. "cafe" or "city"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_type: Option<String>,

    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub address: HashMap<String, String>,
}

impl GeocodeRecord {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    pub fn osm_ref(&self) -> Option<OsmId> {
        Some(OsmId {
            osm_type: self.osm_type?,
            id: self.osm_id?,
        })
    }
}
