//! Upstream response shapes and their conversion into [`GeocodeRecord`].
//!
//! Nominatim's `jsonv2` output mixes strings and numbers for numeric fields
//! (`lat`, `lon` and the bounding box come back as strings). Everything is
//! accepted leniently here and validated once in [`GeocodeRecord::try_from`].

use serde::Deserialize;
use std::collections::HashMap;

use super::place::{Bbox, GeocodeRecord, OsmType};
use crate::error::GeocodeError;
use crate::geometry::buffer_for_rank;

/// Number that may arrive as a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// One place as returned by `search`, `reverse` or `lookup`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlace {
    pub lat: Numeric,
    pub lon: Numeric,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub osm_type: Option<String>,

    #[serde(default)]
    pub osm_id: Option<Numeric>,

    #[serde(default)]
    pub importance: Option<Numeric>,

    #[serde(default)]
    pub place_rank: Option<Numeric>,

    #[serde(default, alias = "class")]
    pub category: Option<String>,

    #[serde(default, rename = "type")]
    pub place_type: Option<String>,

    /// `[min_lat, max_lat, min_lon, max_lon]`
    #[serde(default)]
    pub boundingbox: Option<Vec<Numeric>>,

    #[serde(default)]
    pub address: Option<HashMap<String, serde_json::Value>>,
}

/// Body of a `reverse` response: either a place or the provider's miss marker.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReverseBody {
    Miss { error: String },
    Place(Box<RawPlace>),
}

impl TryFrom<RawPlace> for GeocodeRecord {
    type Error = GeocodeError;

    fn try_from(raw: RawPlace) -> Result<Self, Self::Error> {
        let lat = raw
            .lat
            .as_f64()
            .filter(|v| (-90.0..=90.0).contains(v))
            .ok_or_else(|| GeocodeError::Upstream(format!("invalid latitude {:?}", raw.lat)))?;
        let lon = raw
            .lon
            .as_f64()
            .filter(|v| (-180.0..=180.0).contains(v))
            .ok_or_else(|| GeocodeError::Upstream(format!("invalid longitude {:?}", raw.lon)))?;

        let place_rank = raw
            .place_rank
            .as_ref()
            .and_then(Numeric::as_f64)
            .filter(|r| (0.0..=30.0).contains(r))
            .map(|r| r as u8);

        // Missing or degenerate boxes fall back to a buffer sized by rank.
        let bbox = raw
            .boundingbox
            .as_deref()
            .and_then(parse_nominatim_bbox)
            .unwrap_or_else(|| Bbox::around(lat, lon, buffer_for_rank(place_rank)));

        let address = raw
            .address
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(k, v)| match v {
                serde_json::Value::String(s) => Some((k, s)),
                serde_json::Value::Number(n) => Some((k, n.to_string())),
                _ => None,
            })
            .collect();

        Ok(Self {
            lat,
            lon,
            display_name: raw.display_name.unwrap_or_default(),
            bbox,
            osm_type: raw.osm_type.as_deref().and_then(OsmType::from_name),
            osm_id: raw
                .osm_id
                .as_ref()
                .and_then(Numeric::as_f64)
                .filter(|id| *id >= 0.0)
                .map(|id| id as u64),
            importance: raw.importance.as_ref().and_then(Numeric::as_f64),
            place_rank,
            category: raw.category,
            place_type: raw.place_type,
            address,
        })
    }
}

fn parse_nominatim_bbox(values: &[Numeric]) -> Option<Bbox> {
    let parsed: Vec<f64> = values.iter().map(Numeric::as_f64).collect::<Option<_>>()?;
    let native: [f64; 4] = parsed.try_into().ok()?;
    Bbox::from_nominatim(native)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawPlace {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_jsonv2_record_parses() {
        let record = GeocodeRecord::try_from(raw(json!({
            "place_id": 123,
            "osm_type": "relation",
            "osm_id": 2796416,
            "lat": "51.7916",
            "lon": "0.9446",
            "category": "place",
            "type": "island",
            "place_rank": 17,
            "importance": 0.42,
            "display_name": "Mersea Island, Essex, England, United Kingdom",
            "address": {"county": "Essex", "country": "United Kingdom", "postcode": "CO5"},
            "boundingbox": ["51.7640", "51.8199", "0.8517", "1.0356"]
        })))
        .unwrap();

        assert_eq!(record.osm_type, Some(OsmType::Relation));
        assert_eq!(record.osm_id, Some(2796416));
        assert_eq!(record.place_rank, Some(17));
        assert_eq!(record.category.as_deref(), Some("place"));
        assert_eq!(record.place_type.as_deref(), Some("island"));
        assert_eq!(record.bbox, Bbox::from([0.8517, 51.7640, 1.0356, 51.8199]));
        assert_eq!(record.address.get("county").map(String::as_str), Some("Essex"));
    }

    #[test]
    fn test_missing_bbox_uses_rank_buffer() {
        let record = GeocodeRecord::try_from(raw(json!({
            "lat": "10.0",
            "lon": "20.0",
            "place_rank": 4,
            "display_name": "Somewhere"
        })))
        .unwrap();

        assert_eq!(record.bbox, Bbox::from([10.0, 0.0, 30.0, 20.0]));
    }

    #[test]
    fn test_antimeridian_bbox_uses_rank_buffer() {
        let record = GeocodeRecord::try_from(raw(json!({
            "lat": "-17.0",
            "lon": "179.0",
            "place_rank": 4,
            "boundingbox": ["-21.0", "-12.0", "177.0", "-178.0"]
        })))
        .unwrap();

        assert_eq!(record.bbox.west, 169.0);
        assert_eq!(record.bbox.east, 180.0);
    }

    #[test]
    fn test_degenerate_bbox_replaced() {
        let record = GeocodeRecord::try_from(raw(json!({
            "lat": "51.5",
            "lon": "-0.1",
            "place_rank": 30,
            "boundingbox": ["51.5", "51.5", "-0.1", "-0.1"]
        })))
        .unwrap();

        assert!(record.bbox.west < record.bbox.east);
        assert!(record.bbox.south < record.bbox.north);
    }

    #[test]
    fn test_legacy_class_alias() {
        let record = GeocodeRecord::try_from(raw(json!({
            "lat": 1.0,
            "lon": 2.0,
            "class": "amenity",
            "type": "cafe"
        })))
        .unwrap();
        assert_eq!(record.category.as_deref(), Some("amenity"));
    }

    #[test]
    fn test_bad_latitude_is_upstream_error() {
        let err = GeocodeRecord::try_from(raw(json!({"lat": "north", "lon": "0"}))).unwrap_err();
        assert!(matches!(err, GeocodeError::Upstream(_)));
    }

    #[test]
    fn test_reverse_miss_body() {
        let body: ReverseBody =
            serde_json::from_value(json!({"error": "Unable to geocode"})).unwrap();
        assert!(matches!(body, ReverseBody::Miss { .. }));

        let body: ReverseBody = serde_json::from_value(json!({"lat": "1", "lon": "2"})).unwrap();
        assert!(matches!(body, ReverseBody::Place(_)));
    }
}
