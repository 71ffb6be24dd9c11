//! JSON argument shapes accepted by the registry tools.

use serde::Deserialize;

use crate::error::GeocodeError;
use crate::geocoder::{GeocodeOptions, NearbyOptions};
use crate::models::{NamedPoint, OsmId};
use crate::nominatim::{ReverseParams, ZoomLevel};

/// A list given either as a JSON array or a comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    List(Vec<String>),
    Joined(String),
}

impl StringList {
    pub fn into_vec(self) -> Vec<String> {
        let items = match self {
            StringList::List(items) => items,
            StringList::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn list(value: Option<StringList>) -> Vec<String> {
    value.map(StringList::into_vec).unwrap_or_default()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeocodeArgs {
    pub query: String,
    pub limit: Option<u32>,
    pub countrycodes: Option<StringList>,
    pub language: Option<String>,
}

impl GeocodeArgs {
    pub fn options(&mut self) -> GeocodeOptions {
        GeocodeOptions {
            limit: self.limit,
            country_codes: list(self.countrycodes.take()),
            language: self.language.take(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReverseArgs {
    pub lat: f64,
    pub lon: f64,
    pub zoom: Option<u8>,
    pub language: Option<String>,
}

impl ReverseArgs {
    pub fn params(&self) -> ReverseParams {
        ReverseParams {
            zoom: self.zoom.map(ZoomLevel).unwrap_or_default(),
            language: self.language.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BboxArgs {
    pub query: String,
    pub padding: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NearbyArgs {
    pub lat: f64,
    pub lon: f64,
    pub limit: Option<u32>,
    pub categories: Option<StringList>,
}

impl NearbyArgs {
    pub fn options(&mut self) -> NearbyOptions {
        NearbyOptions {
            limit: self.limit,
            categories: list(self.categories.take()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointArgs {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchArgs {
    pub queries: Vec<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteArgs {
    pub waypoints: Vec<String>,
}

/// `[lat, lon]` or `{"name": ..., "lat": ..., "lon": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PointArg {
    Pair([f64; 2]),
    Named {
        name: Option<String>,
        lat: f64,
        lon: f64,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatrixArgs {
    pub points: Vec<PointArg>,
}

impl MatrixArgs {
    /// Unnamed points become "Point 1", "Point 2", ...
    pub fn named_points(self) -> Vec<NamedPoint> {
        self.points
            .into_iter()
            .enumerate()
            .map(|(i, point)| {
                let fallback = || format!("Point {}", i + 1);
                match point {
                    PointArg::Pair([lat, lon]) => NamedPoint {
                        name: fallback(),
                        lat,
                        lon,
                    },
                    PointArg::Named { name, lat, lon } => NamedPoint {
                        name: name.filter(|n| !n.trim().is_empty()).unwrap_or_else(fallback),
                        lat,
                        lon,
                    },
                }
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LookupArgs {
    pub osm_ids: StringList,
}

impl LookupArgs {
    pub fn ids(self) -> Result<Vec<OsmId>, GeocodeError> {
        self.osm_ids.into_vec().iter().map(|id| id.parse()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_list_accepts_both_forms() {
        let joined: StringList = serde_json::from_value(json!("gb, fr,,de")).unwrap();
        assert_eq!(joined.into_vec(), vec!["gb", "fr", "de"]);

        let listed: StringList = serde_json::from_value(json!(["gb", "fr"])).unwrap();
        assert_eq!(listed.into_vec(), vec!["gb", "fr"]);
    }

    #[test]
    fn test_matrix_points_mixed() {
        let args: MatrixArgs = serde_json::from_value(json!({
            "points": [
                [51.5, -0.12],
                {"name": "Paris", "lat": 48.85, "lon": 2.35},
                {"lat": 52.52, "lon": 13.4}
            ]
        }))
        .unwrap();

        let points = args.named_points();
        let names: Vec<&str> = points.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Point 1", "Paris", "Point 3"]);
        assert_eq!(points[0].lat, 51.5);
        assert_eq!(points[0].lon, -0.12);
    }

    #[test]
    fn test_lookup_ids_validated() {
        let args: LookupArgs = serde_json::from_value(json!({"osm_ids": "R146656,W1"})).unwrap();
        assert_eq!(args.ids().unwrap().len(), 2);

        let args: LookupArgs = serde_json::from_value(json!({"osm_ids": ["Q42"]})).unwrap();
        assert!(args.ids().is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<GeocodeArgs, _> =
            serde_json::from_value(json!({"query": "Paris", "limt": 3}));
        assert!(result.is_err());
    }
}
