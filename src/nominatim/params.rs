//! Request parameters passed through to the upstream.

use serde::{Deserialize, Serialize};

use crate::models::Bbox;

/// Reverse-geocode detail level, 0 (coarsest) to 18 (building).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoomLevel(pub u8);

impl ZoomLevel {
    pub const COUNTRY: ZoomLevel = ZoomLevel(3);
    pub const STATE: ZoomLevel = ZoomLevel(5);
    pub const COUNTY: ZoomLevel = ZoomLevel(8);
    pub const CITY: ZoomLevel = ZoomLevel(10);
    pub const SUBURB: ZoomLevel = ZoomLevel(14);
    pub const STREET: ZoomLevel = ZoomLevel(16);
    pub const BUILDING: ZoomLevel = ZoomLevel(18);

    pub const MAX: u8 = 18;

    pub fn is_valid(&self) -> bool {
        self.0 <= Self::MAX
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        ZoomLevel::BUILDING
    }
}

/// Optional filters for a `search` request.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub limit: u32,
    /// ISO 3166-1 alpha-2 codes
    pub country_codes: Vec<String>,
    pub language: Option<String>,
    pub viewbox: Option<Bbox>,
    /// Restrict results to the viewbox instead of only biasing towards it
    pub bounded: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            limit: 1,
            country_codes: Vec::new(),
            language: None,
            viewbox: None,
            bounded: false,
        }
    }
}

impl SearchParams {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    pub(crate) fn to_query(&self, query: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", query.to_string()), ("limit", self.limit.to_string())];
        if !self.country_codes.is_empty() {
            params.push(("countrycodes", self.country_codes.join(",")));
        }
        if let Some(lang) = &self.language {
            params.push(("accept-language", lang.clone()));
        }
        if let Some(vb) = &self.viewbox {
            params.push((
                "viewbox",
                format!("{},{},{},{}", vb.west, vb.south, vb.east, vb.north),
            ));
            if self.bounded {
                params.push(("bounded", "1".to_string()));
            }
        }
        params
    }
}

/// Options for a `reverse` request.
#[derive(Debug, Clone, Default)]
pub struct ReverseParams {
    pub zoom: ZoomLevel,
    pub language: Option<String>,
}

impl ReverseParams {
    pub fn at(zoom: ZoomLevel) -> Self {
        Self {
            zoom,
            language: None,
        }
    }

    pub(crate) fn to_query(&self, lat: f64, lon: f64) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("zoom", self.zoom.0.to_string()),
        ];
        if let Some(lang) = &self.language {
            params.push(("accept-language", lang.clone()));
        }
        params
    }
}
