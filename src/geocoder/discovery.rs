//! Nearby discovery and administrative hierarchy.

use hashbrown::HashSet;
use tracing::debug;

use super::{into_records, validate, Geocoder, NearbyOptions, DEFAULT_NEARBY_LIMIT};
use crate::error::{GeocodeError, Result};
use crate::geometry::haversine_m;
use crate::models::{AdminHierarchy, Bbox, GeoPoint, GeocodeRecord, NearbyItem};
use crate::nominatim::{ReverseParams, SearchParams, ZoomLevel};

/// Reverse detail levels queried by nearby discovery, finest first.
pub const NEARBY_ZOOMS: [ZoomLevel; 4] = [
    ZoomLevel::BUILDING,
    ZoomLevel::STREET,
    ZoomLevel::SUBURB,
    ZoomLevel::CITY,
];

/// Half-width in degrees of the bounded search window (about 1.1 km).
const NEARBY_WINDOW_DEG: f64 = 0.01;

const NEARBY_SEARCH_LIMIT: u32 = 5;

impl Geocoder {
    /// Places around a point, nearest first.
    ///
    /// Merges reverse lookups at several zooms with a bounded search around
    /// the point. Results are unique by display name; the category filter
    /// runs before truncation.
    pub async fn nearby_places(
        &self,
        lat: f64,
        lon: f64,
        options: &NearbyOptions,
    ) -> Result<Vec<NearbyItem>> {
        validate::coordinates(lat, lon)?;
        let limit = validate::limit(options.limit, DEFAULT_NEARBY_LIMIT, self.max_limit)? as usize;

        let mut candidates: Vec<GeocodeRecord> = Vec::new();
        let mut succeeded = 0usize;
        let mut last_error: Option<GeocodeError> = None;

        for zoom in NEARBY_ZOOMS {
            let step = self
                .client
                .reverse(lat, lon, &ReverseParams::at(zoom))
                .await
                .and_then(GeocodeRecord::try_from);
            match step {
                Ok(record) => {
                    succeeded += 1;
                    candidates.push(record);
                }
                Err(e) => {
                    debug!("Reverse at zoom {} failed: {}", zoom.0, e);
                    last_error = Some(e);
                }
            }
        }

        let window = SearchParams {
            limit: NEARBY_SEARCH_LIMIT,
            viewbox: Some(Bbox::around(lat, lon, NEARBY_WINDOW_DEG)),
            bounded: true,
            ..Default::default()
        };
        let query = format!("{},{}", lat, lon);
        match self
            .client
            .search(&query, &window)
            .await
            .and_then(into_records)
        {
            Ok(records) => {
                succeeded += 1;
                candidates.extend(records);
            }
            Err(e) => {
                debug!("Bounded nearby search failed: {}", e);
                last_error = Some(e);
            }
        }

        if succeeded == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let origin = GeoPoint::new(lat, lon);
        let mut seen = HashSet::new();
        let mut items: Vec<NearbyItem> = candidates
            .into_iter()
            .filter(|r| !r.display_name.is_empty() && seen.insert(r.display_name.clone()))
            .map(|r| {
                let distance = haversine_m(origin, r.point());
                NearbyItem::from_record(r, distance)
            })
            .filter(|item| options.categories.is_empty() || item.matches_any(&options.categories))
            .collect();

        items.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        items.truncate(limit);

        debug!("Found {} place(s) near ({}, {})", items.len(), lat, lon);
        Ok(items)
    }

    /// Administrative levels containing a point, coarsest first.
    pub async fn admin_boundaries(&self, lat: f64, lon: f64) -> Result<AdminHierarchy> {
        validate::coordinates(lat, lon)?;
        let raw = self
            .client
            .reverse(lat, lon, &ReverseParams::at(ZoomLevel::BUILDING))
            .await?;
        let record = GeocodeRecord::try_from(raw)?;
        Ok(AdminHierarchy::from_address(&record.display_name, &record.address))
    }
}
