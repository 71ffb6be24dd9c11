//! Multi-query operations.
//!
//! Items run strictly one after another, in input order. A failing item is
//! recorded in place and never aborts the rest.

use tracing::{debug, info};

use super::{validate, GeocodeOptions, Geocoder};
use crate::error::{GeocodeError, Result};
use crate::geometry::haversine_m;
use crate::models::{
    BatchOutcome, Bbox, DistanceMatrix, NamedPoint, RouteLeg, RouteResult, RouteWaypoint,
    WaypointOutcome,
};

impl Geocoder {
    /// Forward geocode each query in order.
    pub async fn batch_geocode(
        &self,
        queries: &[String],
        options: &GeocodeOptions,
    ) -> Result<Vec<BatchOutcome>> {
        validate::list_len(queries.len(), 1, self.batch_max, "Query")?;
        validate::limit(options.limit, 1, self.max_limit)?;

        let mut outcomes = Vec::with_capacity(queries.len());
        for query in queries {
            let outcome = match self.geocode(query, options).await {
                Ok(results) => BatchOutcome::Resolved {
                    query: query.clone(),
                    results,
                },
                Err(e) => {
                    debug!("Batch item '{}' failed: {}", query, e);
                    BatchOutcome::Failed {
                        query: query.clone(),
                        error: e.descriptor(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        info!(
            "Batch geocoded {}/{} queries successfully",
            outcomes.iter().filter(|o| o.is_success()).count(),
            outcomes.len()
        );
        Ok(outcomes)
    }

    /// Resolve waypoints in order and measure the legs between them.
    ///
    /// Legs join consecutive *resolved* waypoints; an unresolved waypoint is
    /// skipped over rather than breaking the route.
    pub async fn route_waypoints(&self, waypoints: &[String]) -> Result<RouteResult> {
        validate::list_len(waypoints.len(), 2, self.batch_max, "waypoints")?;

        let single = GeocodeOptions {
            limit: Some(1),
            ..Default::default()
        };

        let mut outcomes = Vec::with_capacity(waypoints.len());
        for query in waypoints {
            let resolved = self.geocode(query, &single).await.and_then(|records| {
                records.into_iter().next().ok_or_else(|| {
                    GeocodeError::NotFound(format!("No results found for query '{}'", query.trim()))
                })
            });
            outcomes.push(match resolved {
                Ok(record) => WaypointOutcome::Resolved(RouteWaypoint {
                    query: query.clone(),
                    lat: record.lat,
                    lon: record.lon,
                    bbox: record.bbox,
                    name: record.display_name,
                }),
                Err(e) => {
                    debug!("Waypoint '{}' failed: {}", query, e);
                    WaypointOutcome::Failed {
                        query: query.clone(),
                        error: e.descriptor(),
                    }
                }
            });
        }

        let resolved: Vec<(usize, &RouteWaypoint)> = outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.waypoint().map(|wp| (i, wp)))
            .collect();

        let mut legs = Vec::with_capacity(resolved.len().saturating_sub(1));
        let mut total = 0.0;
        for pair in resolved.windows(2) {
            let (from_index, from) = pair[0];
            let (to_index, to) = pair[1];
            let distance_m = haversine_m(from.point(), to.point());
            total += distance_m;
            legs.push(RouteLeg {
                from_index,
                to_index,
                from_name: from.name.clone(),
                to_name: to.name.clone(),
                distance_m,
                cumulative_m: total,
            });
        }

        let bbox = Bbox::union(resolved.iter().map(|(_, wp)| &wp.bbox));

        info!(
            "Route with {} waypoints, {:.1} km total",
            resolved.len(),
            total / 1000.0
        );
        Ok(RouteResult {
            waypoints: outcomes,
            legs,
            total_distance_m: total,
            bbox,
        })
    }

    /// Pairwise great-circle distances. Pure computation, no network.
    pub fn distance_matrix(&self, points: &[NamedPoint]) -> Result<DistanceMatrix> {
        validate::list_len(points.len(), 2, self.batch_max, "points")?;
        for p in points {
            validate::coordinates(p.lat, p.lon)?;
        }

        let n = points.len();
        let mut distances = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = haversine_m(points[i].point(), points[j].point());
                distances[i][j] = d;
                distances[j][i] = d;
            }
        }

        Ok(DistanceMatrix {
            points: points.to_vec(),
            distances,
        })
    }
}
