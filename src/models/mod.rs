//! Core data models for the geocoding system.

pub mod admin;
pub mod place;
pub mod raw;
pub mod results;

pub use admin::{AdminEntry, AdminHierarchy, AdminLevel};
pub use place::{Bbox, GeoPoint, GeocodeRecord, OsmId, OsmType};
pub use raw::{RawPlace, ReverseBody};
pub use results::{
    BatchOutcome, BboxResult, DistanceMatrix, GeocoderStatus, NamedPoint, NearbyItem,
    RouteLeg, RouteResult, RouteWaypoint, WaypointOutcome,
};
