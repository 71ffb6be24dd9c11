//! Bounding-box and distance helpers.

use geo::{Intersects, Point, Rect};

use crate::models::{Bbox, GeoPoint};

/// Mean Earth radius used for all distances, in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Kilometres per degree of latitude (and of longitude at the equator).
const KM_PER_DEGREE: f64 = 111.32;

/// Synthetic bbox buffers (degrees) by place rank range. Heuristic values,
/// coarse results get the larger buffers.
const PLACE_RANK_BUFFERS: &[((u8, u8), f64)] = &[
    ((0, 4), 10.0),    // country
    ((5, 8), 2.0),     // state
    ((9, 12), 0.5),    // county
    ((13, 16), 0.1),   // city
    ((17, 20), 0.01),  // suburb
    ((21, 26), 0.005), // street
    ((27, 30), 0.001), // building/address
];

/// Buffer for records with no usable rank.
pub const DEFAULT_BBOX_BUFFER: f64 = 0.01;

/// Buffer in degrees to put around a point of the given rank.
pub fn buffer_for_rank(place_rank: Option<u8>) -> f64 {
    place_rank
        .and_then(|rank| {
            PLACE_RANK_BUFFERS
                .iter()
                .find(|((low, high), _)| (*low..=*high).contains(&rank))
                .map(|(_, buffer)| *buffer)
        })
        .unwrap_or(DEFAULT_BBOX_BUFFER)
}

/// Great-circle distance in metres.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lon - a.lon).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h past 1 for antipodal points.
    let h = h.min(1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

impl Bbox {
    /// Convert Nominatim's `[min_lat, max_lat, min_lon, max_lon]`.
    ///
    /// Returns `None` for non-finite or zero-extent boxes, and for boxes that
    /// cross the antimeridian (`min_lon` east of `max_lon` by more than half
    /// the globe), which a `[w,s,e,n]` box cannot represent.
    pub fn from_nominatim([lat_a, lat_b, lon_a, lon_b]: [f64; 4]) -> Option<Self> {
        if lon_a - lon_b > 180.0 {
            return None;
        }
        Bbox {
            west: lon_a,
            south: lat_a,
            east: lon_b,
            north: lat_b,
        }
        .normalized()
        .filter(Bbox::is_valid)
    }

    /// Reorder the edges so that `west <= east` and `south <= north`.
    ///
    /// Idempotent. `None` when any edge is not finite.
    pub fn normalized(self) -> Option<Self> {
        let edges = [self.west, self.south, self.east, self.north];
        if edges.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(Bbox {
            west: self.west.min(self.east),
            south: self.south.min(self.north),
            east: self.west.max(self.east),
            north: self.south.max(self.north),
        })
    }

    /// True when the box has positive width and height.
    pub fn is_valid(&self) -> bool {
        self.west < self.east && self.south < self.north
    }

    /// Square box centered on a point, clamped to valid coordinates.
    pub fn around(lat: f64, lon: f64, buffer: f64) -> Self {
        Bbox {
            west: (lon - buffer).max(-180.0),
            south: (lat - buffer).max(-90.0),
            east: (lon + buffer).min(180.0),
            north: (lat + buffer).min(90.0),
        }
    }

    /// Expand each edge outward by `fraction` of the box's span on that axis.
    pub fn padded(&self, fraction: f64) -> Self {
        let width = self.east - self.west;
        let height = self.north - self.south;
        Bbox {
            west: self.west - width * fraction,
            south: self.south - height * fraction,
            east: self.east + width * fraction,
            north: self.north + height * fraction,
        }
    }

    /// Approximate area in km², shrinking longitude by cos(mid latitude).
    pub fn area_km2(&self) -> f64 {
        let mid_lat = (self.south + self.north) / 2.0;
        let width_km = (self.east - self.west) * KM_PER_DEGREE * mid_lat.to_radians().cos();
        let height_km = (self.north - self.south) * KM_PER_DEGREE;
        (width_km * height_km).abs()
    }

    /// Smallest box covering every input box.
    pub fn union<'a>(boxes: impl IntoIterator<Item = &'a Bbox>) -> Option<Bbox> {
        boxes.into_iter().fold(None, |acc: Option<Bbox>, b| {
            Some(match acc {
                None => *b,
                Some(a) => Bbox {
                    west: a.west.min(b.west),
                    south: a.south.min(b.south),
                    east: a.east.max(b.east),
                    north: a.north.max(b.north),
                },
            })
        })
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            geo::coord! { x: self.west, y: self.south },
            geo::coord! { x: self.east, y: self.north },
        )
    }

    /// True when the point lies inside or on the edge of the box.
    pub fn contains_point(&self, point: GeoPoint) -> bool {
        self.to_rect().intersects(&Point::new(point.lon, point.lat))
    }

    /// True when `other` lies inside this box with every edge strictly inset.
    pub fn strictly_contains(&self, other: &Bbox) -> bool {
        self.west < other.west
            && self.south < other.south
            && self.east > other.east
            && self.north > other.north
    }
}
