//! Input checks run before any upstream call.

use crate::error::{GeocodeError, Result};
use crate::nominatim::ZoomLevel;

pub fn query(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GeocodeError::validation("Query string cannot be empty"));
    }
    Ok(trimmed)
}

pub fn coordinates(lat: f64, lon: f64) -> Result<()> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(GeocodeError::validation(format!(
            "Invalid latitude {}: must be between -90 and 90",
            lat
        )));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(GeocodeError::validation(format!(
            "Invalid longitude {}: must be between -180 and 180",
            lon
        )));
    }
    Ok(())
}

/// Resolve an optional limit against its default and the configured cap.
pub fn limit(requested: Option<u32>, default: u32, max: u32) -> Result<u32> {
    let value = requested.unwrap_or_else(|| default.min(max));
    if value == 0 || value > max {
        return Err(GeocodeError::validation(format!(
            "limit must be between 1 and {}, got {}",
            max, value
        )));
    }
    Ok(value)
}

pub fn zoom(zoom: ZoomLevel) -> Result<ZoomLevel> {
    if !zoom.is_valid() {
        return Err(GeocodeError::validation(format!(
            "zoom must be between 0 and {}, got {}",
            ZoomLevel::MAX,
            zoom.0
        )));
    }
    Ok(zoom)
}

/// ISO 3166-1 alpha-2 codes, returned lower-cased.
pub fn country_codes(codes: &[String]) -> Result<Vec<String>> {
    codes
        .iter()
        .map(|code| {
            let code = code.trim();
            if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
                Ok(code.to_ascii_lowercase())
            } else {
                Err(GeocodeError::validation(format!(
                    "Invalid country code '{}': expected two letters",
                    code
                )))
            }
        })
        .collect()
}

pub fn language(language: Option<&str>) -> Option<String> {
    language
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

pub fn padding(padding: f64) -> Result<f64> {
    if !padding.is_finite() || padding < 0.0 {
        return Err(GeocodeError::validation(format!(
            "padding must be a non-negative number, got {}",
            padding
        )));
    }
    Ok(padding)
}

/// Size check for list inputs (batch queries, waypoints, points, ids).
pub fn list_len(len: usize, min: usize, max: usize, what: &str) -> Result<()> {
    if len == 0 {
        return Err(GeocodeError::validation(format!("{} list cannot be empty", what)));
    }
    if len < min {
        return Err(GeocodeError::validation(format!(
            "At least {} {} required, got {}",
            min, what, len
        )));
    }
    if len > max {
        return Err(GeocodeError::validation(format!(
            "{} count {} exceeds maximum of {}",
            what, len, max
        )));
    }
    Ok(())
}
