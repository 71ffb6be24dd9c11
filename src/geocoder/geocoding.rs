use tracing::debug;

use super::{into_records, validate, GeocodeOptions, Geocoder, DEFAULT_GEOCODE_LIMIT};
use crate::error::{GeocodeError, Result};
use crate::models::{BboxResult, GeocodeRecord, OsmId};
use crate::nominatim::{ReverseParams, SearchParams};

impl Geocoder {
    /// Forward geocode. No match is an empty list, not an error.
    pub async fn geocode(
        &self,
        query: &str,
        options: &GeocodeOptions,
    ) -> Result<Vec<GeocodeRecord>> {
        let query = validate::query(query)?;
        let params = SearchParams {
            limit: validate::limit(options.limit, DEFAULT_GEOCODE_LIMIT, self.max_limit)?,
            country_codes: validate::country_codes(&options.country_codes)?,
            language: validate::language(options.language.as_deref()),
            ..Default::default()
        };

        let records = into_records(self.client.search(query, &params).await?)?;
        debug!("Found {} result(s) for '{}'", records.len(), query);
        Ok(records)
    }

    /// Reverse geocode at the requested detail level.
    pub async fn reverse_geocode(
        &self,
        lat: f64,
        lon: f64,
        params: &ReverseParams,
    ) -> Result<GeocodeRecord> {
        validate::coordinates(lat, lon)?;
        let params = ReverseParams {
            zoom: validate::zoom(params.zoom)?,
            language: validate::language(params.language.as_deref()),
        };

        GeocodeRecord::try_from(self.client.reverse(lat, lon, &params).await?)
    }

    /// Bounding box of the best match for `query`, optionally padded on
    /// each edge by a fraction of its span.
    pub async fn bbox_from_place(&self, query: &str, padding: Option<f64>) -> Result<BboxResult> {
        let query = validate::query(query)?;
        let padding = padding.map(validate::padding).transpose()?.unwrap_or(0.0);

        let record = into_records(
            self.client
                .search(query, &SearchParams::with_limit(1))
                .await?,
        )?
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::NotFound(format!("No results found for query '{}'", query)))?;

        let bbox = if padding > 0.0 {
            record.bbox.padded(padding)
        } else {
            record.bbox
        };

        Ok(BboxResult {
            area_km2: bbox.area_km2(),
            center: [record.lon, record.lat],
            place_name: record.display_name,
            bbox,
        })
    }

    /// Fetch places by provider id.
    pub async fn lookup(&self, ids: &[OsmId]) -> Result<Vec<GeocodeRecord>> {
        validate::list_len(ids.len(), 1, self.batch_max, "OSM id")?;
        into_records(self.client.lookup(ids).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoder::tests::geocoder;
    use crate::models::Bbox;
    use crate::nominatim::client::tests::place;
    use crate::nominatim::transport::tests::{json, MockTransport};
    use crate::nominatim::ZoomLevel;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_geocode_parses_records() {
        let mock = Arc::new(MockTransport::always(json!([
            place("Paris, France", 48.8566, 2.3522),
            place("Paris, Texas", 33.66, -95.55)
        ])));
        let geocoder = geocoder(&mock);

        let options = GeocodeOptions {
            limit: Some(2),
            country_codes: vec!["FR".to_string(), "US".to_string()],
            language: Some("en".to_string()),
        };
        let records = geocoder.geocode("Paris", &options).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].display_name, "Paris, France");
        assert!(records[0].bbox.contains_point(records[0].point()));

        let pairs: Vec<(String, String)> = mock.urls()[0].query_pairs().into_owned().collect();
        assert!(pairs.contains(&("countrycodes".to_string(), "fr,us".to_string())));
        assert!(pairs.contains(&("accept-language".to_string(), "en".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_geocode_no_match_is_empty() {
        let mock = Arc::new(MockTransport::always(json!([])));
        let records = geocoder(&mock)
            .geocode("Nowhere at all", &GeocodeOptions::default())
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_never_reaches_network() {
        let mock = Arc::new(MockTransport::always(json!([])));
        let geocoder = geocoder(&mock);

        let err = geocoder.geocode("   ", &GeocodeOptions::default()).await.unwrap_err();
        assert!(matches!(err, GeocodeError::Validation(_)));

        let options = GeocodeOptions {
            limit: Some(11),
            ..Default::default()
        };
        assert!(geocoder.geocode("Paris", &options).await.is_err());

        let err = geocoder
            .reverse_geocode(95.0, 0.0, &ReverseParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GeocodeError::Validation(_)));

        assert!(geocoder
            .reverse_geocode(0.0, 0.0, &ReverseParams::at(ZoomLevel(19)))
            .await
            .is_err());
        assert!(geocoder.bbox_from_place("Paris", Some(-0.5)).await.is_err());
        assert!(geocoder.lookup(&[]).await.is_err());

        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverse_geocode_record() {
        let mut body = place("10 Downing Street, London", 51.5034, -0.1276);
        body["address"] = json!({
            "road": "Downing Street",
            "city": "London",
            "country": "United Kingdom"
        });
        let mock = Arc::new(MockTransport::always(body));

        let record = geocoder(&mock)
            .reverse_geocode(51.5034, -0.1276, &ReverseParams::default())
            .await
            .unwrap();
        assert_eq!(record.display_name, "10 Downing Street, London");
        assert_eq!(record.address.get("city").map(String::as_str), Some("London"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverse_miss_is_not_found() {
        let mock = Arc::new(MockTransport::always(json!({"error": "Unable to geocode"})));
        let err = geocoder(&mock)
            .reverse_geocode(0.0, -140.0, &ReverseParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GeocodeError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bbox_contains_coordinate_and_padding_expands() {
        let mock = Arc::new(MockTransport::always(json!([{
            "osm_type": "relation",
            "osm_id": 2796416,
            "lat": "51.7916",
            "lon": "0.9446",
            "display_name": "Mersea Island, Essex, England, United Kingdom",
            "place_rank": 17,
            "boundingbox": ["51.7640", "51.8199", "0.8517", "1.0356"]
        }])));
        let geocoder = geocoder(&mock);

        let plain = geocoder.bbox_from_place("Mersea Island", None).await.unwrap();
        assert_eq!(plain.bbox, Bbox::from([0.8517, 51.7640, 1.0356, 51.8199]));
        assert_eq!(plain.center, [0.9446, 51.7916]);
        assert!(plain.bbox.contains_point(crate::models::GeoPoint::new(51.7916, 0.9446)));
        assert!(plain.area_km2 > 0.0);

        let padded = geocoder.bbox_from_place("Mersea Island", Some(0.1)).await.unwrap();
        assert!(padded.bbox.strictly_contains(&plain.bbox));
        assert!(padded.area_km2 > plain.area_km2);

        // Second call served from cache.
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bbox_from_unknown_place_is_not_found() {
        let mock = Arc::new(MockTransport::always(json!([])));
        let err = geocoder(&mock)
            .bbox_from_place("Atlantis", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GeocodeError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bbox_synthesized_from_rank() {
        let mock = Arc::new(MockTransport::new(vec![json(json!([{
            "lat": "48.0",
            "lon": "2.0",
            "display_name": "Somewhere",
            "place_rank": 14
        }]))]));
        let result = geocoder(&mock).bbox_from_place("Somewhere", None).await.unwrap();
        assert_eq!(result.bbox, Bbox::around(48.0, 2.0, 0.1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_records() {
        let mock = Arc::new(MockTransport::always(json!([place("Essex", 51.8, 0.6)])));
        let ids = vec!["R180904".parse().unwrap()];
        let records = geocoder(&mock).lookup(&ids).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].osm_ref().map(|id| id.to_string()), Some("N1".to_string()));
    }
}
