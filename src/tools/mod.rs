//! Tool registry: every orchestrator operation behind a name, taking JSON
//! arguments and returning JSON or a structured error.

pub mod args;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ErrorDescriptor, ErrorKind, GeocodeError};
use crate::geocoder::{Geocoder, NEARBY_ZOOMS};
use crate::nominatim::ZoomLevel;
use args::{
    BatchArgs, BboxArgs, GeocodeArgs, LookupArgs, MatrixArgs, NearbyArgs, PointArgs, ReverseArgs,
    RouteArgs,
};

pub type ToolResult = Result<Value, ErrorDescriptor>;

type Handler = fn(Arc<Geocoder>, Value) -> BoxFuture<'static, ToolResult>;

/// Error from [`ToolRegistry::call`].
#[derive(Debug, Clone, PartialEq)]
pub enum CallError {
    UnknownTool(String),
    Failed(ErrorDescriptor),
}

#[derive(Clone, Copy)]
struct Tool {
    description: &'static str,
    handler: Handler,
}

/// Name and description of a registered tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
}

pub struct ToolRegistry {
    geocoder: Arc<Geocoder>,
    tools: BTreeMap<&'static str, Tool>,
}

impl ToolRegistry {
    pub fn new(geocoder: Arc<Geocoder>) -> Self {
        let mut registry = Self {
            geocoder,
            tools: BTreeMap::new(),
        };
        registry.register("geocode", "Place name or address to coordinates", geocode);
        registry.register(
            "reverse_geocode",
            "Coordinates to the nearest named place",
            reverse_geocode,
        );
        registry.register(
            "bbox_from_place",
            "Bounding box and area of a named place",
            bbox_from_place,
        );
        registry.register(
            "nearby_places",
            "Named places around a coordinate, nearest first",
            nearby_places,
        );
        registry.register(
            "admin_boundaries",
            "Administrative hierarchy containing a coordinate",
            admin_boundaries,
        );
        registry.register("geocoder_status", "Cache and rate limiter status", geocoder_status);
        registry.register(
            "geocoder_capabilities",
            "Available tools and limits",
            geocoder_capabilities,
        );
        registry.register("batch_geocode", "Geocode several place names in order", batch_geocode);
        registry.register(
            "route_waypoints",
            "Resolve waypoints and measure legs between them",
            route_waypoints,
        );
        registry.register(
            "distance_matrix",
            "Pairwise distances between coordinates",
            distance_matrix,
        );
        registry.register("lookup", "Fetch places by OSM id (N123, W456, R789)", lookup);
        registry
    }

    fn register(&mut self, name: &'static str, description: &'static str, handler: Handler) {
        self.tools.insert(name, Tool { description, handler });
    }

    pub fn tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|(name, tool)| ToolInfo {
                name: *name,
                description: tool.description,
            })
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Run a tool by name. A `null` argument value is treated as `{}`.
    pub async fn call(&self, name: &str, args: Value) -> Result<Value, CallError> {
        let tool = self
            .tools
            .get(name)
            .copied()
            .ok_or_else(|| CallError::UnknownTool(name.to_string()))?;
        let args = if args.is_null() { json!({}) } else { args };

        debug!("Calling tool {}", name);
        (tool.handler)(Arc::clone(&self.geocoder), args)
            .await
            .map_err(CallError::Failed)
    }
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ErrorDescriptor> {
    serde_json::from_value(args).map_err(|e| ErrorDescriptor {
        kind: ErrorKind::Validation,
        message: format!("Invalid arguments: {}", e),
    })
}

fn to_json<T: Serialize>(value: &T) -> ToolResult {
    serde_json::to_value(value)
        .map_err(|e| GeocodeError::Upstream(format!("unserializable result: {}", e)).descriptor())
}

fn geocode(geocoder: Arc<Geocoder>, args: Value) -> BoxFuture<'static, ToolResult> {
    Box::pin(async move {
        let mut args: GeocodeArgs = parse_args(args)?;
        let options = args.options();
        let results = geocoder.geocode(&args.query, &options).await?;
        Ok(json!({
            "query": args.query,
            "count": results.len(),
            "results": to_json(&results)?,
        }))
    })
}

fn reverse_geocode(geocoder: Arc<Geocoder>, args: Value) -> BoxFuture<'static, ToolResult> {
    Box::pin(async move {
        let args: ReverseArgs = parse_args(args)?;
        let record = geocoder
            .reverse_geocode(args.lat, args.lon, &args.params())
            .await?;
        to_json(&record)
    })
}

fn bbox_from_place(geocoder: Arc<Geocoder>, args: Value) -> BoxFuture<'static, ToolResult> {
    Box::pin(async move {
        let args: BboxArgs = parse_args(args)?;
        let result = geocoder.bbox_from_place(&args.query, args.padding).await?;
        to_json(&result)
    })
}

fn nearby_places(geocoder: Arc<Geocoder>, args: Value) -> BoxFuture<'static, ToolResult> {
    Box::pin(async move {
        let mut args: NearbyArgs = parse_args(args)?;
        let options = args.options();
        let places = geocoder.nearby_places(args.lat, args.lon, &options).await?;
        Ok(json!({
            "lat": args.lat,
            "lon": args.lon,
            "count": places.len(),
            "places": to_json(&places)?,
        }))
    })
}

fn admin_boundaries(geocoder: Arc<Geocoder>, args: Value) -> BoxFuture<'static, ToolResult> {
    Box::pin(async move {
        let args: PointArgs = parse_args(args)?;
        let hierarchy = geocoder.admin_boundaries(args.lat, args.lon).await?;
        Ok(json!({
            "lat": args.lat,
            "lon": args.lon,
            "display_name": hierarchy.display_name,
            "levels": to_json(&hierarchy.levels)?,
        }))
    })
}

fn geocoder_status(geocoder: Arc<Geocoder>, _args: Value) -> BoxFuture<'static, ToolResult> {
    Box::pin(async move {
        let status = geocoder.status();
        let mut value = to_json(&status)?;
        value["server"] = json!(env!("CARGO_PKG_NAME"));
        value["version"] = json!(env!("CARGO_PKG_VERSION"));
        Ok(value)
    })
}

fn geocoder_capabilities(geocoder: Arc<Geocoder>, _args: Value) -> BoxFuture<'static, ToolResult> {
    Box::pin(async move {
        let registry = ToolRegistry::new(Arc::clone(&geocoder));
        let zooms = [
            ("country", ZoomLevel::COUNTRY),
            ("state", ZoomLevel::STATE),
            ("county", ZoomLevel::COUNTY),
            ("city", ZoomLevel::CITY),
            ("suburb", ZoomLevel::SUBURB),
            ("street", ZoomLevel::STREET),
            ("building", ZoomLevel::BUILDING),
        ];
        let zoom_levels: serde_json::Map<String, Value> = zooms
            .iter()
            .map(|(name, zoom)| (name.to_string(), json!(zoom.0)))
            .collect();
        let nearby_zooms: Vec<u8> = NEARBY_ZOOMS.iter().map(|z| z.0).collect();
        Ok(json!({
            "server": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "nominatim_url": geocoder.client().base_url().as_str(),
            "tools": registry.tools(),
            "tool_count": registry.tools.len(),
            "max_limit": geocoder.max_limit(),
            "batch_max": geocoder.batch_max(),
            "zoom_levels": zoom_levels,
            "nearby_zooms": nearby_zooms,
        }))
    })
}

fn batch_geocode(geocoder: Arc<Geocoder>, args: Value) -> BoxFuture<'static, ToolResult> {
    Box::pin(async move {
        let args: BatchArgs = parse_args(args)?;
        let options = crate::geocoder::GeocodeOptions {
            limit: args.limit,
            ..Default::default()
        };
        let outcomes = geocoder.batch_geocode(&args.queries, &options).await?;
        Ok(json!({
            "total": outcomes.len(),
            "succeeded": outcomes.iter().filter(|o| o.is_success()).count(),
            "results": to_json(&outcomes)?,
        }))
    })
}

fn route_waypoints(geocoder: Arc<Geocoder>, args: Value) -> BoxFuture<'static, ToolResult> {
    Box::pin(async move {
        let args: RouteArgs = parse_args(args)?;
        let route = geocoder.route_waypoints(&args.waypoints).await?;
        to_json(&route)
    })
}

fn distance_matrix(geocoder: Arc<Geocoder>, args: Value) -> BoxFuture<'static, ToolResult> {
    Box::pin(async move {
        let args: MatrixArgs = parse_args(args)?;
        let matrix = geocoder.distance_matrix(&args.named_points())?;
        to_json(&matrix)
    })
}

fn lookup(geocoder: Arc<Geocoder>, args: Value) -> BoxFuture<'static, ToolResult> {
    Box::pin(async move {
        let args: LookupArgs = parse_args(args)?;
        let ids = args.ids()?;
        let results = geocoder.lookup(&ids).await?;
        Ok(json!({
            "count": results.len(),
            "results": to_json(&results)?,
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoder::tests::geocoder;
    use crate::nominatim::client::tests::place;
    use crate::nominatim::transport::tests::{json, MockTransport};

    fn registry(mock: &Arc<MockTransport>) -> ToolRegistry {
        ToolRegistry::new(Arc::new(geocoder(mock)))
    }

    #[test]
    fn test_all_tools_registered() {
        let mock = Arc::new(MockTransport::always(json!([])));
        let names: Vec<&str> = registry(&mock).tools().iter().map(|t| t.name).collect();
        for expected in [
            "geocode",
            "reverse_geocode",
            "bbox_from_place",
            "nearby_places",
            "admin_boundaries",
            "geocoder_status",
            "geocoder_capabilities",
            "batch_geocode",
            "route_waypoints",
            "distance_matrix",
            "lookup",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
        assert_eq!(names.len(), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_tool() {
        let mock = Arc::new(MockTransport::always(json!([])));
        let err = registry(&mock).call("teleport", Value::Null).await.unwrap_err();
        assert_eq!(err, CallError::UnknownTool("teleport".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_arguments_are_validation_errors() {
        let mock = Arc::new(MockTransport::always(json!([])));
        let registry = registry(&mock);

        match registry.call("geocode", json!({"limit": 3})).await {
            Err(CallError::Failed(e)) => assert_eq!(e.kind, ErrorKind::Validation),
            other => panic!("unexpected {:?}", other),
        }
        match registry.call("reverse_geocode", json!({"lat": "north", "lon": 0})).await {
            Err(CallError::Failed(e)) => assert_eq!(e.kind, ErrorKind::Validation),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_geocode_tool() {
        let mock = Arc::new(MockTransport::always(json!([place("Paris, France", 48.85, 2.35)])));
        let value = registry(&mock)
            .call("geocode", json!({"query": "Paris", "countrycodes": "fr"}))
            .await
            .unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["results"][0]["display_name"], "Paris, France");
        assert_eq!(value["results"][0]["bbox"].as_array().map(Vec::len), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bbox_not_found_descriptor() {
        let mock = Arc::new(MockTransport::always(json!([])));
        match registry(&mock)
            .call("bbox_from_place", json!({"query": "Atlantis"}))
            .await
        {
            Err(CallError::Failed(e)) => {
                assert_eq!(e.kind, ErrorKind::NotFound);
                assert!(e.message.contains("Atlantis"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_tool_counts() {
        let mock = Arc::new(MockTransport::new(vec![
            json(serde_json::json!([place("Paris", 48.85, 2.35)])),
            json(serde_json::json!([place("Tokyo", 35.68, 139.69)])),
        ]));
        let value = registry(&mock)
            .call("batch_geocode", json!({"queries": ["Paris", "", "Tokyo"]}))
            .await
            .unwrap();
        assert_eq!(value["total"], 3);
        assert_eq!(value["succeeded"], 2);
        assert_eq!(value["results"][1]["status"], "failed");
        assert_eq!(value["results"][1]["error"]["kind"], "validation");
    }

    #[tokio::test(start_paused = true)]
    async fn test_distance_matrix_tool() {
        let mock = Arc::new(MockTransport::always(json!([])));
        let value = registry(&mock)
            .call(
                "distance_matrix",
                json!({"points": [[51.5, -0.12], {"name": "Paris", "lat": 48.85, "lon": 2.35}]}),
            )
            .await
            .unwrap();
        assert_eq!(value["points"][0]["name"], "Point 1");
        assert_eq!(value["distances"][0][0], 0.0);
        assert_eq!(value["distances"][0][1], value["distances"][1][0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_and_capabilities() {
        let mock = Arc::new(MockTransport::always(json!([])));
        let registry = registry(&mock);

        let status = registry.call("geocoder_status", Value::Null).await.unwrap();
        assert_eq!(status["cache"]["size"], 0);
        assert_eq!(status["version"], env!("CARGO_PKG_VERSION"));

        let caps = registry.call("geocoder_capabilities", json!({})).await.unwrap();
        assert_eq!(caps["tool_count"], 11);
        assert_eq!(caps["max_limit"], 10);
        assert_eq!(caps["zoom_levels"]["city"], 10);
        assert_eq!(mock.call_count(), 0);
    }
}
