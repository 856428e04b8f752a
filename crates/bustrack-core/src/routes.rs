//! Display-only route catalog.
//!
//! Routes are served to dashboards so they can draw a line between stops.
//! Tracking never consults them; a publisher may log in with any route id.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A named bus route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "ROUTE_101",
    "name": "Secunderabad to Charminar",
    "path": [[17.4399, 78.4983], [17.3616, 78.4747]]
}))]
pub struct Route {
    /// Route identifier publishers log in with.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Polyline as `[latitude, longitude]` pairs.
    #[serde(default)]
    #[schema(value_type = Vec<Vec<f64>>)]
    pub path: Vec<[f64; 2]>,
}

/// Routes shipped with the default configuration.
#[must_use]
pub fn default_routes() -> Vec<Route> {
    vec![
        Route {
            id: "ROUTE_101".to_string(),
            name: "Secunderabad to Charminar".to_string(),
            path: vec![[17.4399, 78.4983], [17.3616, 78.4747]],
        },
        Route {
            id: "ROUTE_202".to_string(),
            name: "Hitech City to Gachibowli".to_string(),
            path: vec![[17.4435, 78.3772], [17.4401, 78.3489]],
        },
    ]
}
