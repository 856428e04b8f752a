//! Static catalog of circular geofence zones.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geo::Coordinate;

/// A named circular zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "name": "Depot",
    "center_latitude": 17.40,
    "center_longitude": 78.47,
    "radius_km": 0.3
}))]
pub struct Zone {
    /// Unique zone name, used in alerts.
    pub name: String,

    /// Latitude of the centre in degrees.
    pub center_latitude: f64,

    /// Longitude of the centre in degrees.
    pub center_longitude: f64,

    /// Radius in kilometres.
    pub radius_km: f64,
}

impl Zone {
    /// Create a zone.
    #[must_use]
    pub fn new(name: impl Into<String>, center_latitude: f64, center_longitude: f64, radius_km: f64) -> Self {
        Self {
            name: name.into(),
            center_latitude,
            center_longitude,
            radius_km,
        }
    }

    /// Centre of the zone.
    #[must_use]
    pub const fn center(&self) -> Coordinate {
        Coordinate::new(self.center_latitude, self.center_longitude)
    }

    /// Distance from `position` to the zone centre, in kilometres.
    #[must_use]
    pub fn distance_km(&self, position: &Coordinate) -> f64 {
        self.center().distance_km(position)
    }
}

/// Read-only, ordered collection of zones.
///
/// Iteration order is the configuration order; the geofence evaluator
/// relies on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneCatalog {
    zones: Vec<Zone>,
}

impl ZoneCatalog {
    /// Build a catalog from zones in evaluation order.
    #[must_use]
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    /// Zones in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    /// Number of zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether the catalog has no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Zones shipped with the default configuration (Hyderabad).
#[must_use]
pub fn default_zones() -> Vec<Zone> {
    vec![
        Zone::new("Depot", 17.40, 78.47, 0.3),
        Zone::new("Secunderabad Station", 17.4399, 78.4983, 0.5),
        Zone::new("Charminar", 17.3616, 78.4747, 0.5),
    ]
}
