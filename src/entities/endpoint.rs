use serde::{Deserialize, Serialize};

use crate::entities::{GeoPoint, GeoPosition};
use crate::error::{invalid_endpoint_error, Error};

pub const CURRENT_LOCATION_ID: &str = "current-location";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutingEndpoint {
    pub id: String,
    pub label: String,
    pub coordinates: GeoPoint,
}

impl RoutingEndpoint {
    pub fn new(id: String, label: String, coordinates: GeoPoint) -> Self {
        Self {
            id,
            label,
            coordinates,
        }
    }

    pub fn current_location(position: &GeoPosition) -> Self {
        Self {
            id: CURRENT_LOCATION_ID.into(),
            label: "Your location".into(),
            coordinates: position.point(),
        }
    }
}

/// Where a route starts: the live device position, or a fixed endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    CurrentLocation,
    Endpoint { endpoint: RoutingEndpoint },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
}

impl Building {
    pub fn slug(&self) -> String {
        match &self.slug {
            Some(slug) if !slug.is_empty() => slug.clone(),
            _ => slugify(&self.name),
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.trim().to_lowercase())
    }

    /// Buildings without usable coordinates cannot be routed to.
    pub fn to_endpoint(&self) -> Result<RoutingEndpoint, Error> {
        let coordinates = self.coordinates.ok_or_else(invalid_endpoint_error)?;
        coordinates.validate()?;

        Ok(RoutingEndpoint::new(self.slug(), self.name.clone(), coordinates))
    }
}

/// Lowercases, drops everything but word characters, whitespace and hyphens,
/// then hyphenates whitespace runs.
pub fn slugify(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Campus outline as `[lat, lng]` pairs, used for display only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampusBoundary {
    pub boundaries: Vec<[f64; 2]>,
}

impl CampusBoundary {
    pub const MIN_POINTS: usize = 3;

    pub fn is_polygon(&self) -> bool {
        self.boundaries.len() >= Self::MIN_POINTS
            && self
                .boundaries
                .iter()
                .all(|[lat, lng]| GeoPoint::new(*lat, *lng).is_valid())
    }
}

impl Default for CampusBoundary {
    fn default() -> Self {
        Self {
            boundaries: vec![
                [6.5185, 3.3768],
                [6.5216, 3.3758],
                [6.5210, 3.3796],
                [6.5180, 3.3785],
            ],
        }
    }
}
