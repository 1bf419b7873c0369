pub mod buildings;
pub mod ip_geolocation;
pub mod osrm;
pub mod sensor;

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

use crate::entities::{Building, CampusBoundary, GeoPoint, GeoPosition, RouteStep, TransportMode};
use crate::error::Error;

pub use buildings::HttpBuildingDirectory;
pub use ip_geolocation::{IpEstimate, IpGeolocator, IpLocation};
pub use osrm::Osrm;
pub use sensor::ReportedSensor;

/// One path offered by a routing engine.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidatePath {
    pub geometry: Vec<GeoPoint>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub steps: Vec<RouteStep>,
}

#[async_trait]
pub trait RoutingEngine: Send + Sync {
    async fn candidate_paths(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        mode: TransportMode,
    ) -> Result<Vec<CandidatePath>, Error>;
}

#[async_trait]
pub trait IpResolver: Send + Sync {
    fn name(&self) -> &str;
    async fn resolve(&self, ip: Option<IpAddr>) -> Result<IpLocation, Error>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix that may be returned instead of a fresh one.
    pub maximum_age: Duration,
}

impl Default for SensorOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(5),
            maximum_age: Duration::from_secs(30),
        }
    }
}

#[async_trait]
pub trait PositionSensor: Send + Sync {
    async fn fix(&self, options: &SensorOptions) -> Result<GeoPosition, Error>;
}

#[async_trait]
pub trait BuildingDirectory: Send + Sync {
    async fn buildings(&self) -> Result<Vec<Building>, Error>;
    async fn boundary(&self) -> Result<CampusBoundary, Error>;
}
