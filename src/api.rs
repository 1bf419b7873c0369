use async_trait::async_trait;
use geo_types::LineString;
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;

use crate::engine::directions;
use crate::entities::{
    Acquisition, AcquisitionMethod, AcquisitionStatus, Building, CampusBoundary, GeoPosition,
    Notice, Origin, PolylineStyle, Route, RoutingEndpoint, TransportMode,
};
use crate::error::Error;

#[async_trait]
pub trait LocationAPI {
    /// Resolves the device position with `method`, or the preferred one when `None`.
    async fn acquire_position(
        &self,
        method: Option<AcquisitionMethod>,
        client_ip: Option<IpAddr>,
    ) -> Result<Acquisition, Error>;

    async fn current_position(&self) -> Result<Option<GeoPosition>, Error>;

    async fn acquisition_status(&self) -> Result<AcquisitionStatus, Error>;

    async fn toggle_method(&self) -> Result<AcquisitionMethod, Error>;
}

#[async_trait]
pub trait RouteAPI {
    async fn request_route(
        &self,
        origin: Origin,
        destination: RoutingEndpoint,
        mode: TransportMode,
        client_ip: Option<IpAddr>,
    ) -> Result<RouteResult, Error>;

    async fn current_route(&self) -> Result<Option<RouteView>, Error>;

    async fn clear_route(&self) -> Result<(), Error>;
}

#[async_trait]
pub trait BuildingAPI {
    async fn find_buildings(&self, query: Option<String>) -> Result<Vec<Building>, Error>;

    async fn find_building(&self, slug: String) -> Result<Building, Error>;

    async fn find_boundary(&self) -> Result<CampusBoundary, Error>;
}

pub trait API: LocationAPI + RouteAPI + BuildingAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;

/// A route as it is displayed: the line, its style and the guidance text.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteView {
    pub route: Arc<Route>,
    /// The polyline to draw, `x` as longitude.
    pub line: LineString<f64>,
    pub directions: Vec<String>,
    pub duration_minutes: u64,
    pub style: PolylineStyle,
}

impl From<Arc<Route>> for RouteView {
    fn from(route: Arc<Route>) -> Self {
        Self {
            line: route.line_string(),
            directions: directions::directions(&route),
            duration_minutes: route.duration_minutes(),
            style: route.mode.polyline_style(),
            route,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// The route was computed and is now the active one.
    Applied { view: RouteView },
    /// The active route already answers this request.
    Unchanged,
    /// An equivalent request is still being computed.
    InFlight,
    /// A later input arrived before this request was accepted.
    Superseded,
    /// A newer request was accepted while this one was computing.
    Discarded,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteResult {
    pub outcome: RouteOutcome,
    pub notices: Vec<Notice>,
}

impl RouteResult {
    pub fn new(outcome: RouteOutcome, notices: Vec<Notice>) -> Self {
        Self { outcome, notices }
    }
}
