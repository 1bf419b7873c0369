mod coordinates;
mod endpoint;
mod position;
mod route;

pub use coordinates::{CardinalDirection, GeoPoint, EARTH_RADIUS_KM};
pub use endpoint::{
    slugify, Building, CampusBoundary, Origin, RoutingEndpoint, CURRENT_LOCATION_ID,
};
pub use position::{Acquisition, AcquisitionMethod, AcquisitionStatus, GeoPosition, Notice};
pub use route::{
    duration_minutes, PolylineStyle, RecalculationRequest, Route, RouteSource, RouteStep,
    TransportMode,
};
