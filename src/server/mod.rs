mod handlers;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::Extension,
    http::HeaderMap,
    routing::{get, patch, post, put},
    Router,
};

use crate::api::{DynAPI, API};
use crate::error::{unexpected_error, Error};
use crate::external::{IpGeolocator, ReportedSensor};
use crate::server::handlers::{buildings, geolocation, locations, routes, sensor};

pub fn router(
    api: DynAPI,
    geolocator: Arc<IpGeolocator>,
    sensor: Arc<ReportedSensor>,
) -> Router {
    Router::new()
        .route("/geolocation", get(geolocation::locate))
        .route("/position", get(locations::find))
        .route("/position/acquire", post(locations::acquire))
        .route("/position/method", patch(locations::toggle_method))
        .route("/sensor/position", put(sensor::report))
        .route("/sensor/permission", put(sensor::set_availability))
        .route("/routes", post(routes::create))
        .route(
            "/routes/current",
            get(routes::find_current).delete(routes::clear_current),
        )
        .route("/buildings", get(buildings::search))
        .route("/buildings/:slug", get(buildings::find))
        .route("/boundary", get(buildings::boundary))
        .layer(Extension(api))
        .layer(Extension(geolocator))
        .layer(Extension(sensor))
}

pub async fn serve<T: API + Sync + Send + 'static>(
    api: T,
    geolocator: Arc<IpGeolocator>,
    sensor: Arc<ReportedSensor>,
    addr: SocketAddr,
) -> Result<(), Error> {
    let api = Arc::new(api) as DynAPI;
    let app = router(api, geolocator, sensor);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|err| {
            tracing::error!("server stopped: {}", err);
            unexpected_error()
        })
}

/// Caller address as reported by a fronting proxy.
pub fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next());

    let real = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok());

    forwarded
        .into_iter()
        .chain(real)
        .find_map(|value| value.trim().parse().ok())
}
