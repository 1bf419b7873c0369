use axum::extract::{Extension, Json};
use axum::http::HeaderMap;
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;

use crate::external::IpGeolocator;
use crate::server::client_ip;

#[derive(Serialize)]
pub struct GeolocationResponse {
    latitude: f64,
    longitude: f64,
    ip: Option<IpAddr>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    message: String,
}

pub async fn locate(
    Extension(geolocator): Extension<Arc<IpGeolocator>>,
    headers: HeaderMap,
) -> Json<GeolocationResponse> {
    let ip = client_ip(&headers);
    let estimate = geolocator.locate(ip).await;

    let message = match &estimate.resolved_by {
        Some(resolver) => format!("Location found via {}", resolver),
        None => "Using default campus location".into(),
    };

    Json(GeolocationResponse {
        latitude: estimate.location.latitude,
        longitude: estimate.location.longitude,
        ip,
        city: estimate.location.city,
        region: estimate.location.region,
        country: estimate.location.country,
        message,
    })
}
