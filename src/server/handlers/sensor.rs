use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::entities::{GeoPoint, GeoPosition};
use crate::error::Error;
use crate::external::sensor::SensorAvailability;
use crate::external::ReportedSensor;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportParams {
    latitude: f64,
    longitude: f64,
    accuracy_meters: f64,
    #[serde(default)]
    captured_at_epoch_ms: Option<i64>,
}

#[derive(Serialize, Deserialize)]
pub struct AvailabilityParams {
    availability: SensorAvailability,
}

pub async fn report(
    Extension(sensor): Extension<Arc<ReportedSensor>>,
    Json(params): Json<ReportParams>,
) -> Result<StatusCode, Error> {
    GeoPoint::new(params.latitude, params.longitude).validate()?;

    let captured_at = params
        .captured_at_epoch_ms
        .unwrap_or_else(|| Utc::now().timestamp_millis());

    sensor.report(GeoPosition::new(
        params.latitude,
        params.longitude,
        params.accuracy_meters,
        captured_at,
    ))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_availability(
    Extension(sensor): Extension<Arc<ReportedSensor>>,
    Json(params): Json<AvailabilityParams>,
) -> Result<StatusCode, Error> {
    sensor.set_availability(params.availability)?;

    Ok(StatusCode::NO_CONTENT)
}
