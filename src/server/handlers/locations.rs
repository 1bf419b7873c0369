use axum::extract::{Extension, Json};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::entities::{Acquisition, AcquisitionMethod, AcquisitionStatus, GeoPosition};
use crate::error::Error;
use crate::server::client_ip;
use crate::api::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct AcquireParams {
    #[serde(default)]
    method: Option<AcquisitionMethod>,
}

#[derive(Serialize)]
pub struct PositionResponse {
    position: Option<GeoPosition>,
    status: AcquisitionStatus,
}

#[derive(Serialize)]
pub struct MethodResponse {
    method: AcquisitionMethod,
}

pub async fn acquire(
    Extension(api): Extension<DynAPI>,
    headers: HeaderMap,
    Json(params): Json<AcquireParams>,
) -> Result<Json<Acquisition>, Error> {
    let acquisition = api
        .acquire_position(params.method, client_ip(&headers))
        .await?;

    Ok(acquisition.into())
}

pub async fn find(Extension(api): Extension<DynAPI>) -> Result<Json<PositionResponse>, Error> {
    let position = api.current_position().await?;
    let status = api.acquisition_status().await?;

    Ok(PositionResponse { position, status }.into())
}

pub async fn toggle_method(
    Extension(api): Extension<DynAPI>,
) -> Result<Json<MethodResponse>, Error> {
    let method = api.toggle_method().await?;

    Ok(MethodResponse { method }.into())
}
