use axum::extract::{Extension, Json};
use axum::http::{HeaderMap, StatusCode};
use serde::Deserialize;

use crate::api::{DynAPI, RouteResult, RouteView};
use crate::entities::{Origin, RoutingEndpoint, TransportMode};
use crate::error::Error;
use crate::server::client_ip;

#[derive(Deserialize)]
pub struct CreateParams {
    origin: Origin,
    destination: RoutingEndpoint,
    #[serde(default)]
    mode: TransportMode,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    headers: HeaderMap,
    Json(params): Json<CreateParams>,
) -> Result<Json<RouteResult>, Error> {
    let result = api
        .request_route(
            params.origin,
            params.destination,
            params.mode,
            client_ip(&headers),
        )
        .await?;

    Ok(result.into())
}

pub async fn find_current(
    Extension(api): Extension<DynAPI>,
) -> Result<Json<Option<RouteView>>, Error> {
    let route = api.current_route().await?;

    Ok(route.into())
}

pub async fn clear_current(Extension(api): Extension<DynAPI>) -> Result<StatusCode, Error> {
    api.clear_route().await?;

    Ok(StatusCode::NO_CONTENT)
}
