use axum::extract::{Extension, Json, Path, Query};
use serde::Deserialize;

use crate::api::DynAPI;
use crate::entities::{Building, CampusBoundary};
use crate::error::Error;

#[derive(Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

pub async fn search(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Building>>, Error> {
    let buildings = api.find_buildings(params.q).await?;

    Ok(buildings.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(slug): Path<String>,
) -> Result<Json<Building>, Error> {
    let building = api.find_building(slug).await?;

    Ok(building.into())
}

pub async fn boundary(Extension(api): Extension<DynAPI>) -> Result<Json<CampusBoundary>, Error> {
    let boundary = api.find_boundary().await?;

    Ok(boundary.into())
}
