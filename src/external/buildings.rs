use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    entities::{Building, CampusBoundary},
    error::{upstream_error, Error},
    external::BuildingDirectory,
};

/// Client for the navigation backend that owns building and boundary data.
#[derive(Clone, Debug)]
pub struct HttpBuildingDirectory {
    client: reqwest::Client,
    api_base: String,
}

impl HttpBuildingDirectory {
    pub fn new(api_base: String, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').into(),
        })
    }
}

// The backend has answered with a bare list as well as with wrapped ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BuildingsResponse {
    List(Vec<Building>),
    Buildings { buildings: Vec<Building> },
    Items { items: Vec<Building> },
}

impl From<BuildingsResponse> for Vec<Building> {
    fn from(res: BuildingsResponse) -> Self {
        match res {
            BuildingsResponse::List(buildings) => buildings,
            BuildingsResponse::Buildings { buildings } => buildings,
            BuildingsResponse::Items { items } => items,
        }
    }
}

#[async_trait]
impl BuildingDirectory for HttpBuildingDirectory {
    #[tracing::instrument(skip(self))]
    async fn buildings(&self) -> Result<Vec<Building>, Error> {
        let url = format!("{}/api/buildings", self.api_base);

        let res = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(upstream_error());
        }

        let data: BuildingsResponse = res.json().await?;

        Ok(data.into())
    }

    #[tracing::instrument(skip(self))]
    async fn boundary(&self) -> Result<CampusBoundary, Error> {
        let url = format!("{}/api/boundaries", self.api_base);

        let res = self.client.get(url).send().await?;

        if !res.status().is_success() {
            return Err(upstream_error());
        }

        let boundary: CampusBoundary = res.json().await?;

        if !boundary.is_polygon() {
            tracing::warn!("backend boundary is not a polygon, using default campus boundary");
            return Ok(CampusBoundary::default());
        }

        Ok(boundary)
    }
}
