use super::Engine;

use async_trait::async_trait;

use crate::{
    api::BuildingAPI,
    entities::{Building, CampusBoundary},
    error::{not_found_error, Error},
};

#[async_trait]
impl BuildingAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_buildings(&self, query: Option<String>) -> Result<Vec<Building>, Error> {
        let buildings = self.directory.buildings().await?;

        let query = match query {
            Some(query) if !query.trim().is_empty() => query,
            _ => return Ok(buildings),
        };

        Ok(buildings
            .into_iter()
            .filter(|building| building.matches(&query))
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn find_building(&self, slug: String) -> Result<Building, Error> {
        self.directory
            .buildings()
            .await?
            .into_iter()
            .find(|building| building.slug() == slug)
            .ok_or_else(not_found_error)
    }

    #[tracing::instrument(skip(self))]
    async fn find_boundary(&self) -> Result<CampusBoundary, Error> {
        match self.directory.boundary().await {
            Ok(boundary) if boundary.is_polygon() => Ok(boundary),
            Ok(_) => Ok(CampusBoundary::default()),
            Err(err) => {
                tracing::warn!("boundary unavailable: {}, using campus outline", err);
                Ok(CampusBoundary::default())
            }
        }
    }
}
