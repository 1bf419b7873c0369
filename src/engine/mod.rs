mod building_api;
pub mod directions;
mod location_api;
pub mod position_provider;
pub mod recalculation;
mod route_api;
pub mod route_fetcher;
pub mod route_state;

use std::sync::Arc;

pub use position_provider::{GeoPositionProvider, RetryPolicy};
pub use recalculation::{
    Decision, RecalculationPolicy, Ticket, DEFAULT_DEBOUNCE, DEFAULT_MOVEMENT_THRESHOLD_METERS,
};
pub use route_fetcher::{FallbackPace, RouteFetcher};
pub use route_state::{RouteSnapshot, RouteState};

use crate::{
    api::API,
    config::Config,
    error::Error,
    external::{BuildingDirectory, HttpBuildingDirectory, IpGeolocator, Osrm, PositionSensor, SensorOptions},
};

pub struct Engine {
    provider: GeoPositionProvider,
    fetcher: RouteFetcher,
    policy: RecalculationPolicy,
    state: RouteState,
    directory: Arc<dyn BuildingDirectory>,
}

impl Engine {
    pub fn new(
        provider: GeoPositionProvider,
        fetcher: RouteFetcher,
        policy: RecalculationPolicy,
        directory: Arc<dyn BuildingDirectory>,
    ) -> Self {
        Self {
            provider,
            fetcher,
            policy,
            state: RouteState::new(),
            directory,
        }
    }

    #[tracing::instrument(name = "Engine::from_config", skip_all)]
    pub fn from_config(
        config: &Config,
        sensor: Arc<dyn PositionSensor>,
        geolocator: IpGeolocator,
    ) -> Result<Self, Error> {
        let osrm = Osrm::new(
            config.osrm_api_base.clone(),
            config.osrm_walking_profile.clone(),
            config.osrm_driving_profile.clone(),
            config.routing_timeout,
        )?;

        let directory =
            HttpBuildingDirectory::new(config.buildings_api_base.clone(), config.routing_timeout)?;

        tracing::info!(
            osrm = %config.osrm_api_base,
            buildings = %config.buildings_api_base,
            "engine configured"
        );

        Ok(Self::new(
            GeoPositionProvider::new(
                sensor,
                geolocator,
                RetryPolicy::default(),
                SensorOptions::default(),
            ),
            RouteFetcher::new(Arc::new(osrm), config.pace, config.routing_timeout),
            RecalculationPolicy::new(config.movement_threshold_meters, config.debounce),
            Arc::new(directory),
        ))
    }

    /// Read side of the display state.
    pub fn state(&self) -> &RouteState {
        &self.state
    }
}

impl API for Engine {}
