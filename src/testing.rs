//! Scripted stand-ins for the external collaborators.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::engine::{
    Engine, FallbackPace, GeoPositionProvider, RecalculationPolicy, RetryPolicy, RouteFetcher,
};
use crate::entities::{Building, CampusBoundary, GeoPoint, GeoPosition, TransportMode};
use crate::error::{network_unreachable_error, upstream_error, Error};
use crate::external::ip_geolocation::CAMPUS_FALLBACK;
use crate::external::{
    BuildingDirectory, CandidatePath, IpGeolocator, IpLocation, IpResolver, PositionSensor,
    RoutingEngine, SensorOptions,
};

/// Replays queued results, repeating the last one once the queue runs dry.
pub struct ScriptedSensor {
    script: Mutex<VecDeque<Result<GeoPosition, Error>>>,
    last: Mutex<Option<Result<GeoPosition, Error>>>,
    pub calls: AtomicUsize,
}

impl ScriptedSensor {
    pub fn new(script: Vec<Result<GeoPosition, Error>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PositionSensor for ScriptedSensor {
    async fn fix(&self, _: &SensorOptions) -> Result<GeoPosition, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();

        match next {
            Some(result) => {
                *last = Some(result.clone());
                result
            }
            None => last.clone().unwrap_or_else(|| Err(network_unreachable_error())),
        }
    }
}

pub struct StaticResolver {
    pub name: &'static str,
    pub result: Result<IpLocation, Error>,
    pub delay: Duration,
}

#[async_trait]
impl IpResolver for StaticResolver {
    fn name(&self) -> &str {
        self.name
    }

    async fn resolve(&self, _: Option<IpAddr>) -> Result<IpLocation, Error> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.result.clone()
    }
}

pub fn lagos() -> IpLocation {
    IpLocation {
        latitude: 6.52,
        longitude: 3.375,
        city: Some("Lagos".into()),
        region: None,
        country: None,
    }
}

/// Resolver A hangs past the timeout, resolver B answers with Lagos.
pub fn geolocator() -> IpGeolocator {
    IpGeolocator::new(
        vec![
            Arc::new(StaticResolver {
                name: "resolver-a",
                result: Err(network_unreachable_error()),
                delay: Duration::from_secs(60),
            }),
            Arc::new(StaticResolver {
                name: "resolver-b",
                result: Ok(lagos()),
                delay: Duration::ZERO,
            }),
        ],
        CAMPUS_FALLBACK,
        Duration::from_secs(5),
    )
}

/// Routing engine that is never reachable.
pub struct Unreachable {
    pub calls: AtomicUsize,
}

impl Unreachable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl RoutingEngine for Unreachable {
    async fn candidate_paths(
        &self,
        _: GeoPoint,
        _: GeoPoint,
        _: TransportMode,
    ) -> Result<Vec<CandidatePath>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(network_unreachable_error())
    }
}

/// Answers with a road-snapped path whose latency depends on the destination.
pub struct DelayedEngine {
    pub delay_for: Box<dyn Fn(GeoPoint) -> Duration + Send + Sync>,
    pub calls: AtomicUsize,
}

impl DelayedEngine {
    pub fn new(delay_for: impl Fn(GeoPoint) -> Duration + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            delay_for: Box::new(delay_for),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutingEngine for DelayedEngine {
    async fn candidate_paths(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        _: TransportMode,
    ) -> Result<Vec<CandidatePath>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep((self.delay_for)(destination)).await;

        let midpoint = GeoPoint::new(
            (origin.lat + destination.lat) / 2.0 + 0.0005,
            (origin.lng + destination.lng) / 2.0 - 0.0005,
        );

        Ok(vec![CandidatePath {
            geometry: vec![origin, midpoint, destination],
            distance_meters: origin.haversine_distance(&midpoint)
                + midpoint.haversine_distance(&destination),
            duration_seconds: 300.0,
            steps: vec![],
        }])
    }
}

/// Directory answering from memory; a missing boundary reads as a backend failure.
pub struct StaticDirectory {
    pub buildings: Vec<Building>,
    pub boundary: Option<CampusBoundary>,
}

#[async_trait]
impl BuildingDirectory for StaticDirectory {
    async fn buildings(&self) -> Result<Vec<Building>, Error> {
        Ok(self.buildings.clone())
    }

    async fn boundary(&self) -> Result<CampusBoundary, Error> {
        self.boundary.clone().ok_or_else(upstream_error)
    }
}

pub fn engine_with_parts(
    sensor: Arc<dyn PositionSensor>,
    routing: Arc<dyn RoutingEngine>,
    debounce: Duration,
) -> Arc<Engine> {
    Arc::new(Engine::new(
        GeoPositionProvider::new(
            sensor,
            geolocator(),
            RetryPolicy::default(),
            SensorOptions::default(),
        ),
        RouteFetcher::new(routing, FallbackPace::default(), Duration::from_secs(10)),
        RecalculationPolicy::new(1.0, debounce),
        Arc::new(StaticDirectory {
            buildings: vec![],
            boundary: None,
        }),
    ))
}

pub fn engine_with(routing: Arc<dyn RoutingEngine>, debounce: Duration) -> Arc<Engine> {
    engine_with_parts(ScriptedSensor::new(vec![]), routing, debounce)
}

pub fn engine_with_sensor(sensor: Arc<dyn PositionSensor>) -> Arc<Engine> {
    engine_with_parts(sensor, Unreachable::new(), Duration::ZERO)
}

pub fn engine_with_directory(
    buildings: Vec<Building>,
    boundary: Option<CampusBoundary>,
) -> Engine {
    Engine::new(
        GeoPositionProvider::new(
            ScriptedSensor::new(vec![]),
            geolocator(),
            RetryPolicy::default(),
            SensorOptions::default(),
        ),
        RouteFetcher::new(Unreachable::new(), FallbackPace::default(), Duration::from_secs(10)),
        RecalculationPolicy::default(),
        Arc::new(StaticDirectory {
            buildings,
            boundary,
        }),
    )
}
