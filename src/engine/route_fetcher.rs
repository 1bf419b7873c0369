use std::sync::Arc;
use std::time::Duration;

use super::directions::synthesized_steps;

use crate::{
    entities::{GeoPoint, Route, RouteSource, TransportMode},
    error::{no_route_found_error, Error},
    external::{CandidatePath, RoutingEngine},
};

/// Engine geometry that stops further than this from an endpoint gets the endpoint attached.
const ENDPOINT_TOLERANCE_METERS: f64 = 0.5;

/// Pace used to estimate durations of approximated routes. Not validated pacing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallbackPace {
    pub walking_minutes_per_km: f64,
    pub driving_minutes_per_km: f64,
}

impl Default for FallbackPace {
    fn default() -> Self {
        Self {
            walking_minutes_per_km: 12.0,
            driving_minutes_per_km: 2.0,
        }
    }
}

impl FallbackPace {
    pub fn minutes_per_km(&self, mode: TransportMode) -> f64 {
        match mode {
            TransportMode::Walking => self.walking_minutes_per_km,
            TransportMode::Driving => self.driving_minutes_per_km,
        }
    }

    pub fn duration_seconds(&self, distance_meters: f64, mode: TransportMode) -> f64 {
        (distance_meters / 1000.0 * self.minutes_per_km(mode) * 60.0).max(0.0)
    }
}

pub struct RouteFetcher {
    engine: Arc<dyn RoutingEngine>,
    pace: FallbackPace,
    timeout: Duration,
}

impl RouteFetcher {
    pub fn new(engine: Arc<dyn RoutingEngine>, pace: FallbackPace, timeout: Duration) -> Self {
        Self {
            engine,
            pace,
            timeout,
        }
    }

    /// Resolves a route from the routing engine, or approximates one when it cannot.
    ///
    /// Only invalid coordinates fail; every other problem degrades to a
    /// straight-line route marked [`RouteSource::Approximated`].
    #[tracing::instrument(skip(self))]
    pub async fn compute_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        mode: TransportMode,
    ) -> Result<Route, Error> {
        origin.validate()?;
        destination.validate()?;

        let result = match tokio::time::timeout(
            self.timeout,
            self.engine.candidate_paths(origin, destination, mode),
        )
        .await
        {
            Ok(result) => result,
            Err(elapsed) => Err(elapsed.into()),
        };

        match result.and_then(shortest_path) {
            Ok(path) => Ok(computed_route(path, origin, destination, mode)),
            Err(err) => {
                tracing::warn!("routing engine failed: {}, approximating route", err);
                Ok(self.approximate_route(origin, destination, mode))
            }
        }
    }

    pub fn approximate_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        mode: TransportMode,
    ) -> Route {
        let geometry = vec![origin, destination];
        let distance_meters = origin.haversine_distance(&destination);
        let duration_seconds = self.pace.duration_seconds(distance_meters, mode);
        let steps = synthesized_steps(&geometry, distance_meters, duration_seconds, mode);

        Route::new(
            geometry,
            distance_meters,
            duration_seconds,
            steps,
            RouteSource::Approximated,
            mode,
        )
    }
}

/// First candidate with the smallest finite distance.
fn shortest_path(paths: Vec<CandidatePath>) -> Result<CandidatePath, Error> {
    let mut best: Option<CandidatePath> = None;

    for path in paths {
        if !path.distance_meters.is_finite() || path.geometry.is_empty() {
            continue;
        }

        match &best {
            Some(current) if path.distance_meters >= current.distance_meters => (),
            _ => best = Some(path),
        }
    }

    best.ok_or_else(no_route_found_error)
}

fn computed_route(
    path: CandidatePath,
    origin: GeoPoint,
    destination: GeoPoint,
    mode: TransportMode,
) -> Route {
    let mut geometry = path.geometry;

    // engines snap to the road network; keep the line attached to both endpoints
    if !geometry
        .first()
        .map(|first| first.approx_eq(&origin, ENDPOINT_TOLERANCE_METERS))
        .unwrap_or(false)
    {
        geometry.insert(0, origin);
    }

    if !geometry
        .last()
        .map(|last| last.approx_eq(&destination, ENDPOINT_TOLERANCE_METERS))
        .unwrap_or(false)
    {
        geometry.push(destination);
    }

    // a single snapped point can sit within tolerance of two nearby endpoints
    if geometry.len() < 2 {
        geometry = vec![origin, destination];
    }

    Route::new(
        geometry,
        path.distance_meters,
        path.duration_seconds.max(0.0),
        path.steps,
        RouteSource::Computed,
        mode,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RouteStep;
    use crate::testing::{DelayedEngine, Unreachable};
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;

    struct Candidates(Vec<CandidatePath>);

    #[async_trait]
    impl RoutingEngine for Candidates {
        async fn candidate_paths(
            &self,
            _: GeoPoint,
            _: GeoPoint,
            _: TransportMode,
        ) -> Result<Vec<CandidatePath>, Error> {
            Ok(self.0.clone())
        }
    }

    fn origin() -> GeoPoint {
        GeoPoint::new(6.5200, 3.3750)
    }

    fn destination() -> GeoPoint {
        GeoPoint::new(6.5210, 3.3790)
    }

    fn path(distance_meters: f64, via: GeoPoint) -> CandidatePath {
        CandidatePath {
            geometry: vec![
                GeoPoint::new(6.52003, 3.37502),
                via,
                GeoPoint::new(6.52098, 3.37897),
            ],
            distance_meters,
            duration_seconds: distance_meters / 1.4,
            steps: vec![RouteStep::new("Head out on College Road".into(), Some(distance_meters))],
        }
    }

    fn fetcher(engine: Arc<dyn RoutingEngine>) -> RouteFetcher {
        RouteFetcher::new(engine, FallbackPace::default(), Duration::from_secs(10))
    }

    #[tokio::test]
    async fn unreachable_engine_yields_approximated_walking_route() {
        let engine = Unreachable::new();
        let fetcher = fetcher(engine.clone());

        let route = fetcher
            .compute_route(origin(), destination(), TransportMode::Walking)
            .await
            .unwrap();

        let expected = origin().haversine_distance(&destination());

        assert_eq!(route.source, RouteSource::Approximated);
        assert_eq!(route.geometry, vec![origin(), destination()]);
        assert!((route.distance_meters - expected).abs() / expected < 0.01);

        let expected_duration = route.distance_meters / 1000.0 * 12.0 * 60.0;
        assert!((route.duration_seconds - expected_duration).abs() < 1e-6);

        assert!(!route.steps.is_empty());
        assert_eq!(
            route.steps[0].instruction_text,
            "Start by heading East toward your destination."
        );
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn driving_fallback_uses_driving_pace() {
        let fetcher = fetcher(Unreachable::new());

        let route = fetcher
            .compute_route(origin(), destination(), TransportMode::Driving)
            .await
            .unwrap();

        let expected_duration = route.distance_meters / 1000.0 * 2.0 * 60.0;
        assert!((route.duration_seconds - expected_duration).abs() < 1e-6);
        assert_eq!(route.mode, TransportMode::Driving);
    }

    #[tokio::test]
    async fn fallback_is_deterministic() {
        let fetcher = fetcher(Unreachable::new());

        let first = fetcher
            .compute_route(origin(), destination(), TransportMode::Walking)
            .await
            .unwrap();
        let second = fetcher
            .compute_route(origin(), destination(), TransportMode::Walking)
            .await
            .unwrap();

        assert_eq!(first.geometry, second.geometry);
        assert_eq!(first.distance_meters, second.distance_meters);
        assert_eq!(first.duration_seconds, second.duration_seconds);
        assert_eq!(first.steps, second.steps);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn invalid_endpoints_never_reach_the_engine() {
        let engine = Unreachable::new();
        let fetcher = fetcher(engine.clone());

        let err = fetcher
            .compute_route(
                GeoPoint::new(f64::NAN, 3.375),
                destination(),
                TransportMode::Walking,
            )
            .await
            .unwrap_err();
        assert!(err.is_invalid_endpoint());

        let err = fetcher
            .compute_route(origin(), GeoPoint::new(6.52, 200.0), TransportMode::Walking)
            .await
            .unwrap_err();
        assert!(err.is_invalid_endpoint());

        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn shortest_candidate_wins_and_is_anchored_to_endpoints() {
        let long = path(700.0, GeoPoint::new(6.5230, 3.3770));
        let short = path(480.0, GeoPoint::new(6.5204, 3.3770));
        let tie = path(480.0, GeoPoint::new(6.5190, 3.3770));
        let fetcher = fetcher(Arc::new(Candidates(vec![long, short.clone(), tie])));

        let route = fetcher
            .compute_route(origin(), destination(), TransportMode::Walking)
            .await
            .unwrap();

        assert_eq!(route.source, RouteSource::Computed);
        assert_eq!(route.distance_meters, 480.0);
        assert_eq!(route.steps, short.steps);
        assert_eq!(route.geometry.first(), Some(&origin()));
        assert_eq!(route.geometry.last(), Some(&destination()));
        assert_eq!(route.geometry[2], GeoPoint::new(6.5204, 3.3770));
    }

    #[tokio::test]
    async fn empty_candidate_list_is_approximated() {
        let fetcher = fetcher(Arc::new(Candidates(vec![])));

        let route = fetcher
            .compute_route(origin(), destination(), TransportMode::Walking)
            .await
            .unwrap();

        assert!(route.is_approximated());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_engine_times_out_into_fallback() {
        let engine = DelayedEngine::new(|_| Duration::from_secs(60));
        let fetcher = fetcher(engine.clone());

        let route = fetcher
            .compute_route(origin(), destination(), TransportMode::Walking)
            .await
            .unwrap();

        assert!(route.is_approximated());
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn computed_geometry_already_at_endpoints_is_kept() {
        let engine = DelayedEngine::new(|_| Duration::ZERO);
        let fetcher = fetcher(engine);

        let route = fetcher
            .compute_route(origin(), destination(), TransportMode::Driving)
            .await
            .unwrap();

        assert_eq!(route.source, RouteSource::Computed);
        assert_eq!(route.geometry.len(), 3);
        assert_eq!(route.geometry[0], origin());
        assert_eq!(route.geometry[2], destination());
    }

    #[tokio::test]
    async fn single_point_geometry_still_has_two_ends() {
        let from = origin();
        let to = GeoPoint::new(from.lat + 0.000005, from.lng);
        let snapped = GeoPoint::new(from.lat + 0.0000025, from.lng);

        let fetcher = fetcher(Arc::new(Candidates(vec![CandidatePath {
            geometry: vec![snapped],
            distance_meters: 0.5,
            duration_seconds: 1.0,
            steps: vec![],
        }])));

        let route = fetcher
            .compute_route(from, to, TransportMode::Walking)
            .await
            .unwrap();

        assert_eq!(route.source, RouteSource::Computed);
        assert_eq!(route.geometry, vec![from, to]);
    }
}
