use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::entities::{GeoPosition, Route};

/// What a display surface renders: where the user is and the active route.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSnapshot {
    pub position: Option<GeoPosition>,
    pub position_updated_at: Option<DateTime<Utc>>,
    pub route: Option<Arc<Route>>,
    pub route_updated_at: Option<DateTime<Utc>>,
    /// A route computation is pending; panels show a placeholder meanwhile.
    pub calculating: bool,
}

/// Shared state written only through whole-field replacements.
///
/// Readers hold a [`watch::Receiver`] and cannot write back.
#[derive(Debug)]
pub struct RouteState {
    sender: watch::Sender<RouteSnapshot>,
}

impl Default for RouteState {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteState {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(RouteSnapshot::default());

        Self { sender }
    }

    pub fn set_position(&self, position: GeoPosition) {
        self.sender.send_modify(|snapshot| {
            snapshot.position = Some(position);
            snapshot.position_updated_at = Some(Utc::now());
        });
    }

    pub fn set_calculating(&self, calculating: bool) {
        self.sender.send_if_modified(|snapshot| {
            let changed = snapshot.calculating != calculating;
            snapshot.calculating = calculating;
            changed
        });
    }

    /// Installs `route` as the active one and ends any pending computation.
    pub fn set_route(&self, route: Route) -> Arc<Route> {
        let route = Arc::new(route);

        self.sender.send_modify(|snapshot| {
            snapshot.route = Some(route.clone());
            snapshot.route_updated_at = Some(Utc::now());
            snapshot.calculating = false;
        });

        route
    }

    pub fn clear_route(&self) {
        self.sender.send_modify(|snapshot| {
            snapshot.route = None;
            snapshot.route_updated_at = Some(Utc::now());
            snapshot.calculating = false;
        });
    }

    pub fn snapshot(&self) -> RouteSnapshot {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RouteSnapshot> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{GeoPoint, RouteSource, TransportMode};

    fn route() -> Route {
        Route::new(
            vec![GeoPoint::new(6.52, 3.375), GeoPoint::new(6.521, 3.379)],
            450.0,
            320.0,
            vec![],
            RouteSource::Computed,
            TransportMode::Walking,
        )
    }

    #[test]
    fn writes_replace_fields_and_stamp_times() {
        let state = RouteState::new();
        assert_eq!(state.snapshot(), RouteSnapshot::default());

        let position = GeoPosition::captured_now(6.52, 3.375, 12.0);
        state.set_position(position);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.position, Some(position));
        assert!(snapshot.position_updated_at.is_some());
        assert!(snapshot.route.is_none());
        assert!(snapshot.route_updated_at.is_none());

        let applied = state.set_route(route());
        let snapshot = state.snapshot();
        assert_eq!(snapshot.route.as_deref(), Some(applied.as_ref()));
        assert_eq!(snapshot.position, Some(position));

        state.clear_route();
        let snapshot = state.snapshot();
        assert!(snapshot.route.is_none());
        assert!(snapshot.route_updated_at.is_some());
    }

    #[test]
    fn subscribers_see_every_change() {
        let state = RouteState::new();
        let mut updates = state.subscribe();

        tokio_test::block_on(async {
            state.set_calculating(true);
            updates.changed().await.unwrap();
            assert!(updates.borrow().calculating);

            let applied = state.set_route(route());
            updates.changed().await.unwrap();
            assert_eq!(
                updates.borrow().route.as_ref().map(|route| route.id),
                Some(applied.id)
            );
            assert!(!updates.borrow().calculating);

            state.clear_route();
            updates.changed().await.unwrap();
            assert!(updates.borrow().route.is_none());
        });
    }

    #[test]
    fn repeated_calculating_flag_is_not_republished() {
        let state = RouteState::new();
        let updates = state.subscribe();

        state.set_calculating(false);
        assert!(!updates.has_changed().unwrap());

        state.set_calculating(true);
        assert!(updates.has_changed().unwrap());

        state.clear_route();
        assert!(!state.snapshot().calculating);
    }
}
