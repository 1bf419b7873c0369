use geo_types::{Coord, LineString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::GeoPoint;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Walking,
    Driving,
}

impl Default for TransportMode {
    fn default() -> Self {
        Self::Walking
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolylineStyle {
    pub color: String,
    pub weight: u8,
    pub opacity: f32,
    pub dash_array: Option<String>,
}

impl TransportMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Driving => "driving",
        }
    }

    pub fn polyline_style(&self) -> PolylineStyle {
        match self {
            Self::Walking => PolylineStyle {
                color: "#3498DB".into(),
                weight: 5,
                opacity: 0.7,
                dash_array: Some("5,10".into()),
            },
            Self::Driving => PolylineStyle {
                color: "#2C3E50".into(),
                weight: 6,
                opacity: 0.8,
                dash_array: None,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    Computed,
    Approximated,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    pub instruction_text: String,
    pub step_distance_meters: Option<f64>,
}

impl RouteStep {
    pub fn new(instruction_text: String, step_distance_meters: Option<f64>) -> Self {
        Self {
            instruction_text,
            step_distance_meters,
        }
    }
}

/// A computed path. Every (re)computation produces a fresh `Route`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: Uuid,
    pub geometry: Vec<GeoPoint>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub steps: Vec<RouteStep>,
    pub source: RouteSource,
    pub mode: TransportMode,
}

impl Route {
    pub fn new(
        geometry: Vec<GeoPoint>,
        distance_meters: f64,
        duration_seconds: f64,
        steps: Vec<RouteStep>,
        source: RouteSource,
        mode: TransportMode,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            geometry,
            distance_meters,
            duration_seconds,
            steps,
            source,
            mode,
        }
    }

    pub fn is_approximated(&self) -> bool {
        self.source == RouteSource::Approximated
    }

    /// Whole minutes, rounded up so short routes never read "0 minutes".
    pub fn duration_minutes(&self) -> u64 {
        duration_minutes(self.duration_seconds)
    }

    pub fn line_string(&self) -> LineString<f64> {
        self.geometry
            .iter()
            .map(|point| Coord::<f64>::from(*point))
            .collect()
    }
}

pub fn duration_minutes(duration_seconds: f64) -> u64 {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return 0;
    }

    (duration_seconds / 60.0).ceil() as u64
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecalculationRequest {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub mode: TransportMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_round_up() {
        assert_eq!(duration_minutes(0.0), 0);
        assert_eq!(duration_minutes(1.0), 1);
        assert_eq!(duration_minutes(60.0), 1);
        assert_eq!(duration_minutes(61.0), 2);
        assert_eq!(duration_minutes(-5.0), 0);
        assert_eq!(duration_minutes(f64::NAN), 0);
    }

    #[test]
    fn line_string_uses_lng_as_x() {
        let route = Route::new(
            vec![GeoPoint::new(6.52, 3.375), GeoPoint::new(6.521, 3.379)],
            450.0,
            300.0,
            vec![],
            RouteSource::Approximated,
            TransportMode::Walking,
        );

        let line = route.line_string();
        assert_eq!(line.0.len(), 2);
        assert_eq!(line.0[0].x, 3.375);
        assert_eq!(line.0[1].y, 6.521);
    }

    #[test]
    fn each_route_gets_its_own_id() {
        let make = || {
            Route::new(
                vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)],
                1.0,
                1.0,
                vec![],
                RouteSource::Computed,
                TransportMode::Driving,
            )
        };

        assert_ne!(make().id, make().id);
    }

    #[test]
    fn walking_line_is_dashed() {
        assert!(TransportMode::Walking.polyline_style().dash_array.is_some());
        assert!(TransportMode::Driving.polyline_style().dash_array.is_none());
    }
}
