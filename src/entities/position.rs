use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::entities::GeoPoint;

/// A single position reading. Later readings supersede it; it is never mutated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
    pub captured_at_epoch_ms: i64,
}

impl GeoPosition {
    /// Negative or non-finite accuracies are clamped to zero.
    pub fn new(latitude: f64, longitude: f64, accuracy_meters: f64, captured_at_epoch_ms: i64) -> Self {
        let accuracy_meters = if accuracy_meters.is_finite() {
            accuracy_meters.max(0.0)
        } else {
            0.0
        };

        Self {
            latitude,
            longitude,
            accuracy_meters,
            captured_at_epoch_ms,
        }
    }

    pub fn captured_now(latitude: f64, longitude: f64, accuracy_meters: f64) -> Self {
        Self::new(latitude, longitude, accuracy_meters, Utc::now().timestamp_millis())
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    pub fn age_ms(&self, now_epoch_ms: i64) -> i64 {
        (now_epoch_ms - self.captured_at_epoch_ms).max(0)
    }

    /// Map zoom level for centering on this position; tighter for better accuracy.
    pub fn display_zoom(&self) -> u8 {
        match self.accuracy_meters {
            a if a <= 10.0 => 19,
            a if a <= 50.0 => 18,
            a if a <= 100.0 => 17,
            a if a <= 500.0 => 16,
            a if a <= 2000.0 => 15,
            _ => 13,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMethod {
    BrowserSensor,
    IpEstimate,
}

impl AcquisitionMethod {
    pub fn other(&self) -> Self {
        match self {
            Self::BrowserSensor => Self::IpEstimate,
            Self::IpEstimate => Self::BrowserSensor,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum AcquisitionStatus {
    Idle,
    Acquiring { method: AcquisitionMethod },
    Resolved { position: GeoPosition },
    Failed { reason: String },
}

/// Non-fatal conditions worth a short-lived notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Notice {
    UsingApproximateLocation,
    SensorPermissionDenied,
    SensorRetriesExhausted { attempts: u32 },
    /// The routing engine could not be used; the route is a straight-line estimate.
    ApproximateRoute,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acquisition {
    pub position: GeoPosition,
    pub method: AcquisitionMethod,
    pub zoom: u8,
    pub notices: Vec<Notice>,
}
