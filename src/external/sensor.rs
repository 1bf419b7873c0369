use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::watch;

use crate::{
    entities::GeoPosition,
    error::{
        sensor_permission_denied_error, sensor_timeout_error, sensor_unavailable_error,
        unexpected_error, Error,
    },
    external::{PositionSensor, SensorOptions},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorAvailability {
    Available,
    PermissionDenied,
    Unavailable,
}

/// A device sensor fed by fixes that the client device reports.
#[derive(Debug)]
pub struct ReportedSensor {
    readings: watch::Sender<Option<GeoPosition>>,
    availability: Mutex<SensorAvailability>,
}

impl Default for ReportedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportedSensor {
    pub fn new() -> Self {
        let (readings, _) = watch::channel(None);

        Self {
            readings,
            availability: Mutex::new(SensorAvailability::Available),
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn report(&self, position: GeoPosition) -> Result<(), Error> {
        self.set_availability(SensorAvailability::Available)?;
        self.readings.send_replace(Some(position));

        Ok(())
    }

    pub fn set_availability(&self, availability: SensorAvailability) -> Result<(), Error> {
        let mut current = self.availability.lock().map_err(|_| unexpected_error())?;
        *current = availability;

        Ok(())
    }

    pub fn availability(&self) -> Result<SensorAvailability, Error> {
        let current = self.availability.lock().map_err(|_| unexpected_error())?;

        Ok(*current)
    }
}

#[async_trait]
impl PositionSensor for ReportedSensor {
    #[tracing::instrument(skip(self))]
    async fn fix(&self, options: &SensorOptions) -> Result<GeoPosition, Error> {
        match self.availability()? {
            SensorAvailability::PermissionDenied => return Err(sensor_permission_denied_error()),
            SensorAvailability::Unavailable => return Err(sensor_unavailable_error()),
            SensorAvailability::Available => (),
        }

        let mut readings = self.readings.subscribe();
        let cached = *readings.borrow_and_update();

        if let Some(position) = cached {
            let max_age_ms = options.maximum_age.as_millis() as i64;

            if position.age_ms(Utc::now().timestamp_millis()) <= max_age_ms {
                return Ok(position);
            }
        }

        match tokio::time::timeout(options.timeout, readings.changed()).await {
            Ok(Ok(())) => (*readings.borrow()).ok_or_else(sensor_unavailable_error),
            Ok(Err(_)) => Err(sensor_unavailable_error()),
            Err(_) => Err(sensor_timeout_error()),
        }
    }
}
