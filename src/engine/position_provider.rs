use chrono::Utc;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::{
    entities::{Acquisition, AcquisitionMethod, AcquisitionStatus, GeoPosition, Notice},
    error::{sensor_permission_denied_error, sensor_timeout_error, unexpected_error, Error},
    external::{IpGeolocator, PositionSensor, SensorOptions},
};

/// Attempt cap and exponential backoff schedule for transient sensor failures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt numbered `attempt` (starting at 1).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));

        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
    }

    pub fn should_retry(&self, attempt: u32, err: &Error) -> bool {
        err.is_transient_sensor_error() && attempt < self.max_attempts
    }
}

#[derive(Debug)]
struct SensorFailure {
    error: Error,
    attempts: u32,
}

#[derive(Debug)]
struct ProviderState {
    status: AcquisitionStatus,
    preferred: AcquisitionMethod,
    // Set by a permission denial; lasts as long as this provider.
    sensor_disabled: bool,
    last_known: Option<GeoPosition>,
    client_ip: Option<IpAddr>,
}

pub struct GeoPositionProvider {
    sensor: Arc<dyn PositionSensor>,
    geolocator: IpGeolocator,
    retry: RetryPolicy,
    sensor_options: SensorOptions,
    state: Mutex<ProviderState>,
}

impl GeoPositionProvider {
    pub fn new(
        sensor: Arc<dyn PositionSensor>,
        geolocator: IpGeolocator,
        retry: RetryPolicy,
        sensor_options: SensorOptions,
    ) -> Self {
        Self {
            sensor,
            geolocator,
            retry,
            sensor_options,
            state: Mutex::new(ProviderState {
                status: AcquisitionStatus::Idle,
                preferred: AcquisitionMethod::BrowserSensor,
                sensor_disabled: false,
                last_known: None,
                client_ip: None,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ProviderState>, Error> {
        self.state.lock().map_err(|_| unexpected_error())
    }

    fn set_status(&self, status: AcquisitionStatus) -> Result<(), Error> {
        self.lock()?.status = status;
        Ok(())
    }

    pub fn status(&self) -> Result<AcquisitionStatus, Error> {
        Ok(self.lock()?.status.clone())
    }

    pub fn preferred_method(&self) -> Result<AcquisitionMethod, Error> {
        Ok(self.lock()?.preferred)
    }

    pub fn is_sensor_disabled(&self) -> Result<bool, Error> {
        Ok(self.lock()?.sensor_disabled)
    }

    pub fn last_known(&self) -> Result<Option<GeoPosition>, Error> {
        Ok(self.lock()?.last_known)
    }

    /// Last resolved position, if it is no older than the cached-fix allowance.
    pub fn fresh_position(&self) -> Result<Option<GeoPosition>, Error> {
        let max_age_ms = self.sensor_options.maximum_age.as_millis() as i64;
        let now = Utc::now().timestamp_millis();

        Ok(self
            .lock()?
            .last_known
            .filter(|position| position.age_ms(now) <= max_age_ms))
    }

    /// Address handed to the IP resolvers instead of the server's own.
    pub fn set_client_ip(&self, ip: Option<IpAddr>) -> Result<(), Error> {
        self.lock()?.client_ip = ip;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn toggle_method(&self) -> Result<AcquisitionMethod, Error> {
        let mut state = self.lock()?;
        let next = state.preferred.other();

        if next == AcquisitionMethod::BrowserSensor && state.sensor_disabled {
            tracing::warn!("sensor permission was denied, keeping ip estimate");
            return Err(sensor_permission_denied_error());
        }

        state.preferred = next;

        Ok(next)
    }

    #[tracing::instrument(skip(self))]
    pub async fn acquire(&self, preferred: AcquisitionMethod) -> Result<Acquisition, Error> {
        let (method, client_ip) = {
            let state = self.lock()?;
            let method = match preferred {
                AcquisitionMethod::BrowserSensor if state.sensor_disabled => {
                    AcquisitionMethod::IpEstimate
                }
                method => method,
            };

            (method, state.client_ip)
        };

        let mut notices = vec![];

        if method == AcquisitionMethod::BrowserSensor {
            self.set_status(AcquisitionStatus::Acquiring { method })?;

            match self.fix_with_retry().await {
                Ok(position) => return self.resolve(position, method, notices),
                Err(SensorFailure { error, attempts: _ }) if error.is_sensor_permission_denied() => {
                    tracing::warn!("sensor permission denied, switching to ip estimate for this session");

                    let mut state = self.lock()?;
                    state.sensor_disabled = true;
                    state.preferred = AcquisitionMethod::IpEstimate;
                    state.status = AcquisitionStatus::Failed {
                        reason: error.message.clone(),
                    };

                    notices.push(Notice::SensorPermissionDenied);
                }
                Err(SensorFailure { error, attempts }) => {
                    tracing::warn!(attempts, "sensor fix failed: {}, using ip estimate", error);

                    self.set_status(AcquisitionStatus::Failed {
                        reason: error.message.clone(),
                    })?;

                    notices.push(Notice::SensorRetriesExhausted { attempts });
                }
            }
        }

        self.set_status(AcquisitionStatus::Acquiring {
            method: AcquisitionMethod::IpEstimate,
        })?;

        let estimate = self.geolocator.locate(client_ip).await;

        if preferred == AcquisitionMethod::BrowserSensor || estimate.is_fallback() {
            notices.push(Notice::UsingApproximateLocation);
        }

        self.resolve(estimate.position(), AcquisitionMethod::IpEstimate, notices)
    }

    async fn fix_with_retry(&self) -> Result<GeoPosition, SensorFailure> {
        let mut attempt = 1;

        loop {
            let result = match tokio::time::timeout(
                self.sensor_options.timeout,
                self.sensor.fix(&self.sensor_options),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(sensor_timeout_error()),
            };

            match result {
                Ok(position) => return Ok(position),
                Err(error) if self.retry.should_retry(attempt, &error) => {
                    let delay = self.retry.backoff(attempt);
                    tracing::info!(attempt, ?delay, "sensor fix failed: {}, retrying", error);

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    return Err(SensorFailure {
                        error,
                        attempts: attempt,
                    })
                }
            }
        }
    }

    fn resolve(
        &self,
        position: GeoPosition,
        method: AcquisitionMethod,
        notices: Vec<Notice>,
    ) -> Result<Acquisition, Error> {
        let mut state = self.lock()?;
        state.last_known = Some(position);
        state.status = AcquisitionStatus::Resolved { position };

        Ok(Acquisition {
            position,
            method,
            zoom: position.display_zoom(),
            notices,
        })
    }
}
