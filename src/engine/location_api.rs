use super::Engine;

use async_trait::async_trait;
use std::net::IpAddr;

use crate::{
    api::LocationAPI,
    entities::{Acquisition, AcquisitionMethod, AcquisitionStatus, GeoPosition},
    error::Error,
};

#[async_trait]
impl LocationAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn acquire_position(
        &self,
        method: Option<AcquisitionMethod>,
        client_ip: Option<IpAddr>,
    ) -> Result<Acquisition, Error> {
        let method = match method {
            Some(method) => method,
            None => self.provider.preferred_method()?,
        };

        self.provider.set_client_ip(client_ip)?;

        let acquisition = self.provider.acquire(method).await?;
        self.state.set_position(acquisition.position);

        Ok(acquisition)
    }

    #[tracing::instrument(skip(self))]
    async fn current_position(&self) -> Result<Option<GeoPosition>, Error> {
        self.provider.last_known()
    }

    #[tracing::instrument(skip(self))]
    async fn acquisition_status(&self) -> Result<AcquisitionStatus, Error> {
        self.provider.status()
    }

    #[tracing::instrument(skip(self))]
    async fn toggle_method(&self) -> Result<AcquisitionMethod, Error> {
        self.provider.toggle_method()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Notice;
    use crate::error::sensor_permission_denied_error;
    use crate::testing::{engine_with_sensor, ScriptedSensor};

    #[tokio::test]
    async fn acquired_position_is_published() {
        let fix = GeoPosition::captured_now(6.5191, 3.3762, 25.0);
        let engine = engine_with_sensor(ScriptedSensor::new(vec![Ok(fix)]));
        let mut updates = engine.state().subscribe();

        let acquisition = engine.acquire_position(None, None).await.unwrap();

        assert_eq!(acquisition.position, fix);
        assert_eq!(acquisition.zoom, 18);
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow().position, Some(fix));
        assert_eq!(engine.current_position().await.unwrap(), Some(fix));
        assert_eq!(
            engine.acquisition_status().await.unwrap(),
            AcquisitionStatus::Resolved { position: fix }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn denied_sensor_cannot_be_toggled_back() {
        let engine = engine_with_sensor(ScriptedSensor::new(vec![Err(
            sensor_permission_denied_error(),
        )]));

        let acquisition = engine
            .acquire_position(Some(AcquisitionMethod::BrowserSensor), None)
            .await
            .unwrap();

        assert_eq!(acquisition.method, AcquisitionMethod::IpEstimate);
        assert_eq!(acquisition.position.accuracy_meters, 500.0);
        assert!(acquisition.notices.contains(&Notice::SensorPermissionDenied));

        let err = engine.toggle_method().await.unwrap_err();
        assert!(err.is_sensor_permission_denied());
    }
}
