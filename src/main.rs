use std::sync::Arc;

use wayfinder::config::Config;
use wayfinder::engine::Engine;
use wayfinder::error::Error;
use wayfinder::external::{IpGeolocator, ReportedSensor};
use wayfinder::server::serve;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let sensor = Arc::new(ReportedSensor::new());
    let geolocator = IpGeolocator::with_default_resolvers(config.ip_resolver_timeout)?;

    let engine = Engine::from_config(&config, sensor.clone(), geolocator.clone())?;

    let mut updates = engine.state().subscribe();
    tokio::spawn(async move {
        let mut route_updated_at = None;

        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow().clone();

            // position-only updates
            if snapshot.route_updated_at == route_updated_at {
                continue;
            }
            route_updated_at = snapshot.route_updated_at;

            match snapshot.route {
                Some(route) => tracing::info!(
                    id = %route.id,
                    source = ?route.source,
                    distance_meters = route.distance_meters,
                    "active route updated"
                ),
                None => tracing::info!("no active route"),
            }
        }
    });

    serve(engine, Arc::new(geolocator), sensor, config.addr).await
}
