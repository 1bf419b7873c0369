use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    entities::{GeoPoint, GeoPosition},
    error::{upstream_error, Error},
    external::IpResolver,
};

/// Accuracy assigned to every IP-based estimate.
pub const IP_ESTIMATE_ACCURACY_METERS: f64 = 500.0;

/// Approximate campus location (Yaba College of Technology, Lagos).
pub const CAMPUS_FALLBACK: GeoPoint = GeoPoint {
    lat: 6.5200,
    lng: 3.3750,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IpLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl IpLocation {
    fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
        city: Option<String>,
        region: Option<String>,
        country: Option<String>,
    ) -> Result<Self, Error> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude))
                if GeoPoint::new(latitude, longitude).is_valid() =>
            {
                Ok(Self {
                    latitude,
                    longitude,
                    city,
                    region,
                    country,
                })
            }
            _ => Err(upstream_error()),
        }
    }
}

/// ipapi.co, keyless.
#[derive(Clone, Debug)]
pub struct IpApiCo {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct IpApiCoResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    region: Option<String>,
    country_name: Option<String>,
}

impl IpApiCo {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IpResolver for IpApiCo {
    fn name(&self) -> &str {
        "ipapi.co"
    }

    #[tracing::instrument(skip(self))]
    async fn resolve(&self, ip: Option<IpAddr>) -> Result<IpLocation, Error> {
        let url = match ip {
            Some(ip) => format!("https://ipapi.co/{}/json/", ip),
            None => "https://ipapi.co/json/".into(),
        };

        let res = self.client.get(url).send().await?;

        if !res.status().is_success() {
            return Err(upstream_error());
        }

        let data: IpApiCoResponse = res.json().await?;

        IpLocation::from_parts(
            data.latitude,
            data.longitude,
            data.city,
            data.region,
            data.country_name,
        )
    }
}

/// ip-api.com, keyless and rate limited.
#[derive(Clone, Debug)]
pub struct IpApiCom {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiComResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    region_name: Option<String>,
    country: Option<String>,
}

impl IpApiCom {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IpResolver for IpApiCom {
    fn name(&self) -> &str {
        "ip-api.com"
    }

    #[tracing::instrument(skip(self))]
    async fn resolve(&self, ip: Option<IpAddr>) -> Result<IpLocation, Error> {
        let url = match ip {
            Some(ip) => format!("http://ip-api.com/json/{}", ip),
            None => "http://ip-api.com/json/".into(),
        };

        let res = self.client.get(url).send().await?;

        if !res.status().is_success() {
            return Err(upstream_error());
        }

        let data: IpApiComResponse = res.json().await?;

        if data.status != "success" {
            return Err(upstream_error());
        }

        IpLocation::from_parts(data.lat, data.lon, data.city, data.region_name, data.country)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IpEstimate {
    pub location: IpLocation,
    /// Name of the resolver that answered, `None` for the campus fallback.
    pub resolved_by: Option<String>,
}

impl IpEstimate {
    pub fn is_fallback(&self) -> bool {
        self.resolved_by.is_none()
    }

    pub fn position(&self) -> GeoPosition {
        GeoPosition::captured_now(
            self.location.latitude,
            self.location.longitude,
            IP_ESTIMATE_ACCURACY_METERS,
        )
    }
}

/// Tries each resolver in order, then settles on a fixed fallback coordinate.
#[derive(Clone)]
pub struct IpGeolocator {
    resolvers: Vec<Arc<dyn IpResolver>>,
    fallback: GeoPoint,
    timeout: Duration,
}

impl IpGeolocator {
    pub fn new(resolvers: Vec<Arc<dyn IpResolver>>, fallback: GeoPoint, timeout: Duration) -> Self {
        Self {
            resolvers,
            fallback,
            timeout,
        }
    }

    pub fn with_default_resolvers(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self::new(
            vec![
                Arc::new(IpApiCo::new(client.clone())),
                Arc::new(IpApiCom::new(client)),
            ],
            CAMPUS_FALLBACK,
            timeout,
        ))
    }

    #[tracing::instrument(skip(self))]
    pub async fn locate(&self, ip: Option<IpAddr>) -> IpEstimate {
        for resolver in self.resolvers.iter() {
            let result = match tokio::time::timeout(self.timeout, resolver.resolve(ip)).await {
                Ok(result) => result,
                Err(elapsed) => Err(elapsed.into()),
            };

            match result {
                Ok(location) => {
                    tracing::info!("location found via {}", resolver.name());
                    return IpEstimate {
                        location,
                        resolved_by: Some(resolver.name().into()),
                    };
                }
                Err(err) => {
                    tracing::warn!("{} failed: {}, trying next resolver", resolver.name(), err);
                }
            }
        }

        tracing::warn!("all ip resolvers failed, using campus fallback location");

        IpEstimate {
            location: IpLocation {
                latitude: self.fallback.lat,
                longitude: self.fallback.lng,
                city: Some("Lagos".into()),
                region: Some("Lagos".into()),
                country: Some("Nigeria".into()),
            },
            resolved_by: None,
        }
    }
}
