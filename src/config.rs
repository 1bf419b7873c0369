use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::engine::{FallbackPace, DEFAULT_DEBOUNCE, DEFAULT_MOVEMENT_THRESHOLD_METERS};
use crate::error::{config_error, Error};

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub addr: SocketAddr,
    pub osrm_api_base: String,
    pub osrm_walking_profile: String,
    pub osrm_driving_profile: String,
    pub buildings_api_base: String,
    pub routing_timeout: Duration,
    pub ip_resolver_timeout: Duration,
    pub pace: FallbackPace,
    pub debounce: Duration,
    pub movement_threshold_meters: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            osrm_api_base: "https://router.project-osrm.org".into(),
            osrm_walking_profile: "foot".into(),
            osrm_driving_profile: "driving".into(),
            buildings_api_base: "https://navigationbackend.onrender.com".into(),
            routing_timeout: Duration::from_secs(10),
            ip_resolver_timeout: Duration::from_secs(5),
            pace: FallbackPace::default(),
            debounce: DEFAULT_DEBOUNCE,
            movement_threshold_meters: DEFAULT_MOVEMENT_THRESHOLD_METERS,
        }
    }
}

impl Config {
    /// Reads the process environment; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let defaults = Self::default();

        let millis = |key: &str, default: Duration| -> Result<Duration, Error> {
            let ms = parse_or(&lookup, key, default.as_millis() as u64)?;
            Ok(Duration::from_millis(ms))
        };

        Ok(Self {
            addr: parse_or(&lookup, "WAYFINDER_ADDR", defaults.addr)?,
            osrm_api_base: var_or(&lookup, "OSRM_API_BASE", defaults.osrm_api_base)?,
            osrm_walking_profile: var_or(
                &lookup,
                "OSRM_WALKING_PROFILE",
                defaults.osrm_walking_profile,
            )?,
            osrm_driving_profile: var_or(
                &lookup,
                "OSRM_DRIVING_PROFILE",
                defaults.osrm_driving_profile,
            )?,
            buildings_api_base: var_or(&lookup, "BUILDINGS_API_BASE", defaults.buildings_api_base)?,
            routing_timeout: millis("ROUTING_TIMEOUT_MS", defaults.routing_timeout)?,
            ip_resolver_timeout: millis("IP_RESOLVER_TIMEOUT_MS", defaults.ip_resolver_timeout)?,
            pace: FallbackPace {
                walking_minutes_per_km: positive_or(
                    &lookup,
                    "WALKING_MINUTES_PER_KM",
                    defaults.pace.walking_minutes_per_km,
                )?,
                driving_minutes_per_km: positive_or(
                    &lookup,
                    "DRIVING_MINUTES_PER_KM",
                    defaults.pace.driving_minutes_per_km,
                )?,
            },
            debounce: millis("RECALCULATION_DEBOUNCE_MS", defaults.debounce)?,
            movement_threshold_meters: positive_or(
                &lookup,
                "MOVEMENT_THRESHOLD_METERS",
                defaults.movement_threshold_meters,
            )?,
        })
    }
}

fn var_or<F>(lookup: &F, key: &str, default: String) -> Result<String, Error>
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match lookup(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().into()),
        Ok(_) | Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err.into()),
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, Error>
where
    F: Fn(&str) -> Result<String, env::VarError>,
    T: FromStr,
{
    match lookup(key) {
        Ok(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|_| config_error(key))
        }
        Ok(_) | Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err.into()),
    }
}

fn positive_or<F>(lookup: &F, key: &str, default: f64) -> Result<f64, Error>
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    let value: f64 = parse_or(lookup, key, default)?;

    if !value.is_finite() || value <= 0.0 {
        return Err(config_error(key));
    }

    Ok(value)
}
