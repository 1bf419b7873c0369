use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    entities::{GeoPoint, RouteStep, TransportMode},
    error::{invalid_input_error, no_route_found_error, upstream_error, Error},
    external::{CandidatePath, RoutingEngine},
};

#[derive(Clone, Debug)]
pub struct Osrm {
    client: reqwest::Client,
    api_base: String,
    walking_profile: String,
    driving_profile: String,
}

impl Osrm {
    pub fn new(
        api_base: String,
        walking_profile: String,
        driving_profile: String,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').into(),
            walking_profile,
            driving_profile,
        })
    }

    pub fn profile(&self, mode: TransportMode) -> &str {
        match mode {
            TransportMode::Walking => &self.walking_profile,
            TransportMode::Driving => &self.driving_profile,
        }
    }

    pub fn route_url(&self, origin: GeoPoint, destination: GeoPoint, mode: TransportMode) -> String {
        format!(
            "{}/route/v1/{}/{};{}",
            self.api_base,
            self.profile(mode),
            origin.to_lng_lat(),
            destination.to_lng_lat()
        )
    }
}

#[derive(Debug, Deserialize)]
struct Response {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    distance: f64,
    #[serde(default)]
    name: String,
    maneuver: OsrmManeuver,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    #[serde(rename = "type")]
    kind: String,
    modifier: Option<String>,
    instruction: Option<String>,
}

#[async_trait]
impl RoutingEngine for Osrm {
    #[tracing::instrument(skip(self))]
    async fn candidate_paths(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        mode: TransportMode,
    ) -> Result<Vec<CandidatePath>, Error> {
        let res = self
            .client
            .get(self.route_url(origin, destination, mode))
            .query(&[("alternatives", "true")])
            .query(&[("steps", "true")])
            .query(&[("geometries", "geojson")])
            .query(&[("overview", "full")])
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if status_code >= 400 && status_code < 500 {
            return Err(invalid_input_error());
        } else if status_code != 200 {
            return Err(upstream_error());
        }

        let data: Response = res.json().await?;

        paths_from_response(data)
    }
}

fn paths_from_response(data: Response) -> Result<Vec<CandidatePath>, Error> {
    match data.code.as_str() {
        "Ok" => (),
        "NoRoute" => return Err(no_route_found_error()),
        _ => return Err(upstream_error()),
    }

    if data.routes.is_empty() {
        return Err(no_route_found_error());
    }

    let paths = data
        .routes
        .into_iter()
        .map(|route| CandidatePath {
            geometry: route
                .geometry
                .coordinates
                .iter()
                .map(|[lng, lat]| GeoPoint::new(*lat, *lng))
                .collect(),
            distance_meters: route.distance,
            duration_seconds: route.duration,
            steps: route
                .legs
                .iter()
                .flat_map(|leg| leg.steps.iter())
                .map(|step| {
                    let text = match &step.maneuver.instruction {
                        Some(instruction) if !instruction.is_empty() => instruction.clone(),
                        _ => describe_maneuver(
                            &step.maneuver.kind,
                            step.maneuver.modifier.as_deref(),
                            &step.name,
                        ),
                    };

                    RouteStep::new(text, Some(step.distance))
                })
                .collect(),
        })
        .collect();

    Ok(paths)
}

/// Composes instruction text for maneuvers that came without any.
pub fn describe_maneuver(kind: &str, modifier: Option<&str>, name: &str) -> String {
    let onto = if name.is_empty() {
        String::new()
    } else {
        format!(" onto {}", name)
    };

    match (kind, modifier) {
        ("depart", _) if name.is_empty() => "Depart".into(),
        ("depart", _) => format!("Head out on {}", name),
        ("arrive", Some(side @ ("left" | "right"))) => {
            format!("Arrive at your destination on the {}", side)
        }
        ("arrive", _) => "Arrive at your destination".into(),
        (_, Some("uturn")) => format!("Make a U-turn{}", onto),
        ("roundabout" | "rotary", _) => format!("Enter the roundabout and take the exit{}", onto),
        ("new name", _) => format!("Continue{}", onto),
        ("fork", Some(modifier)) => format!("Keep {} at the fork{}", modifier, onto),
        ("end of road", Some(modifier)) => {
            format!("Turn {} at the end of the road{}", modifier, onto)
        }
        ("merge", Some(modifier)) => format!("Merge {}{}", modifier, onto),
        ("on ramp" | "off ramp", Some(modifier)) => format!("Take the ramp on the {}{}", modifier, onto),
        (_, Some("straight")) => format!("Continue straight{}", onto),
        (_, Some(modifier)) => format!("Turn {}{}", modifier, onto),
        (_, None) => format!("Continue{}", onto),
    }
}
