//! Human-readable turn guidance for a route.
//!
//! Engine-supplied steps are shown as they are, with their distance appended.
//! Routes without such steps get a short synthesized instruction set built
//! from the initial bearing, total distance and estimated duration.

use crate::{
    entities::{duration_minutes, CardinalDirection, GeoPoint, Route, RouteStep, TransportMode},
    error::{invalid_input_error, Error},
};

/// Formats meters as `"420 m"` below a kilometer and `"1.3 km"` above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{} m", meters.max(0.0).round() as u64)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// Ordered instruction lines for display; never empty.
pub fn directions(route: &Route) -> Vec<String> {
    let lines: Vec<String> = route
        .steps
        .iter()
        .filter(|step| !step.instruction_text.trim().is_empty())
        .map(step_line)
        .collect();

    if !lines.is_empty() {
        return lines;
    }

    synthesize(
        &route.geometry,
        route.distance_meters,
        route.duration_seconds,
        route.mode,
    )
}

fn step_line(step: &RouteStep) -> String {
    match step.step_distance_meters {
        Some(meters) if meters.is_finite() && meters > 0.0 => {
            format!("{} ({})", step.instruction_text, format_distance(meters))
        }
        _ => step.instruction_text.clone(),
    }
}

/// Instructions for a route the engine gave no guidance for.
pub fn synthesize(
    geometry: &[GeoPoint],
    distance_meters: f64,
    duration_seconds: f64,
    mode: TransportMode,
) -> Vec<String> {
    match try_synthesize(geometry, distance_meters, duration_seconds, mode) {
        Ok(lines) => lines,
        Err(err) => {
            tracing::warn!("could not synthesize directions: {}", err);
            fallback_directions()
        }
    }
}

pub fn synthesized_steps(
    geometry: &[GeoPoint],
    distance_meters: f64,
    duration_seconds: f64,
    mode: TransportMode,
) -> Vec<RouteStep> {
    synthesize(geometry, distance_meters, duration_seconds, mode)
        .into_iter()
        .map(|line| RouteStep::new(line, None))
        .collect()
}

pub fn fallback_directions() -> Vec<String> {
    vec![
        "Head toward your destination.".into(),
        "Follow the route line on the map.".into(),
    ]
}

fn try_synthesize(
    geometry: &[GeoPoint],
    distance_meters: f64,
    duration_seconds: f64,
    mode: TransportMode,
) -> Result<Vec<String>, Error> {
    let start = geometry.first().ok_or_else(invalid_input_error)?;
    // skip duplicated leading vertices, they carry no heading
    let next = geometry
        .iter()
        .skip(1)
        .find(|point| *point != start)
        .ok_or_else(invalid_input_error)?;

    let direction = CardinalDirection::from_bearing(start.initial_bearing(next))
        .ok_or_else(invalid_input_error)?;

    if !distance_meters.is_finite() || !duration_seconds.is_finite() {
        return Err(invalid_input_error());
    }

    let minutes = duration_minutes(duration_seconds);
    let unit = if minutes == 1 { "minute" } else { "minutes" };

    Ok(vec![
        format!("Start by heading {} toward your destination.", direction),
        format!("Total distance: {}.", format_distance(distance_meters)),
        format!("Estimated {} time: {} {}.", mode.name(), minutes, unit),
        "Follow the highlighted route line to reach your destination.".into(),
    ])
}
