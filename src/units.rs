use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

use crate::stats::TrackStatistics;

const KMH_PER_MPS: f64 = 3.6;
const MPH_PER_MPS: f64 = 2.23694;
const MILES_PER_METER: f64 = 0.000621371;
const FEET_PER_METER: f64 = 3.28084;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn is_metric(self) -> bool {
        self == UnitSystem::Metric
    }

    /// Meters per second to km/h or mph.
    pub fn speed(self, meters_per_second: f64) -> f64 {
        match self {
            UnitSystem::Metric => meters_per_second * KMH_PER_MPS,
            UnitSystem::Imperial => meters_per_second * MPH_PER_MPS,
        }
    }

    /// Meters to kilometers or miles.
    pub fn distance(self, meters: f64) -> f64 {
        match self {
            UnitSystem::Metric => meters / 1000.0,
            UnitSystem::Imperial => meters * MILES_PER_METER,
        }
    }

    /// Meters to meters or feet.
    pub fn elevation(self, meters: f64) -> f64 {
        match self {
            UnitSystem::Metric => meters,
            UnitSystem::Imperial => meters * FEET_PER_METER,
        }
    }

    pub fn speed_unit(self) -> &'static str {
        if self.is_metric() { "km/h" } else { "mph" }
    }

    pub fn distance_unit(self) -> &'static str {
        if self.is_metric() { "km" } else { "mi" }
    }

    pub fn elevation_unit(self) -> &'static str {
        if self.is_metric() { "m" } else { "ft" }
    }
}

/// A labelled, display-ready value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Statistic {
    pub title: String,
    pub value: String,
}

impl Statistic {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.value)
    }
}

/// Rounds half away from zero to one decimal place.
pub fn round_to_tenth(value: f64) -> f64 {
    // adding 0.0 turns -0.0 into 0.0
    (value * 10.0).round() / 10.0 + 0.0
}

fn format_value(value: f64, unit: &str) -> String {
    format!("{:.1} {unit}", round_to_tenth(value))
}

/// Formats seconds as `"1h 23m 10s"`, leaving out zero components.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };

    let parts: Vec<String> = [(total / 3600, "h"), (total % 3600 / 60, "m"), (total % 60, "s")]
        .into_iter()
        .filter(|(amount, _)| *amount > 0)
        .map(|(amount, suffix)| format!("{amount}{suffix}"))
        .collect();

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

/// Statistics for a JSON export: Max Speed, Total Distance, Vertical, Duration.
pub fn json_statistics(stats: &TrackStatistics, units: UnitSystem) -> Vec<Statistic> {
    let vertical_unit = if units.is_metric() { "meters" } else { "feet" };

    vec![
        Statistic::new(
            "Max Speed",
            format_value(units.speed(stats.max_speed), units.speed_unit()),
        ),
        Statistic::new(
            "Total Distance",
            format_value(units.distance(stats.total_distance), units.distance_unit()),
        ),
        Statistic::new(
            "Vertical",
            format_value(units.elevation(stats.elevation_loss), vertical_unit),
        ),
        Statistic::new("Duration", format_duration(stats.duration)),
    ]
}

/// Statistics for a GPX file: Total Distance, Max Elevation, Total Elevation
/// Loss, Min Elevation, Max Speed, Duration.
pub fn gpx_statistics(stats: &TrackStatistics, units: UnitSystem) -> Vec<Statistic> {
    let elevation = |meters| format_value(units.elevation(meters), units.elevation_unit());

    vec![
        Statistic::new(
            "Total Distance",
            format_value(units.distance(stats.total_distance), units.distance_unit()),
        ),
        Statistic::new("Max Elevation", elevation(stats.max_elevation)),
        Statistic::new("Total Elevation Loss", elevation(stats.elevation_loss)),
        Statistic::new("Min Elevation", elevation(stats.min_elevation)),
        Statistic::new(
            "Max Speed",
            format_value(units.speed(stats.max_speed), units.speed_unit()),
        ),
        Statistic::new("Duration", format_duration(stats.duration)),
    ]
}
