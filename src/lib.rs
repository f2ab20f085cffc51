//! Ride statistics for recorded ski and snowboard tracks.
//!
//! Track files (JSON exports or GPX) are decoded into [`GeoFix`] sequences,
//! reduced to [`TrackStatistics`], and formatted as display [`Statistic`]s.

pub mod error;
pub mod gpxxml;
pub mod stats;
pub mod track;
pub mod trackjson;
pub mod units;

use time::OffsetDateTime;
use time::format_description::well_known::Iso8601;

pub use error::{Result, TrackError};
pub use gpxxml::{GpxTrack, extract_track_name, parse_gpx};
pub use stats::{StatOverrides, TrackStatistics};
pub use track::{
    LoadedTrack, TrackFormat, TrackListing, default_track_name, list_tracks, read_track_name,
};
pub use trackjson::{TrackData, TrackLocation, parse_track_json};
pub use units::{Statistic, UnitSystem, format_duration, gpx_statistics, json_statistics};

/// One recorded sample point.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters. Fixes without elevation are left out of elevation aggregates.
    pub elevation: Option<f64>,
    pub timestamp: Option<OffsetDateTime>,
    /// Instantaneous speed in meters per second, when the recorder supplied one.
    pub speed: Option<f64>,
}

impl GeoFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: None,
            timestamp: None,
            speed: None,
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn with_timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }
}

/// Calculates the great circle distance in meters between two GPS coordinates
/// using the haversine formula.
///
/// The Earth is treated as a sphere of radius 6,371 km. For the short hops
/// between consecutive track fixes this is well within GPS noise.
///
/// References:
/// - R.W. Sinnott, "Virtues of the Haversine", Sky and Telescope, vol. 68, no. 2, 1984, p. 159
/// - https://en.wikipedia.org/wiki/Haversine_formula
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS: f64 = 6371000.0; // Mean Earth radius in meters

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    // a = sin²(Δφ/2) + cos φ1 ⋅ cos φ2 ⋅ sin²(Δλ/2)
    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);

    // c = 2 ⋅ atan2(√a, √(1−a))
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS * c
}

pub fn fix_distance(p1: &GeoFix, p2: &GeoFix) -> f64 {
    haversine_distance(p1.latitude, p1.longitude, p2.latitude, p2.longitude)
}

/// Seconds between two fixes, or `None` if either lacks a timestamp.
pub fn elapsed_seconds(p1: &GeoFix, p2: &GeoFix) -> Option<f64> {
    Some((p2.timestamp? - p1.timestamp?).as_seconds_f64())
}

/// Speed in meters per second between two fixes.
///
/// Returns `None` when the pair has no usable elapsed time: a missing
/// timestamp, or a duplicate or out-of-order one.
pub fn calculate_speed(p1: &GeoFix, p2: &GeoFix) -> Option<f64> {
    let time_diff = elapsed_seconds(p1, p2)?;

    if time_diff > 0.0 {
        Some(fix_distance(p1, p2) / time_diff)
    } else {
        None
    }
}

pub(crate) fn parse_fix_time(s: &str) -> std::result::Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(s.trim(), &Iso8601::DEFAULT)
}
