use tracing::debug;

use crate::{GeoFix, calculate_speed, elapsed_seconds, fix_distance};

/// Precomputed aggregates that replace the corresponding engine computation.
///
/// Units match [`TrackStatistics`]: meters, meters per second, seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatOverrides {
    pub total_distance: Option<f64>,
    pub max_speed: Option<f64>,
    pub elevation_loss: Option<f64>,
    pub elevation_gain: Option<f64>,
    pub duration: Option<f64>,
    pub max_elevation: Option<f64>,
    pub min_elevation: Option<f64>,
}

/// Ride statistics in SI base units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackStatistics {
    /// Meters.
    pub total_distance: f64,
    /// Meters per second.
    pub max_speed: f64,
    /// Meters of descent, always non-negative.
    pub elevation_loss: f64,
    /// Meters of ascent, always non-negative.
    pub elevation_gain: f64,
    /// Seconds.
    pub duration: f64,
    pub max_elevation: f64,
    pub min_elevation: f64,
}

impl TrackStatistics {
    pub fn compute(fixes: &[GeoFix]) -> Self {
        Self::compute_with(fixes, &StatOverrides::default())
    }

    /// Merges `overrides` with statistics derived from `fixes`. A field is only
    /// computed when its override is absent.
    ///
    /// Fewer than two fixes derive an all-zero record.
    pub fn compute_with(fixes: &[GeoFix], overrides: &StatOverrides) -> Self {
        let fixes = if fixes.len() < 2 { &[][..] } else { fixes };

        let (min_elevation, max_elevation) =
            match (overrides.min_elevation, overrides.max_elevation) {
                (Some(min), Some(max)) => (min, max),
                (min, max) => {
                    let (lowest, highest) = elevation_range(fixes).unwrap_or((0.0, 0.0));
                    (min.unwrap_or(lowest), max.unwrap_or(highest))
                }
            };

        let (elevation_gain, elevation_loss) =
            match (overrides.elevation_gain, overrides.elevation_loss) {
                (Some(gain), Some(loss)) => (gain, loss),
                (gain, loss) => {
                    let (climbed, descended) = elevation_changes(fixes);
                    (gain.unwrap_or(climbed), loss.unwrap_or(descended))
                }
            };

        let stats = Self {
            total_distance: overrides
                .total_distance
                .unwrap_or_else(|| total_distance(fixes)),
            max_speed: overrides.max_speed.unwrap_or_else(|| max_speed(fixes)),
            elevation_loss,
            elevation_gain,
            duration: overrides.duration.unwrap_or_else(|| duration(fixes)),
            max_elevation,
            min_elevation,
        };

        debug!(points = fixes.len(), ?overrides, ?stats, "computed track statistics");
        stats
    }
}

/// Sum of the great circle distance between consecutive fixes, in meters.
pub fn total_distance(fixes: &[GeoFix]) -> f64 {
    fixes.windows(2).map(|w| fix_distance(&w[0], &w[1])).sum()
}

/// Lowest and highest elevation among fixes that carry one.
pub fn elevation_range(fixes: &[GeoFix]) -> Option<(f64, f64)> {
    fixes
        .iter()
        .filter_map(|fix| fix.elevation)
        .fold(None, |range, elevation| match range {
            None => Some((elevation, elevation)),
            Some((min, max)) => Some((f64::min(min, elevation), f64::max(max, elevation))),
        })
}

/// Total ascent and descent between consecutive elevation-bearing fixes.
///
/// Fixes without elevation are skipped, so a gap joins the readings on either
/// side of it.
pub fn elevation_changes(fixes: &[GeoFix]) -> (f64, f64) {
    let mut gain = 0.0;
    let mut loss = 0.0;
    let mut previous: Option<f64> = None;

    for elevation in fixes.iter().filter_map(|fix| fix.elevation) {
        if let Some(prev) = previous {
            let delta = elevation - prev;
            if delta > 0.0 {
                gain += delta;
            } else {
                loss -= delta;
            }
        }
        previous = Some(elevation);
    }

    (gain, loss)
}

/// Seconds between the first and last timestamped fix; zero if there are
/// fewer than two or they run backwards.
pub fn duration(fixes: &[GeoFix]) -> f64 {
    let first = fixes.iter().find(|fix| fix.timestamp.is_some());
    let last = fixes.iter().rev().find(|fix| fix.timestamp.is_some());

    match (first, last) {
        (Some(first), Some(last)) => elapsed_seconds(first, last).unwrap_or(0.0).max(0.0),
        _ => 0.0,
    }
}

/// Fastest speed over the track in meters per second.
///
/// Consecutive pairs with no elapsed time are skipped rather than treated as
/// infinitely fast. Instantaneous speeds reported by the recorder also count.
pub fn max_speed(fixes: &[GeoFix]) -> f64 {
    let mut skipped = 0usize;
    let derived = fixes.windows(2).filter_map(|w| {
        let speed = calculate_speed(&w[0], &w[1]);
        if speed.is_none() {
            skipped += 1;
        }
        speed
    });
    let reported = fixes
        .iter()
        .filter_map(|fix| fix.speed)
        .filter(|speed| *speed >= 0.0);

    let fastest = derived.chain(reported).fold(0.0, f64::max);
    if skipped > 0 {
        debug!(skipped, "skipped fix pairs without elapsed time");
    }
    fastest
}
