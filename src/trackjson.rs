use serde::{Deserialize, Deserializer};
use time::OffsetDateTime;
use tracing::debug;

use crate::error::{Result, TrackError};
use crate::stats::StatOverrides;
use crate::{GeoFix, parse_fix_time};

/// A recording session as exported by the tracker app.
///
/// The aggregate fields are whatever the recorder computed while tracking;
/// when present they win over values recomputed from `locations`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackData {
    pub track_name: Option<String>,
    /// Meters per second.
    pub max_speed: Option<f64>,
    /// Meters.
    pub total_distance: Option<f64>,
    /// Meters of descent.
    pub total_vertical: Option<f64>,
    /// Seconds.
    pub recording_duration: Option<f64>,
    pub locations: Vec<TrackLocation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, alias = "altitude")]
    pub elevation: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: Option<OffsetDateTime>,
    #[serde(default)]
    pub speed: Option<f64>,
}

impl TrackData {
    pub fn fixes(&self) -> Vec<GeoFix> {
        self.locations.iter().map(TrackLocation::to_fix).collect()
    }

    pub fn overrides(&self) -> StatOverrides {
        StatOverrides {
            total_distance: self.total_distance,
            max_speed: self.max_speed,
            elevation_loss: self.total_vertical,
            duration: self.recording_duration,
            ..StatOverrides::default()
        }
    }
}

impl TrackLocation {
    pub fn to_fix(&self) -> GeoFix {
        GeoFix {
            latitude: self.latitude,
            longitude: self.longitude,
            elevation: self.elevation,
            timestamp: self.timestamp,
            // Recorders report a negative speed when they have no valid reading
            speed: self.speed.filter(|speed| *speed >= 0.0),
        }
    }
}

pub fn parse_track_json(input: &[u8]) -> Result<TrackData> {
    let track: TrackData =
        serde_json::from_slice(input).map_err(|e| TrackError::json(e.to_string()))?;
    debug!(
        points = track.locations.len(),
        name = ?track.track_name,
        "decoded JSON track"
    );
    Ok(track)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    UnixSeconds(f64),
}

fn deserialize_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<RawTimestamp>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawTimestamp::Text(text)) => parse_fix_time(&text)
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid timestamp {text:?}: {e}"))),
        Some(RawTimestamp::UnixSeconds(seconds)) => {
            let nanos = (seconds * 1e9).round() as i128;
            OffsetDateTime::from_unix_timestamp_nanos(nanos)
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid timestamp {seconds}: {e}")))
        }
    }
}
