use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::{debug, warn};

use crate::GeoFix;
use crate::error::{Result, TrackError};
use crate::gpxxml::{extract_track_name, parse_gpx};
use crate::stats::TrackStatistics;
use crate::trackjson::parse_track_json;
use crate::units::{Statistic, UnitSystem, gpx_statistics, json_statistics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackFormat {
    Json,
    Gpx,
}

impl TrackFormat {
    /// Picks the format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(TrackFormat::Json),
            Some("gpx") => Ok(TrackFormat::Gpx),
            _ => Err(TrackError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl fmt::Display for TrackFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackFormat::Json => f.write_str("JSON"),
            TrackFormat::Gpx => f.write_str("GPX"),
        }
    }
}

/// A decoded track file and its statistics.
///
/// Construction either succeeds completely or returns an error; nothing is
/// kept between loads.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTrack {
    pub name: String,
    pub format: TrackFormat,
    pub fixes: Vec<GeoFix>,
    pub stats: TrackStatistics,
}

impl LoadedTrack {
    pub fn load(path: &Path) -> Result<Self> {
        let format = TrackFormat::from_path(path)?;
        let bytes = read_file(path)?;
        Self::from_bytes(format, &bytes, &default_track_name(path))
    }

    /// Decodes `bytes` and computes statistics. JSON exports keep the
    /// aggregates their recorder supplied; GPX statistics are always derived
    /// from the points.
    pub fn from_bytes(format: TrackFormat, bytes: &[u8], fallback_name: &str) -> Result<Self> {
        let (name, fixes, stats) = match format {
            TrackFormat::Json => {
                let data = parse_track_json(bytes)?;
                let fixes = data.fixes();
                let stats = TrackStatistics::compute_with(&fixes, &data.overrides());
                (data.track_name, fixes, stats)
            }
            TrackFormat::Gpx => {
                let track = parse_gpx(bytes)?;
                let stats = TrackStatistics::compute(&track.fixes);
                (track.name, track.fixes, stats)
            }
        };

        Ok(Self {
            name: display_name(name, fallback_name),
            format,
            fixes,
            stats,
        })
    }

    /// Display statistics in the fixed order for this track's source format.
    pub fn statistics(&self, units: UnitSystem) -> Vec<Statistic> {
        match self.format {
            TrackFormat::Json => json_statistics(&self.stats, units),
            TrackFormat::Gpx => gpx_statistics(&self.stats, units),
        }
    }
}

/// The display name of a track file without computing its statistics.
pub fn read_track_name(path: &Path) -> Result<String> {
    let format = TrackFormat::from_path(path)?;
    let bytes = read_file(path)?;
    let name = match format {
        TrackFormat::Json => parse_track_json(&bytes)?.track_name,
        TrackFormat::Gpx => extract_track_name(&bytes),
    };
    Ok(display_name(name, &default_track_name(path)))
}

/// Name for a track that does not carry one: the file stem, rendered as a long
/// date when it has the recorder's `MM-dd-yyyy` form.
pub fn default_track_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    long_date(&stem).unwrap_or(stem)
}

const RECORDED_DATE: &[BorrowedFormatItem<'_>] = format_description!("[month]-[day]-[year]");
const LONG_DATE: &[BorrowedFormatItem<'_>] =
    format_description!("[month repr:long] [day padding:none], [year]");

fn long_date(stem: &str) -> Option<String> {
    Date::parse(stem, RECORDED_DATE).ok()?.format(LONG_DATE).ok()
}

fn display_name(name: Option<String>, fallback: &str) -> String {
    name.map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| TrackError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// One entry of a track history listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackListing {
    pub file_name: String,
    pub name: String,
}

/// Lists every `.json` and `.gpx` track in `dir`, sorted by file name.
///
/// A file that cannot be read or decoded is still listed, under its file name.
pub fn list_tracks(dir: &Path) -> Result<Vec<TrackListing>> {
    let io_error = |source| TrackError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut listings = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if !path.is_file() || TrackFormat::from_path(&path).is_err() {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match read_track_name(&path) {
            Ok(name) => name,
            Err(e) => {
                warn!(file = %file_name, error = %e, "could not read track name");
                file_name.clone()
            }
        };
        listings.push(TrackListing { file_name, name });
    }

    listings.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    debug!(dir = %dir.display(), tracks = listings.len(), "listed tracks");
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const MORNING_RUN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk>
    <name>Morning Run</name>
    <trkseg>
      <trkpt lat="0.0" lon="0.0"><ele>100</ele><time>2024-01-15T09:00:00Z</time></trkpt>
      <trkpt lat="0.0" lon="0.01"><ele>80</ele><time>2024-01-15T09:01:00Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    /// Tests that the track format is picked from the extension, ignoring case.
    #[test]
    fn test_format_from_path() {
        assert_eq!(
            TrackFormat::from_path(Path::new("a/b/run.gpx")).unwrap(),
            TrackFormat::Gpx
        );
        assert_eq!(
            TrackFormat::from_path(Path::new("RUN.JSON")).unwrap(),
            TrackFormat::Json
        );
        assert!(matches!(
            TrackFormat::from_path(Path::new("run.fit")),
            Err(TrackError::UnsupportedFormat(_))
        ));
        assert!(TrackFormat::from_path(Path::new("run")).is_err());
    }

    /// Tests that MM-dd-yyyy file stems become long dates and other stems are kept.
    #[test]
    fn test_default_track_name() {
        assert_eq!(
            default_track_name(Path::new("tracks/12-01-2023.json")),
            "December 1, 2023"
        );
        assert_eq!(
            default_track_name(Path::new("03-15-2024.gpx")),
            "March 15, 2024"
        );
        assert_eq!(default_track_name(Path::new("vail-day-2.gpx")), "vail-day-2");
        assert_eq!(default_track_name(Path::new("13-40-2023.gpx")), "13-40-2023");
    }

    /// Tests that a GPX track takes its name from the document.
    #[test]
    fn test_gpx_name_from_document() {
        let track =
            LoadedTrack::from_bytes(TrackFormat::Gpx, MORNING_RUN.as_bytes(), "fallback").unwrap();
        assert_eq!(track.name, "Morning Run");
        assert_eq!(track.fixes.len(), 2);
        assert_eq!(track.stats.elevation_loss, 20.0);
    }

    /// Tests that an unclosed name element falls back to the file-derived name.
    #[test]
    fn test_gpx_name_falls_back_when_unclosed() {
        let gpx = r#"<gpx><trk><name>Morning Run
            <trkseg><trkpt lat="0" lon="0"/></trkseg></trk></gpx>"#;
        assert!(LoadedTrack::from_bytes(TrackFormat::Gpx, gpx.as_bytes(), "01-02-2024").is_err());

        let name = extract_track_name(gpx.as_bytes());
        assert_eq!(display_name(name, "January 2, 2024"), "January 2, 2024");
    }

    /// Tests that GPX statistics are derived from the points in display order.
    #[test]
    fn test_gpx_statistics_are_recomputed() {
        let track = LoadedTrack::from_bytes(TrackFormat::Gpx, MORNING_RUN.as_bytes(), "x").unwrap();
        let stats = track.statistics(UnitSystem::Metric);

        assert_eq!(stats[0], Statistic::new("Total Distance", "1.1 km"));
        assert_eq!(stats[2], Statistic::new("Total Elevation Loss", "20.0 m"));
        assert_eq!(stats[4], Statistic::new("Max Speed", "66.7 km/h"));
        assert_eq!(stats[5], Statistic::new("Duration", "1m"));
    }

    /// Tests that a JSON total distance is kept while max speed is derived from the points.
    #[test]
    fn test_json_precomputed_distance_with_derived_speed() {
        let json = r#"{
            "totalDistance": 5000,
            "locations": [
                {"latitude": 0.0, "longitude": 0.0, "timestamp": "2024-01-15T09:00:00Z"},
                {"latitude": 0.0, "longitude": 0.01, "timestamp": "2024-01-15T09:01:00Z"}
            ]
        }"#;
        let track =
            LoadedTrack::from_bytes(TrackFormat::Json, json.as_bytes(), "Fallback").unwrap();

        assert_eq!(track.name, "Fallback");
        assert_eq!(track.stats.total_distance, 5000.0);
        assert!((track.stats.max_speed - 18.5325).abs() < 0.001);

        let stats = track.statistics(UnitSystem::Metric);
        assert_eq!(stats[0], Statistic::new("Max Speed", "66.7 km/h"));
        assert_eq!(stats[1], Statistic::new("Total Distance", "5.0 km"));
    }

    /// Tests that a blank JSON trackName falls back to the file-derived name.
    #[test]
    fn test_json_blank_name_uses_fallback() {
        let json = r#"{"trackName": "  ", "locations": []}"#;
        let track =
            LoadedTrack::from_bytes(TrackFormat::Json, json.as_bytes(), "Fallback").unwrap();
        assert_eq!(track.name, "Fallback");
        assert_eq!(track.stats, TrackStatistics::default());
    }

    /// Tests that loading a missing file is an Io error, not a parse error.
    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = LoadedTrack::load(&PathBuf::from("/definitely/not/here.gpx")).unwrap_err();
        assert!(matches!(err, TrackError::Io { .. }), "got {err:?}");
    }

    /// Tests that list_tracks names every track file and skips everything else.
    #[test]
    fn test_load_and_list_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("run.gpx"), MORNING_RUN).unwrap();
        fs::write(
            dir.path().join("12-01-2023.json"),
            r#"{"locations": [{"latitude": 1.0, "longitude": 2.0}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a track").unwrap();
        fs::create_dir(dir.path().join("nested.gpx")).unwrap();

        let loaded = LoadedTrack::load(&dir.path().join("12-01-2023.json")).unwrap();
        assert_eq!(loaded.name, "December 1, 2023");

        let listings = list_tracks(dir.path()).unwrap();
        assert_eq!(
            listings,
            vec![
                TrackListing {
                    file_name: "12-01-2023.json".into(),
                    name: "December 1, 2023".into()
                },
                TrackListing {
                    file_name: "broken.json".into(),
                    name: "broken.json".into()
                },
                TrackListing {
                    file_name: "run.gpx".into(),
                    name: "Morning Run".into()
                },
            ]
        );
    }

    /// Tests that listing a missing directory is an Io error.
    #[test]
    fn test_list_missing_directory_is_io_error() {
        assert!(matches!(
            list_tracks(Path::new("/definitely/not/here")),
            Err(TrackError::Io { .. })
        ));
    }
}
