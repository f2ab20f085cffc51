use std::path::PathBuf;

use thiserror::Error;

use crate::track::TrackFormat;

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {format} track: {message}")]
    Parse { format: TrackFormat, message: String },
    #[error("unsupported track file: {0}")]
    UnsupportedFormat(String),
}

impl TrackError {
    pub(crate) fn gpx(message: impl Into<String>) -> Self {
        TrackError::Parse {
            format: TrackFormat::Gpx,
            message: message.into(),
        }
    }

    pub(crate) fn json(message: impl Into<String>) -> Self {
        TrackError::Parse {
            format: TrackFormat::Json,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackError>;
