use crate::OutputFormat;
use serde::Serialize;
use slopestats::{LoadedTrack, Statistic, TrackFormat, UnitSystem};
use std::error::Error;
use std::io::{self, Write};
use std::path::Path;

#[derive(Serialize)]
struct StatsReport<'a> {
    name: &'a str,
    format: TrackFormat,
    units: UnitSystem,
    points: usize,
    statistics: &'a [Statistic],
}

pub fn stats_command(
    path: &Path,
    units: UnitSystem,
    output: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let track = LoadedTrack::load(path)?;
    let statistics = track.statistics(units);

    let mut stdout = io::stdout().lock();
    match output {
        OutputFormat::Text => {
            writeln!(stdout, "{}", track.name)?;
            for statistic in &statistics {
                writeln!(stdout, "{statistic}")?;
            }
        }
        OutputFormat::Json => {
            let report = StatsReport {
                name: &track.name,
                format: track.format,
                units,
                points: track.fixes.len(),
                statistics: &statistics,
            };
            serde_json::to_writer_pretty(&mut stdout, &report)?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
