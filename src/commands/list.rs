use crate::OutputFormat;
use slopestats::list_tracks;
use std::error::Error;
use std::io::{self, Write};
use std::path::Path;

pub fn list_command(dir: &Path, output: OutputFormat) -> Result<(), Box<dyn Error>> {
    let listings = list_tracks(dir)?;

    let mut stdout = io::stdout().lock();
    match output {
        OutputFormat::Text => {
            for listing in &listings {
                writeln!(stdout, "{}\t{}", listing.file_name, listing.name)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut stdout, &listings)?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
