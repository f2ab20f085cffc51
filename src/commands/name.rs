use crate::OutputFormat;
use slopestats::read_track_name;
use std::error::Error;
use std::io::{self, Write};
use std::path::Path;

pub fn name_command(path: &Path, output: OutputFormat) -> Result<(), Box<dyn Error>> {
    let name = read_track_name(path)?;

    let mut stdout = io::stdout().lock();
    match output {
        OutputFormat::Text => writeln!(stdout, "{name}")?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut stdout, &serde_json::json!({ "name": name }))?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
