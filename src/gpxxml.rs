use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::error::{Result, TrackError};
use crate::{GeoFix, parse_fix_time};

/// A decoded GPX document: the display name and every track point in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct GpxTrack {
    pub name: Option<String>,
    pub fixes: Vec<GeoFix>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointField {
    Elevation,
    Time,
    Speed,
}

impl PointField {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"ele" => Some(PointField::Elevation),
            b"time" => Some(PointField::Time),
            b"speed" => Some(PointField::Speed),
            _ => None,
        }
    }
}

/// Decodes a GPX document. Decoding is all-or-nothing: any malformed point
/// fails the whole document.
pub fn parse_gpx(input: &[u8]) -> Result<GpxTrack> {
    std::str::from_utf8(input).map_err(|e| TrackError::gpx(format!("invalid UTF-8: {e}")))?;

    let fixes = extract_geofixes(input)?;
    let name = extract_track_name(input);
    debug!(points = fixes.len(), name = ?name, "decoded GPX track");

    Ok(GpxTrack { name, fixes })
}

/// Returns the text of the first `<name>` element in the document.
///
/// Anything that prevents the element from closing cleanly (a missing
/// `</name>`, an XML error before it) yields `None`, as does empty text.
pub fn extract_track_name(input: &[u8]) -> Option<String> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();

    let mut in_name = false;
    let mut name_text = String::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Err(e) => {
                debug!(position = reader.buffer_position(), error = %e, "track name not found");
                return None;
            }
            Ok(Event::Eof) => return None,
            Ok(event) => event.into_owned(),
        };

        match event {
            Event::Start(ref e) if e.local_name().as_ref() == b"name" => {
                if in_name {
                    return None;
                }
                in_name = true;
                name_text.clear();
            }

            Event::End(ref e) if in_name && e.local_name().as_ref() == b"name" => {
                let name = name_text.trim();
                return (!name.is_empty()).then(|| name.to_string());
            }

            Event::Text(ref e) if in_name => match e.unescape() {
                Ok(text) => name_text.push_str(&text),
                Err(_) => return None,
            },

            Event::CData(ref e) if in_name => match std::str::from_utf8(e) {
                Ok(text) => name_text.push_str(text),
                Err(_) => return None,
            },

            _ => {}
        }

        buf.clear();
    }
}

/// Extracts every `<trkpt>` as a [`GeoFix`].
///
/// `lat` and `lon` are required; `<ele>`, `<time>` and `<speed>` children are
/// optional but must be well formed when present.
pub fn extract_geofixes(input: &[u8]) -> Result<Vec<GeoFix>> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut fixes = Vec::new();

    let mut seen_gpx = false;
    let mut depth = 0usize;
    let mut current: Option<(GeoFix, usize)> = None;
    let mut field: Option<PointField> = None;
    let mut field_text = String::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Err(e) => {
                return Err(TrackError::gpx(format!(
                    "error at position {}: {e}",
                    reader.buffer_position()
                )));
            }
            Ok(Event::Eof) => {
                if current.is_some() || depth != 0 {
                    return Err(TrackError::gpx(format!(
                        "unexpected end of document with {depth} unclosed element(s)"
                    )));
                }
                break;
            }
            Ok(event) => event.into_owned(),
        };

        match event {
            Event::Start(ref e) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"gpx" => seen_gpx = true,
                    b"trkpt" => {
                        if current.is_some() {
                            return Err(TrackError::gpx("nested <trkpt> element"));
                        }
                        current = Some((start_fix(e)?, depth));
                    }
                    tag => {
                        if let Some((_, point_depth)) = &current
                            && depth == *point_depth + 1
                        {
                            field = PointField::from_tag(tag);
                            field_text.clear();
                        }
                    }
                }
            }

            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"gpx" => seen_gpx = true,
                b"trkpt" if current.is_none() => fixes.push(start_fix(e)?),
                _ => {}
            },

            Event::End(ref e) => {
                if e.local_name().as_ref() == b"trkpt" {
                    if let Some((fix, _)) = current.take() {
                        fixes.push(fix);
                    }
                } else if let Some((fix, point_depth)) = current.as_mut()
                    && depth == *point_depth + 1
                    && let Some(kind) = field.take()
                {
                    apply_field(fix, kind, &field_text)?;
                }
                depth = depth.saturating_sub(1);
            }

            Event::Text(ref e) => {
                if field.is_some() {
                    let text = e
                        .unescape()
                        .map_err(|err| TrackError::gpx(format!("bad text: {err}")))?;
                    field_text.push_str(&text);
                }
            }

            _ => {}
        }

        buf.clear();
    }

    if !seen_gpx {
        return Err(TrackError::gpx("missing <gpx> root element"));
    }

    Ok(fixes)
}

fn start_fix(e: &BytesStart) -> Result<GeoFix> {
    let mut lat = None;
    let mut lon = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|err| TrackError::gpx(format!("bad <trkpt> attribute: {err}")))?;
        let target = match attr.key.as_ref() {
            b"lat" => &mut lat,
            b"lon" => &mut lon,
            _ => continue,
        };
        let value = std::str::from_utf8(&attr.value)
            .map_err(|err| TrackError::gpx(format!("bad <trkpt> attribute: {err}")))?;
        *target = Some(parse_number("coordinate", value)?);
    }

    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok(GeoFix::new(lat, lon)),
        (None, _) => Err(TrackError::gpx("<trkpt> is missing the lat attribute")),
        (_, None) => Err(TrackError::gpx("<trkpt> is missing the lon attribute")),
    }
}

fn apply_field(fix: &mut GeoFix, kind: PointField, text: &str) -> Result<()> {
    match kind {
        PointField::Elevation => fix.elevation = Some(parse_number("elevation", text)?),
        PointField::Speed => fix.speed = Some(parse_number("speed", text)?),
        PointField::Time => {
            let time = parse_fix_time(text)
                .map_err(|err| TrackError::gpx(format!("invalid time {:?}: {err}", text.trim())))?;
            fix.timestamp = Some(time);
        }
    }
    Ok(())
}

fn parse_number(what: &str, text: &str) -> Result<f64> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|err| TrackError::gpx(format!("invalid {what} {:?}: {err}", text.trim())))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TrackError::gpx(format!("invalid {what} {:?}", text.trim())))
    }
}
