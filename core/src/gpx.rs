use std::fs;
use std::path::Path;

use log::{debug, info};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::config::SplitConfig;
use crate::error::{Result, SplitError};
use crate::types::{Segment, SplitResult, TrackPoint};

const GPX_NS: &str = "http://www.topografix.com/GPX/1/1";

#[derive(Clone, Copy, PartialEq)]
enum TextTarget {
    Ele,
    Time,
}

fn parse_coord(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Leser alle `<trkpt>` i dokumentrekkefølge.
/// Punkter uten `<time>` hoppes stille over.
pub fn parse_track_points(gpx_text: &str) -> Result<Vec<TrackPoint>> {
    read_track_points(gpx_text).map(|(points, _)| points)
}

/// Som `parse_track_points`, men returnerer også antall punkter uten tid.
pub(crate) fn read_track_points(gpx_text: &str) -> Result<(Vec<TrackPoint>, usize)> {
    let mut reader = Reader::from_str(gpx_text);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut points: Vec<TrackPoint> = Vec::new();
    let mut in_trkpt = false;
    let mut lat = f64::NAN;
    let mut lon = f64::NAN;
    let mut ele: Option<f64> = None;
    let mut time: Option<String> = None;
    let mut target: Option<TextTarget> = None;
    let mut dropped = 0usize;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            SplitError::Gpx(format!("at byte {}: {}", reader.buffer_position(), e))
        })?;
        match event {
            Event::Eof => break,
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"trkpt" => {
                lat = f64::NAN;
                lon = f64::NAN;
                ele = None;
                time = None;
                for a in e.attributes().flatten() {
                    let value = a.unescape_value().unwrap_or_default();
                    match a.key.local_name().as_ref() {
                        b"lat" => lat = parse_coord(&value),
                        b"lon" => lon = parse_coord(&value),
                        _ => {}
                    }
                }
                if matches!(event, Event::Start(_)) {
                    in_trkpt = true;
                } else {
                    // <trkpt/> har ingen <time>
                    dropped += 1;
                }
            }
            Event::Start(ref e) if in_trkpt => {
                // Første <ele>/<time> innenfor punktet vinner
                target = match e.local_name().as_ref() {
                    b"ele" if ele.is_none() => Some(TextTarget::Ele),
                    b"time" if time.is_none() => {
                        // Tomt <time></time> teller som tid (ugyldig), ikke som manglende
                        time = Some(String::new());
                        Some(TextTarget::Time)
                    }
                    _ => None,
                };
            }
            Event::Empty(ref e) if in_trkpt => {
                if e.local_name().as_ref() == b"time" && time.is_none() {
                    time = Some(String::new());
                }
            }
            Event::Text(ref t) if in_trkpt => {
                let txt = t.unescape().map_err(|e| SplitError::Gpx(e.to_string()))?;
                match target {
                    Some(TextTarget::Ele) => ele = txt.trim().parse::<f64>().ok(),
                    Some(TextTarget::Time) => {
                        if let Some(time) = time.as_mut() {
                            time.push_str(&txt);
                        }
                    }
                    None => {}
                }
            }
            Event::End(ref e) if in_trkpt => match e.local_name().as_ref() {
                b"trkpt" => {
                    in_trkpt = false;
                    target = None;
                    match time.take() {
                        Some(time) => points.push(TrackPoint { lat, lon, elevation: ele, time }),
                        None => dropped += 1,
                    }
                }
                _ => target = None,
            },
            _ => {}
        }
        buf.clear();
    }

    debug!("read_track_points: {} punkter, {} uten tid", points.len(), dropped);
    Ok((points, dropped))
}

pub fn parse_gpx_file<P: AsRef<Path>>(path: P) -> Result<Vec<TrackPoint>> {
    let s = fs::read_to_string(path)?;
    parse_track_points(&s)
}

fn write_text_element<W: std::io::Write>(w: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Bygger et GPX 1.1-dokument: ett `<trk>`, ett `<trkseg>` per ikke-tomt segment.
pub fn generate_gpx(segments: &[Segment], config: &SplitConfig) -> Result<String> {
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut gpx = BytesStart::new("gpx");
    gpx.push_attribute(("xmlns", GPX_NS));
    gpx.push_attribute(("version", "1.1"));
    gpx.push_attribute(("creator", config.creator.as_str()));
    w.write_event(Event::Start(gpx))?;
    w.write_event(Event::Start(BytesStart::new("trk")))?;
    write_text_element(&mut w, "name", &config.track_name)?;

    for segment in segments.iter().filter(|s| !s.is_empty()) {
        w.write_event(Event::Start(BytesStart::new("trkseg")))?;
        for p in segment {
            let mut trkpt = BytesStart::new("trkpt");
            trkpt.push_attribute(("lat", p.lat.to_string().as_str()));
            trkpt.push_attribute(("lon", p.lon.to_string().as_str()));
            w.write_event(Event::Start(trkpt))?;
            if let Some(ele) = p.elevation {
                write_text_element(&mut w, "ele", &ele.to_string())?;
            }
            write_text_element(&mut w, "time", &p.time)?;
            w.write_event(Event::End(BytesEnd::new("trkpt")))?;
        }
        w.write_event(Event::End(BytesEnd::new("trkseg")))?;
    }

    w.write_event(Event::End(BytesEnd::new("trk")))?;
    w.write_event(Event::End(BytesEnd::new("gpx")))?;

    String::from_utf8(w.into_inner()).map_err(|e| SplitError::Gpx(e.to_string()))
}

/// (good.gpx, avoid.gpx)
pub fn generate_split_gpx(result: &SplitResult, config: &SplitConfig) -> Result<(String, String)> {
    Ok((generate_gpx(&result.good, config)?, generate_gpx(&result.avoid, config)?))
}

/// Skriver `good.gpx` og `avoid.gpx` til katalogen.
pub fn save_split_gpx<P: AsRef<Path>>(dir: P, result: &SplitResult, config: &SplitConfig) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let (good, avoid) = generate_split_gpx(result, config)?;
    fs::write(dir.join("good.gpx"), good)?;
    fs::write(dir.join("avoid.gpx"), avoid)?;
    info!(
        "✅ Lagret good.gpx ({} segmenter) og avoid.gpx ({} segmenter) i {}",
        result.good.len(),
        result.avoid.len(),
        dir.display()
    );
    Ok(())
}
