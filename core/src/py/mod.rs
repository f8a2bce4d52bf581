use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use serde::Deserialize;
use serde_json::{self as json, Value};
use serde_path_to_error as spte;

use crate::config::SplitConfig;
use crate::gpx::generate_split_gpx;
use crate::recording::parse_recording_text;
use crate::segmentation::process_gpx_and_split;
use crate::types::{Interval, State};

// ──────────────────────────────────────────────────────────────────────────────
// INPUT-REPR (untagged): PRØV OBJECT FØRST, SÅ REN LISTE
// ──────────────────────────────────────────────────────────────────────────────

// Tolerant intervall-inngang (klienter har brukt både state/label og start/from)
#[derive(Debug, Deserialize, Clone)]
struct IntervalInTol {
    #[serde(alias = "label", alias = "type")]
    state: State,
    #[serde(alias = "from")]
    start: String,
    #[serde(alias = "to")]
    end: String,
}

#[derive(Debug, Deserialize)]
struct IntervalsObject {
    intervals: Vec<IntervalInTol>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IntervalsIn {
    Object(IntervalsObject),
    List(Vec<IntervalInTol>),
}

fn parse_intervals(json_in: &str) -> Result<Vec<Interval>, String> {
    let mut de = json::Deserializer::from_str(json_in);
    let repr: IntervalsIn = spte::deserialize(&mut de)
        .map_err(|e| format!("parse error (IntervalsIn) at {}: {}", e.path(), e))?;
    let list = match repr {
        IntervalsIn::Object(o) => o.intervals,
        IntervalsIn::List(l) => l,
    };
    Ok(list
        .into_iter()
        .map(|i| Interval { state: i.state, start: i.start, end: i.end })
        .collect())
}

// ──────────────────────────────────────────────────────────────────────────────
// KJERNEKALL (String-feil, mappes til PyValueError ytterst)
// ──────────────────────────────────────────────────────────────────────────────

fn call_split_from_json(gpx_text: &str, intervals_json: &str, config_json: Option<&str>) -> Result<String, String> {
    let intervals = parse_intervals(intervals_json)?;
    let config = match config_json {
        Some(c) => SplitConfig::from_json(c).map_err(|e| e.to_string())?,
        None => SplitConfig::default(),
    };

    let result = process_gpx_and_split(gpx_text, &intervals, &config).map_err(|e| e.to_string())?;
    let (good_gpx, avoid_gpx) = generate_split_gpx(&result, &config).map_err(|e| e.to_string())?;

    let out = json::json!({
        "good": result.good,
        "avoid": result.avoid,
        "stats": result.stats,
        "bounds": result.bounds(),
        "good_gpx": good_gpx,
        "avoid_gpx": avoid_gpx,
        "source": "rust_binding",
    });
    Ok(out.to_string())
}

// ──────────────────────────────────────────────────────────────────────────────
// PyO3-MODUL
// ──────────────────────────────────────────────────────────────────────────────

#[pyfunction]
fn parse_recording_text_json(text: &str) -> PyResult<String> {
    let intervals = parse_recording_text(text);
    json::to_string(&intervals).map_err(|e| PyValueError::new_err(e.to_string()))
}

#[pyfunction]
#[pyo3(signature = (gpx_text, intervals, config_json=None))]
fn split_gpx_json(
    py: Python<'_>,
    gpx_text: &str,
    intervals: &PyAny,
    config_json: Option<&str>,
) -> PyResult<String> {
    // Tillat både str og list/dict (serialiseres via Python sin json.dumps)
    let intervals_json: String = if let Ok(s) = intervals.extract::<&str>() {
        s.to_owned()
    } else {
        let json_mod = py
            .import("json")
            .map_err(|e| PyValueError::new_err(format!("failed to import json: {e}")))?;
        json_mod
            .call_method1("dumps", (intervals,))
            .and_then(|o| o.extract::<String>())
            .map_err(|e| PyValueError::new_err(format!("failed to serialize intervals with json.dumps: {e}")))?
    };

    call_split_from_json(gpx_text, &intervals_json, config_json).map_err(PyValueError::new_err)
}

#[pymodule]
fn gpxsplit_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(parse_recording_text_json, m)?)?;
    m.add_function(wrap_pyfunction!(split_gpx_json, m)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_accept_list_and_object_forms() {
        let list = r#"[{"state":"Good","start":"a","end":"b"}]"#;
        let obj = r#"{"intervals":[{"label":"Avoid","from":"a","to":"b"}]}"#;
        assert_eq!(parse_intervals(list).unwrap()[0].state, State::Good);
        assert_eq!(parse_intervals(obj).unwrap()[0].state, State::Avoid);
        assert!(parse_intervals(r#"{"intervals":[{"state":"Meh"}]}"#).is_err());
    }
}
