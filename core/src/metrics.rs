use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::types::{SplitResult, State};

pub struct Metrics {
    registry: Registry,
    pub points_total: IntCounter,
    pub points_dropped_total: IntCounterVec,
    pub segments_total: IntCounterVec,
    pub recordings_saved_total: IntCounter,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let points_total = IntCounter::new("gpxsplit_points_total", "Track points with a timestamp")?;
        let points_dropped_total = IntCounterVec::new(
            Opts::new("gpxsplit_points_dropped_total", "Track points left out of every segment"),
            &["reason"],
        )?;
        let segments_total = IntCounterVec::new(
            Opts::new("gpxsplit_segments_total", "Segments emitted per state"),
            &["state"],
        )?;
        let recordings_saved_total =
            IntCounter::new("gpxsplit_recordings_saved_total", "Recordings written to a store")?;

        registry.register(Box::new(points_total.clone()))?;
        registry.register(Box::new(points_dropped_total.clone()))?;
        registry.register(Box::new(segments_total.clone()))?;
        registry.register(Box::new(recordings_saved_total.clone()))?;

        Ok(Self {
            registry,
            points_total,
            points_dropped_total,
            segments_total,
            recordings_saved_total,
        })
    }

    /// Oppdaterer tellerne etter én splitting.
    pub fn observe_split(&self, result: &SplitResult) {
        let s = &result.stats;
        self.points_total.inc_by(s.points_total as u64);
        self.points_dropped_total
            .with_label_values(&["no_time"])
            .inc_by(s.points_without_time as u64);
        self.points_dropped_total
            .with_label_values(&["unmatched"])
            .inc_by(s.points_unmatched as u64);
        for state in [State::Good, State::Avoid] {
            self.segments_total
                .with_label_values(&[state.as_str()])
                .inc_by(result.segments(state).len() as u64);
        }
    }

    /// Prometheus tekstformat.
    pub fn gather_text(&self) -> String {
        let mut buf = Vec::new();
        if TextEncoder::new().encode(&self.registry.gather(), &mut buf).is_err() {
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

pub static METRICS: Lazy<Metrics> =
    Lazy::new(|| Metrics::new().expect("metric names are static and unique"));

pub fn gather_text() -> String {
    METRICS.gather_text()
}
