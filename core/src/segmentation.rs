use log::{info, warn};

use crate::config::SplitConfig;
use crate::error::Result;
use crate::gpx::read_track_points;
use crate::timestamp::timestamp_millis;
use crate::types::{Interval, Segment, SplitResult, State, TrackPoint};

/// Intervall med ferdig tolkede grenser (ms siden epoch).
/// None betyr at tidsstempelet ikke lot seg tolke; da treffer intervallet aldri.
struct TimedInterval {
    state: State,
    range: Option<(i64, i64)>,
}

impl TimedInterval {
    fn from_interval(iv: &Interval) -> Self {
        let range = match (timestamp_millis(&iv.start), timestamp_millis(&iv.end)) {
            (Some(s), Some(e)) => Some((s, e)),
            _ => {
                warn!("⚠️ Intervall {} {}..{} har ugyldig tid, ignoreres", iv.state, iv.start, iv.end);
                None
            }
        };
        Self { state: iv.state, range }
    }

    // Halvåpent: [start, end)
    fn contains(&self, t: i64) -> bool {
        matches!(self.range, Some((s, e)) if t >= s && t < e)
    }
}

/// Segmentet som bygges opp mens punktene gås gjennom.
#[derive(Default)]
struct Accumulator {
    state: Option<State>,
    points: Segment,
    good: Vec<Segment>,
    avoid: Vec<Segment>,
}

impl Accumulator {
    /// Lukker pågående segment (hvis det har punkter) og nullstiller tilstanden.
    fn flush(&mut self) {
        if self.points.is_empty() {
            return;
        }
        let points = std::mem::take(&mut self.points);
        match self.state {
            Some(State::Good) => self.good.push(points),
            Some(State::Avoid) => self.avoid.push(points),
            None => {}
        }
        self.state = None;
    }

    fn push(&mut self, state: State, point: TrackPoint) {
        if self.state != Some(state) {
            self.flush();
        }
        self.state = Some(state);
        self.points.push(point);
    }
}

/// Deler punktene i Good- og Avoid-segmenter.
///
/// Punktene tas i dokumentrekkefølge. Hvert punkt tilordnes første intervall
/// (lineært søk) som dekker tidspunktet. Et segment brytes når tiden siden
/// forrige punkt overstiger `max_gap_secs`, når tilstanden skifter, eller når
/// punktet ikke treffer noe intervall (punktet forkastes da).
pub fn split_track(points: &[TrackPoint], intervals: &[Interval], config: &SplitConfig) -> SplitResult {
    let timed: Vec<TimedInterval> = intervals.iter().map(TimedInterval::from_interval).collect();
    let max_gap = config.max_gap_millis();

    let mut acc = Accumulator::default();
    let mut result = SplitResult::default();
    let mut last_t: Option<i64> = None;

    for pt in points {
        let Some(t) = timestamp_millis(&pt.time) else {
            // Ugyldig tid: ingen treff, og neste gap-sjekk slår ikke til
            result.stats.points_without_time += 1;
            acc.flush();
            last_t = None;
            continue;
        };
        result.stats.points_total += 1;

        if let Some(prev) = last_t {
            if t - prev > max_gap && !acc.points.is_empty() {
                result.stats.gap_breaks += 1;
                acc.flush();
            }
        }

        match timed.iter().find(|iv| iv.contains(t)) {
            Some(iv) => acc.push(iv.state, pt.clone()),
            None => {
                result.stats.points_unmatched += 1;
                acc.flush();
            }
        }
        last_t = Some(t);
    }

    acc.flush();
    result.good = acc.good;
    result.avoid = acc.avoid;
    result
}

/// Leser GPX-teksten og deler sporet etter intervallene.
pub fn process_gpx_and_split(gpx_text: &str, intervals: &[Interval], config: &SplitConfig) -> Result<SplitResult> {
    config.validate()?;
    let (points, without_time) = read_track_points(gpx_text)?;
    let mut result = split_track(&points, intervals, config);
    result.stats.points_without_time += without_time;

    info!(
        "✂️ Splittet {} punkter: {} Good-segmenter, {} Avoid-segmenter ({} uten treff, {} uten tid)",
        result.stats.points_total,
        result.good.len(),
        result.avoid.len(),
        result.stats.points_unmatched,
        result.stats.points_without_time
    );
    crate::metrics::METRICS.observe_split(&result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(time: &str) -> TrackPoint {
        TrackPoint { lat: 59.9, lon: 10.7, elevation: None, time: time.to_string() }
    }

    fn iv(state: State, start: &str, end: &str) -> Interval {
        Interval { state, start: start.to_string(), end: end.to_string() }
    }

    #[test]
    fn first_matching_interval_wins_on_overlap() {
        let intervals = vec![
            iv(State::Avoid, "2024-05-01T10:00:00Z", "2024-05-01T10:10:00Z"),
            iv(State::Good, "2024-05-01T09:00:00Z", "2024-05-01T11:00:00Z"),
        ];
        let out = split_track(&[pt("2024-05-01T10:05:00Z")], &intervals, &SplitConfig::default());
        assert_eq!(out.avoid.len(), 1);
        assert!(out.good.is_empty());
    }

    #[test]
    fn state_change_splits_segment() {
        let intervals = vec![
            iv(State::Good, "2024-05-01T10:00:00Z", "2024-05-01T10:01:00Z"),
            iv(State::Avoid, "2024-05-01T10:01:00Z", "2024-05-01T10:02:00Z"),
            iv(State::Good, "2024-05-01T10:02:00Z", "2024-05-01T10:03:00Z"),
        ];
        let points: Vec<_> = ["10:00:10", "10:00:50", "10:01:10", "10:02:30"]
            .iter()
            .map(|t| pt(&format!("2024-05-01T{t}Z")))
            .collect();
        let out = split_track(&points, &intervals, &SplitConfig::default());
        assert_eq!(out.good.len(), 2);
        assert_eq!(out.good[0].len(), 2);
        assert_eq!(out.avoid.len(), 1);
        assert_eq!(out.stats.gap_breaks, 0);
    }

    #[test]
    fn gap_of_exactly_threshold_does_not_split() {
        let intervals = vec![iv(State::Good, "2024-05-01T10:00:00Z", "2024-05-01T11:00:00Z")];
        let points = vec![pt("2024-05-01T10:00:00Z"), pt("2024-05-01T10:05:00Z")];
        let out = split_track(&points, &intervals, &SplitConfig::default());
        assert_eq!(out.good.len(), 1);
        assert_eq!(out.good[0].len(), 2);
    }

    #[test]
    fn custom_gap_threshold_is_respected() {
        let intervals = vec![iv(State::Good, "2024-05-01T10:00:00Z", "2024-05-01T11:00:00Z")];
        let points = vec![pt("2024-05-01T10:00:00Z"), pt("2024-05-01T10:00:31Z")];
        let cfg = SplitConfig { max_gap_secs: 30, ..SplitConfig::default() };
        let out = split_track(&points, &intervals, &cfg);
        assert_eq!(out.good.len(), 2);
        assert_eq!(out.stats.gap_breaks, 1);
    }

    #[test]
    fn unparseable_times_never_match() {
        let intervals = vec![
            iv(State::Good, "not a time", "2024-05-01T11:00:00Z"),
            iv(State::Avoid, "2024-05-01T10:00:00Z", "2024-05-01T11:00:00Z"),
        ];
        let points = vec![pt("2024-05-01T10:00:00Z"), pt("garbage"), pt("2024-05-01T10:20:00Z")];
        let out = split_track(&points, &intervals, &SplitConfig::default());
        // Ugyldig punkt bryter segmentet, og gap-sjekken etterpå nullstilles
        assert_eq!(out.avoid.len(), 2);
        assert_eq!(out.stats.points_without_time, 1);
        assert_eq!(out.stats.gap_breaks, 0);
    }

    #[test]
    fn empty_input_gives_empty_result() {
        let out = split_track(&[], &[], &SplitConfig::default());
        assert!(out.is_empty());
        assert!(out.bounds().is_none());
    }
}
