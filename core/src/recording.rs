use chrono::{DateTime, Utc};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SplitError};
use crate::timestamp::format_iso;
use crate::types::{EntryKind, Interval, LogEntry, State};

// Samme mønster som loggen skrives med; treffer hvor som helst på linjen.
static ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(Start|Toggle|End): (\w+) at ([^\r\n\u{2028}\u{2029}]+)")
        .expect("static regex")
});

/// Leser én logglinje. Linjer som ikke matcher, eller har ukjent tilstand, gir None.
pub fn parse_log_line(line: &str) -> Option<LogEntry> {
    let caps = ENTRY_RE.captures(line)?;
    let kind: EntryKind = caps[1].parse().ok()?;
    let state: State = caps[2].parse().ok()?;
    let timestamp = caps[3].trim_end().replace("+00:00Z", "Z");
    Some(LogEntry { kind, state, timestamp })
}

/// Gjør om opptaksteksten til intervaller i filrekkefølge.
///
/// `Start`/`Toggle` lukker åpent intervall på sitt eget tidspunkt og åpner et nytt.
/// `End` lukker det åpne intervallet, men åpner ikke noe nytt. Ingen sortering
/// eller validering av tidsstempler.
pub fn parse_recording_text(text: &str) -> Vec<Interval> {
    let mut intervals = Vec::new();
    let mut open: Option<(State, String)> = None;

    for entry in text.trim().split('\n').filter_map(parse_log_line) {
        match entry.kind {
            EntryKind::Start | EntryKind::Toggle => {
                if let Some((state, start)) = open.take() {
                    intervals.push(Interval { state, start, end: entry.timestamp.clone() });
                }
                open = Some((entry.state, entry.timestamp));
            }
            EntryKind::End => {
                // NB: det åpne intervallet blir stående etter End
                if let Some((state, start)) = &open {
                    intervals.push(Interval {
                        state: *state,
                        start: start.clone(),
                        end: entry.timestamp,
                    });
                }
            }
        }
    }

    debug!("parse_recording_text: {} intervaller", intervals.len());
    intervals
}

/// Tilstandsmaskinen bak opptaksskjermen: Start → Toggle* → End.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    recording: bool,
    state: State,
    since: Option<DateTime<Utc>>,
    entries: Vec<LogEntry>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn current_state(&self) -> State {
        self.state
    }

    /// Tidspunktet gjeldende tilstand startet (None før første Start).
    pub fn since(&self) -> Option<DateTime<Utc>> {
        self.since
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn start(&mut self, state: State, now: DateTime<Utc>) -> Result<LogEntry> {
        if self.recording {
            return Err(SplitError::AlreadyRecording);
        }
        self.recording = true;
        self.state = state;
        self.entries.clear();
        Ok(self.push(EntryKind::Start, now))
    }

    /// Bytter tilstand og logger en Toggle.
    pub fn toggle(&mut self, now: DateTime<Utc>) -> Result<LogEntry> {
        if !self.recording {
            return Err(SplitError::NotRecording);
        }
        self.state = self.state.toggled();
        Ok(self.push(EntryKind::Toggle, now))
    }

    /// Manuell bryter. Utenfor opptak endres bare valgt starttilstand;
    /// under opptak logges en Toggle hvis tilstanden faktisk endres.
    pub fn set_state(&mut self, state: State, now: DateTime<Utc>) -> Option<LogEntry> {
        if state == self.state {
            return None;
        }
        self.state = state;
        if !self.recording {
            return None;
        }
        Some(self.push(EntryKind::Toggle, now))
    }

    /// Avslutter opptaket og returnerer hele loggteksten.
    pub fn end(&mut self, now: DateTime<Utc>) -> Result<String> {
        if !self.recording {
            return Err(SplitError::NotRecording);
        }
        self.push(EntryKind::End, now);
        let text = self
            .entries
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n");

        info!("⏹️ Opptak avsluttet ({} linjer)", self.entries.len());

        // Klar for nytt opptak
        self.recording = false;
        self.state = State::Good;
        self.since = None;
        self.entries.clear();
        Ok(text)
    }

    fn push(&mut self, kind: EntryKind, now: DateTime<Utc>) -> LogEntry {
        let entry = LogEntry { kind, state: self.state, timestamp: format_iso(now) };
        self.since = Some(now);
        self.entries.push(entry.clone());
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn line_with_prefix_noise_still_matches() {
        let e = parse_log_line("12: Toggle: Avoid at 2024-05-01T10:00:00.000Z").unwrap();
        assert_eq!(e.kind, EntryKind::Toggle);
        assert_eq!(e.state, State::Avoid);
        assert_eq!(e.timestamp, "2024-05-01T10:00:00.000Z");
    }

    #[test]
    fn utc_suffix_is_normalized() {
        let e = parse_log_line("Start: Good at 2024-05-01T10:00:00+00:00Z").unwrap();
        assert_eq!(e.timestamp, "2024-05-01T10:00:00Z");
    }

    #[test]
    fn unknown_state_and_garbage_are_skipped() {
        assert!(parse_log_line("Start: Maybe at 2024-05-01T10:00:00Z").is_none());
        assert!(parse_log_line("hello world").is_none());
        assert!(parse_log_line("Start: Good at ").is_none());
    }

    #[test]
    fn carriage_return_is_not_part_of_timestamp() {
        let e = parse_log_line("End: Good at 2024-05-01T10:00:00Z\r").unwrap();
        assert_eq!(e.timestamp, "2024-05-01T10:00:00Z");
    }

    #[test]
    fn trailing_spaces_are_trimmed_from_timestamp() {
        let iv = parse_recording_text("Start: Good at T0  \nEnd: Good at T1   \t");
        assert_eq!(iv[0].start, "T0");
        assert_eq!(iv[0].end, "T1");
    }

    #[test]
    fn end_without_start_yields_nothing() {
        assert!(parse_recording_text("End: Good at 2024-05-01T10:00:00Z").is_empty());
    }

    #[test]
    fn entry_after_end_closes_same_interval_again() {
        let text = "Start: Good at T0\nEnd: Good at T1\nToggle: Avoid at T2\nEnd: Avoid at T3";
        let iv = parse_recording_text(text);
        assert_eq!(iv.len(), 3);
        assert_eq!((iv[1].start.as_str(), iv[1].end.as_str()), ("T0", "T2"));
        assert_eq!((iv[2].state, iv[2].start.as_str()), (State::Avoid, "T2"));
    }

    #[test]
    fn recorder_produces_parseable_log() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let mut rec = Recorder::new();
        rec.start(State::Good, t0).unwrap();
        assert!(rec.start(State::Good, t0).is_err());
        rec.toggle(t0 + Duration::minutes(3)).unwrap();
        assert_eq!(rec.current_state(), State::Avoid);
        assert!(rec.set_state(State::Avoid, t0 + Duration::minutes(4)).is_none());
        rec.set_state(State::Good, t0 + Duration::minutes(5)).unwrap();
        let text = rec.end(t0 + Duration::minutes(9)).unwrap();

        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("Start: Good at 2024-05-01T10:00:00.000Z"));
        let iv = parse_recording_text(&text);
        assert_eq!(iv.len(), 3);
        assert_eq!(iv[2].end, "2024-05-01T10:09:00.000Z");

        assert!(!rec.is_recording());
        assert_eq!(rec.current_state(), State::Good);
        assert!(rec.end(t0).is_err());
        assert!(rec.toggle(t0).is_err());
    }

    #[test]
    fn set_state_while_idle_only_changes_selection() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let mut rec = Recorder::new();
        assert!(rec.set_state(State::Avoid, t0).is_none());
        assert!(rec.entries().is_empty());
        let first = rec.start(rec.current_state(), t0).unwrap();
        assert_eq!(first.state, State::Avoid);
    }
}
