use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tilstanden brukeren registrerer underveis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum State {
    #[default]
    Good,
    Avoid,
}

impl State {
    pub fn toggled(self) -> Self {
        match self {
            State::Good => State::Avoid,
            State::Avoid => State::Good,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Good => "Good",
            State::Avoid => "Avoid",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for State {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Good" => Ok(State::Good),
            "Avoid" => Ok(State::Avoid),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Start,
    Toggle,
    End,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Start => "Start",
            EntryKind::Toggle => "Toggle",
            EntryKind::End => "End",
        }
    }
}

impl FromStr for EntryKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Start" => Ok(EntryKind::Start),
            "Toggle" => Ok(EntryKind::Toggle),
            "End" => Ok(EntryKind::End),
            _ => Err(()),
        }
    }
}

/// Én linje i opptaksloggen, f.eks. `Toggle: Avoid at 2024-05-01T10:15:30.000Z`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub kind: EntryKind,
    pub state: State,
    pub timestamp: String, // ISO-8601, slik den står i loggen
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.kind.as_str(), self.state, self.timestamp)
    }
}

/// Tidsrom med én tilstand. Halvåpent: `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub state: State,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
    pub time: String, // rå <time>-tekst, skrives tilbake uendret
}

pub type Segment = Vec<TrackPoint>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitStats {
    pub points_total: usize,
    pub points_without_time: usize,
    pub points_unmatched: usize,
    pub gap_breaks: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitResult {
    pub good: Vec<Segment>,
    pub avoid: Vec<Segment>,
    pub stats: SplitStats,
}

impl SplitResult {
    pub fn segments(&self, state: State) -> &[Segment] {
        match state {
            State::Good => &self.good,
            State::Avoid => &self.avoid,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.good.is_empty() && self.avoid.is_empty()
    }

    /// Omsluttende boks for alle punkter i begge lister (kartutsnitt).
    pub fn bounds(&self) -> Option<Bounds> {
        let mut out: Option<Bounds> = None;
        for p in self.good.iter().chain(self.avoid.iter()).flatten() {
            if !p.lat.is_finite() || !p.lon.is_finite() {
                continue;
            }
            out = Some(match out {
                None => Bounds { min_lat: p.lat, min_lon: p.lon, max_lat: p.lat, max_lon: p.lon },
                Some(b) => Bounds {
                    min_lat: b.min_lat.min(p.lat),
                    min_lon: b.min_lon.min(p.lon),
                    max_lat: b.max_lat.max(p.lat),
                    max_lon: b.max_lon.max(p.lon),
                },
            });
        }
        out
    }
}
