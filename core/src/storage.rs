use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SplitError};
use crate::metrics::METRICS;
use crate::timestamp::{format_iso, parse_timestamp};

const KEY_PREFIX: &str = "recording-";
const KEY_SUFFIX: &str = ".txt";

static KEY_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"T(\d{2})-(\d{2})-(\d{2})").expect("static regex"));

/// Enkel nøkkel/verdi-lagring for opptak (tilsvarer nettleserens localStorage).
pub trait RecordingStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordingStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items.keys().cloned().collect())
    }
}

/// Én fil per nøkkel i en katalog.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        // Nøkler er filnavn, ikke stier
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(SplitError::RecordingNotFound(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

impl RecordingStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path_for(key)?, value)?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    keys.push(name.to_string());
                }
            }
        }
        Ok(keys)
    }
}

/// `recording-2024-05-01T10-15-30.123Z.txt`
pub fn recording_key(now: DateTime<Utc>) -> String {
    format!("{KEY_PREFIX}{}{KEY_SUFFIX}", format_iso(now).replace(':', "-"))
}

pub fn is_recording_key(key: &str) -> bool {
    key.starts_with(KEY_PREFIX) && key.ends_with(KEY_SUFFIX)
}

// Fjerner første forekomst av prefiks og suffiks, ikke alle
fn key_stem(key: &str) -> String {
    key.replacen(KEY_PREFIX, "", 1).replacen(KEY_SUFFIX, "", 1)
}

/// Henter tidspunktet ut av nøkkelen igjen (kolon tilbake i klokkeslettet).
pub fn parse_recording_key(key: &str) -> Option<DateTime<Utc>> {
    let stem = key_stem(key);
    let iso = KEY_TIME_RE.replace(&stem, "T$1:$2:$3");
    parse_timestamp(&iso)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingListing {
    pub key: String,
    pub recorded_at: DateTime<Utc>,
}

impl RecordingListing {
    pub fn label(&self) -> String {
        format!("Recording - {}", self.recorded_at.format("%b %-d, %Y, %H:%M"))
    }
}

/// Lagrer opptaksteksten under en tidsstemplet nøkkel og returnerer nøkkelen.
pub fn save_recording(store: &mut dyn RecordingStore, content: &str, now: DateTime<Utc>) -> Result<String> {
    let key = recording_key(now);
    store.set(&key, content)?;
    METRICS.recordings_saved_total.inc();
    info!("✅ Opptak lagret som {}", key);
    Ok(key)
}

pub fn load_recording(store: &dyn RecordingStore, key: &str) -> Result<String> {
    match store.get(key)? {
        None => Err(SplitError::RecordingNotFound(key.to_string())),
        Some(text) if text.trim().is_empty() => Err(SplitError::EmptyRecording(key.to_string())),
        Some(text) => {
            info!("📂 Opptak lastet fra {}", key);
            Ok(text)
        }
    }
}

/// Alle opptak i lageret, sortert på nøkkel (dvs. kronologisk).
/// Nøkler der tidspunktet ikke kan leses tilbake (ødelagt navn) utelates.
pub fn list_recordings(store: &dyn RecordingStore) -> Result<Vec<RecordingListing>> {
    let mut keys: Vec<String> = store.keys()?.into_iter().filter(|k| is_recording_key(k)).collect();
    keys.sort();
    Ok(keys
        .into_iter()
        .filter_map(|key| match parse_recording_key(&key) {
            Some(recorded_at) => Some(RecordingListing { key, recorded_at }),
            None => {
                debug!("Hopper over opptak med ødelagt navn: {}", key);
                None
            }
        })
        .collect())
}
