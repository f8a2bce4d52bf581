//! gpxsplit core: Good/Avoid-opptak og splitting av GPX-spor etter tilstand.

pub mod config;
pub mod error;
pub mod gpx;
pub mod metrics;
pub mod recording;
pub mod segmentation;
pub mod storage;
pub mod timestamp;
pub mod types;

#[cfg(feature = "python")]
mod py;

pub use config::{load_config, save_config, SplitConfig, DEFAULT_MAX_GAP_SECS};
pub use error::{Result, SplitError};
pub use gpx::{generate_gpx, generate_split_gpx, parse_gpx_file, parse_track_points, save_split_gpx};
pub use recording::{parse_log_line, parse_recording_text, Recorder};
pub use segmentation::{process_gpx_and_split, split_track};
pub use storage::{
    list_recordings, load_recording, save_recording, DirStore, MemoryStore, RecordingListing, RecordingStore,
};
pub use types::{Bounds, EntryKind, Interval, LogEntry, Segment, SplitResult, SplitStats, State, TrackPoint};
