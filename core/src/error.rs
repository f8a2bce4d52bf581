use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse GPX: {0}")]
    Gpx(String),
    #[error("invalid JSON at {path}: {message}")]
    Json { path: String, message: String },
    #[error("recording not found: {0}")]
    RecordingNotFound(String),
    #[error("recording is empty: {0}")]
    EmptyRecording(String),
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error("no recording in progress")]
    NotRecording,
    #[error("invalid config: {0}")]
    Config(String),
}

impl From<quick_xml::Error> for SplitError {
    fn from(e: quick_xml::Error) -> Self {
        SplitError::Gpx(e.to_string())
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for SplitError {
    fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
        SplitError::Json {
            path: e.path().to_string(),
            message: e.inner().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SplitError>;
