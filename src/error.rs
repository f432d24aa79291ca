use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,
    #[error("sample rate mismatch on {channel}: buffer at {expected} Hz, event at {actual} Hz")]
    RateMismatch {
        channel: String,
        expected: f64,
        actual: f64,
    },
    #[error("trace event for {0} carries no samples")]
    EmptyTrace(String),
    #[error("buffer store lock poisoned")]
    StorePoisoned,
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to render capture: {0}")]
    Capture(String),
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for MonitorError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        MonitorError::Capture(format!("{value:?}"))
    }
}

impl From<image::ImageError> for MonitorError {
    fn from(value: image::ImageError) -> Self {
        MonitorError::Capture(value.to_string())
    }
}

impl From<time::error::Format> for MonitorError {
    fn from(value: time::error::Format) -> Self {
        MonitorError::Capture(value.to_string())
    }
}
