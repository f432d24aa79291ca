use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::MonitorError;

/// Single decoded batch of time-ordered samples for one channel.
#[derive(Clone, Debug)]
pub struct TraceEvent {
    pub channel: String,
    pub start: SystemTime,
    pub sample_rate_hz: f64,
    pub samples: Vec<f64>,
}

impl TraceEvent {
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.sample_rate_hz <= 0.0 {
            return Err(MonitorError::InvalidSampleRate);
        }
        if self.samples.is_empty() {
            return Err(MonitorError::EmptyTrace(self.channel.clone()));
        }
        Ok(())
    }

    /// Absolute index of the first sample on the channel's fixed-rate grid.
    pub fn start_index(&self) -> i64 {
        let secs = match self.start.duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs_f64(),
            Err(before) => -before.duration().as_secs_f64(),
        };
        (secs * self.sample_rate_hz).round() as i64
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate_hz)
    }
}

/// What the external streaming client hands to the ingestion callback.
#[derive(Clone, Debug)]
pub enum StreamEvent {
    /// Control/info notification; carries no sample payload.
    Info(String),
    /// Decoded packet without a trace payload.
    Empty,
    /// Ordered samples for exactly one channel.
    Trace(TraceEvent),
}
