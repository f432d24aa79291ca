use std::collections::VecDeque;
use std::f64::consts::PI;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::MonitorError;
use crate::stream::trace::{StreamEvent, TraceEvent};

/// The external streaming client seam. Implementations own the wire protocol;
/// the core only sees decoded events. `Ok(None)` ends the client loop.
pub trait TraceSource {
    fn next_event(&mut self) -> Result<Option<StreamEvent>, MonitorError>;
}

/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<StreamEvent>,
}

impl ManualSource {
    pub fn new(events: impl IntoIterator<Item = StreamEvent>) -> Self {
        Self {
            queue: events.into_iter().collect(),
        }
    }
}

impl TraceSource for ManualSource {
    fn next_event(&mut self) -> Result<Option<StreamEvent>, MonitorError> {
        Ok(self.queue.pop_front())
    }
}

struct SynthChannel {
    id: String,
    freq_hz: f64,
    phase: f64,
    amp: f64,
    next_start: SystemTime,
}

/// Stand-in for the external SeedLink client: paced sine-plus-noise batches
/// per subscribed channel, seeded with a backfill span so the first frames
/// already have history to window. Rare large spikes exercise the alert path.
pub struct SyntheticSource {
    channels: Vec<SynthChannel>,
    sample_rate_hz: f64,
    batch: usize,
    rng: StdRng,
    cursor: usize,
    announced: bool,
}

impl SyntheticSource {
    pub fn new(ids: &[String], sample_rate_hz: f64, backfill: Duration) -> Self {
        let seed_start = SystemTime::now() - backfill;
        let channels = ids
            .iter()
            .enumerate()
            .map(|(index, id)| SynthChannel {
                id: id.clone(),
                freq_hz: 0.6 + index as f64 * 0.35,
                phase: index as f64 * 0.8,
                amp: 1_800.0,
                next_start: seed_start,
            })
            .collect();
        Self {
            channels,
            sample_rate_hz,
            batch: ((sample_rate_hz * 0.25).ceil() as usize).max(1),
            rng: StdRng::from_entropy(),
            cursor: 0,
            announced: false,
        }
    }

    fn pending_samples(&self, index: usize) -> usize {
        let waiting = SystemTime::now()
            .duration_since(self.channels[index].next_start)
            .unwrap_or_default();
        (waiting.as_secs_f64() * self.sample_rate_hz) as usize
    }

    fn emit(&mut self, index: usize, count: usize) -> TraceEvent {
        let (freq_hz, phase, amp, start) = {
            let channel = &self.channels[index];
            (channel.freq_hz, channel.phase, channel.amp, channel.next_start)
        };
        let epoch = start
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        let mut samples = Vec::with_capacity(count);
        for k in 0..count {
            let t = epoch + k as f64 / self.sample_rate_hz;
            let base = (2.0 * PI * freq_hz * t + phase).sin() * amp;
            let noise = self.rng.gen_range(-amp * 0.15..amp * 0.15);
            let spike = if self.rng.gen_bool(1.0 / 50_000.0) {
                amp * 30.0
            } else {
                0.0
            };
            samples.push(base + noise + spike);
        }
        let channel = &mut self.channels[index];
        channel.next_start = start + Duration::from_secs_f64(count as f64 / self.sample_rate_hz);
        TraceEvent {
            channel: channel.id.clone(),
            start,
            sample_rate_hz: self.sample_rate_hz,
            samples,
        }
    }
}

impl TraceSource for SyntheticSource {
    fn next_event(&mut self) -> Result<Option<StreamEvent>, MonitorError> {
        if self.channels.is_empty() {
            return Ok(None);
        }
        if !self.announced {
            self.announced = true;
            return Ok(Some(StreamEvent::Info(format!(
                "synthetic feed: {} channels at {} Hz",
                self.channels.len(),
                self.sample_rate_hz
            ))));
        }
        loop {
            for _ in 0..self.channels.len() {
                let index = self.cursor;
                self.cursor = (self.cursor + 1) % self.channels.len();
                let pending = self.pending_samples(index);
                if pending >= self.batch {
                    // Backfill drains in large chunks, live data in small ones.
                    let count = pending.min(2_048);
                    return Ok(Some(StreamEvent::Trace(self.emit(index, count))));
                }
            }
            thread::sleep(Duration::from_millis(50));
        }
    }
}
