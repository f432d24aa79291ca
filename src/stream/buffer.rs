use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::MonitorError;
use crate::stream::trace::TraceEvent;

/// Merged rolling history for one channel, addressed on the channel's
/// fixed-rate sample grid. Overlapping merges are last-writer-wins per slot;
/// disjoint ranges are bridged with zero samples.
pub struct ChannelBuffer {
    start_index: i64,
    samples: VecDeque<f64>,
    sample_rate_hz: f64,
    retention: usize,
}

impl ChannelBuffer {
    pub fn new(sample_rate_hz: f64, retention: usize) -> Self {
        Self {
            start_index: 0,
            samples: VecDeque::with_capacity(retention),
            sample_rate_hz,
            retention: retention.max(1),
        }
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn end_index(&self) -> i64 {
        self.start_index + self.samples.len() as i64
    }

    pub fn merge(&mut self, event: &TraceEvent) -> Result<(), MonitorError> {
        if (event.sample_rate_hz - self.sample_rate_hz).abs() > f64::EPSILON {
            return Err(MonitorError::RateMismatch {
                channel: event.channel.clone(),
                expected: self.sample_rate_hz,
                actual: event.sample_rate_hz,
            });
        }
        let start = event.start_index();
        if self.samples.is_empty() {
            self.start_index = start;
        } else {
            let gap = start - self.end_index();
            if gap >= self.retention as i64 {
                // The whole retained history would be evicted anyway.
                self.samples.clear();
                self.start_index = start;
            } else if gap > 0 {
                for _ in 0..gap {
                    self.samples.push_back(0.0);
                }
            }
        }
        for (offset, &value) in event.samples.iter().enumerate() {
            let index = start + offset as i64;
            if index < self.start_index {
                continue;
            }
            let slot = (index - self.start_index) as usize;
            if slot < self.samples.len() {
                self.samples[slot] = value;
            } else {
                self.samples.push_back(value);
            }
        }
        self.enforce_retention();
        Ok(())
    }

    fn enforce_retention(&mut self) {
        while self.samples.len() > self.retention {
            self.samples.pop_front();
            self.start_index += 1;
        }
    }

    pub fn history(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }
}

/// Consistent read-only copy of one channel as of a snapshot.
#[derive(Clone, Debug)]
pub struct ChannelSnapshot {
    pub channel: String,
    pub samples: Vec<f64>,
}

/// Shared surface between the ingestion and scheduler actors. Every mutation
/// and every history read goes through the one mutex; the lock is only ever
/// held across in-memory work.
pub struct BufferStore {
    channels: Mutex<HashMap<String, ChannelBuffer>>,
    retention: usize,
}

impl BufferStore {
    pub fn new(retention: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            retention,
        }
    }

    pub fn merge(&self, event: &TraceEvent) -> Result<(), MonitorError> {
        event.validate()?;
        let mut channels = self
            .channels
            .lock()
            .map_err(|_| MonitorError::StorePoisoned)?;
        let buffer = channels
            .entry(event.channel.clone())
            .or_insert_with(|| ChannelBuffer::new(event.sample_rate_hz, self.retention));
        buffer.merge(event)
    }

    /// Clones every channel's retained history under the lock, sorted by
    /// channel id so render order is stable.
    pub fn snapshot(&self) -> Result<Vec<ChannelSnapshot>, MonitorError> {
        let channels = self
            .channels
            .lock()
            .map_err(|_| MonitorError::StorePoisoned)?;
        let mut out: Vec<ChannelSnapshot> = channels
            .iter()
            .map(|(id, buffer)| ChannelSnapshot {
                channel: id.clone(),
                samples: buffer.history(),
            })
            .collect();
        out.sort_by(|a, b| a.channel.cmp(&b.channel));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, UNIX_EPOCH};

    fn event_at(secs: u64, samples: Vec<f64>) -> TraceEvent {
        TraceEvent {
            channel: "G.PEL.00.BHZ".into(),
            start: UNIX_EPOCH + Duration::from_secs(secs),
            sample_rate_hz: 1.0,
            samples,
        }
    }

    #[test]
    fn merge_is_idempotent() {
        let mut buffer = ChannelBuffer::new(1.0, 100);
        let ev = event_at(10, vec![1.0, 2.0, 3.0]);
        buffer.merge(&ev).unwrap();
        let once = buffer.history();
        buffer.merge(&ev).unwrap();
        assert_eq!(buffer.history(), once);
    }

    #[test]
    fn overlap_is_last_writer_wins_and_stays_ordered() {
        let mut buffer = ChannelBuffer::new(1.0, 100);
        buffer.merge(&event_at(10, vec![1.0, 2.0, 3.0, 4.0])).unwrap();
        // Overlaps the last two slots and extends by two.
        buffer.merge(&event_at(12, vec![9.0, 8.0, 7.0, 6.0])).unwrap();
        assert_eq!(buffer.history(), vec![1.0, 2.0, 9.0, 8.0, 7.0, 6.0]);
    }

    #[test]
    fn gap_is_bridged_with_zeros() {
        let mut buffer = ChannelBuffer::new(1.0, 100);
        buffer.merge(&event_at(10, vec![1.0, 1.0])).unwrap();
        buffer.merge(&event_at(15, vec![2.0, 2.0])).unwrap();
        assert_eq!(buffer.history(), vec![1.0, 1.0, 0.0, 0.0, 0.0, 2.0, 2.0]);
    }

    #[test]
    fn far_future_event_resets_the_buffer() {
        let mut buffer = ChannelBuffer::new(1.0, 10);
        buffer.merge(&event_at(10, vec![1.0, 1.0])).unwrap();
        buffer.merge(&event_at(1000, vec![2.0, 2.0])).unwrap();
        assert_eq!(buffer.history(), vec![2.0, 2.0]);
    }

    #[test]
    fn retention_evicts_oldest() {
        let mut buffer = ChannelBuffer::new(1.0, 4);
        buffer.merge(&event_at(10, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])).unwrap();
        assert_eq!(buffer.history(), vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn stale_samples_before_retained_start_are_ignored() {
        let mut buffer = ChannelBuffer::new(1.0, 4);
        buffer.merge(&event_at(10, vec![1.0, 2.0, 3.0, 4.0])).unwrap();
        // Starts before the retained range; only the tail lands.
        buffer.merge(&event_at(8, vec![9.0, 9.0, 9.0])).unwrap();
        assert_eq!(buffer.history(), vec![9.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn rate_mismatch_is_rejected() {
        let mut buffer = ChannelBuffer::new(20.0, 100);
        let mut ev = event_at(10, vec![1.0]);
        ev.sample_rate_hz = 40.0;
        assert!(matches!(
            buffer.merge(&ev),
            Err(MonitorError::RateMismatch { .. })
        ));
    }

    #[test]
    fn store_snapshot_is_sorted_and_validated() {
        let store = BufferStore::new(100);
        let mut b = event_at(10, vec![1.0]);
        b.channel = "G.INU.00.BHZ".into();
        store.merge(&event_at(10, vec![2.0])).unwrap();
        store.merge(&b).unwrap();
        let snap = store.snapshot().unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].channel, "G.INU.00.BHZ");
        assert_eq!(snap[1].channel, "G.PEL.00.BHZ");
        assert!(store.merge(&event_at(10, vec![])).is_err());
    }

    #[test]
    fn concurrent_merges_never_tear_a_snapshot() {
        // Each merged event is a run of 10 identical values; retention is a
        // multiple of the run length and events are contiguous, so every
        // consistent snapshot decomposes into whole runs.
        const RUN: usize = 10;
        let store = Arc::new(BufferStore::new(100));
        let writer_store = Arc::clone(&store);
        let writer = thread::spawn(move || {
            for k in 0..200u64 {
                let ev = event_at(k * RUN as u64, vec![k as f64; RUN]);
                writer_store.merge(&ev).unwrap();
            }
        });
        for _ in 0..500 {
            let snap = store.snapshot().unwrap();
            if let Some(channel) = snap.first() {
                assert_eq!(channel.samples.len() % RUN, 0);
                for run in channel.samples.chunks(RUN) {
                    assert!(run.iter().all(|v| v == &run[0]));
                }
            }
        }
        writer.join().unwrap();
    }
}
