use std::thread::{self, JoinHandle};

use crate::error::MonitorError;
use crate::stream::buffer::BufferStore;
use crate::stream::source::TraceSource;
use crate::stream::trace::StreamEvent;
use std::sync::Arc;

/// Whether the ingestion loop should keep pulling events.
#[derive(Debug, PartialEq, Eq)]
pub enum SinkVerdict {
    Continue,
    Stop,
}

/// Consumes decoded stream events and folds trace payloads into the shared
/// store. Malformed events are dropped with a warning; only a poisoned store
/// stops the loop.
pub struct IngestionSink {
    store: Arc<BufferStore>,
}

impl IngestionSink {
    pub fn new(store: Arc<BufferStore>) -> Self {
        Self { store }
    }

    pub fn handle(&self, event: StreamEvent) -> SinkVerdict {
        match event {
            StreamEvent::Info(message) => {
                log::info!("stream: {message}");
                SinkVerdict::Continue
            }
            StreamEvent::Empty => {
                log::debug!("stream: packet without trace payload");
                SinkVerdict::Continue
            }
            StreamEvent::Trace(trace) => match self.store.merge(&trace) {
                Ok(()) => SinkVerdict::Continue,
                Err(MonitorError::StorePoisoned) => {
                    log::error!("buffer store poisoned, stopping ingestion");
                    SinkVerdict::Stop
                }
                Err(err) => {
                    log::warn!("dropping trace event for {}: {err}", trace.channel);
                    SinkVerdict::Continue
                }
            },
        }
    }
}

/// Runs the blocking client loop on its own thread. Returns when the source
/// is exhausted, the source errors, or the sink votes to stop.
pub fn spawn_ingest<S>(mut source: S, sink: IngestionSink) -> JoinHandle<()>
where
    S: TraceSource + Send + 'static,
{
    thread::spawn(move || loop {
        match source.next_event() {
            Ok(Some(event)) => {
                if sink.handle(event) == SinkVerdict::Stop {
                    break;
                }
            }
            Ok(None) => {
                log::info!("stream source exhausted");
                break;
            }
            Err(err) => {
                log::warn!("stream source failed: {err}");
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::source::ManualSource;
    use crate::stream::trace::TraceEvent;
    use std::time::{Duration, UNIX_EPOCH};

    fn trace(rate: f64, samples: Vec<f64>) -> StreamEvent {
        StreamEvent::Trace(TraceEvent {
            channel: "G.PEL.00.BHZ".into(),
            start: UNIX_EPOCH + Duration::from_secs(100),
            sample_rate_hz: rate,
            samples,
        })
    }

    #[test]
    fn malformed_events_are_dropped_without_stopping() {
        let store = Arc::new(BufferStore::new(100));
        let sink = IngestionSink::new(Arc::clone(&store));
        assert_eq!(sink.handle(StreamEvent::Info("hello".into())), SinkVerdict::Continue);
        assert_eq!(sink.handle(StreamEvent::Empty), SinkVerdict::Continue);
        assert_eq!(sink.handle(trace(0.0, vec![1.0])), SinkVerdict::Continue);
        assert_eq!(sink.handle(trace(20.0, vec![1.0, 2.0])), SinkVerdict::Continue);
        let snap = store.snapshot().unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].samples, vec![1.0, 2.0]);
    }

    #[test]
    fn ingest_thread_drains_a_manual_source() {
        let store = Arc::new(BufferStore::new(100));
        let sink = IngestionSink::new(Arc::clone(&store));
        let source = ManualSource::new(vec![
            StreamEvent::Info("connected".into()),
            trace(20.0, vec![3.0; 5]),
            StreamEvent::Empty,
        ]);
        spawn_ingest(source, sink).join().unwrap();
        let snap = store.snapshot().unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].samples.len(), 5);
    }
}
