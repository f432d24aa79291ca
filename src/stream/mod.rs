pub mod alert;
pub mod baseline;
pub mod buffer;
pub mod sink;
pub mod source;
pub mod trace;
pub mod window;

pub use alert::{AlertManager, AlertOutcome, AlertState, Notify};
pub use baseline::BaselineTracker;
pub use buffer::{BufferStore, ChannelSnapshot};
pub use sink::{spawn_ingest, IngestionSink};
pub use source::{ManualSource, SyntheticSource, TraceSource};
pub use trace::{StreamEvent, TraceEvent};
