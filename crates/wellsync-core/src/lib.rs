//! Core types: event records, classification, sync windows, tracing

pub mod classify;
pub mod event;
pub mod time;
pub mod tracing;

pub use classify::{MANAGED_MARKER, classify, is_managed, stamp_managed};
pub use event::{Category, EventFields, EventOrigin, EventRecord, ProviderKind};
pub use time::{SyncWindow, TimeWindow};
pub use tracing::{LogConfig, LogFormat, TracingError, init_tracing};
