//! Domain layer for bound-reporting spokes

pub mod incumbent;
pub mod trace;
pub mod tracker;

pub use incumbent::IncumbentCache;
pub use trace::{trace_path, TraceLog, TRACE_HEADER};
pub use tracker::{BoundState, BoundTracker};
