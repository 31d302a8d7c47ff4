//! Domain layer for the exchange communicator
//!
//! Pure state: no transport calls happen in here.

pub mod buffer;
pub mod consensus;
pub mod registry;
pub mod shutdown;

pub use buffer::{RecvBuffer, SendBuffer};
pub use consensus::{decide, FetchOutcome, Observation, CONTRIBUTION_LEN};
pub use registry::{FieldHandle, FieldRegistry};
pub use shutdown::{ShutdownLatch, SHUTDOWN_VALUE};
