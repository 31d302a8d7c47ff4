//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The communicator talks to the rest of the run only through the transport
//! ports of `shared-window`, bundled per rank in a `CommContext`.

pub use shared_window::{CommContext, GroupComm, WindowTransport};
