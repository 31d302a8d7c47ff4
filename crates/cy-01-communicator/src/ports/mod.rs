//! Ports module for the exchange communicator

pub mod inbound;
pub mod outbound;

pub use inbound::ExchangeApi;
pub use outbound::{CommContext, GroupComm, WindowTransport};
