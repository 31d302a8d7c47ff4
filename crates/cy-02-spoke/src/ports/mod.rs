//! Ports module for bound-reporting spokes

pub mod inbound;
pub mod outbound;

pub use inbound::BoundSpokeApi;
pub use outbound::SolutionSource;
