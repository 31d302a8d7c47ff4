//! Ports module for the hub

pub mod inbound;

pub use inbound::{BoundsUpdate, HubApi};
