//! Domain layer for the hub

pub mod bounds;
pub mod gaps;

pub use bounds::GlobalBounds;
pub use gaps::Gaps;
