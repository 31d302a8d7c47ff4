//! Error types for the hub communicator

use cy_01_communicator::CommError;
use shared_types::Field;
use thiserror::Error;

/// Hub errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HubError {
    /// Exchange failure
    #[error("Exchange error: {0}")]
    Comm(#[from] CommError),

    /// Some spoke reads a nonant-length field but the hub has no workload
    #[error("Spokes read {field} but the hub's nonant length is 0")]
    NoLocalWorkload { field: Field },

    /// Spoke variant list does not match the topology
    #[error("Hub was given {actual} spoke variants for {expected} spokes")]
    SpokeCountMismatch { expected: usize, actual: usize },
}

impl HubError {
    pub fn is_setup_error(&self) -> bool {
        match self {
            HubError::Comm(e) => e.is_setup_error(),
            HubError::NoLocalWorkload { .. } | HubError::SpokeCountMismatch { .. } => true,
        }
    }
}

/// Result type for hub operations
pub type HubResult<T> = Result<T, HubError>;
