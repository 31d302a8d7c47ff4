//! Error types for bound-reporting spokes

use cy_01_communicator::CommError;
use shared_types::SpokeVariant;
use std::path::PathBuf;
use thiserror::Error;

/// Spoke errors
#[derive(Debug, Error)]
pub enum SpokeError {
    /// Exchange failure
    #[error("Exchange error: {0}")]
    Comm(#[from] CommError),

    /// Variant reads a nonant-length field but this rank has no workload
    #[error("{variant} needs a non-empty local workload, got nonant length 0")]
    NoLocalWorkload { variant: SpokeVariant },

    /// Incumbent-caching variant constructed without a solution source
    #[error("{variant} caches incumbents and needs a solution source")]
    MissingSolutionSource { variant: SpokeVariant },

    /// Solution source coordinates do not match its snapshot
    #[error("Solution snapshot has {actual} values for {expected} coordinates")]
    SnapshotLength { expected: usize, actual: usize },

    /// Refuse to overwrite the trace of an earlier run
    #[error("Spoke trace file {path:?} already exists")]
    TraceFileExists { path: PathBuf },

    /// Trace file could not be created or appended
    #[error("Trace file {path:?}: {source}")]
    TraceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Subordinate computation failed and the spoke runs in strict mode
    #[error("Computation for {unit} failed: {reason}")]
    ComputationFailed { unit: String, reason: String },

    /// Bound offered after `finalize`
    #[error("Bound offered after finalization")]
    AlreadyFinalized,
}

impl SpokeError {
    /// Fatal configuration defects raised while building the spoke.
    pub fn is_setup_error(&self) -> bool {
        match self {
            SpokeError::Comm(e) => e.is_setup_error(),
            SpokeError::NoLocalWorkload { .. }
            | SpokeError::MissingSolutionSource { .. }
            | SpokeError::TraceFileExists { .. } => true,
            _ => false,
        }
    }

    /// Caller misuse of the spoke API.
    pub fn is_protocol_violation(&self) -> bool {
        match self {
            SpokeError::Comm(e) => e.is_protocol_violation(),
            SpokeError::AlreadyFinalized | SpokeError::SnapshotLength { .. } => true,
            _ => false,
        }
    }
}

/// Result type for spoke operations
pub type SpokeResult<T> = Result<T, SpokeError>;
