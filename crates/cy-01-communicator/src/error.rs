//! Error types for the exchange communicator
//!
//! Two families share one enum: setup errors (a configuration defect, never
//! retried) and protocol violations (a programming error in the caller).
//! Torn reads are not errors at all; they surface as `FetchOutcome::Torn`.

use shared_types::{Direction, Field, FieldKey, Rank};
use shared_window::WindowError;
use thiserror::Error;

/// Communicator errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommError {
    /// Same key registered twice with different lengths
    #[error("Field {key} already registered with length {registered}, cannot re-register with length {requested}")]
    LengthMismatch {
        key: FieldKey,
        registered: usize,
        requested: usize,
    },

    /// Same key registered as both send and receive
    #[error("Field {key} already registered as {registered:?}")]
    DirectionConflict {
        key: FieldKey,
        registered: Direction,
    },

    /// A rank tried to receive a field it owns
    #[error("Rank cannot receive its own field {key}")]
    SelfReceive { key: FieldKey },

    /// Registration attempted after the window was built
    #[error("Cannot register {key}: registration closed once the window is built")]
    RegistrationClosed { key: FieldKey },

    /// `make_window` called twice
    #[error("Window already built")]
    WindowAlreadyBuilt,

    /// A rank of this rank's strata group or cylinder failed its window setup
    #[error("Window setup failed on strata rank {rank}")]
    RemoteSetupFailure { rank: Rank },

    /// The rank gave up on setup for a reason outside the registry
    #[error("Window setup abandoned: {reason}")]
    SetupAbandoned { reason: String },

    /// Put/Get attempted before `make_window`
    #[error("Window not built yet: finish field registration first")]
    WindowNotReady,

    /// Key was never registered for receiving
    #[error("Field {key} is not registered for receiving")]
    NotRegistered { key: FieldKey },

    /// Publish to a field this rank does not own
    #[error("Field {field} is not registered for sending by this rank")]
    NotOwner { field: Field },

    /// Payload length differs from the registered length
    #[error("Payload length {actual} does not match {key} (length {expected})")]
    PayloadLength {
        key: FieldKey,
        expected: usize,
        actual: usize,
    },

    /// Transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] WindowError),
}

impl CommError {
    /// Configuration defects detected during field registration/window setup.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            CommError::LengthMismatch { .. }
                | CommError::DirectionConflict { .. }
                | CommError::SelfReceive { .. }
                | CommError::RemoteSetupFailure { .. }
                | CommError::SetupAbandoned { .. }
                | CommError::Transport(WindowError::LengthMismatch { .. })
        )
    }

    /// Caller misuse of the exchange API.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            CommError::RegistrationClosed { .. }
                | CommError::WindowAlreadyBuilt
                | CommError::WindowNotReady
                | CommError::NotRegistered { .. }
                | CommError::NotOwner { .. }
                | CommError::PayloadLength { .. }
                | CommError::Transport(WindowError::NotOwner { .. })
        )
    }
}

/// Result type for communicator operations
pub type CommResult<T> = Result<T, CommError>;
