//! Error types for the session control engine

use crate::controls::types::CapabilityId;
use crate::transport::TransportError;
use thiserror::Error;

/// Result type alias for control engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the session control engine
#[derive(Debug, Error)]
pub enum Error {
    /// Capability id not registered for this session's domain/codec pair
    #[error("capability {0} is not registered for this session")]
    InvalidCapability(CapabilityId),

    /// The capability graph contains a cycle; the session cannot
    /// initialize its control surface
    #[error("dependency cycle among capabilities: {0:?}")]
    DependencyCycle(Vec<CapabilityId>),

    /// Post-streaming write to a capability without the dynamic flag
    #[error("capability {0} cannot be adjusted while streaming")]
    NotDynamicallyAdjustable(CapabilityId),

    /// An adjust callback reported an internal inconsistency
    #[error("adjust failed for {cap}: {reason}")]
    AdjustFailure {
        /// Capability whose adjust callback failed
        cap: CapabilityId,
        /// Callback-reported reason
        reason: String,
    },

    /// Client-supplied value rejected by the capability's bounds
    #[error("invalid value {value} for capability {cap}")]
    InvalidValue {
        /// Capability the client wrote
        cap: CapabilityId,
        /// The rejected value
        value: i64,
    },

    /// Registration template failed build-time validation
    #[error("invalid capability graph: {0}")]
    InvalidGraph(String),

    /// No registration template exists for the requested session type
    #[error("unsupported session type: {domain} {codec}")]
    UnsupportedSession {
        /// Requested session domain
        domain: crate::controls::types::Domain,
        /// Requested codec
        codec: crate::controls::types::Codec,
    },

    /// Engine-wide session accounting limit reached
    #[error("session limit reached: {0}")]
    SessionLimit(String),

    /// A commit callback failed to reach the device
    #[error(transparent)]
    Transport(#[from] TransportError),
}
