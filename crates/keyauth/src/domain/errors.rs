//! # KeyAuth Errors
//!
//! Every failure of the pipeline is one of these kinds. They are terminal for
//! the request and exist for logging; the wire only ever sees
//! [`RequestRejected`].

use super::entities::NativeStatus;
use thiserror::Error;

/// Status pair reported by a failed logon call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogonFailure {
    pub status: NativeStatus,
    pub sub_status: NativeStatus,
}

/// A host allocation could not be satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("allocation of {requested} bytes failed")]
pub struct AllocError {
    pub requested: usize,
}

/// Errors that can occur while handling a `keyauthenticate` request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyAuthError {
    /// Truncated field, wrong operation tag, or an account name out of bounds
    #[error("Malformed request: {reason}")]
    MalformedRequest { reason: String },

    /// The public key blob could not be parsed
    #[error("Malformed key: {reason}")]
    MalformedKey { reason: String },

    /// The signature did not verify for the given key and payload
    #[error("Signature verification failed")]
    SignatureInvalid,

    /// Logon-process registration or LUID allocation failed
    #[error("Logon subsystem unavailable (status {status})")]
    LogonSubsystemUnavailable { status: NativeStatus },

    /// The authentication package is not registered
    #[error("Authentication package {package:?} unavailable (status {status})")]
    AuthPackageUnavailable {
        package: String,
        status: NativeStatus,
    },

    /// The logon-info buffer could not be allocated
    #[error("Out of memory allocating {requested} bytes")]
    OutOfMemory { requested: usize },

    /// The S4U logon call returned a non-success status
    #[error("Logon failed (status {}, sub-status {})", .0.status, .0.sub_status)]
    LogonFailed(LogonFailure),

    /// The connection could not report its peer process id
    #[error("Peer identification failed (status {status})")]
    PeerIdentificationFailed { status: NativeStatus },

    /// The peer process could not be opened for handle duplication
    #[error("Peer process {pid} unreachable (status {status})")]
    PeerUnreachable { pid: u32, status: NativeStatus },

    /// The token could not be duplicated into the peer
    #[error("Handle duplication failed (status {status})")]
    HandleDuplicationFailed { status: NativeStatus },
}

impl KeyAuthError {
    /// Stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            KeyAuthError::MalformedRequest { .. } => "malformed_request",
            KeyAuthError::MalformedKey { .. } => "malformed_key",
            KeyAuthError::SignatureInvalid => "signature_invalid",
            KeyAuthError::LogonSubsystemUnavailable { .. } => "logon_subsystem_unavailable",
            KeyAuthError::AuthPackageUnavailable { .. } => "auth_package_unavailable",
            KeyAuthError::OutOfMemory { .. } => "out_of_memory",
            KeyAuthError::LogonFailed(_) => "logon_failed",
            KeyAuthError::PeerIdentificationFailed { .. } => "peer_identification_failed",
            KeyAuthError::PeerUnreachable { .. } => "peer_unreachable",
            KeyAuthError::HandleDuplicationFailed { .. } => "handle_duplication_failed",
        }
    }

    pub(crate) fn malformed_request(reason: impl Into<String>) -> Self {
        KeyAuthError::MalformedRequest {
            reason: reason.into(),
        }
    }
}

/// The only failure signal handed back to the transport.
///
/// Carries no detail; the transport answers with a generic
/// agent failure.
#[derive(Debug, Clone, Copy, Default, Error, PartialEq, Eq)]
#[error("invalid request")]
pub struct RequestRejected;

impl From<KeyAuthError> for RequestRejected {
    fn from(_: KeyAuthError) -> Self {
        RequestRejected
    }
}
