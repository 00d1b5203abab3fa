//! # Inbound Ports (Driving Ports / API)
//!
//! The entry points the agent's request dispatcher uses.

use crate::domain::entities::AuthResponse;
use crate::domain::errors::{KeyAuthError, RequestRejected};
use crate::ports::outbound::PeerConnection;
use bytes::BytesMut;

/// Key-authentication API.
///
/// Each call handles exactly one request on the caller's thread and shares no
/// state with other calls. Implementations must be thread-safe (`Send + Sync`).
pub trait KeyAuthenticateApi: Send + Sync {
    /// Run the whole pipeline and return the detailed outcome.
    ///
    /// The error is for diagnostics only and must not be sent to the peer.
    fn authenticate(
        &self,
        request: &[u8],
        connection: &dyn PeerConnection,
    ) -> Result<AuthResponse, KeyAuthError>;

    /// Transport-facing form of [`authenticate`](Self::authenticate).
    ///
    /// On success, appends the peer's token handle as a big-endian `u32` to
    /// `response`. On failure, `response` is left untouched.
    fn process_request(
        &self,
        request: &[u8],
        response: &mut BytesMut,
        connection: &dyn PeerConnection,
    ) -> Result<(), RequestRejected>;
}
