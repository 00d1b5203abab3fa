//! # Privileged Handle Transfer
//!
//! Places the logon token into the peer's handle table.
//!
//! ## Security Notes
//!
//! - The peer is opened with `PROCESS_DUP_HANDLE` and nothing else
//! - The duplicate carries `TOKEN_QUERY | TOKEN_IMPERSONATE` only; the
//!   same-access option is passed as a hint and the explicit mask bounds it
//! - The local token and the peer handle are closed whatever the outcome

use super::entities::{DuplicateOptions, NativeStatus, TokenAccess};
use super::errors::KeyAuthError;
use super::resources::{IdentityToken, PeerProcess};
use crate::ports::outbound::{HostSecurity, PeerConnection};
use tracing::{debug, error};

/// Rights of the token handle placed in the peer.
pub const TRANSFER_TOKEN_ACCESS: TokenAccess = TokenAccess::QUERY_IMPERSONATE;

/// `STATUS_INVALID_HANDLE`, reported when a duplicate does not fit in 32 bits.
const STATUS_INVALID_HANDLE: NativeStatus = NativeStatus(0xC000_0008_u32 as i32);

/// Duplicate `token` into the process behind `connection`.
///
/// Consumes the token; it is closed before this returns. On success returns
/// the duplicate's handle value in the peer's table.
pub fn transfer_token<H: HostSecurity>(
    host: &H,
    token: IdentityToken<'_, H>,
    connection: &dyn PeerConnection,
) -> Result<u32, KeyAuthError> {
    let pid = connection
        .peer_process_id()
        .map_err(|status| KeyAuthError::PeerIdentificationFailed { status })?;

    let peer = PeerProcess::open(host, pid)
        .map_err(|status| KeyAuthError::PeerUnreachable { pid, status })?;

    let duplicated = host
        .duplicate_handle(
            token.raw(),
            peer.handle(),
            TRANSFER_TOKEN_ACCESS,
            DuplicateOptions::SAME_ACCESS,
        )
        .map_err(|status| KeyAuthError::HandleDuplicationFailed { status })?;

    // Handle values are 32-bit significant; anything wider cannot go on the
    // wire, so take it back out of the peer rather than leave it orphaned.
    let value = match u32::try_from(duplicated.0) {
        Ok(value) => value,
        Err(_) => {
            if let Err(status) = host.close_remote_handle(peer.handle(), duplicated) {
                error!(pid, %status, "failed to reclaim unrepresentable peer handle");
            }
            return Err(KeyAuthError::HandleDuplicationFailed {
                status: STATUS_INVALID_HANDLE,
            });
        }
    };

    debug!(pid = peer.pid(), "token duplicated into peer");
    Ok(value)
}
