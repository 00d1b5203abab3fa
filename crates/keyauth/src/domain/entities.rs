//! # Domain Entities
//!
//! The decoded request, the response, and the opaque host values that flow
//! between the pipeline stages. None of them outlive a single request.

use std::fmt;
use std::ops::BitOr;

/// Operation tag carried by every key-authentication request.
pub const AUTH_REQUEST: &str = "keyauthenticate";

// =============================================================================
// Request / Response
// =============================================================================

/// A decoded `keyauthenticate` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthRequest {
    /// Operation tag, always equal to [`AUTH_REQUEST`] once decoded.
    pub operation: &'static str,
    /// SSH wire-format public key blob.
    pub public_key_blob: Vec<u8>,
    /// Account to log on, as received.
    pub account_name: String,
    /// Account name as UTF-16 code units, without terminator.
    pub account_name_wide: Vec<u16>,
    /// SSH wire-format signature blob over `signed_payload`.
    pub signature: Vec<u8>,
    /// Bytes the signature attests to.
    pub signed_payload: Vec<u8>,
}

/// Successful result: the token handle value inside the peer's handle table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthResponse {
    /// Handle value valid only in the peer process.
    pub peer_token_handle: u32,
}

// =============================================================================
// Host Values
// =============================================================================

/// Opaque native handle value. The core never dereferences it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawHandle(pub usize);

impl RawHandle {
    /// The null handle.
    pub const NULL: RawHandle = RawHandle(0);

    /// Whether this is the null handle.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Handle to a logon-process registration with the security subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LsaHandle(pub usize);

/// Identifier of an authentication package.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthPackageId(pub u32);

/// Locally unique identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Luid {
    pub low_part: u32,
    pub high_part: i32,
}

impl fmt::Display for Luid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}:{:08x}", self.high_part as u32, self.low_part)
    }
}

/// Token source passed to the logon call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenSource {
    /// Fixed 8-byte source name.
    pub name: [u8; 8],
    /// Fresh identifier distinguishing this logon session.
    pub identifier: Luid,
}

/// Logon type requested from the security subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum LogonType {
    /// Network-style, non-interactive logon.
    Network = 3,
}

/// Quota limits returned by the logon call. Not used beyond diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuotaLimits {
    pub paged_pool_limit: usize,
    pub non_paged_pool_limit: usize,
    pub minimum_working_set_size: usize,
    pub maximum_working_set_size: usize,
    pub pagefile_limit: usize,
    pub time_limit: i64,
}

/// Address of a profile buffer owned by the security subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProfileBufferPtr(pub usize);

/// Raw host status code (NTSTATUS or HRESULT), kept for diagnostics only.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeStatus(pub i32);

impl NativeStatus {
    /// Success status.
    pub const SUCCESS: NativeStatus = NativeStatus(0);
}

impl fmt::Display for NativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0 as u32)
    }
}

impl fmt::Debug for NativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeStatus({self})")
    }
}

// =============================================================================
// Access Masks
// =============================================================================

/// Token access rights.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenAccess(pub u32);

impl TokenAccess {
    /// `TOKEN_IMPERSONATE`
    pub const IMPERSONATE: TokenAccess = TokenAccess(0x0004);
    /// `TOKEN_QUERY`
    pub const QUERY: TokenAccess = TokenAccess(0x0008);
    /// The only rights a transferred token ever carries.
    pub const QUERY_IMPERSONATE: TokenAccess =
        TokenAccess(Self::QUERY.0 | Self::IMPERSONATE.0);

    /// Whether every bit of `other` is set in `self`.
    pub fn contains(self, other: TokenAccess) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TokenAccess {
    type Output = TokenAccess;

    fn bitor(self, rhs: TokenAccess) -> TokenAccess {
        TokenAccess(self.0 | rhs.0)
    }
}

/// Process access rights.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessAccess(pub u32);

impl ProcessAccess {
    /// `PROCESS_DUP_HANDLE`
    pub const DUP_HANDLE: ProcessAccess = ProcessAccess(0x0040);
}

/// Options for handle duplication.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DuplicateOptions(pub u32);

impl DuplicateOptions {
    /// `DUPLICATE_CLOSE_SOURCE`
    pub const CLOSE_SOURCE: DuplicateOptions = DuplicateOptions(0x1);
    /// `DUPLICATE_SAME_ACCESS`, passed as a hint; the explicit mask still bounds the rights.
    pub const SAME_ACCESS: DuplicateOptions = DuplicateOptions(0x2);
}

// =============================================================================
// Logon Call
// =============================================================================

/// Inputs of the S4U logon call.
#[derive(Debug)]
pub struct LogonRequest<'a, I> {
    pub origin_name: &'a str,
    pub logon_type: LogonType,
    pub package: AuthPackageId,
    /// Host-allocated logon-info buffer holding the account name.
    pub logon_info: &'a I,
    pub source: TokenSource,
}

/// Everything the logon call hands back on success.
///
/// `token` and `profile` are owned by the receiver and must each be released
/// exactly once: the token with `close_handle`, the profile with
/// `free_return_buffer`.
#[derive(Debug, PartialEq, Eq)]
pub struct LogonOutput {
    pub token: RawHandle,
    pub profile: Option<ProfileBufferPtr>,
    pub profile_len: u32,
    pub logon_id: Luid,
    pub quotas: QuotaLimits,
}
