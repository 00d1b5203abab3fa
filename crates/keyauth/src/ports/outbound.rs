//! # Outbound Ports (Driven Ports / SPI)
//!
//! Collaborators the pipeline depends on. Production uses
//! [`SshKeyLibrary`](crate::domain::sshkey::SshKeyLibrary) and the Windows
//! adapters; tests substitute counting fakes.

use crate::domain::entities::{
    AuthPackageId, DuplicateOptions, LogonOutput, LogonRequest, LsaHandle, Luid, NativeStatus,
    ProcessAccess, ProfileBufferPtr, RawHandle, TokenAccess,
};
use crate::domain::errors::{AllocError, LogonFailure};

/// Key parsing and signature verification.
pub trait KeyLibrary: Send + Sync {
    /// Parsed key.
    type Key;
    /// Library error; every error counts as "not verified".
    type Error: std::error::Error;

    /// Parse an SSH wire-format public key blob.
    fn key_from_blob(&self, blob: &[u8]) -> Result<Self::Key, Self::Error>;

    /// Verify `signature` over `payload`. Only `Ok(())` means verified.
    fn verify(&self, key: &Self::Key, signature: &[u8], payload: &[u8])
        -> Result<(), Self::Error>;

    /// Human-readable key fingerprint for logs.
    fn fingerprint(&self, key: &Self::Key) -> String;
}

/// The connection a request arrived on.
pub trait PeerConnection {
    /// OS process id of the connected client.
    fn peer_process_id(&self) -> Result<u32, NativeStatus>;
}

/// Host security subsystem: logon and handle primitives.
///
/// Every acquiring method has a matching release method, and the domain
/// guards in [`resources`](crate::domain::resources) call each release
/// exactly once.
pub trait HostSecurity: Send + Sync {
    /// Host heap buffer holding the S4U logon-info structure; freed on drop.
    type LogonInfo;

    /// Register a logon process under `name`.
    fn register_logon_process(&self, name: &str) -> Result<LsaHandle, NativeStatus>;

    /// Release a registration obtained from `register_logon_process`.
    fn deregister_logon_process(&self, handle: LsaHandle);

    /// Look up an authentication package by name.
    fn lookup_authentication_package(
        &self,
        lsa: LsaHandle,
        name: &str,
    ) -> Result<AuthPackageId, NativeStatus>;

    /// Allocate the S4U logon-info buffer for `client_upn` (UTF-16, no terminator).
    ///
    /// The buffer holds the structure header, the name, and a terminator.
    fn allocate_logon_info(&self, client_upn: &[u16]) -> Result<Self::LogonInfo, AllocError>;

    /// Generate a fresh locally unique identifier.
    fn allocate_locally_unique_id(&self) -> Result<Luid, NativeStatus>;

    /// Perform the logon. On failure nothing is left for the caller to release.
    fn logon_user(
        &self,
        lsa: LsaHandle,
        request: &LogonRequest<'_, Self::LogonInfo>,
    ) -> Result<LogonOutput, LogonFailure>;

    /// Release a profile buffer returned by `logon_user`.
    fn free_return_buffer(&self, profile: ProfileBufferPtr);

    /// Open a process with exactly `access`.
    fn open_process(&self, pid: u32, access: ProcessAccess) -> Result<RawHandle, NativeStatus>;

    /// Duplicate `source` from this process into `target_process`.
    ///
    /// Returns the handle value as it exists in the target's table.
    fn duplicate_handle(
        &self,
        source: RawHandle,
        target_process: RawHandle,
        access: TokenAccess,
        options: DuplicateOptions,
    ) -> Result<RawHandle, NativeStatus>;

    /// Close `handle` inside `process` (a handle this process does not own).
    fn close_remote_handle(&self, process: RawHandle, handle: RawHandle)
        -> Result<(), NativeStatus>;

    /// Close a handle owned by this process.
    fn close_handle(&self, handle: RawHandle);
}
