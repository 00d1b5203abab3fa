//! # Native Resource Guards
//!
//! One guard per kind of host resource. Each guard owns exactly one resource
//! and releases it through the host's own release primitive on drop, so every
//! exit path of the pipeline releases what it acquired, once.
//!
//! | Guard | Acquired by | Released by |
//! |-------|-------------|-------------|
//! | [`LogonRegistration`] | `register_logon_process` | `deregister_logon_process` |
//! | [`ProfileBuffer`] | `logon_user` | `free_return_buffer` |
//! | [`IdentityToken`] | `logon_user` | `close_handle` |
//! | [`PeerProcess`] | `open_process` | `close_handle` |
//!
//! The logon-info buffer is the host's `LogonInfo` type and frees itself.

use super::entities::{LsaHandle, NativeStatus, ProcessAccess, ProfileBufferPtr, RawHandle};
use crate::ports::outbound::HostSecurity;
use tracing::trace;

/// A logon-process registration.
pub struct LogonRegistration<'h, H: HostSecurity + ?Sized> {
    host: &'h H,
    handle: LsaHandle,
}

impl<'h, H: HostSecurity + ?Sized> LogonRegistration<'h, H> {
    /// Register `name` with the host.
    pub fn register(host: &'h H, name: &str) -> Result<Self, NativeStatus> {
        let handle = host.register_logon_process(name)?;
        trace!(lsa = handle.0, "logon process registered");
        Ok(Self { host, handle })
    }

    pub fn handle(&self) -> LsaHandle {
        self.handle
    }
}

impl<H: HostSecurity + ?Sized> Drop for LogonRegistration<'_, H> {
    fn drop(&mut self) {
        self.host.deregister_logon_process(self.handle);
    }
}

/// A profile buffer owned by the security subsystem.
///
/// Released with `free_return_buffer`, never with a generic deallocator.
pub struct ProfileBuffer<'h, H: HostSecurity + ?Sized> {
    host: &'h H,
    ptr: ProfileBufferPtr,
}

impl<'h, H: HostSecurity + ?Sized> ProfileBuffer<'h, H> {
    pub fn new(host: &'h H, ptr: ProfileBufferPtr) -> Self {
        Self { host, ptr }
    }
}

impl<H: HostSecurity + ?Sized> Drop for ProfileBuffer<'_, H> {
    fn drop(&mut self) {
        self.host.free_return_buffer(self.ptr);
    }
}

/// Logon token for the authenticated account.
///
/// Owned by the current request until dropped. A duplicate placed in another
/// process is an independent handle and is not affected.
pub struct IdentityToken<'h, H: HostSecurity + ?Sized> {
    host: &'h H,
    handle: RawHandle,
}

impl<'h, H: HostSecurity + ?Sized> IdentityToken<'h, H> {
    pub fn new(host: &'h H, handle: RawHandle) -> Self {
        Self { host, handle }
    }

    pub fn raw(&self) -> RawHandle {
        self.handle
    }
}

impl<H: HostSecurity + ?Sized> Drop for IdentityToken<'_, H> {
    fn drop(&mut self) {
        self.host.close_handle(self.handle);
    }
}

impl<H: HostSecurity + ?Sized> std::fmt::Debug for IdentityToken<'_, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityToken")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

/// Handle to the peer process, opened with `PROCESS_DUP_HANDLE` only.
pub struct PeerProcess<'h, H: HostSecurity + ?Sized> {
    host: &'h H,
    handle: RawHandle,
    pid: u32,
}

impl<'h, H: HostSecurity + ?Sized> PeerProcess<'h, H> {
    /// Open `pid` with the duplicate-handle right and nothing else.
    pub fn open(host: &'h H, pid: u32) -> Result<Self, NativeStatus> {
        let handle = host.open_process(pid, ProcessAccess::DUP_HANDLE)?;
        Ok(Self { host, handle, pid })
    }

    pub fn handle(&self) -> RawHandle {
        self.handle
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl<H: HostSecurity + ?Sized> Drop for PeerProcess<'_, H> {
    fn drop(&mut self) {
        self.host.close_handle(self.handle);
    }
}
