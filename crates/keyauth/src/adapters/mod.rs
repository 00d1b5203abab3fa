//! # Adapters Layer
//!
//! Bindings of the outbound ports to the host operating system.
//!
//! | Adapter | Port | Platform |
//! |---------|------|----------|
//! | [`LsaHost`](win32::LsaHost) | `HostSecurity` | Windows |
//! | [`NamedPipeConnection`](win32::NamedPipeConnection) | `PeerConnection` | Windows |
//!
//! The key library port is served by
//! [`SshKeyLibrary`](crate::domain::sshkey::SshKeyLibrary) on every platform.

#[cfg(windows)]
pub mod win32;

#[cfg(windows)]
pub use self::win32::{LsaHost, NamedPipeConnection, S4uLogonBuffer};
