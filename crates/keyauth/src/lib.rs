//! # KeyAuth
//!
//! Handles the `keyauthenticate` agent request: a signed assertion naming a
//! local or domain account is verified, turned into an S4U logon token, and
//! the token is duplicated into the requesting process with
//! `TOKEN_QUERY | TOKEN_IMPERSONATE` rights only.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): request decoding, key handling, token
//!   issuing and hand-off logic, resource guards
//! - **Ports Layer** (`ports/`): the inbound API and the host collaborators
//! - **Service Layer** (`service.rs`): wires the pipeline stages together
//! - **Adapters Layer** (`adapters/`): the Windows LSA / named-pipe bindings
//!
//! ## Pipeline
//!
//! ```text
//! request ─→ decode ─→ verify ─→ S4U logon ─→ duplicate into peer ─→ u32
//!              │          │          │                │
//!              └──────────┴──────────┴────────────────┴─→ RequestRejected
//! ```
//!
//! ## Security Notes
//!
//! - No logon call is made for an account whose assertion did not verify
//! - Every native resource is owned by a guard with exactly one release point
//! - Failure detail is logged, never written to the wire

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use config::{ConfigError, KeyAuthConfig, ACCOUNT_NAME_BUFFER_LEN, MAX_ACCOUNT_NAME_LEN};
pub use domain::entities::{
    AuthPackageId, AuthRequest, AuthResponse, DuplicateOptions, LogonOutput, LogonRequest,
    LogonType, LsaHandle, Luid, NativeStatus, ProcessAccess, ProfileBufferPtr, QuotaLimits,
    RawHandle, TokenAccess, TokenSource, AUTH_REQUEST,
};
pub use domain::errors::{AllocError, KeyAuthError, LogonFailure, RequestRejected};
pub use domain::resources::IdentityToken;
pub use domain::sshkey::{KeyError, SshKeyLibrary};
pub use domain::verifier::Verdict;
pub use ports::inbound::KeyAuthenticateApi;
pub use ports::outbound::{HostSecurity, KeyLibrary, PeerConnection};
pub use service::KeyAuthService;
