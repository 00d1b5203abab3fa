//! # Domain Layer
//!
//! Request decoding, key handling, and the token pipeline stages.
//! Host calls only happen through the `HostSecurity` port.

pub mod decoder;
pub mod encoder;
pub mod entities;
pub mod errors;
pub mod issuer;
pub mod resources;
pub mod sshkey;
pub mod transfer;
pub mod verifier;
