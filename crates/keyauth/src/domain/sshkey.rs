//! # SSH Keys
//!
//! Public key and signature blobs in SSH wire format, parsed and verified
//! with `ssh-key`.
//!
//! ## Supported Algorithms
//!
//! | Key | Signature |
//! |-----|-----------|
//! | `ssh-ed25519` | `ssh-ed25519` |
//! | `ecdsa-sha2-nistp256/384/521` | same name as the key |
//! | `ssh-rsa` | `rsa-sha2-256`, `rsa-sha2-512` |
//!
//! ## Security Notes
//!
//! - SHA-1 `ssh-rsa` signatures, DSA keys and security-key (`sk-*`) keys are
//!   rejected
//! - Trailing bytes after a key or signature blob are rejected
//! - The signature algorithm must belong to the key's family

use crate::ports::outbound::KeyLibrary;
use signature::Verifier;
use ssh_encoding::{Decode, Reader};
use ssh_key::{Algorithm, HashAlg, PublicKey, Signature};
use thiserror::Error;

/// Key and signature errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Key blob is not a valid SSH public key
    #[error("invalid key blob: {0}")]
    InvalidKey(ssh_key::Error),

    /// Key algorithm is parsed but not accepted for logon
    #[error("unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(Algorithm),

    /// Signature blob is not a valid SSH signature
    #[error("invalid signature blob: {0}")]
    InvalidSignature(ssh_key::Error),

    /// Signature algorithm does not belong to the key's family
    #[error("signature algorithm {signature} does not match key {key}")]
    AlgorithmMismatch {
        key: Algorithm,
        signature: Algorithm,
    },

    /// Signature does not verify
    #[error("signature verification failed")]
    VerificationFailed,
}

/// Parse an SSH wire-format public key blob.
pub fn parse_public_key(blob: &[u8]) -> Result<PublicKey, KeyError> {
    let key = PublicKey::from_bytes(blob).map_err(KeyError::InvalidKey)?;
    match key.algorithm() {
        Algorithm::Ed25519 | Algorithm::Ecdsa { .. } | Algorithm::Rsa { .. } => Ok(key),
        other => Err(KeyError::UnsupportedAlgorithm(other)),
    }
}

/// Parse an SSH signature blob.
pub fn parse_signature(mut blob: &[u8]) -> Result<Signature, KeyError> {
    let reader = &mut blob;
    let signature = Signature::decode(reader).map_err(KeyError::InvalidSignature)?;
    reader
        .finish(signature)
        .map_err(|e| KeyError::InvalidSignature(e.into()))
}

/// Verify an SSH signature blob over `payload` with `key`.
pub fn verify_signature(
    key: &PublicKey,
    signature_blob: &[u8],
    payload: &[u8],
) -> Result<(), KeyError> {
    let signature = parse_signature(signature_blob)?;

    let key_algorithm = key.algorithm();
    let signature_algorithm = signature.algorithm();
    if !signature_fits_key(&key_algorithm, &signature_algorithm) {
        return Err(KeyError::AlgorithmMismatch {
            key: key_algorithm,
            signature: signature_algorithm,
        });
    }

    // PublicKey has an inherent SSHSIG `verify`; the raw signature check is the trait's
    <PublicKey as Verifier<Signature>>::verify(key, payload, &signature)
        .map_err(|_| KeyError::VerificationFailed)
}

/// RSA keys sign with any SHA-2 variant; every other family must match exactly.
fn signature_fits_key(key: &Algorithm, signature: &Algorithm) -> bool {
    match (key, signature) {
        (Algorithm::Rsa { .. }, Algorithm::Rsa { hash }) => hash.is_some(),
        _ => key == signature,
    }
}

/// Built-in key library over `ssh-key`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshKeyLibrary;

impl KeyLibrary for SshKeyLibrary {
    type Key = PublicKey;
    type Error = KeyError;

    fn key_from_blob(&self, blob: &[u8]) -> Result<PublicKey, KeyError> {
        parse_public_key(blob)
    }

    fn verify(&self, key: &PublicKey, signature: &[u8], payload: &[u8]) -> Result<(), KeyError> {
        verify_signature(key, signature, payload)
    }

    fn fingerprint(&self, key: &PublicKey) -> String {
        key.fingerprint(HashAlg::Sha256).to_string()
    }
}
