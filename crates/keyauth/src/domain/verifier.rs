//! # Assertion Verifier
//!
//! Fail-closed glue over [`KeyLibrary::verify`]: only an explicit success
//! counts. An invalid signature is an expected input, so this returns a
//! verdict instead of an error.

use crate::ports::outbound::KeyLibrary;
use tracing::debug;

/// Outcome of checking an assertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum Verdict {
    Verified,
    NotVerified,
}

impl Verdict {
    pub fn is_verified(self) -> bool {
        self == Verdict::Verified
    }
}

/// Check `signature` over `payload` with `key`.
pub fn verify_assertion<L: KeyLibrary>(
    library: &L,
    key: &L::Key,
    signature: &[u8],
    payload: &[u8],
) -> Verdict {
    match library.verify(key, signature, payload) {
        Ok(()) => Verdict::Verified,
        Err(e) => {
            debug!(reason = %e, "assertion not verified");
            Verdict::NotVerified
        }
    }
}
