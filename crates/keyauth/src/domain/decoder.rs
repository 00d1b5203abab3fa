//! # Request Decoder
//!
//! Turns a `keyauthenticate` request buffer into an [`AuthRequest`].
//!
//! Wire layout, each field a big-endian `u32` length plus bytes:
//!
//! ```text
//! string  operation        "keyauthenticate"
//! string  public key blob
//! string  account name     NUL-free UTF-8
//! string  signature blob
//! string  signed payload
//! ```
//!
//! The operation tag is checked before anything else is read. Bytes after
//! the last field are ignored.

use super::entities::{AuthRequest, AUTH_REQUEST};
use super::errors::KeyAuthError;
use crate::ports::outbound::KeyLibrary;
use ssh_encoding::Decode;

/// Decoder bound to an account name limit.
#[derive(Debug, Clone, Copy)]
pub struct RequestDecoder {
    max_account_name_len: usize,
}

impl RequestDecoder {
    /// `max_account_name_len` is in UTF-16 code units.
    pub fn new(max_account_name_len: usize) -> Self {
        Self {
            max_account_name_len,
        }
    }

    /// Decode the request fields.
    pub fn decode(&self, mut request: &[u8]) -> Result<AuthRequest, KeyAuthError> {
        let reader = &mut request;

        let operation: Vec<u8> = read_field(reader, "operation")?;
        if operation != AUTH_REQUEST.as_bytes() {
            return Err(KeyAuthError::malformed_request(format!(
                "unsupported operation {:?}",
                String::from_utf8_lossy(&operation)
            )));
        }

        let public_key_blob = read_field(reader, "public key")?;
        let account_name: String = read_field(reader, "account name")?;
        let signature = read_field(reader, "signature")?;
        let signed_payload = read_field(reader, "signed payload")?;

        let account_name_wide = self.encode_account(&account_name)?;

        Ok(AuthRequest {
            operation: AUTH_REQUEST,
            public_key_blob,
            account_name,
            account_name_wide,
            signature,
            signed_payload,
        })
    }

    /// Parse the request's public key blob with `library`.
    pub fn parse_key<L: KeyLibrary>(
        &self,
        library: &L,
        request: &AuthRequest,
    ) -> Result<L::Key, KeyAuthError> {
        library
            .key_from_blob(&request.public_key_blob)
            .map_err(|e| KeyAuthError::MalformedKey {
                reason: e.to_string(),
            })
    }

    /// Bound-check and convert the account name to UTF-16.
    fn encode_account(&self, account: &str) -> Result<Vec<u16>, KeyAuthError> {
        if account.is_empty() {
            return Err(KeyAuthError::malformed_request("empty account name"));
        }
        if account.contains('\0') {
            return Err(KeyAuthError::malformed_request(
                "account name contains an embedded NUL",
            ));
        }

        let units = account.encode_utf16().count();
        if units > self.max_account_name_len {
            return Err(KeyAuthError::malformed_request(format!(
                "account name is {units} UTF-16 units, maximum is {}",
                self.max_account_name_len
            )));
        }

        Ok(account.encode_utf16().collect())
    }
}

/// Decode one length-prefixed field.
fn read_field<T>(reader: &mut &[u8], field: &'static str) -> Result<T, KeyAuthError>
where
    T: Decode<Error = ssh_encoding::Error>,
{
    T::decode(reader).map_err(|e| KeyAuthError::malformed_request(format!("{field}: {e}")))
}
