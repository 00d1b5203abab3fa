//! # KeyAuth Configuration
//!
//! Names registered with the host security subsystem and request limits.
//!
//! The defaults match what OpenSSH for Windows registers.

use serde::Deserialize;
use thiserror::Error;

/// Size of the agent's account name buffer in UTF-16 code units, terminator
/// included.
///
/// Two 255-unit halves: `DOMAIN\user` or `user@REALM`.
pub const ACCOUNT_NAME_BUFFER_LEN: usize = 255 + 255;

/// Maximum account name length in UTF-16 code units, excluding the terminator.
pub const MAX_ACCOUNT_NAME_LEN: usize = ACCOUNT_NAME_BUFFER_LEN - 1;

/// Largest account name a native `UNICODE_STRING` can describe.
///
/// `Length` is a `u16` byte count that must also leave room for the terminator.
pub const NATIVE_ACCOUNT_NAME_CAPACITY: usize = (u16::MAX as usize - 2) / 2;

/// Length of the fixed-size token source name.
pub const TOKEN_SOURCE_NAME_LEN: usize = 8;

/// Default logon process name registered with the LSA.
pub const DEFAULT_LOGON_PROCESS_NAME: &str = "ssh-agent";

/// Default authentication package used for S4U logons.
pub const DEFAULT_AUTH_PACKAGE_NAME: &str = "Negotiate";

/// Default origin name passed to the logon call.
pub const DEFAULT_ORIGIN_NAME: &str = "sshd";

/// Default token source name (space padded to 8 bytes).
pub const DEFAULT_TOKEN_SOURCE_NAME: &str = ".Jobs   ";

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A name field is empty.
    #[error("{field} must not be empty")]
    EmptyName { field: &'static str },

    /// A name field contains non-ASCII bytes; LSA strings are ANSI.
    #[error("{field} must be ASCII: {value:?}")]
    NonAsciiName { field: &'static str, value: String },

    /// A name field contains a NUL byte and cannot be passed as a C string.
    #[error("{field} must not contain NUL")]
    EmbeddedNul { field: &'static str },

    /// The token source name does not fit the native 8-byte field.
    #[error("token_source_name is {len} bytes, maximum is {TOKEN_SOURCE_NAME_LEN}")]
    TokenSourceNameTooLong { len: usize },

    /// The account name bound is zero or beyond what the host can represent.
    #[error("max_account_name_len {value} is outside 1..={NATIVE_ACCOUNT_NAME_CAPACITY}")]
    AccountNameBoundOutOfRange { value: usize },
}

/// KeyAuth configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeyAuthConfig {
    /// Maximum account name length in UTF-16 code units.
    pub max_account_name_len: usize,
    /// Logon process name registered with the LSA.
    pub logon_process_name: String,
    /// Authentication package supporting S4U logons (`Negotiate` or `Kerberos`).
    pub auth_package_name: String,
    /// Origin name recorded for the logon session.
    pub origin_name: String,
    /// Token source name, at most 8 ASCII bytes.
    pub token_source_name: String,
}

impl Default for KeyAuthConfig {
    fn default() -> Self {
        Self {
            max_account_name_len: MAX_ACCOUNT_NAME_LEN,
            logon_process_name: DEFAULT_LOGON_PROCESS_NAME.to_string(),
            auth_package_name: DEFAULT_AUTH_PACKAGE_NAME.to_string(),
            origin_name: DEFAULT_ORIGIN_NAME.to_string(),
            token_source_name: DEFAULT_TOKEN_SOURCE_NAME.to_string(),
        }
    }
}

impl KeyAuthConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - any name is empty or not ASCII
    /// - the token source name is longer than 8 bytes
    /// - `max_account_name_len` is zero or exceeds the native capacity
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("logon_process_name", &self.logon_process_name),
            ("auth_package_name", &self.auth_package_name),
            ("origin_name", &self.origin_name),
            ("token_source_name", &self.token_source_name),
        ] {
            if value.is_empty() {
                return Err(ConfigError::EmptyName { field });
            }
            if !value.is_ascii() {
                return Err(ConfigError::NonAsciiName {
                    field,
                    value: value.clone(),
                });
            }
            if value.contains('\0') {
                return Err(ConfigError::EmbeddedNul { field });
            }
        }

        if self.token_source_name.len() > TOKEN_SOURCE_NAME_LEN {
            return Err(ConfigError::TokenSourceNameTooLong {
                len: self.token_source_name.len(),
            });
        }

        if self.max_account_name_len == 0
            || self.max_account_name_len > NATIVE_ACCOUNT_NAME_CAPACITY
        {
            return Err(ConfigError::AccountNameBoundOutOfRange {
                value: self.max_account_name_len,
            });
        }

        Ok(())
    }

    /// Token source name as the fixed 8-byte native field, space padded.
    pub fn token_source_bytes(&self) -> [u8; TOKEN_SOURCE_NAME_LEN] {
        let mut name = [b' '; TOKEN_SOURCE_NAME_LEN];
        let bytes = self.token_source_name.as_bytes();
        let len = bytes.len().min(TOKEN_SOURCE_NAME_LEN);
        name[..len].copy_from_slice(&bytes[..len]);
        name
    }
}
