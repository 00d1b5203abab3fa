//! # Identity Token Issuer
//!
//! Mints an S4U logon token for a verified account name.
//!
//! ## Steps
//!
//! 1. Register the logon process → `LogonSubsystemUnavailable`
//! 2. Look up the authentication package → `AuthPackageUnavailable`
//! 3. Allocate the logon-info buffer → `OutOfMemory`
//! 4. Allocate the token source identifier → `LogonSubsystemUnavailable`
//! 5. Network logon → `LogonFailed`
//!
//! Whatever was acquired is released when this function returns, in reverse
//! order: profile buffer, logon-info buffer, registration. The token is
//! returned to the caller.

use super::entities::{LogonOutput, LogonRequest, LogonType, TokenSource};
use super::errors::KeyAuthError;
use super::resources::{IdentityToken, LogonRegistration, ProfileBuffer};
use crate::config::KeyAuthConfig;
use crate::ports::outbound::HostSecurity;
use tracing::debug;

/// Exact byte size of an S4U logon-info buffer: header, name, terminator.
///
/// Returns `None` if the size overflows.
pub fn s4u_logon_info_size(header_len: usize, upn_units: usize) -> Option<usize> {
    upn_units
        .checked_add(1)?
        .checked_mul(std::mem::size_of::<u16>())?
        .checked_add(header_len)
}

/// Issues logon tokens through the host security subsystem.
#[derive(Debug, Clone, Copy)]
pub struct IdentityTokenIssuer<'c> {
    config: &'c KeyAuthConfig,
}

impl<'c> IdentityTokenIssuer<'c> {
    pub fn new(config: &'c KeyAuthConfig) -> Self {
        Self { config }
    }

    /// Log on `account_wide` (UTF-16, no terminator) and return its token.
    ///
    /// The caller must only pass an account whose assertion has verified.
    pub fn issue<'h, H: HostSecurity>(
        &self,
        host: &'h H,
        account_wide: &[u16],
    ) -> Result<IdentityToken<'h, H>, KeyAuthError> {
        let registration = LogonRegistration::register(host, &self.config.logon_process_name)
            .map_err(|status| KeyAuthError::LogonSubsystemUnavailable { status })?;

        let package = host
            .lookup_authentication_package(registration.handle(), &self.config.auth_package_name)
            .map_err(|status| KeyAuthError::AuthPackageUnavailable {
                package: self.config.auth_package_name.clone(),
                status,
            })?;

        let logon_info = host
            .allocate_logon_info(account_wide)
            .map_err(|e| KeyAuthError::OutOfMemory {
                requested: e.requested,
            })?;

        let identifier = host
            .allocate_locally_unique_id()
            .map_err(|status| KeyAuthError::LogonSubsystemUnavailable { status })?;

        let request = LogonRequest {
            origin_name: &self.config.origin_name,
            logon_type: LogonType::Network,
            package,
            logon_info: &logon_info,
            source: TokenSource {
                name: self.config.token_source_bytes(),
                identifier,
            },
        };

        let LogonOutput {
            token,
            profile,
            profile_len,
            logon_id,
            quotas: _,
        } = host
            .logon_user(registration.handle(), &request)
            .map_err(KeyAuthError::LogonFailed)?;

        let token = IdentityToken::new(host, token);
        let _profile = profile.map(|ptr| ProfileBuffer::new(host, ptr));

        debug!(
            package = package.0,
            %logon_id,
            profile_len,
            "S4U logon succeeded"
        );

        Ok(token)
    }
}
