//! # KeyAuth Service
//!
//! Application service implementing [`KeyAuthenticateApi`].
//!
//! ## Pipeline
//!
//! 1. Decode the request and parse its key
//! 2. Verify the assertion (fail-closed)
//! 3. Issue an S4U logon token for the account
//! 4. Duplicate the token into the peer
//! 5. Encode the peer's handle value
//!
//! Each stage returns early on failure; the resource guards created by the
//! stages release whatever was acquired before the error.

use crate::config::{ConfigError, KeyAuthConfig};
use crate::domain::decoder::RequestDecoder;
use crate::domain::encoder::encode_response;
use crate::domain::entities::AuthResponse;
use crate::domain::errors::{KeyAuthError, RequestRejected};
use crate::domain::issuer::IdentityTokenIssuer;
use crate::domain::transfer::transfer_token;
use crate::domain::verifier::verify_assertion;
use crate::ports::inbound::KeyAuthenticateApi;
use crate::ports::outbound::{HostSecurity, KeyLibrary, PeerConnection};
use bytes::BytesMut;
use tracing::{debug, info, warn};

/// Key-authentication service over a host security subsystem and a key library.
pub struct KeyAuthService<H: HostSecurity, L: KeyLibrary> {
    config: KeyAuthConfig,
    decoder: RequestDecoder,
    host: H,
    keys: L,
}

impl<H: HostSecurity, L: KeyLibrary> KeyAuthService<H, L> {
    /// Create a service after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns the first problem found by [`KeyAuthConfig::validate`].
    pub fn new(config: KeyAuthConfig, host: H, keys: L) -> Result<Self, ConfigError> {
        config.validate()?;
        let decoder = RequestDecoder::new(config.max_account_name_len);
        Ok(Self {
            config,
            decoder,
            host,
            keys,
        })
    }

    /// Create a service with the default configuration.
    pub fn with_defaults(host: H, keys: L) -> Self {
        let config = KeyAuthConfig::default();
        let decoder = RequestDecoder::new(config.max_account_name_len);
        Self {
            config,
            decoder,
            host,
            keys,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn run(
        &self,
        request: &[u8],
        connection: &dyn PeerConnection,
    ) -> Result<AuthResponse, KeyAuthError> {
        let request = self.decoder.decode(request)?;
        let key = self.decoder.parse_key(&self.keys, &request)?;
        let fingerprint = self.keys.fingerprint(&key);
        debug!(account = %request.account_name, %fingerprint, "keyauthenticate request decoded");

        if !verify_assertion(
            &self.keys,
            &key,
            &request.signature,
            &request.signed_payload,
        )
        .is_verified()
        {
            warn!(account = %request.account_name, %fingerprint, "assertion signature rejected");
            return Err(KeyAuthError::SignatureInvalid);
        }

        let token = IdentityTokenIssuer::new(&self.config)
            .issue(&self.host, &request.account_name_wide)?;
        let peer_token_handle = transfer_token(&self.host, token, connection)?;

        info!(account = %request.account_name, %fingerprint, "logon token transferred to peer");
        Ok(AuthResponse { peer_token_handle })
    }
}

impl<H: HostSecurity, L: KeyLibrary> KeyAuthenticateApi for KeyAuthService<H, L> {
    fn authenticate(
        &self,
        request: &[u8],
        connection: &dyn PeerConnection,
    ) -> Result<AuthResponse, KeyAuthError> {
        self.run(request, connection).inspect_err(|e| {
            warn!(kind = e.kind(), error = %e, "keyauthenticate request failed");
        })
    }

    fn process_request(
        &self,
        request: &[u8],
        response: &mut BytesMut,
        connection: &dyn PeerConnection,
    ) -> Result<(), RequestRejected> {
        let result = self.authenticate(request, connection)?;
        encode_response(&result, response);
        Ok(())
    }
}
