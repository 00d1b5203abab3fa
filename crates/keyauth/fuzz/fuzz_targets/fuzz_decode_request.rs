//! Fuzz target for `keyauthenticate` request decoding.
//!
//! Feeds arbitrary bytes, and arbitrary field sets framed as a request, to
//! the decoder, the key parser and the verifier. None may panic.
//!
//! ## Running
//!
//! ```bash
//! cd crates/keyauth
//! cargo +nightly fuzz run fuzz_decode_request
//! ```

#![no_main]

use keyauth::domain::decoder::RequestDecoder;
use keyauth::domain::verifier::verify_assertion;
use keyauth::{KeyAuthError, SshKeyLibrary, AUTH_REQUEST, MAX_ACCOUNT_NAME_LEN};
use libfuzzer_sys::fuzz_target;
use ssh_encoding::Encode;

/// Either raw bytes or well-framed fields with fuzzed contents.
#[derive(Debug, arbitrary::Arbitrary)]
enum FuzzInput {
    Raw(Vec<u8>),
    Framed {
        use_auth_tag: bool,
        operation: Vec<u8>,
        public_key: Vec<u8>,
        account: Vec<u8>,
        signature: Vec<u8>,
        payload: Vec<u8>,
        trailing: Vec<u8>,
    },
}

fuzz_target!(|input: FuzzInput| {
    let bytes = match input {
        FuzzInput::Raw(bytes) => bytes,
        FuzzInput::Framed {
            use_auth_tag,
            operation,
            public_key,
            account,
            signature,
            payload,
            trailing,
        } => {
            let operation = if use_auth_tag {
                AUTH_REQUEST.as_bytes()
            } else {
                operation.as_slice()
            };
            let mut bytes = Vec::new();
            let fields = [
                operation,
                public_key.as_slice(),
                account.as_slice(),
                signature.as_slice(),
                payload.as_slice(),
            ];
            for field in fields {
                if field.encode(&mut bytes).is_err() {
                    return;
                }
            }
            bytes.extend_from_slice(&trailing);
            bytes
        }
    };

    let decoder = RequestDecoder::new(MAX_ACCOUNT_NAME_LEN);
    match decoder.decode(&bytes) {
        Ok(request) => {
            // A decoded request always satisfies the account bounds
            assert!(!request.account_name.is_empty());
            assert!(request.account_name_wide.len() <= MAX_ACCOUNT_NAME_LEN);
            assert!(!request.account_name.contains('\0'));

            match decoder.parse_key(&SshKeyLibrary, &request) {
                Ok(key) => {
                    let _ = verify_assertion(
                        &SshKeyLibrary,
                        &key,
                        &request.signature,
                        &request.signed_payload,
                    );
                }
                Err(KeyAuthError::MalformedKey { .. }) => {}
                Err(other) => panic!("unexpected key error: {other:?}"),
            }
        }
        Err(KeyAuthError::MalformedRequest { .. }) => {}
        Err(other) => panic!("unexpected decode error: {other:?}"),
    }
});
