//! Resource guards release through the host exactly once.

mod common;

use common::*;
use keyauth::domain::issuer::IdentityTokenIssuer;
use keyauth::domain::resources::{LogonRegistration, PeerProcess, ProfileBuffer};
use keyauth::domain::transfer::{transfer_token, TRANSFER_TOKEN_ACCESS};
use keyauth::{IdentityToken, KeyAuthConfig, KeyAuthError, ProcessAccess};

#[test]
fn test_registration_deregisters_on_drop() {
    let host = FakeHost::new();
    {
        let registration = LogonRegistration::register(&host, "ssh-agent").unwrap();
        assert_eq!(registration.handle(), LSA_HANDLE);
        assert_eq!(host.ledger().deregistered, 0);
    }
    assert_eq!(host.ledger().deregistered, 1);
}

#[test]
fn test_failed_registration_has_nothing_to_release() {
    let host = FakeHost::new().failing_at(Step::Register);
    assert_eq!(
        LogonRegistration::register(&host, "ssh-agent").err(),
        Some(STATUS_ACCESS_DENIED)
    );
    assert_eq!(host.ledger().deregistered, 0);
}

#[test]
fn test_token_and_profile_guards_release_once() {
    let host = FakeHost::new();
    drop(IdentityToken::new(&host, TOKEN_HANDLE));
    drop(ProfileBuffer::new(&host, PROFILE_PTR));

    let ledger = host.ledger();
    assert_eq!(ledger.tokens_closed(), 1);
    assert_eq!(ledger.profiles_freed, 1);
}

#[test]
fn test_peer_process_opened_for_duplication_only() {
    let host = FakeHost::new();
    {
        let peer = PeerProcess::open(&host, PEER_PID).unwrap();
        assert_eq!(peer.handle(), PROCESS_HANDLE);
        assert_eq!(peer.pid(), PEER_PID);
    }
    let ledger = host.ledger();
    assert_eq!(ledger.opened, vec![(PEER_PID, ProcessAccess::DUP_HANDLE)]);
    assert_eq!(ledger.processes_closed(), 1);
}

#[test]
fn test_issuer_returns_token_and_releases_the_rest() {
    let host = FakeHost::new();
    let config = KeyAuthConfig::default();
    let account: Vec<u16> = "alice".encode_utf16().collect();

    let token = IdentityTokenIssuer::new(&config).issue(&host, &account).unwrap();

    assert_eq!(token.raw(), TOKEN_HANDLE);
    let ledger = host.ledger();
    assert_eq!(ledger.deregistered, 1);
    assert_eq!(ledger.profiles_freed, 1);
    assert_eq!(host.logon_infos_freed(), 1);
    assert_eq!(ledger.tokens_closed(), 0);

    drop(token);
    assert_eq!(host.ledger().tokens_closed(), 1);
    host.assert_balanced();
}

#[test]
fn test_issuer_allocation_failure_is_out_of_memory() {
    let host = FakeHost::new().failing_at(Step::AllocateInfo);
    let config = KeyAuthConfig::default();
    let account: Vec<u16> = "alice".encode_utf16().collect();

    let err = IdentityTokenIssuer::new(&config)
        .issue(&host, &account)
        .unwrap_err();

    assert_eq!(err, KeyAuthError::OutOfMemory { requested: 12 });
    host.assert_balanced();
}

#[test]
fn test_transfer_consumes_token() {
    let host = FakeHost::new();
    let token = IdentityToken::new(&host, TOKEN_HANDLE);

    let value = transfer_token(&host, token, &FakeConnection::peer(PEER_PID)).unwrap();

    assert_eq!(value, DEFAULT_PEER_HANDLE as u32);
    let ledger = host.ledger();
    assert_eq!(ledger.duplicates[0].0, TRANSFER_TOKEN_ACCESS);
    assert_eq!(ledger.tokens_closed(), 1);
    assert_eq!(ledger.processes_closed(), 1);
}
