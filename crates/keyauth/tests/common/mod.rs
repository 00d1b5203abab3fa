//! Shared fixtures: a counting fake host, a fake pipe connection, and request
//! builders backed by real Ed25519, ECDSA and RSA keys.

#![allow(dead_code)]

use ed25519_dalek::SigningKey;
use keyauth::{
    AllocError, AuthPackageId, DuplicateOptions, HostSecurity, LogonFailure, LogonOutput,
    LogonRequest, LogonType, LsaHandle, Luid, NativeStatus, PeerConnection, ProcessAccess,
    ProfileBufferPtr, QuotaLimits, RawHandle, TokenAccess, AUTH_REQUEST,
};
use rand::rngs::OsRng;
use signature::Signer;
use ssh_encoding::Encode;
use ssh_key::private::Ed25519Keypair;
use ssh_key::{Algorithm, EcdsaCurve, PrivateKey, Signature};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

pub const LSA_HANDLE: LsaHandle = LsaHandle(0x10);
pub const PACKAGE_ID: AuthPackageId = AuthPackageId(7);
pub const TOKEN_HANDLE: RawHandle = RawHandle(0x44);
pub const PROCESS_HANDLE: RawHandle = RawHandle(0x88);
pub const PROFILE_PTR: ProfileBufferPtr = ProfileBufferPtr(0xBEEF_0000);
pub const DEFAULT_PEER_HANDLE: usize = 0x1A4;
pub const PEER_PID: u32 = 4242;

pub const STATUS_ACCESS_DENIED: NativeStatus = NativeStatus(0xC000_0022_u32 as i32);
pub const STATUS_LOGON_FAILURE: NativeStatus = NativeStatus(0xC000_006D_u32 as i32);
pub const STATUS_NO_SUCH_USER: NativeStatus = NativeStatus(0xC000_0064_u32 as i32);
pub const STATUS_INVALID_CID: NativeStatus = NativeStatus(0xC000_000B_u32 as i32);

static TRACING: Once = Once::new();

/// Install the agent subscriber once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let config = agent_telemetry::TelemetryConfig {
            log_level: "debug".to_string(),
            ..Default::default()
        };
        let _ = agent_telemetry::init_logging(&config);
    });
}

// =============================================================================
// Fake Host
// =============================================================================

/// Host calls that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Register,
    LookupPackage,
    AllocateInfo,
    AllocateLuid,
    Logon,
    OpenProcess,
    Duplicate,
}

/// Logon fields as the fake host received them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedLogon {
    pub origin_name: String,
    pub logon_type: LogonType,
    pub package: AuthPackageId,
    pub client_upn: Vec<u16>,
    pub source_name: [u8; 8],
}

/// What the fake host saw.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    pub calls: Vec<Step>,
    pub registered: usize,
    pub deregistered: usize,
    pub logon_infos_allocated: usize,
    pub tokens_created: usize,
    pub profiles_returned: usize,
    pub profiles_freed: usize,
    pub processes_opened: usize,
    pub closed: Vec<RawHandle>,
    pub remote_closed: Vec<(RawHandle, RawHandle)>,
    pub logons: Vec<RecordedLogon>,
    pub opened: Vec<(u32, ProcessAccess)>,
    pub duplicates: Vec<(TokenAccess, DuplicateOptions)>,
    pub lookups: Vec<String>,
    pub registrations: Vec<String>,
}

impl Ledger {
    pub fn tokens_closed(&self) -> usize {
        self.closed.iter().filter(|h| **h == TOKEN_HANDLE).count()
    }

    pub fn processes_closed(&self) -> usize {
        self.closed.iter().filter(|h| **h == PROCESS_HANDLE).count()
    }

    pub fn host_touched(&self) -> bool {
        !self.calls.is_empty()
    }
}

/// S4U buffer stand-in; counts its own release.
#[derive(Debug)]
pub struct FakeLogonInfo {
    pub client_upn: Vec<u16>,
    freed: Arc<AtomicUsize>,
}

impl Drop for FakeLogonInfo {
    fn drop(&mut self) {
        self.freed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Counting `HostSecurity` with one optional failure point.
pub struct FakeHost {
    fail_at: Option<Step>,
    peer_handle: usize,
    return_profile: bool,
    exited_pids: Vec<u32>,
    logon_infos_freed: Arc<AtomicUsize>,
    ledger: Mutex<Ledger>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            fail_at: None,
            peer_handle: DEFAULT_PEER_HANDLE,
            return_profile: true,
            exited_pids: Vec::new(),
            logon_infos_freed: Arc::new(AtomicUsize::new(0)),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub fn failing_at(mut self, step: Step) -> Self {
        self.fail_at = Some(step);
        self
    }

    pub fn with_peer_handle(mut self, value: usize) -> Self {
        self.peer_handle = value;
        self
    }

    pub fn without_profile(mut self) -> Self {
        self.return_profile = false;
        self
    }

    pub fn with_exited_process(mut self, pid: u32) -> Self {
        self.exited_pids.push(pid);
        self
    }

    pub fn ledger(&self) -> Ledger {
        self.ledger.lock().unwrap().clone()
    }

    pub fn logon_infos_freed(&self) -> usize {
        self.logon_infos_freed.load(Ordering::SeqCst)
    }

    /// Every acquired resource has been released exactly once.
    pub fn assert_balanced(&self) {
        let ledger = self.ledger();
        assert_eq!(ledger.registered, ledger.deregistered, "registrations");
        assert_eq!(
            ledger.logon_infos_allocated,
            self.logon_infos_freed(),
            "logon-info buffers"
        );
        assert_eq!(ledger.tokens_created, ledger.tokens_closed(), "tokens");
        assert_eq!(ledger.profiles_returned, ledger.profiles_freed, "profiles");
        assert_eq!(
            ledger.processes_opened,
            ledger.processes_closed(),
            "peer processes"
        );
    }

    fn enter(&self, step: Step) -> bool {
        self.ledger.lock().unwrap().calls.push(step);
        self.fail_at == Some(step)
    }
}

impl HostSecurity for FakeHost {
    type LogonInfo = FakeLogonInfo;

    fn register_logon_process(&self, name: &str) -> Result<LsaHandle, NativeStatus> {
        if self.enter(Step::Register) {
            return Err(STATUS_ACCESS_DENIED);
        }
        let mut ledger = self.ledger.lock().unwrap();
        ledger.registered += 1;
        ledger.registrations.push(name.to_string());
        Ok(LSA_HANDLE)
    }

    fn deregister_logon_process(&self, handle: LsaHandle) {
        assert_eq!(handle, LSA_HANDLE);
        self.ledger.lock().unwrap().deregistered += 1;
    }

    fn lookup_authentication_package(
        &self,
        lsa: LsaHandle,
        name: &str,
    ) -> Result<AuthPackageId, NativeStatus> {
        assert_eq!(lsa, LSA_HANDLE);
        if self.enter(Step::LookupPackage) {
            return Err(STATUS_NO_SUCH_USER);
        }
        self.ledger.lock().unwrap().lookups.push(name.to_string());
        Ok(PACKAGE_ID)
    }

    fn allocate_logon_info(&self, client_upn: &[u16]) -> Result<FakeLogonInfo, AllocError> {
        if self.enter(Step::AllocateInfo) {
            return Err(AllocError {
                requested: client_upn.len() * 2 + 2,
            });
        }
        self.ledger.lock().unwrap().logon_infos_allocated += 1;
        Ok(FakeLogonInfo {
            client_upn: client_upn.to_vec(),
            freed: Arc::clone(&self.logon_infos_freed),
        })
    }

    fn allocate_locally_unique_id(&self) -> Result<Luid, NativeStatus> {
        if self.enter(Step::AllocateLuid) {
            return Err(STATUS_ACCESS_DENIED);
        }
        Ok(Luid {
            low_part: 0x1234,
            high_part: 0,
        })
    }

    fn logon_user(
        &self,
        lsa: LsaHandle,
        request: &LogonRequest<'_, FakeLogonInfo>,
    ) -> Result<LogonOutput, LogonFailure> {
        assert_eq!(lsa, LSA_HANDLE);
        let failed = self.enter(Step::Logon);
        let mut ledger = self.ledger.lock().unwrap();
        ledger.logons.push(RecordedLogon {
            origin_name: request.origin_name.to_string(),
            logon_type: request.logon_type,
            package: request.package,
            client_upn: request.logon_info.client_upn.clone(),
            source_name: request.source.name,
        });
        if failed {
            return Err(LogonFailure {
                status: STATUS_LOGON_FAILURE,
                sub_status: STATUS_NO_SUCH_USER,
            });
        }

        ledger.tokens_created += 1;
        let profile = if self.return_profile {
            ledger.profiles_returned += 1;
            Some(PROFILE_PTR)
        } else {
            None
        };
        Ok(LogonOutput {
            token: TOKEN_HANDLE,
            profile,
            profile_len: if profile.is_some() { 64 } else { 0 },
            logon_id: Luid {
                low_part: 0x9999,
                high_part: 0,
            },
            quotas: QuotaLimits::default(),
        })
    }

    fn free_return_buffer(&self, profile: ProfileBufferPtr) {
        assert_eq!(profile, PROFILE_PTR);
        self.ledger.lock().unwrap().profiles_freed += 1;
    }

    fn open_process(&self, pid: u32, access: ProcessAccess) -> Result<RawHandle, NativeStatus> {
        if self.enter(Step::OpenProcess) || self.exited_pids.contains(&pid) {
            return Err(STATUS_INVALID_CID);
        }
        let mut ledger = self.ledger.lock().unwrap();
        ledger.processes_opened += 1;
        ledger.opened.push((pid, access));
        Ok(PROCESS_HANDLE)
    }

    fn duplicate_handle(
        &self,
        source: RawHandle,
        target_process: RawHandle,
        access: TokenAccess,
        options: DuplicateOptions,
    ) -> Result<RawHandle, NativeStatus> {
        assert_eq!(source, TOKEN_HANDLE);
        assert_eq!(target_process, PROCESS_HANDLE);
        if self.enter(Step::Duplicate) {
            return Err(STATUS_ACCESS_DENIED);
        }
        self.ledger.lock().unwrap().duplicates.push((access, options));
        Ok(RawHandle(self.peer_handle))
    }

    fn close_remote_handle(
        &self,
        process: RawHandle,
        handle: RawHandle,
    ) -> Result<(), NativeStatus> {
        self.ledger
            .lock()
            .unwrap()
            .remote_closed
            .push((process, handle));
        Ok(())
    }

    fn close_handle(&self, handle: RawHandle) {
        assert!(
            handle == TOKEN_HANDLE || handle == PROCESS_HANDLE,
            "closing unknown handle {handle:?}"
        );
        self.ledger.lock().unwrap().closed.push(handle);
    }
}

// =============================================================================
// Fake Connection
// =============================================================================

/// Pipe connection reporting a fixed client pid, or a failure.
pub struct FakeConnection {
    pid: Result<u32, NativeStatus>,
}

impl FakeConnection {
    pub fn peer(pid: u32) -> Self {
        Self { pid: Ok(pid) }
    }

    pub fn broken(status: NativeStatus) -> Self {
        Self { pid: Err(status) }
    }
}

impl PeerConnection for FakeConnection {
    fn peer_process_id(&self) -> Result<u32, NativeStatus> {
        self.pid
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Fresh Ed25519 key.
pub fn random_key() -> PrivateKey {
    PrivateKey::from(Ed25519Keypair::from(&SigningKey::generate(&mut OsRng)))
}

/// Fresh ECDSA key on `curve`.
pub fn ecdsa_key(curve: EcdsaCurve) -> PrivateKey {
    PrivateKey::random(&mut OsRng, Algorithm::Ecdsa { curve }).unwrap()
}

/// Fixed 2048-bit RSA key; signs with `rsa-sha2-512`.
pub fn rsa_key() -> PrivateKey {
    PrivateKey::from_openssh(include_str!("../data/rsa-2048")).unwrap()
}

pub fn public_blob(key: &PrivateKey) -> Vec<u8> {
    key.public_key().to_bytes().unwrap()
}

pub fn sign_blob(key: &PrivateKey, payload: &[u8]) -> Vec<u8> {
    let signature: Signature = Signer::try_sign(key, payload).unwrap();
    let mut blob = Vec::new();
    signature.encode(&mut blob).unwrap();
    blob
}

pub fn frame(op: &str, key: &[u8], account: &str, sig: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for field in [op.as_bytes(), key, account.as_bytes(), sig, payload] {
        field.encode(&mut bytes).unwrap();
    }
    bytes
}

/// A correctly signed request for `account`.
pub fn signed_request(key: &PrivateKey, account: &str) -> Vec<u8> {
    let payload = b"session-id-and-user-auth-request";
    frame(
        AUTH_REQUEST,
        &public_blob(key),
        account,
        &sign_blob(key, payload),
        payload,
    )
}
