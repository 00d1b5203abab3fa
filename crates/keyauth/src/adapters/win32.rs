//! # Windows Host Adapter
//!
//! [`HostSecurity`] over the LSA logon APIs and the Win32 handle APIs, and
//! [`PeerConnection`] over a connected named pipe.
//!
//! ## Security Notes
//!
//! - The caller must hold the privilege to register a logon process
//! - Every status returned here is passed through untouched for diagnostics
//! - Partial outputs of a failed `LsaLogonUser` are released before returning

use crate::config::NATIVE_ACCOUNT_NAME_CAPACITY;
use crate::domain::entities::{
    AuthPackageId, DuplicateOptions, LogonOutput, LogonRequest, LsaHandle, Luid, NativeStatus,
    ProcessAccess, ProfileBufferPtr, QuotaLimits, RawHandle, TokenAccess,
};
use crate::domain::errors::{AllocError, LogonFailure};
use crate::domain::issuer::s4u_logon_info_size;
use crate::ports::outbound::{HostSecurity, PeerConnection};
use std::alloc::{self, Layout};
use std::ffi::{c_void, CStr, CString};
use std::mem;
use std::os::windows::io::{AsRawHandle, BorrowedHandle};
use std::ptr::{self, NonNull};
use tracing::warn;
use windows::core::{PSTR, PWSTR};
use windows::Win32::Foundation::{
    CloseHandle, DuplicateHandle, DUPLICATE_CLOSE_SOURCE, DUPLICATE_HANDLE_OPTIONS, HANDLE, LUID,
    NTSTATUS, UNICODE_STRING,
};
use windows::Win32::Security::Authentication::Identity::{
    KerbS4ULogon, LsaDeregisterLogonProcess, LsaFreeReturnBuffer, LsaLogonUser,
    LsaLookupAuthenticationPackage, LsaRegisterLogonProcess, KERB_S4U_LOGON, LSA_STRING,
    SECURITY_LOGON_TYPE,
};
use windows::Win32::Security::{AllocateLocallyUniqueId, QUOTA_LIMITS, TOKEN_SOURCE};
use windows::Win32::System::Pipes::GetNamedPipeClientProcessId;
use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcess, PROCESS_ACCESS_RIGHTS};

const STATUS_INVALID_PARAMETER: NativeStatus = NativeStatus(0xC000_000D_u32 as i32);
const STATUS_NO_TOKEN: NativeStatus = NativeStatus(0xC000_007C_u32 as i32);

fn handle(raw: RawHandle) -> HANDLE {
    HANDLE(raw.0 as _)
}

fn raw(handle: HANDLE) -> RawHandle {
    RawHandle(handle.0 as usize)
}

fn lsa_handle(lsa: LsaHandle) -> HANDLE {
    HANDLE(lsa.0 as _)
}

fn nt_result(status: NTSTATUS) -> Result<(), NativeStatus> {
    if status.0 == 0 {
        Ok(())
    } else {
        Err(NativeStatus(status.0))
    }
}

fn win32_status(err: windows::core::Error) -> NativeStatus {
    NativeStatus(err.code().0)
}

fn ansi_name(name: &str) -> Result<CString, NativeStatus> {
    CString::new(name).map_err(|_| STATUS_INVALID_PARAMETER)
}

/// Counted ANSI string borrowing `name`; valid while `name` is.
fn lsa_string(name: &CStr) -> Result<LSA_STRING, NativeStatus> {
    let length = u16::try_from(name.to_bytes().len()).map_err(|_| STATUS_INVALID_PARAMETER)?;
    let maximum = u16::try_from(name.to_bytes_with_nul().len())
        .map_err(|_| STATUS_INVALID_PARAMETER)?;
    Ok(LSA_STRING {
        Length: length,
        MaximumLength: maximum,
        Buffer: PSTR(name.as_ptr() as *mut u8),
    })
}

// =============================================================================
// S4U Logon Buffer
// =============================================================================

/// Heap buffer holding a `KERB_S4U_LOGON` header followed by the client UPN
/// and its terminator. `ClientUpn.Buffer` points into the same allocation.
pub struct S4uLogonBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl S4uLogonBuffer {
    /// Allocate and fill the buffer for `client_upn` (UTF-16, no terminator).
    pub fn new(client_upn: &[u16]) -> Result<Self, AllocError> {
        let header = mem::size_of::<KERB_S4U_LOGON>();
        let size = s4u_logon_info_size(header, client_upn.len()).ok_or(AllocError {
            requested: usize::MAX,
        })?;
        if client_upn.len() > NATIVE_ACCOUNT_NAME_CAPACITY {
            return Err(AllocError { requested: size });
        }
        let layout = Layout::from_size_align(size, mem::align_of::<KERB_S4U_LOGON>())
            .map_err(|_| AllocError { requested: size })?;

        // SAFETY: the layout has a non-zero size (the header is not empty).
        let base = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(base).ok_or(AllocError { requested: size })?;

        let name_bytes = (client_upn.len() * mem::size_of::<u16>()) as u16;
        // SAFETY: the allocation is `header` bytes of header plus room for the
        // name and a terminator, and `header` is a multiple of the header's
        // alignment, so the name area is aligned for u16. The terminator is
        // already zero.
        unsafe {
            let name = base.add(header).cast::<u16>();
            ptr::copy_nonoverlapping(client_upn.as_ptr(), name, client_upn.len());
            base.cast::<KERB_S4U_LOGON>().write(KERB_S4U_LOGON {
                MessageType: KerbS4ULogon,
                Flags: 0,
                ClientUpn: UNICODE_STRING {
                    Length: name_bytes,
                    MaximumLength: name_bytes + mem::size_of::<u16>() as u16,
                    Buffer: PWSTR(name),
                },
                ClientRealm: UNICODE_STRING::default(),
            });
        }

        Ok(Self { ptr, layout })
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.ptr.as_ptr().cast()
    }

    /// Total size in bytes.
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    fn header(&self) -> &KERB_S4U_LOGON {
        // SAFETY: written in `new` and never moved.
        unsafe { &*self.ptr.as_ptr().cast::<KERB_S4U_LOGON>() }
    }
}

impl Drop for S4uLogonBuffer {
    fn drop(&mut self) {
        // SAFETY: allocated in `new` with this layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

impl std::fmt::Debug for S4uLogonBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S4uLogonBuffer")
            .field("len", &self.len())
            .field("upn_bytes", &self.header().ClientUpn.Length)
            .finish()
    }
}

// =============================================================================
// LSA Host
// =============================================================================

/// The local security authority and the Win32 handle table.
#[derive(Debug, Default, Clone, Copy)]
pub struct LsaHost;

impl HostSecurity for LsaHost {
    type LogonInfo = S4uLogonBuffer;

    fn register_logon_process(&self, name: &str) -> Result<LsaHandle, NativeStatus> {
        let name = ansi_name(name)?;
        let name = lsa_string(&name)?;
        let mut lsa = HANDLE::default();
        let mut mode = 0u32;
        // SAFETY: `name` borrows a live CString; the out pointers are locals.
        nt_result(unsafe { LsaRegisterLogonProcess(&name, &mut lsa, &mut mode) })?;
        Ok(LsaHandle(lsa.0 as usize))
    }

    fn deregister_logon_process(&self, lsa: LsaHandle) {
        // SAFETY: `lsa` came from `register_logon_process` and is released once.
        let status = unsafe { LsaDeregisterLogonProcess(lsa_handle(lsa)) };
        if let Err(status) = nt_result(status) {
            warn!(%status, "LsaDeregisterLogonProcess failed");
        }
    }

    fn lookup_authentication_package(
        &self,
        lsa: LsaHandle,
        name: &str,
    ) -> Result<AuthPackageId, NativeStatus> {
        let name = ansi_name(name)?;
        let name = lsa_string(&name)?;
        let mut package = 0u32;
        // SAFETY: as in `register_logon_process`.
        nt_result(unsafe {
            LsaLookupAuthenticationPackage(lsa_handle(lsa), &name, &mut package)
        })?;
        Ok(AuthPackageId(package))
    }

    fn allocate_logon_info(&self, client_upn: &[u16]) -> Result<S4uLogonBuffer, AllocError> {
        S4uLogonBuffer::new(client_upn)
    }

    fn allocate_locally_unique_id(&self) -> Result<Luid, NativeStatus> {
        let mut luid = LUID::default();
        // SAFETY: writes one LUID to a local.
        unsafe { AllocateLocallyUniqueId(&mut luid) }.map_err(win32_status)?;
        Ok(Luid {
            low_part: luid.LowPart,
            high_part: luid.HighPart,
        })
    }

    fn logon_user(
        &self,
        lsa: LsaHandle,
        request: &LogonRequest<'_, S4uLogonBuffer>,
    ) -> Result<LogonOutput, LogonFailure> {
        let invalid = LogonFailure {
            status: STATUS_INVALID_PARAMETER,
            sub_status: NativeStatus::SUCCESS,
        };
        let origin = ansi_name(request.origin_name).map_err(|_| invalid)?;
        let origin = lsa_string(&origin).map_err(|_| invalid)?;
        let info_len = u32::try_from(request.logon_info.len()).map_err(|_| invalid)?;
        let source = TOKEN_SOURCE {
            SourceName: request.source.name.map(|b| b as _),
            SourceIdentifier: LUID {
                LowPart: request.source.identifier.low_part,
                HighPart: request.source.identifier.high_part,
            },
        };

        let mut profile: *mut c_void = ptr::null_mut();
        let mut profile_len = 0u32;
        let mut logon_id = LUID::default();
        let mut token = HANDLE::default();
        let mut quotas = QUOTA_LIMITS::default();
        let mut sub_status = NTSTATUS::default();

        // SAFETY: every input borrows a value that outlives the call and the
        // logon buffer is self-contained; the out pointers are locals.
        let status = unsafe {
            LsaLogonUser(
                lsa_handle(lsa),
                &origin,
                SECURITY_LOGON_TYPE(request.logon_type as i32),
                request.package.0,
                request.logon_info.as_ptr(),
                info_len,
                None,
                &source,
                &mut profile,
                &mut profile_len,
                &mut logon_id,
                &mut token,
                &mut quotas,
                &mut sub_status,
            )
        };

        let failure = match nt_result(status) {
            Err(status) => Some(LogonFailure {
                status,
                sub_status: NativeStatus(sub_status.0),
            }),
            Ok(()) if raw(token).is_null() => Some(LogonFailure {
                status: STATUS_NO_TOKEN,
                sub_status: NativeStatus::SUCCESS,
            }),
            Ok(()) => None,
        };

        if let Some(failure) = failure {
            if !profile.is_null() {
                self.free_return_buffer(ProfileBufferPtr(profile as usize));
            }
            if !raw(token).is_null() {
                self.close_handle(raw(token));
            }
            return Err(failure);
        }

        Ok(LogonOutput {
            token: raw(token),
            profile: (!profile.is_null()).then_some(ProfileBufferPtr(profile as usize)),
            profile_len,
            logon_id: Luid {
                low_part: logon_id.LowPart,
                high_part: logon_id.HighPart,
            },
            quotas: QuotaLimits {
                paged_pool_limit: quotas.PagedPoolLimit,
                non_paged_pool_limit: quotas.NonPagedPoolLimit,
                minimum_working_set_size: quotas.MinimumWorkingSetSize,
                maximum_working_set_size: quotas.MaximumWorkingSetSize,
                pagefile_limit: quotas.PagefileLimit,
                time_limit: quotas.TimeLimit,
            },
        })
    }

    fn free_return_buffer(&self, profile: ProfileBufferPtr) {
        // SAFETY: `profile` was returned by `LsaLogonUser` and is freed once.
        let status = unsafe { LsaFreeReturnBuffer(profile.0 as *const c_void) };
        if let Err(status) = nt_result(status) {
            warn!(%status, "LsaFreeReturnBuffer failed");
        }
    }

    fn open_process(&self, pid: u32, access: ProcessAccess) -> Result<RawHandle, NativeStatus> {
        // SAFETY: no pointers are passed.
        unsafe { OpenProcess(PROCESS_ACCESS_RIGHTS(access.0), false, pid) }
            .map(raw)
            .map_err(win32_status)
    }

    fn duplicate_handle(
        &self,
        source: RawHandle,
        target_process: RawHandle,
        access: TokenAccess,
        options: DuplicateOptions,
    ) -> Result<RawHandle, NativeStatus> {
        let mut target = HANDLE::default();
        // SAFETY: the handles are owned by live guards; `target` is a local.
        unsafe {
            DuplicateHandle(
                GetCurrentProcess(),
                handle(source),
                handle(target_process),
                &mut target,
                access.0,
                false,
                DUPLICATE_HANDLE_OPTIONS(options.0),
            )
        }
        .map_err(win32_status)?;
        Ok(raw(target))
    }

    fn close_remote_handle(
        &self,
        process: RawHandle,
        remote: RawHandle,
    ) -> Result<(), NativeStatus> {
        // SAFETY: closing via DUPLICATE_CLOSE_SOURCE needs no target.
        unsafe {
            DuplicateHandle(
                handle(process),
                handle(remote),
                HANDLE::default(),
                ptr::null_mut(),
                0,
                false,
                DUPLICATE_CLOSE_SOURCE,
            )
        }
        .map_err(win32_status)
    }

    fn close_handle(&self, raw_handle: RawHandle) {
        // SAFETY: the handle is owned by exactly one guard.
        if let Err(e) = unsafe { CloseHandle(handle(raw_handle)) } {
            warn!(status = %win32_status(e), "CloseHandle failed");
        }
    }
}

// =============================================================================
// Named Pipe Connection
// =============================================================================

/// Server end of a connected agent pipe.
#[derive(Debug, Clone, Copy)]
pub struct NamedPipeConnection<'a> {
    pipe: BorrowedHandle<'a>,
}

impl<'a> NamedPipeConnection<'a> {
    pub fn new(pipe: BorrowedHandle<'a>) -> Self {
        Self { pipe }
    }
}

impl PeerConnection for NamedPipeConnection<'_> {
    fn peer_process_id(&self) -> Result<u32, NativeStatus> {
        let mut pid = 0u32;
        // SAFETY: the pipe handle is borrowed for the lifetime of `self`.
        unsafe { GetNamedPipeClientProcessId(HANDLE(self.pipe.as_raw_handle() as _), &mut pid) }
            .map_err(win32_status)?;
        Ok(pid)
    }
}
