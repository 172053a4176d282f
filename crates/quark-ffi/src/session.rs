//! Instance lifecycle, command channels and the last-error slot.
//!
//! Each open instance lives in its own `Arc<Mutex<Session>>`; the global
//! table lock is held only to resolve a handle. Ranks of one group that
//! share this library from different threads can therefore sit in the
//! same collective at once.

use std::collections::BTreeMap;
use std::ffi::{c_char, c_int, CString};
use std::sync::{Arc, Mutex};

use quark_library::Instance;

use crate::cstr;
use crate::status::QuarkStatus;

/// An open instance and the C-side copies of its text values.
pub(crate) struct Session {
    pub(crate) inst: Instance,
    /// NUL-terminated unit style handed out by `quark_extract_global`.
    pub(crate) units: CString,
}

type SessionArc = Arc<Mutex<Session>>;

/// Open sessions by handle. Handles count up from 1 and are never
/// reissued, so a closed, forged or zero handle resolves to nothing.
struct Registry {
    next: u64,
    open: BTreeMap<u64, SessionArc>,
}

impl Registry {
    const fn new() -> Self {
        Self {
            next: 1,
            open: BTreeMap::new(),
        }
    }

    /// Register `session` under a fresh handle; `None` once handles run out.
    fn register(&mut self, session: SessionArc) -> Option<u64> {
        let handle = self.next;
        self.next = handle.checked_add(1)?;
        self.open.insert(handle, session);
        Some(handle)
    }
}

static SESSIONS: Mutex<Registry> = Mutex::new(Registry::new());

/// The session behind `handle`, or `None` if the handle is stale or the
/// registry is poisoned.
pub(crate) fn lookup(handle: u64) -> Option<SessionArc> {
    SESSIONS.lock().ok()?.open.get(&handle).cloned()
}

/// Collect `count` C strings, or `None` if any is null or not UTF-8.
///
/// # Safety
///
/// `ptrs` is valid for `count` reads when `count > 0`.
#[allow(unsafe_code)]
unsafe fn string_array(count: usize, ptrs: *const *const c_char) -> Option<Vec<String>> {
    if count == 0 {
        return Some(Vec::new());
    }
    if ptrs.is_null() {
        return None;
    }
    // SAFETY: `ptrs` holds `count` entries per the caller contract.
    let ptrs = unsafe { std::slice::from_raw_parts(ptrs, count) };
    ptrs.iter()
        // SAFETY: each entry is null or NUL-terminated per the caller contract.
        .map(|&p| unsafe { cstr::arg(p) }.map(str::to_string))
        .collect()
}

// ── Lifecycle ──────────────────────────────────────────────────────

/// Open an instance on the process-wide default group.
///
/// `argv[0]` is the program name and is skipped; the remaining entries
/// are command-line switches. On success the handle is written to
/// `handle_out`. A construction failure is printed to stderr and
/// reported as `OpenFailed`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_open_no_group(argc: c_int, argv: *const *const c_char, handle_out: *mut u64) -> i32 {
    ffi_guard!({
        if handle_out.is_null() || argc < 0 {
            return QuarkStatus::InvalidArgument as i32;
        }
        // SAFETY: argv holds argc entries per the caller contract.
        let Some(args) = (unsafe { string_array(argc as usize, argv) }) else {
            return QuarkStatus::InvalidArgument as i32;
        };
        let switches = args.get(1..).unwrap_or_default();
        let Some(inst) = Instance::open_without_group(switches) else {
            return QuarkStatus::OpenFailed as i32;
        };
        let session = Session {
            inst,
            units: CString::default(),
        };
        let mut registry = ffi_lock!(SESSIONS);
        let Some(handle) = registry.register(Arc::new(Mutex::new(session))) else {
            return QuarkStatus::InternalError as i32;
        };
        tracing::debug!(handle, open = registry.open.len(), "instance opened");
        // SAFETY: handle_out is non-null and valid per the caller contract.
        unsafe { *handle_out = handle };
        QuarkStatus::Ok as i32
    })
}

/// Close an instance. Closing a stale handle returns `InvalidHandle`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_close(handle: u64) -> i32 {
    ffi_guard!({
        let Some(session) = ffi_lock!(SESSIONS).open.remove(&handle) else {
            return QuarkStatus::InvalidHandle as i32;
        };
        if let Ok(mutex) = Arc::try_unwrap(session) {
            if let Ok(session) = mutex.into_inner() {
                session.inst.close();
            }
        }
        QuarkStatus::Ok as i32
    })
}

/// Numeric engine version, or `InvalidHandle`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_version(handle: u64) -> c_int {
    ffi_guard!({
        let session = ffi_session!(handle);
        let session = ffi_lock!(session);
        session.inst.version()
    })
}

// ── Commands ───────────────────────────────────────────────────────

/// Execute every command in the input file at `path`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_file(handle: u64, path: *const c_char) -> i32 {
    ffi_guard!({
        // SAFETY: path is null or NUL-terminated per the caller contract.
        let Some(path) = (unsafe { cstr::arg(path) }) else {
            return QuarkStatus::InvalidArgument as i32;
        };
        let session = ffi_session!(handle);
        ffi_lock!(session).inst.run_file(path);
        QuarkStatus::Ok as i32
    })
}

/// Execute one command.
///
/// If `name_out` is non-null, the command name (empty for blank lines
/// and failed commands) is copied into it; `BufferTooSmall` means it was
/// truncated. The command runs either way.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_command(handle: u64, line: *const c_char, name_out: *mut c_char, name_cap: usize) -> i32 {
    ffi_guard!({
        // SAFETY: line is null or NUL-terminated per the caller contract.
        let Some(line) = (unsafe { cstr::arg(line) }) else {
            return QuarkStatus::InvalidArgument as i32;
        };
        let session = ffi_session!(handle);
        let name = ffi_lock!(session).inst.run_one(line).unwrap_or_default();
        if name_out.is_null() {
            return QuarkStatus::Ok as i32;
        }
        // SAFETY: name_out holds name_cap bytes per the caller contract.
        if unsafe { cstr::copy_out(&name, name_out, name_cap) } {
            QuarkStatus::Ok as i32
        } else {
            QuarkStatus::BufferTooSmall as i32
        }
    })
}

/// Execute `count` commands as one batch.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_commands_list(handle: u64, count: c_int, cmds: *const *const c_char) -> i32 {
    ffi_guard!({
        if count < 0 {
            return QuarkStatus::InvalidArgument as i32;
        }
        // SAFETY: cmds holds count entries per the caller contract.
        let Some(lines) = (unsafe { string_array(count as usize, cmds) }) else {
            return QuarkStatus::InvalidArgument as i32;
        };
        let session = ffi_session!(handle);
        ffi_lock!(session).inst.run_batch(&lines);
        QuarkStatus::Ok as i32
    })
}

/// Execute newline-delimited commands as one batch.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_commands_string(handle: u64, text: *const c_char) -> i32 {
    ffi_guard!({
        // SAFETY: text is null or NUL-terminated per the caller contract.
        let Some(text) = (unsafe { cstr::arg(text) }) else {
            return QuarkStatus::InvalidArgument as i32;
        };
        let session = ffi_session!(handle);
        ffi_lock!(session).inst.run_text(text);
        QuarkStatus::Ok as i32
    })
}

// ── Last error ─────────────────────────────────────────────────────

/// Pending failure: 0 none, 1 recoverable, 2 group-fatal.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_has_error(handle: u64) -> c_int {
    ffi_guard!({
        let session = ffi_session!(handle);
        let session = ffi_lock!(session);
        session.inst.last_error().map_or(0, |f| f.severity.code())
    })
}

/// Move the pending failure's message into `buf` (truncated to
/// `cap - 1` bytes) and clear it. Returns its severity code, or 0 if
/// nothing was pending.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_get_last_error_message(handle: u64, buf: *mut c_char, cap: c_int) -> c_int {
    ffi_guard!({
        let session = ffi_session!(handle);
        let Some(failure) = ffi_lock!(session).inst.take_error() else {
            return 0;
        };
        // SAFETY: buf holds cap bytes per the caller contract.
        unsafe { cstr::copy_out(&failure.message, buf, cap.max(0) as usize) };
        failure.severity.code()
    })
}

#[cfg(test)]
#[allow(unsafe_code)]
pub(crate) mod tests {
    use std::ffi::CStr;

    use quark_comm::SerialComm;

    use super::*;

    /// Open a silent instance and run `lines`; panics on failure.
    pub(crate) fn open(lines: &[&str]) -> u64 {
        let argv: Vec<CString> = ["quark", "-screen", "none", "-log", "none"]
            .into_iter()
            .map(|a| CString::new(a).unwrap())
            .collect();
        let ptrs: Vec<*const c_char> = argv.iter().map(|a| a.as_ptr()).collect();
        let mut handle = 0;
        assert_eq!(quark_open_no_group(ptrs.len() as c_int, ptrs.as_ptr(), &mut handle), 0);
        for line in lines {
            let line = CString::new(*line).unwrap();
            assert_eq!(quark_command(handle, line.as_ptr(), std::ptr::null_mut(), 0), 0);
        }
        assert_eq!(quark_has_error(handle), 0, "setup failed");
        handle
    }

    pub(crate) fn c(text: &str) -> CString {
        CString::new(text).unwrap()
    }

    #[test]
    fn lifecycle_rejects_stale_handles() {
        let h = open(&[]);
        assert!(quark_version(h) > 0);
        assert_eq!(quark_close(h), 0);
        assert_eq!(quark_close(h), QuarkStatus::InvalidHandle as i32);
        assert_eq!(quark_version(h), QuarkStatus::InvalidHandle as i32);
        assert_eq!(quark_has_error(h), QuarkStatus::InvalidHandle as i32);
    }

    #[test]
    fn handles_are_never_reissued() {
        let mut registry = Registry::new();
        let session = || {
            let inst = Instance::open(&["-screen", "none"], Arc::new(SerialComm::new())).unwrap();
            Arc::new(Mutex::new(Session {
                inst,
                units: CString::default(),
            }))
        };
        let first = registry.register(session()).unwrap();
        assert_eq!(first, 1);
        assert!(registry.open.remove(&first).is_some());
        let second = registry.register(session()).unwrap();
        assert_ne!(second, first);
        assert!(!registry.open.contains_key(&first));
        assert!(!registry.open.contains_key(&0));

        registry.next = u64::MAX;
        assert_eq!(registry.register(session()), None);
        assert_eq!(registry.open.len(), 1);
    }

    #[test]
    fn forged_handles_are_rejected() {
        let h = open(&[]);
        for forged in [0, h + 1_000_000, u64::MAX] {
            assert_eq!(quark_version(forged), QuarkStatus::InvalidHandle as i32);
            assert_eq!(quark_close(forged), QuarkStatus::InvalidHandle as i32);
        }
        quark_close(h);
    }

    #[test]
    fn bad_switch_fails_open() {
        let argv = [c("quark"), c("-bogus")];
        let ptrs: Vec<_> = argv.iter().map(|a| a.as_ptr()).collect();
        let mut handle = 0;
        assert_eq!(
            quark_open_no_group(2, ptrs.as_ptr(), &mut handle),
            QuarkStatus::OpenFailed as i32
        );
        assert_eq!(
            quark_open_no_group(0, std::ptr::null(), std::ptr::null_mut()),
            QuarkStatus::InvalidArgument as i32
        );
    }

    #[test]
    fn command_returns_name_and_errors_are_polled() {
        let h = open(&[]);
        let mut name = [0 as c_char; 16];
        let line = c("units metal");
        assert_eq!(quark_command(h, line.as_ptr(), name.as_mut_ptr(), name.len()), 0);
        assert_eq!(unsafe { CStr::from_ptr(name.as_ptr()) }.to_str(), Ok("units"));

        let bad = c("no_such_command");
        assert_eq!(quark_command(h, bad.as_ptr(), std::ptr::null_mut(), 0), 0);
        assert_eq!(quark_has_error(h), 1);
        let mut msg = [0 as c_char; 64];
        assert_eq!(quark_get_last_error_message(h, msg.as_mut_ptr(), 64), 1);
        let msg = unsafe { CStr::from_ptr(msg.as_ptr()) }.to_str().unwrap();
        assert!(msg.contains("no_such_command"), "{msg}");
        assert_eq!(quark_has_error(h), 0);
        assert_eq!(quark_get_last_error_message(h, std::ptr::null_mut(), 0), 0);
        quark_close(h);
    }

    #[test]
    fn list_and_string_batches_agree() {
        let a = open(&[]);
        let lines = [c("variable x equal &"), c("2+2")];
        let ptrs: Vec<_> = lines.iter().map(|l| l.as_ptr()).collect();
        assert_eq!(quark_commands_list(a, 2, ptrs.as_ptr()), 0);
        let b = open(&[]);
        let text = c("variable x equal 2+2\n");
        assert_eq!(quark_commands_string(b, text.as_ptr()), 0);
        for h in [a, b] {
            assert_eq!(quark_has_error(h), 0);
            let session = lookup(h).unwrap();
            let value = session.lock().unwrap().inst.engine_mut().evaluate_equal("x");
            assert_eq!(value.ok(), Some(4.0));
            quark_close(h);
        }
    }
}
