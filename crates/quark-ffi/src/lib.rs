//! C ABI for embedding the Quark engine.
//!
//! Instances are addressed by `u64` handles that are never reissued,
//! so a closed or forged handle is rejected instead of dereferenced.
//! Every exported function runs inside `ffi_guard!`: a panic becomes
//! [`QuarkStatus::Panicked`] (or the function's sentinel value) and never
//! unwinds into C. This is the only crate in the workspace that contains
//! `unsafe` code.
//!
//! Engine failures do not change a function's status; they are captured
//! in the instance and polled with `quark_has_error` and
//! `quark_get_last_error_message`, exactly as for Rust callers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run `$body` with panics caught. The body may `return` early.
///
/// The one-argument form yields [`QuarkStatus::Panicked`] as `i32` on a
/// panic; `ffi_guard!(fallback, body)` yields `fallback` instead.
macro_rules! ffi_guard {
    ($body:block) => {
        ffi_guard!($crate::status::QuarkStatus::Panicked as i32, $body)
    };
    ($fallback:expr, $body:block) => {
        match ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| $body)) {
            Ok(value) => value,
            Err(_) => {
                ::tracing::error!("panic caught at the C boundary");
                $fallback
            }
        }
    };
}

/// Lock `$mutex`, returning [`QuarkStatus::InternalError`] (or
/// `$fallback`) from the enclosing closure if it is poisoned.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        ffi_lock!($mutex, $crate::status::QuarkStatus::InternalError as i32)
    };
    ($mutex:expr, $fallback:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(_) => return $fallback,
        }
    };
}

/// Resolve a handle to its session, returning [`QuarkStatus::InvalidHandle`]
/// (or `$fallback`) from the enclosing closure if it is stale.
macro_rules! ffi_session {
    ($handle:expr) => {
        ffi_session!($handle, $crate::status::QuarkStatus::InvalidHandle as i32)
    };
    ($handle:expr, $fallback:expr) => {
        match $crate::session::lookup($handle) {
            Some(session) => session,
            None => return $fallback,
        }
    };
}

mod cstr;
pub mod exchange;
pub mod extract;
pub mod session;
pub mod state;
pub mod status;

pub use status::QuarkStatus;
