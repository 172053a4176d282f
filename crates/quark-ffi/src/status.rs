//! C-compatible status codes.
//!
//! [`QuarkStatus`] is returned by every exported function that does not
//! return data directly. Exchange failures map from
//! [`ExchangeError`]; engine failures never do, since they are captured
//! in the instance instead.

use quark_library::ExchangeError;

/// Status code returned across the C boundary.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuarkStatus {
    /// Success.
    Ok = 0,
    /// Handle is invalid or was already closed.
    InvalidHandle = -1,
    /// An argument is null, not UTF-8, or out of range.
    InvalidArgument = -2,
    /// Caller-provided buffer is too small.
    BufferTooSmall = -3,
    /// No object, variable or property of that name.
    NotFound = -4,
    /// Element kind or per-particle count does not match the property.
    Mismatch = -5,
    /// Exchange preconditions do not hold; details were recorded in the
    /// instance (on rank 0).
    PreconditionFailed = -6,
    /// Instance construction failed.
    OpenFailed = -7,
    /// Internal error (poisoned lock after an earlier panic).
    InternalError = -20,
    /// A Rust panic was caught at the boundary.
    Panicked = -128,
}

impl From<&ExchangeError> for QuarkStatus {
    fn from(e: &ExchangeError) -> Self {
        match e {
            ExchangeError::Precondition { .. } => QuarkStatus::PreconditionFailed,
            ExchangeError::UnknownProperty { .. } => QuarkStatus::NotFound,
            ExchangeError::Mismatch { .. } => QuarkStatus::Mismatch,
            ExchangeError::InvalidType { .. } => QuarkStatus::InvalidArgument,
            ExchangeError::ShortBuffer { .. } => QuarkStatus::BufferTooSmall,
        }
    }
}

impl QuarkStatus {
    /// Status of an exchange result as `i32`.
    pub(crate) fn of<T>(result: &Result<T, ExchangeError>) -> i32 {
        match result {
            Ok(_) => QuarkStatus::Ok as i32,
            Err(e) => QuarkStatus::from(e) as i32,
        }
    }
}
