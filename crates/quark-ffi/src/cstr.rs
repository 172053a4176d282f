//! C string arguments and results.

use std::ffi::{c_char, CStr};

/// Borrow a NUL-terminated UTF-8 argument. `None` for null or non-UTF-8.
///
/// # Safety
///
/// `ptr` is null or points to a NUL-terminated string that outlives `'a`.
#[allow(unsafe_code)]
pub(crate) unsafe fn arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated per the caller contract.
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Copy `text` into `buf` as a NUL-terminated string of at most `cap`
/// bytes, truncating if needed. Returns whether it fit.
///
/// # Safety
///
/// `buf` is null or valid for `cap` bytes of writes.
#[allow(unsafe_code)]
pub(crate) unsafe fn copy_out(text: &str, buf: *mut c_char, cap: usize) -> bool {
    if buf.is_null() || cap == 0 {
        return false;
    }
    let n = text.len().min(cap - 1);
    // SAFETY: `buf` holds `cap >= n + 1` bytes per the caller contract.
    unsafe {
        std::ptr::copy_nonoverlapping(text.as_ptr().cast::<c_char>(), buf, n);
        *buf.add(n) = 0;
    }
    n == text.len()
}
