//! Extraction of computed quantities, driver results and expressions.
//!
//! Borrowed results come back as a pointer plus `rows`/`cols` outputs
//! (scalar 1 x 1, vector `len` x 1, array row-major). They stay valid
//! until the next call on the instance. Owned results are copied into
//! caller buffers.

use std::ffi::{c_char, c_int};
use std::ptr;

use quark_core::{DataRef, Scope, Shape};
use quark_library::ExpressionValue;

use crate::cstr;
use crate::status::QuarkStatus;

/// Pointer and dimensions of a borrowed result.
fn layout(data: DataRef<'_>) -> (*const f64, usize, usize) {
    match data {
        DataRef::Scalar(v) => (ptr::from_ref(v), 1, 1),
        DataRef::Vector(v) => (v.as_ptr(), v.len(), 1),
        DataRef::Array(a) => (a.as_slice().as_ptr(), a.rows(), a.cols()),
    }
}

/// Write dimensions to whichever outputs are non-null.
///
/// # Safety
///
/// Each non-null pointer is valid for one write.
#[allow(unsafe_code)]
unsafe fn write_dims(rows_out: *mut usize, cols_out: *mut usize, rows: usize, cols: usize) {
    // SAFETY: per the caller contract.
    unsafe {
        if !rows_out.is_null() {
            *rows_out = rows;
        }
        if !cols_out.is_null() {
            *cols_out = cols;
        }
    }
}

fn scope_shape(scope: c_int, shape: c_int) -> Option<(Scope, Shape)> {
    Some((Scope::try_from(scope).ok()?, Shape::try_from(shape).ok()?))
}

/// Borrow the `scope`/`shape` results of compute `id`, recomputing them
/// if stale. Null if the compute is unknown or does not produce them.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_extract_compute(
    handle: u64,
    id: *const c_char,
    scope: c_int,
    shape: c_int,
    rows_out: *mut usize,
    cols_out: *mut usize,
) -> *const f64 {
    ffi_guard!(ptr::null(), {
        // SAFETY: id is null or NUL-terminated per the caller contract.
        let (Some(id), Some((scope, shape))) = (unsafe { cstr::arg(id) }, scope_shape(scope, shape)) else {
            return ptr::null();
        };
        let session = ffi_session!(handle, ptr::null());
        let mut guard = ffi_lock!(session, ptr::null());
        let Some((data, rows, cols)) = guard.inst.extract_computed(id, scope, shape).map(layout) else {
            return ptr::null();
        };
        // SAFETY: outputs are null or valid per the caller contract.
        unsafe { write_dims(rows_out, cols_out, rows, cols) };
        data
    })
}

/// Compute one global value of fix `id` into `value_out`: its scalar,
/// element `i` of its vector, or element `(i, j)` of its array.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_extract_fix_value(
    handle: u64,
    id: *const c_char,
    shape: c_int,
    i: c_int,
    j: c_int,
    value_out: *mut f64,
) -> i32 {
    ffi_guard!({
        // SAFETY: id is null or NUL-terminated per the caller contract.
        let id = unsafe { cstr::arg(id) };
        let parsed = (id, Shape::try_from(shape), usize::try_from(i), usize::try_from(j));
        let (Some(id), Ok(shape), Ok(i), Ok(j)) = parsed else {
            return QuarkStatus::InvalidArgument as i32;
        };
        if value_out.is_null() {
            return QuarkStatus::InvalidArgument as i32;
        }
        let session = ffi_session!(handle);
        let value = ffi_lock!(session).inst.extract_driver_value(id, shape, i, j);
        let Some(value) = value else {
            return QuarkStatus::NotFound as i32;
        };
        // SAFETY: value_out is non-null and valid per the caller contract.
        unsafe { *value_out = value };
        QuarkStatus::Ok as i32
    })
}

/// Borrow the per-particle or local data fix `id` maintains. Null for
/// global scope, an unknown fix, or data it does not keep.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_extract_fix_data(
    handle: u64,
    id: *const c_char,
    scope: c_int,
    shape: c_int,
    rows_out: *mut usize,
    cols_out: *mut usize,
) -> *const f64 {
    ffi_guard!(ptr::null(), {
        // SAFETY: id is null or NUL-terminated per the caller contract.
        let (Some(id), Some((scope, shape))) = (unsafe { cstr::arg(id) }, scope_shape(scope, shape)) else {
            return ptr::null();
        };
        let session = ffi_session!(handle, ptr::null());
        let guard = ffi_lock!(session, ptr::null());
        let Some((data, rows, cols)) = guard.inst.extract_driver_data(id, scope, shape).map(layout) else {
            return ptr::null();
        };
        // SAFETY: outputs are null or valid per the caller contract.
        unsafe { write_dims(rows_out, cols_out, rows, cols) };
        data
    })
}

/// Evaluate variable `name` into `out`.
///
/// `equal` variables write one value; `atom` variables write one value
/// per local particle and need `group`. The value count goes to
/// `len_out` (if non-null) even when `cap` is too small, in which case
/// nothing is copied and `BufferTooSmall` is returned.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_extract_variable(
    handle: u64,
    name: *const c_char,
    group: *const c_char,
    out: *mut f64,
    cap: usize,
    len_out: *mut usize,
) -> i32 {
    ffi_guard!({
        // SAFETY: both are null or NUL-terminated per the caller contract.
        let (name, group) = unsafe { (cstr::arg(name), cstr::arg(group)) };
        let Some(name) = name else {
            return QuarkStatus::InvalidArgument as i32;
        };
        let session = ffi_session!(handle);
        let value = ffi_lock!(session).inst.extract_expression(name, group);
        let values: Vec<f64> = match value {
            Some(ExpressionValue::Global(v)) => vec![v],
            Some(ExpressionValue::PerParticle(v)) => v,
            None => return QuarkStatus::NotFound as i32,
        };
        // SAFETY: len_out is null or valid per the caller contract.
        unsafe { write_dims(len_out, ptr::null_mut(), values.len(), 0) };
        if values.len() > cap || (out.is_null() && !values.is_empty()) {
            return QuarkStatus::BufferTooSmall as i32;
        }
        // SAFETY: out holds cap >= values.len() doubles per the caller contract.
        unsafe { ptr::copy_nonoverlapping(values.as_ptr(), out, values.len()) };
        QuarkStatus::Ok as i32
    })
}
