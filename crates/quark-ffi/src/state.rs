//! Settings, global references, box geometry, variables and thermo.

use std::ffi::{c_char, c_int, c_void, CString};
use std::ptr;

use quark_library::{get_setting, global_descriptor, GlobalKind, GlobalMut, GlobalRef, PerParticleMut};

use crate::cstr;
use crate::session::Session;
use crate::status::QuarkStatus;

/// Byte width of `bigint`, `tagint` or `imageint`; -1 for anything else.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_extract_setting(name: *const c_char) -> c_int {
    ffi_guard!(-1, {
        // SAFETY: name is null or NUL-terminated per the caller contract.
        unsafe { cstr::arg(name) }.map_or(-1, get_setting)
    })
}

/// Element type of global `name`: 0 int, 1 double, 2 bigint (`int64_t`),
/// 3 string; -1 if unknown.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_extract_global_datatype(name: *const c_char) -> c_int {
    ffi_guard!(-1, {
        // SAFETY: name is null or NUL-terminated per the caller contract.
        let descriptor = unsafe { cstr::arg(name) }.and_then(global_descriptor);
        descriptor.map_or(-1, |d| match d.kind {
            GlobalKind::Int => 0,
            GlobalKind::Double => 1,
            GlobalKind::BigInt => 2,
            GlobalKind::Str => 3,
        })
    })
}

/// Pointer to global `name`, or null if unknown.
///
/// The pointer stays valid until the instance is closed. Only `dt`,
/// `ntimestep`, `atime` and `atimestep` may be written through it; the
/// `units` string is a copy refreshed by each call.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_extract_global(handle: u64, name: *const c_char) -> *mut c_void {
    ffi_guard!(ptr::null_mut(), {
        // SAFETY: name is null or NUL-terminated per the caller contract.
        let Some(name) = (unsafe { cstr::arg(name) }) else {
            return ptr::null_mut();
        };
        let session = ffi_session!(handle, ptr::null_mut());
        let mut guard = ffi_lock!(session, ptr::null_mut());
        let Session { inst, units } = &mut *guard;

        if global_descriptor(name).is_some_and(|d| d.writable) {
            return match inst.get_global_mut(name) {
                Some(GlobalMut::Double(v)) => ptr::from_mut(v).cast(),
                Some(GlobalMut::BigInt(v)) => ptr::from_mut(v).cast(),
                None => ptr::null_mut(),
            };
        }
        match inst.get_global_ref(name) {
            Some(GlobalRef::Double(v)) => ptr::from_ref(v).cast_mut().cast(),
            Some(GlobalRef::DoubleArray(v)) => v.as_ptr().cast_mut().cast(),
            Some(GlobalRef::Int(v)) => ptr::from_ref(v).cast_mut().cast(),
            Some(GlobalRef::IntArray(v)) => v.as_ptr().cast_mut().cast(),
            Some(GlobalRef::BigInt(v)) => ptr::from_ref(v).cast_mut().cast(),
            Some(GlobalRef::Str(text)) => {
                *units = CString::new(text).unwrap_or_default();
                units.as_ptr().cast_mut().cast()
            }
            None => ptr::null_mut(),
        }
    })
}

/// Copy the box geometry into whichever outputs are non-null.
///
/// `boxlo`, `boxhi` and `periodicity` receive three values each.
#[no_mangle]
#[allow(unsafe_code, clippy::too_many_arguments)]
pub extern "C" fn quark_extract_box(
    handle: u64,
    boxlo: *mut f64,
    boxhi: *mut f64,
    xy: *mut f64,
    yz: *mut f64,
    xz: *mut f64,
    periodicity: *mut c_int,
    box_change: *mut c_int,
) -> i32 {
    ffi_guard!({
        let session = ffi_session!(handle);
        let geometry = ffi_lock!(session).inst.get_box();
        // SAFETY: every non-null output is valid for the documented
        // number of writes per the caller contract.
        unsafe {
            if !boxlo.is_null() {
                ptr::copy_nonoverlapping(geometry.lo.as_ptr(), boxlo, 3);
            }
            if !boxhi.is_null() {
                ptr::copy_nonoverlapping(geometry.hi.as_ptr(), boxhi, 3);
            }
            if !periodicity.is_null() {
                ptr::copy_nonoverlapping(geometry.periodicity.as_ptr(), periodicity, 3);
            }
            for (out, value) in [(xy, geometry.xy), (yz, geometry.yz), (xz, geometry.xz)] {
                if !out.is_null() {
                    *out = value;
                }
            }
            if !box_change.is_null() {
                *box_change = c_int::from(geometry.box_change);
            }
        }
        QuarkStatus::Ok as i32
    })
}

/// Replace the box bounds and tilts. Collective. `boxlo` and `boxhi`
/// hold three values each. Invalid bounds are captured, not returned.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_reset_box(
    handle: u64,
    boxlo: *const f64,
    boxhi: *const f64,
    xy: f64,
    yz: f64,
    xz: f64,
) -> i32 {
    ffi_guard!({
        if boxlo.is_null() || boxhi.is_null() {
            return QuarkStatus::InvalidArgument as i32;
        }
        // SAFETY: both point to three doubles per the caller contract.
        let (lo, hi) = unsafe { (ptr::read(boxlo.cast::<[f64; 3]>()), ptr::read(boxhi.cast::<[f64; 3]>())) };
        let session = ffi_session!(handle);
        ffi_lock!(session).inst.set_box(lo, hi, xy, yz, xz);
        QuarkStatus::Ok as i32
    })
}

/// Pointer to the local values of per-particle property `name`, or null.
///
/// Invalidated by anything that adds particles.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_extract_atom(handle: u64, name: *const c_char) -> *mut c_void {
    ffi_guard!(ptr::null_mut(), {
        // SAFETY: name is null or NUL-terminated per the caller contract.
        let Some(name) = (unsafe { cstr::arg(name) }) else {
            return ptr::null_mut();
        };
        let session = ffi_session!(handle, ptr::null_mut());
        let mut guard = ffi_lock!(session, ptr::null_mut());
        match guard.inst.extract_particle_mut(name) {
            Some(PerParticleMut::Int { data, .. }) => data.as_mut_ptr().cast(),
            Some(PerParticleMut::Double { data, .. }) => data.as_mut_ptr().cast(),
            None => ptr::null_mut(),
        }
    })
}

/// Set string variable `name` to `value`: 0 on success, -1 otherwise.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_set_variable(handle: u64, name: *const c_char, value: *const c_char) -> c_int {
    ffi_guard!({
        // SAFETY: both are null or NUL-terminated per the caller contract.
        let (Some(name), Some(value)) = (unsafe { cstr::arg(name) }, unsafe { cstr::arg(value) }) else {
            return -1;
        };
        let session = ffi_session!(handle);
        let status = ffi_lock!(session).inst.set_string_variable(name, value);
        status
    })
}

/// Current value of thermo keyword `name`; 0.0 when unknown or failed.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_get_thermo(handle: u64, name: *const c_char) -> f64 {
    ffi_guard!(0.0, {
        // SAFETY: name is null or NUL-terminated per the caller contract.
        let Some(name) = (unsafe { cstr::arg(name) }) else {
            return 0.0;
        };
        let session = ffi_session!(handle, 0.0);
        let value = ffi_lock!(session, 0.0).inst.get_thermo(name);
        value.unwrap_or(0.0)
    })
}

/// Global particle count; 0 if it does not fit in an `int`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_get_natoms(handle: u64) -> c_int {
    ffi_guard!({
        let session = ffi_session!(handle);
        let natoms = ffi_lock!(session).inst.natoms();
        natoms
    })
}
