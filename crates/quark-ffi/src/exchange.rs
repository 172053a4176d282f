//! Gather, scatter and particle creation. All three are collectives.
//!
//! Buffers carry an explicit element count so a short buffer is reported
//! as `BufferTooSmall` instead of being overrun.

use std::ffi::{c_char, c_int, c_void};
use std::slice;

use quark_core::ElementKind;
use quark_library::{CreateParticles, ExchangeBuf, ExchangeSlice};

use crate::cstr;
use crate::status::QuarkStatus;

/// View `len` elements at `data`; null is accepted only for `len == 0`.
///
/// # Safety
///
/// `data` is null or valid for `len` reads of `T` for `'a`.
#[allow(unsafe_code)]
unsafe fn input<'a, T>(data: *const T, len: usize) -> Option<&'a [T]> {
    if data.is_null() {
        return if len == 0 { Some(&[]) } else { None };
    }
    // SAFETY: valid for len reads per the caller contract.
    Some(unsafe { slice::from_raw_parts(data, len) })
}

/// Mutable counterpart of [`input`].
///
/// # Safety
///
/// `data` is null or valid for `len` writes of `T` for `'a`, with no
/// other live reference to it.
#[allow(unsafe_code)]
unsafe fn output<'a, T>(data: *mut T, len: usize) -> Option<&'a mut [T]> {
    if data.is_null() {
        return if len == 0 { Some(&mut []) } else { None };
    }
    // SAFETY: valid for len writes per the caller contract.
    Some(unsafe { slice::from_raw_parts_mut(data, len) })
}

/// Gather `count` values per particle of property `name` into `data`
/// (`len` elements of `int` for kind 0, `double` for kind 1), ordered by
/// tag.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_gather_atoms(
    handle: u64,
    name: *const c_char,
    kind: c_int,
    count: c_int,
    data: *mut c_void,
    len: usize,
) -> i32 {
    ffi_guard!({
        // SAFETY: name is null or NUL-terminated per the caller contract.
        let name = unsafe { cstr::arg(name) };
        let (Some(name), Ok(kind), Ok(count)) = (name, ElementKind::try_from(kind), usize::try_from(count)) else {
            return QuarkStatus::InvalidArgument as i32;
        };
        // SAFETY: data holds len elements of the stated kind per the
        // caller contract.
        let buf = match kind {
            ElementKind::Int => unsafe { output(data.cast::<i32>(), len) }.map(ExchangeBuf::Int),
            ElementKind::Double => unsafe { output(data.cast::<f64>(), len) }.map(ExchangeBuf::Double),
        };
        let Some(buf) = buf else {
            return QuarkStatus::InvalidArgument as i32;
        };
        let session = ffi_session!(handle);
        let result = ffi_lock!(session).inst.gather(name, count, buf);
        QuarkStatus::of(&result)
    })
}

/// Overwrite `count` values per owned particle of property `name` from
/// `data`, ordered by tag. Requires a tag map.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn quark_scatter_atoms(
    handle: u64,
    name: *const c_char,
    kind: c_int,
    count: c_int,
    data: *const c_void,
    len: usize,
) -> i32 {
    ffi_guard!({
        // SAFETY: name is null or NUL-terminated per the caller contract.
        let name = unsafe { cstr::arg(name) };
        let (Some(name), Ok(kind), Ok(count)) = (name, ElementKind::try_from(kind), usize::try_from(count)) else {
            return QuarkStatus::InvalidArgument as i32;
        };
        // SAFETY: data holds len elements of the stated kind per the
        // caller contract.
        let src = match kind {
            ElementKind::Int => unsafe { input(data.cast::<i32>(), len) }.map(ExchangeSlice::Int),
            ElementKind::Double => unsafe { input(data.cast::<f64>(), len) }.map(ExchangeSlice::Double),
        };
        let Some(src) = src else {
            return QuarkStatus::InvalidArgument as i32;
        };
        let session = ffi_session!(handle);
        let result = ffi_lock!(session).inst.scatter(name, count, src);
        QuarkStatus::of(&result)
    })
}

/// Create `n` particles. `types` holds `n` values and `x` holds `3n`;
/// `ids`, `v` (`3n`) and `image` (`n`) may be null. A non-zero
/// `shrinkexceed` lets candidates beyond a shrink-wrapped face be kept.
///
/// Returns the number kept by this rank, or a negative status.
#[no_mangle]
#[allow(unsafe_code, clippy::too_many_arguments)]
pub extern "C" fn quark_create_atoms(
    handle: u64,
    n: c_int,
    ids: *const i32,
    types: *const i32,
    x: *const f64,
    v: *const f64,
    image: *const i32,
    shrinkexceed: c_int,
) -> c_int {
    ffi_guard!({
        let Ok(n) = usize::try_from(n) else {
            return QuarkStatus::InvalidArgument as i32;
        };
        // SAFETY: every non-null array holds the documented number of
        // elements per the caller contract.
        let (types, x) = unsafe { (input(types, n), input(x, 3 * n)) };
        let (Some(types), Some(x)) = (types, x) else {
            return QuarkStatus::InvalidArgument as i32;
        };
        // SAFETY: as above.
        let batch = unsafe {
            CreateParticles {
                ids: (!ids.is_null()).then(|| slice::from_raw_parts(ids, n)),
                types,
                x,
                v: (!v.is_null()).then(|| slice::from_raw_parts(v, 3 * n)),
                image: (!image.is_null()).then(|| slice::from_raw_parts(image, n)),
                allow_outside_bound: shrinkexceed != 0,
            }
        };
        let session = ffi_session!(handle);
        let result = ffi_lock!(session).inst.create_particles(&batch);
        match result {
            Ok(kept) => kept as c_int,
            Err(e) => QuarkStatus::from(&e) as i32,
        }
    })
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use std::ptr;

    use super::*;
    use crate::session::tests::{c, open};
    use crate::session::{quark_close, quark_has_error};
    use crate::state::quark_get_natoms;

    const BOX: [&str; 4] = [
        "atom_modify map array",
        "region b block 0 10 0 10 0 10",
        "create_box 2 b",
        "mass * 1.0",
    ];

    fn populated() -> u64 {
        let h = open(&BOX);
        let types = [1, 2, 1];
        let x = [1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0];
        let kept = quark_create_atoms(h, 3, ptr::null(), types.as_ptr(), x.as_ptr(), ptr::null(), ptr::null(), 0);
        assert_eq!(kept, 3);
        h
    }

    #[test]
    fn create_then_gather() {
        let h = populated();
        assert_eq!(quark_get_natoms(h), 3);
        let mut types = [0i32; 3];
        let status = quark_gather_atoms(h, c("type").as_ptr(), 0, 1, types.as_mut_ptr().cast(), 3);
        assert_eq!(status, 0);
        assert_eq!(types, [1, 2, 1]);
        quark_close(h);
    }

    #[test]
    fn scatter_then_gather_velocities() {
        let h = populated();
        let v: Vec<f64> = (0..9).map(f64::from).collect();
        assert_eq!(quark_scatter_atoms(h, c("v").as_ptr(), 1, 3, v.as_ptr().cast(), 9), 0);
        let mut back = [0.0; 9];
        assert_eq!(quark_gather_atoms(h, c("v").as_ptr(), 1, 3, back.as_mut_ptr().cast(), 9), 0);
        assert_eq!(back.to_vec(), v);
        quark_close(h);
    }

    #[test]
    fn usage_errors_map_to_status() {
        let h = populated();
        let mut small = [0.0; 2];
        let x = c("x");
        assert_eq!(
            quark_gather_atoms(h, x.as_ptr(), 1, 3, small.as_mut_ptr().cast(), 2),
            QuarkStatus::BufferTooSmall as i32
        );
        assert_eq!(
            quark_gather_atoms(h, x.as_ptr(), 0, 3, small.as_mut_ptr().cast(), 2),
            QuarkStatus::Mismatch as i32
        );
        assert_eq!(
            quark_gather_atoms(h, x.as_ptr(), 7, 3, small.as_mut_ptr().cast(), 2),
            QuarkStatus::InvalidArgument as i32
        );
        assert_eq!(
            quark_gather_atoms(h, x.as_ptr(), 1, 3, ptr::null_mut(), 9),
            QuarkStatus::InvalidArgument as i32
        );
        assert_eq!(quark_has_error(h), 0);
        assert_eq!(
            quark_gather_atoms(h, c("charm").as_ptr(), 1, 1, small.as_mut_ptr().cast(), 2),
            QuarkStatus::NotFound as i32
        );
        assert_eq!(quark_has_error(h), 1);
        quark_close(h);
    }

    #[test]
    fn create_without_box_is_a_precondition_failure() {
        let h = open(&[]);
        let types = [1];
        let x = [0.0; 3];
        let status = quark_create_atoms(h, 1, ptr::null(), types.as_ptr(), x.as_ptr(), ptr::null(), ptr::null(), 0);
        assert_eq!(status, QuarkStatus::PreconditionFailed as i32);
        assert_eq!(quark_has_error(h), 1);
        quark_close(h);
    }

    #[test]
    fn create_with_unknown_type_is_an_invalid_argument() {
        let h = open(&BOX);
        let types = [1, 5];
        let x = [1.0; 6];
        let status = quark_create_atoms(h, 2, ptr::null(), types.as_ptr(), x.as_ptr(), ptr::null(), ptr::null(), 0);
        assert_eq!(status, QuarkStatus::InvalidArgument as i32);
        assert_eq!(quark_get_natoms(h), 0);
        assert_eq!(quark_has_error(h), 0);
        quark_close(h);
    }
}
