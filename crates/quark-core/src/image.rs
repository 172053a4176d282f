//! Packed periodic image flags.
//!
//! Each particle carries one [`ImageInt`] recording how many times it has
//! been wrapped through each periodic dimension. The three counters are
//! stored as 10-bit fields offset by [`IMGMAX`], so a freshly created
//! particle (zero wraps in every dimension) has the value
//! [`DEFAULT_IMAGE`].

use crate::id::ImageInt;

/// Bits per dimension.
pub const IMGBITS: u32 = 10;
/// Shift of the z field.
pub const IMG2BITS: u32 = 20;
/// Mask of one packed field.
pub const IMGMASK: ImageInt = 1023;
/// Offset that encodes a zero wrap count.
pub const IMGMAX: ImageInt = 512;

/// Image flag of a particle that has never been wrapped.
pub const DEFAULT_IMAGE: ImageInt = (IMGMAX << IMG2BITS) | (IMGMAX << IMGBITS) | IMGMAX;

/// Pack three signed wrap counts into one image flag.
///
/// Counts outside `-512..=511` wrap silently, matching the packed
/// representation's range.
pub fn pack(counts: [i32; 3]) -> ImageInt {
    let field = |c: i32| (c + IMGMAX) & IMGMASK;
    (field(counts[2]) << IMG2BITS) | (field(counts[1]) << IMGBITS) | field(counts[0])
}

/// Unpack an image flag into signed wrap counts `[ix, iy, iz]`.
pub fn unpack(image: ImageInt) -> [i32; 3] {
    [
        (image & IMGMASK) - IMGMAX,
        ((image >> IMGBITS) & IMGMASK) - IMGMAX,
        (image >> IMG2BITS) - IMGMAX,
    ]
}

/// Shift one dimension's wrap count by `delta`, leaving the others intact.
pub fn shift(image: ImageInt, dim: usize, delta: i32) -> ImageInt {
    let mut counts = unpack(image);
    counts[dim] += delta;
    pack(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_image_unpacks_to_zero() {
        assert_eq!(unpack(DEFAULT_IMAGE), [0, 0, 0]);
        assert_eq!(pack([0, 0, 0]), DEFAULT_IMAGE);
    }

    #[test]
    fn shift_touches_one_dimension() {
        let img = shift(DEFAULT_IMAGE, 1, -3);
        assert_eq!(unpack(img), [0, -3, 0]);
        let img = shift(img, 2, 7);
        assert_eq!(unpack(img), [0, -3, 7]);
    }

    #[test]
    fn negative_counts_survive_packing() {
        assert_eq!(unpack(pack([-512, 511, -1])), [-512, 511, -1]);
    }
}
