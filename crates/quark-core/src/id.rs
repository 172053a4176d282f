//! Integer classes for counters, particle identities, and image flags.
//!
//! The widths are fixed at compile time. Drivers query them by name
//! through the library's setting lookup so they can size their own
//! buffers without linking against these aliases.

use std::mem::size_of;

/// Global counters: particle totals, timesteps.
pub type BigInt = i64;

/// Particle identity tags.
pub type TagInt = i32;

/// Packed per-particle image flags (see [`crate::image`]).
pub type ImageInt = i32;

/// Largest particle count the exchange protocols can address with a
/// 32-bit index.
pub const MAX_SMALL_INT: BigInt = i32::MAX as BigInt;

/// Byte width of every named integer class, in lookup order.
pub const INTEGER_WIDTHS: [(&str, usize); 3] = [
    ("bigint", size_of::<BigInt>()),
    ("tagint", size_of::<TagInt>()),
    ("imageint", size_of::<ImageInt>()),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_match_aliases() {
        assert_eq!(INTEGER_WIDTHS[0], ("bigint", 8));
        assert_eq!(INTEGER_WIDTHS[1], ("tagint", 4));
        assert_eq!(INTEGER_WIDTHS[2], ("imageint", 4));
    }

    #[test]
    fn small_int_limit_is_i32_max() {
        assert_eq!(MAX_SMALL_INT, 2_147_483_647);
    }
}
