//! Scalar per-particle attributes addressable by name in
//! `compute property/atom`, `fix store/state` and atom-style variables.

use std::sync::LazyLock;

use indexmap::IndexMap;
use quark_core::image;

use crate::domain::Domain;
use crate::particles::ParticleStore;

/// One scalar attribute of a particle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Property {
    /// Tag.
    Id,
    /// Type.
    Type,
    /// Group mask.
    Mask,
    /// Per-type mass.
    Mass,
    /// Position component.
    X(usize),
    /// Unwrapped position component.
    Unwrapped(usize),
    /// Image count component.
    Image(usize),
    /// Velocity component.
    V(usize),
    /// Force component.
    F(usize),
    /// Charge.
    Q,
}

static NAMES: LazyLock<IndexMap<&'static str, Property>> = LazyLock::new(|| {
    use Property::*;
    IndexMap::from([
        ("id", Id),
        ("type", Type),
        ("mask", Mask),
        ("mass", Mass),
        ("x", X(0)),
        ("y", X(1)),
        ("z", X(2)),
        ("xu", Unwrapped(0)),
        ("yu", Unwrapped(1)),
        ("zu", Unwrapped(2)),
        ("ix", Image(0)),
        ("iy", Image(1)),
        ("iz", Image(2)),
        ("vx", V(0)),
        ("vy", V(1)),
        ("vz", V(2)),
        ("fx", F(0)),
        ("fy", F(1)),
        ("fz", F(2)),
        ("q", Q),
    ])
});

impl Property {
    /// Look up an attribute by name.
    pub fn parse(name: &str) -> Option<Self> {
        NAMES.get(name).copied()
    }

    /// Whether the attribute needs per-particle charges.
    pub fn needs_charge(self) -> bool {
        self == Self::Q
    }

    /// Value for local particle `i`.
    pub fn value(self, particles: &ParticleStore, domain: &Domain, i: usize) -> f64 {
        match self {
            Self::Id => f64::from(particles.tags()[i]),
            Self::Type => f64::from(particles.types()[i]),
            Self::Mask => f64::from(particles.masks()[i]),
            Self::Mass => particles.mass_of(i),
            Self::X(d) => particles.x()[i][d],
            Self::Unwrapped(d) => domain.unmap(&particles.x()[i], particles.images()[i])[d],
            Self::Image(d) => f64::from(image::unpack(particles.images()[i])[d]),
            Self::V(d) => particles.v()[i][d],
            Self::F(d) => particles.f()[i][d],
            Self::Q => particles.q()[i],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve() {
        assert_eq!(Property::parse("vy"), Some(Property::V(1)));
        assert_eq!(Property::parse("zu"), Some(Property::Unwrapped(2)));
        assert_eq!(Property::parse("w"), None);
    }

    #[test]
    fn values_read_the_store() {
        let mut p = ParticleStore::default();
        p.set_ntypes(1);
        p.mass[1] = 2.0;
        let i = p.push(1, [1.0, 2.0, 3.0]);
        p.tags_mut()[i] = 9;
        p.images_mut()[i] = image::pack([1, 0, 0]);
        let d = Domain::default();
        assert_eq!(Property::Id.value(&p, &d, i), 9.0);
        assert_eq!(Property::Mass.value(&p, &d, i), 2.0);
        assert_eq!(Property::X(2).value(&p, &d, i), 3.0);
        assert_eq!(Property::Image(0).value(&p, &d, i), 1.0);
        assert_eq!(Property::Unwrapped(0).value(&p, &d, i), 2.0);
    }
}
