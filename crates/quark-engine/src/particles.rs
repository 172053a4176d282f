//! Per-process particle storage.
//!
//! Structure-of-arrays over the locally owned particles. Local indices
//! are dense `0..nlocal` and carry no meaning across processes; tags are
//! the stable global identity. There are never ghost particles.

use std::collections::HashMap;
use std::sync::LazyLock;

use indexmap::IndexMap;
use quark_core::image::DEFAULT_IMAGE;
use quark_core::{BigInt, Communicator, ElementKind, ImageInt, ReduceOp, TagInt};

// ── Property table ─────────────────────────────────────────────────

/// Element type and per-particle width of a named property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyInfo {
    /// Element type.
    pub kind: ElementKind,
    /// Values per particle.
    pub width: usize,
}

static PROPERTIES: LazyLock<IndexMap<&'static str, PropertyInfo>> = LazyLock::new(|| {
    use ElementKind::{Double, Int};
    [
        ("id", Int, 1),
        ("type", Int, 1),
        ("mask", Int, 1),
        ("image", Int, 1),
        ("x", Double, 3),
        ("v", Double, 3),
        ("f", Double, 3),
        ("q", Double, 1),
    ]
    .into_iter()
    .map(|(name, kind, width)| (name, PropertyInfo { kind, width }))
    .collect()
});

/// Describe the per-particle property `name`, if it exists.
pub fn property_info(name: &str) -> Option<PropertyInfo> {
    PROPERTIES.get(name).copied()
}

/// Borrowed flat view of one per-particle property, `width` values per
/// particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PerParticle<'a> {
    /// Integer property.
    Int {
        /// `nlocal * width` values.
        data: &'a [i32],
        /// Values per particle.
        width: usize,
    },
    /// Floating-point property.
    Double {
        /// `nlocal * width` values.
        data: &'a [f64],
        /// Values per particle.
        width: usize,
    },
}

/// Mutable flat view of one per-particle property.
#[derive(Debug, PartialEq)]
pub enum PerParticleMut<'a> {
    /// Integer property.
    Int {
        /// `nlocal * width` values.
        data: &'a mut [i32],
        /// Values per particle.
        width: usize,
    },
    /// Floating-point property.
    Double {
        /// `nlocal * width` values.
        data: &'a mut [f64],
        /// Values per particle.
        width: usize,
    },
}

// ── Tag map ────────────────────────────────────────────────────────

/// How the tag → local index map is stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MapStyle {
    /// No map.
    #[default]
    None,
    /// Dense array indexed by tag.
    Array,
    /// Hash map keyed by tag.
    Hash,
}

#[derive(Clone, Debug, Default)]
enum TagMap {
    #[default]
    Empty,
    Array(Vec<i32>),
    Hash(HashMap<TagInt, usize>),
}

// ── ParticleStore ──────────────────────────────────────────────────

/// Locally owned particles and global particle counts.
#[derive(Clone, Debug)]
pub struct ParticleStore {
    /// Global particle count.
    pub natoms: BigInt,
    /// Global bond count. Always 0.
    pub nbonds: BigInt,
    /// Global angle count. Always 0.
    pub nangles: BigInt,
    /// Global dihedral count. Always 0.
    pub ndihedrals: BigInt,
    /// Global improper count. Always 0.
    pub nimpropers: BigInt,
    /// Locally owned particles.
    pub nlocal: i32,
    /// Ghost particles. Always 0.
    pub nghost: i32,
    /// Allocated per-particle capacity.
    pub nmax: i32,
    /// Number of particle types.
    pub ntypes: usize,
    /// Whether particles carry tags.
    pub tag_enable: bool,
    /// 1 if particles carry a charge.
    pub q_flag: i32,
    /// Per-type mass, indexed `1..=ntypes`.
    pub mass: Vec<f64>,
    /// Whether each per-type mass was set.
    pub mass_set: Vec<bool>,
    /// Requested tag map storage.
    pub map_style: MapStyle,
    tag: Vec<TagInt>,
    kind: Vec<i32>,
    mask: Vec<i32>,
    image: Vec<ImageInt>,
    x: Vec<[f64; 3]>,
    v: Vec<[f64; 3]>,
    f: Vec<[f64; 3]>,
    q: Vec<f64>,
    map: TagMap,
}

impl Default for ParticleStore {
    fn default() -> Self {
        Self {
            natoms: 0,
            nbonds: 0,
            nangles: 0,
            ndihedrals: 0,
            nimpropers: 0,
            nlocal: 0,
            nghost: 0,
            nmax: 0,
            ntypes: 0,
            tag_enable: true,
            q_flag: 0,
            mass: vec![0.0],
            mass_set: vec![false],
            map_style: MapStyle::None,
            tag: Vec::new(),
            kind: Vec::new(),
            mask: Vec::new(),
            image: Vec::new(),
            x: Vec::new(),
            v: Vec::new(),
            f: Vec::new(),
            q: Vec::new(),
            map: TagMap::Empty,
        }
    }
}

impl ParticleStore {
    /// Number of locally owned particles.
    pub fn len(&self) -> usize {
        self.tag.len()
    }

    /// Whether this rank owns no particles.
    pub fn is_empty(&self) -> bool {
        self.tag.is_empty()
    }

    /// Size the per-type tables for `ntypes` types.
    pub fn set_ntypes(&mut self, ntypes: usize) {
        self.ntypes = ntypes;
        self.mass = vec![0.0; ntypes + 1];
        self.mass_set = vec![false; ntypes + 1];
    }

    /// Whether every type has a mass.
    pub fn all_masses_set(&self) -> bool {
        self.mass_set.iter().skip(1).all(|&set| set)
    }

    /// Append a particle of `kind` at `x` with default properties and
    /// return its local index. The caller sets the tag.
    pub fn push(&mut self, kind: i32, x: [f64; 3]) -> usize {
        self.tag.push(0);
        self.kind.push(kind);
        self.mask.push(1);
        self.image.push(DEFAULT_IMAGE);
        self.x.push(x);
        self.v.push([0.0; 3]);
        self.f.push([0.0; 3]);
        self.q.push(0.0);
        self.nlocal = self.tag.len() as i32;
        self.nmax = self.nmax.max(self.tag.capacity() as i32);
        self.nlocal as usize - 1
    }

    /// Borrow the property `name`. `q` exists only with charges enabled.
    pub fn extract(&self, name: &str) -> Option<PerParticle<'_>> {
        let view = match name {
            "id" => PerParticle::Int { data: &self.tag, width: 1 },
            "type" => PerParticle::Int { data: &self.kind, width: 1 },
            "mask" => PerParticle::Int { data: &self.mask, width: 1 },
            "image" => PerParticle::Int { data: &self.image, width: 1 },
            "x" => PerParticle::Double { data: self.x.as_flattened(), width: 3 },
            "v" => PerParticle::Double { data: self.v.as_flattened(), width: 3 },
            "f" => PerParticle::Double { data: self.f.as_flattened(), width: 3 },
            "q" if self.q_flag != 0 => PerParticle::Double { data: &self.q, width: 1 },
            _ => return None,
        };
        Some(view)
    }

    /// Mutably borrow the property `name`.
    pub fn extract_mut(&mut self, name: &str) -> Option<PerParticleMut<'_>> {
        let view = match name {
            "id" => PerParticleMut::Int { data: &mut self.tag, width: 1 },
            "type" => PerParticleMut::Int { data: &mut self.kind, width: 1 },
            "mask" => PerParticleMut::Int { data: &mut self.mask, width: 1 },
            "image" => PerParticleMut::Int { data: &mut self.image, width: 1 },
            "x" => PerParticleMut::Double { data: self.x.as_flattened_mut(), width: 3 },
            "v" => PerParticleMut::Double { data: self.v.as_flattened_mut(), width: 3 },
            "f" => PerParticleMut::Double { data: self.f.as_flattened_mut(), width: 3 },
            "q" if self.q_flag != 0 => PerParticleMut::Double { data: &mut self.q, width: 1 },
            _ => return None,
        };
        Some(view)
    }

    /// Tags.
    pub fn tags(&self) -> &[TagInt] {
        &self.tag
    }

    /// Mutable tags.
    pub fn tags_mut(&mut self) -> &mut [TagInt] {
        &mut self.tag
    }

    /// Types.
    pub fn types(&self) -> &[i32] {
        &self.kind
    }

    /// Group masks.
    pub fn masks(&self) -> &[i32] {
        &self.mask
    }

    /// Mutable group masks.
    pub fn masks_mut(&mut self) -> &mut [i32] {
        &mut self.mask
    }

    /// Image counters.
    pub fn images(&self) -> &[ImageInt] {
        &self.image
    }

    /// Mutable image counters.
    pub fn images_mut(&mut self) -> &mut [ImageInt] {
        &mut self.image
    }

    /// Positions.
    pub fn x(&self) -> &[[f64; 3]] {
        &self.x
    }

    /// Velocities.
    pub fn v(&self) -> &[[f64; 3]] {
        &self.v
    }

    /// Mutable velocities.
    pub fn v_mut(&mut self) -> &mut [[f64; 3]] {
        &mut self.v
    }

    /// Forces.
    pub fn f(&self) -> &[[f64; 3]] {
        &self.f
    }

    /// Mutable forces.
    pub fn f_mut(&mut self) -> &mut [[f64; 3]] {
        &mut self.f
    }

    /// Charges (zero when charges are disabled).
    pub fn q(&self) -> &[f64] {
        &self.q
    }

    /// Positions, velocities, forces, images and masks borrowed together
    /// for integration.
    pub fn integrate_view(
        &mut self,
    ) -> (
        &mut [[f64; 3]],
        &mut [[f64; 3]],
        &mut [[f64; 3]],
        &mut [ImageInt],
        &[i32],
    ) {
        (
            &mut self.x,
            &mut self.v,
            &mut self.f,
            &mut self.image,
            &self.mask,
        )
    }

    /// Mass of particle `i`.
    pub fn mass_of(&self, i: usize) -> f64 {
        self.mass
            .get(self.kind[i] as usize)
            .copied()
            .unwrap_or(0.0)
    }

    /// Whether tags are exactly `1..=natoms` across the group. Collective.
    ///
    /// Only the global minimum and maximum are checked.
    pub fn tag_consecutive(&self, comm: &dyn Communicator) -> bool {
        let lo = self.tag.iter().copied().min().unwrap_or(TagInt::MAX);
        let hi = self.tag.iter().copied().max().unwrap_or(0);
        let mut out = [0i32; 1];
        comm.all_reduce_i32(&[lo], &mut out, ReduceOp::Min);
        let lo_all = out[0];
        comm.all_reduce_i32(&[hi], &mut out, ReduceOp::Max);
        let hi_all = out[0];
        lo_all == 1 && BigInt::from(hi_all) == self.natoms
    }

    /// Whether a tag map is configured.
    pub fn has_map(&self) -> bool {
        self.map_style != MapStyle::None
    }

    /// Discard the current map contents.
    pub fn map_init(&mut self) {
        self.map = match self.map_style {
            MapStyle::None => TagMap::Empty,
            MapStyle::Array => TagMap::Array(Vec::new()),
            MapStyle::Hash => TagMap::Hash(HashMap::new()),
        };
    }

    /// Record every local particle in the map.
    pub fn map_set(&mut self) {
        match &mut self.map {
            TagMap::Empty => {}
            TagMap::Array(slots) => {
                let max = self.tag.iter().copied().max().unwrap_or(0).max(0) as usize;
                slots.clear();
                slots.resize(max + 1, -1);
                for (i, &t) in self.tag.iter().enumerate() {
                    if t > 0 {
                        slots[t as usize] = i as i32;
                    }
                }
            }
            TagMap::Hash(slots) => {
                slots.clear();
                slots.extend(self.tag.iter().enumerate().map(|(i, &t)| (t, i)));
            }
        }
    }

    /// Local index of the particle tagged `tag`, if owned here.
    pub fn map_find(&self, tag: TagInt) -> Option<usize> {
        match &self.map {
            TagMap::Empty => None,
            TagMap::Array(slots) => usize::try_from(tag)
                .ok()
                .and_then(|t| slots.get(t))
                .and_then(|&i| usize::try_from(i).ok()),
            TagMap::Hash(slots) => slots.get(&tag).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quark_comm::SerialComm;

    fn three() -> ParticleStore {
        let mut p = ParticleStore::default();
        p.set_ntypes(1);
        for (k, x) in [[0.0; 3], [1.0; 3], [2.0; 3]].into_iter().enumerate() {
            let i = p.push(1, x);
            p.tags_mut()[i] = k as TagInt + 1;
        }
        p.natoms = 3;
        p
    }

    #[test]
    fn push_sets_defaults() {
        let p = three();
        assert_eq!(p.nlocal, 3);
        assert!(p.nmax >= 3);
        assert_eq!(p.masks(), &[1, 1, 1]);
        assert_eq!(p.images()[0], DEFAULT_IMAGE);
    }

    #[test]
    fn extract_flattens_vectors() {
        let p = three();
        match p.extract("x") {
            Some(PerParticle::Double { data, width: 3 }) => {
                assert_eq!(data.len(), 9);
                assert_eq!(data[3], 1.0);
            }
            other => panic!("expected Double view, got {other:?}"),
        }
        assert!(p.extract("q").is_none());
        assert!(p.extract("nope").is_none());
    }

    #[test]
    fn property_table_matches_extract() {
        let mut p = three();
        p.q_flag = 1;
        for (name, info) in PROPERTIES.iter() {
            match (p.extract(name), info.kind) {
                (Some(PerParticle::Int { width, .. }), ElementKind::Int) => {
                    assert_eq!(width, info.width)
                }
                (Some(PerParticle::Double { width, .. }), ElementKind::Double) => {
                    assert_eq!(width, info.width)
                }
                other => panic!("{name}: table and store disagree: {other:?}"),
            }
        }
    }

    #[test]
    fn consecutive_tags_detected() {
        let comm = SerialComm::new();
        let mut p = three();
        assert!(p.tag_consecutive(&comm));
        p.tags_mut()[2] = 7;
        assert!(!p.tag_consecutive(&comm));
        assert!(!ParticleStore::default().tag_consecutive(&comm));
    }

    #[test]
    fn array_and_hash_maps_agree() {
        for style in [MapStyle::Array, MapStyle::Hash] {
            let mut p = three();
            p.map_style = style;
            p.map_init();
            p.map_set();
            assert_eq!(p.map_find(2), Some(1));
            assert_eq!(p.map_find(4), None);
            assert_eq!(p.map_find(-1), None);
        }
        let p = three();
        assert!(!p.has_map());
        assert_eq!(p.map_find(1), None);
    }
}
