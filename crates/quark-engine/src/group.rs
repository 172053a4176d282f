//! Named particle groups, stored as bits of each particle's mask.

use indexmap::IndexMap;
use quark_core::{BigInt, Communicator, EngineError, EngineResult};

use crate::particles::ParticleStore;
use crate::region::Region;

/// Most groups that can exist at once, including `all`.
pub const MAX_GROUP: usize = 32;

/// Group name table. Group `i` owns mask bit `1 << i`; `all` is group 0.
#[derive(Clone, Debug)]
pub struct Groups {
    names: [Option<String>; MAX_GROUP],
}

impl Default for Groups {
    fn default() -> Self {
        let mut names: [Option<String>; MAX_GROUP] = Default::default();
        names[0] = Some("all".to_string());
        Self { names }
    }
}

impl Groups {
    /// Index of group `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n.as_deref() == Some(name))
    }

    /// Mask bit of group `name`.
    pub fn bitmask(&self, name: &str) -> Option<i32> {
        self.find(name).map(|i| 1i32 << i)
    }

    /// Mask bit of group `name`, or an error naming `context`.
    pub fn require(&self, name: &str, context: &str) -> EngineResult<i32> {
        self.bitmask(name)
            .ok_or_else(|| EngineError::all(format!("Could not find {context} group ID {name}")))
    }

    /// Number of particles in the group with mask `bit`. Collective.
    pub fn count(&self, bit: i32, particles: &ParticleStore, comm: &dyn Communicator) -> BigInt {
        let local = particles.masks().iter().filter(|&&m| m & bit != 0).count();
        comm.sum_i64(local as i64)
    }

    fn find_or_create(&mut self, name: &str) -> EngineResult<usize> {
        if let Some(i) = self.find(name) {
            return Ok(i);
        }
        let slot = self
            .names
            .iter()
            .position(Option::is_none)
            .ok_or_else(|| EngineError::all("Too many groups"))?;
        self.names[slot] = Some(name.to_string());
        Ok(slot)
    }

    /// Apply a `group ID style args...` command.
    pub fn command(
        &mut self,
        args: &[&str],
        particles: &mut ParticleStore,
        regions: &IndexMap<String, Region>,
    ) -> EngineResult<()> {
        let (name, style, rest) = match args {
            [name, style, rest @ ..] => (*name, *style, rest),
            _ => return Err(EngineError::all("Illegal group command")),
        };

        if style == "delete" {
            let index = self
                .find(name)
                .ok_or_else(|| EngineError::all("Could not find group delete group ID"))?;
            if index == 0 {
                return Err(EngineError::all("Cannot delete group all"));
            }
            let keep = !(1i32 << index);
            particles.masks_mut().iter_mut().for_each(|m| *m &= keep);
            self.names[index] = None;
            return Ok(());
        }

        if style == "clear" {
            let index = self
                .find(name)
                .ok_or_else(|| EngineError::all(format!("Could not find group clear group ID {name}")))?;
            if index == 0 {
                return Err(EngineError::all("Cannot clear group all"));
            }
            let keep = !(1i32 << index);
            particles.masks_mut().iter_mut().for_each(|m| *m &= keep);
            return Ok(());
        }

        if !crate::config::is_identifier(name) {
            return Err(EngineError::all(format!("Group ID must be alphanumeric: {name}")));
        }
        let selection = self.select(style, rest, particles, regions)?;
        let bit = 1i32 << self.find_or_create(name)?;
        for (mask, chosen) in particles.masks_mut().iter_mut().zip(selection) {
            if chosen {
                *mask |= bit;
            }
        }
        Ok(())
    }

    fn select(
        &self,
        style: &str,
        args: &[&str],
        particles: &ParticleStore,
        regions: &IndexMap<String, Region>,
    ) -> EngineResult<Vec<bool>> {
        let n = particles.len();
        let masks = particles.masks();
        let chosen = match style {
            "empty" => vec![false; n],
            "type" | "id" => {
                let ranges = args
                    .iter()
                    .map(|a| parse_range(a))
                    .collect::<EngineResult<Vec<_>>>()?;
                let values = if style == "type" {
                    particles.types()
                } else {
                    particles.tags()
                };
                values
                    .iter()
                    .map(|&v| ranges.iter().any(|&(lo, hi)| v >= lo && v <= hi))
                    .collect()
            }
            "region" => {
                let id = args.first().ok_or_else(|| EngineError::all("Illegal group command"))?;
                let region = regions
                    .get(*id)
                    .ok_or_else(|| EngineError::all(format!("Group region ID {id} does not exist")))?;
                particles.x().iter().map(|x| region.contains(x)).collect()
            }
            "union" | "intersect" | "subtract" => {
                if args.is_empty() {
                    return Err(EngineError::all("Illegal group command"));
                }
                let bits = args
                    .iter()
                    .map(|g| self.require(g, "group"))
                    .collect::<EngineResult<Vec<_>>>()?;
                masks
                    .iter()
                    .map(|&m| match style {
                        "union" => bits.iter().any(|&b| m & b != 0),
                        "intersect" => bits.iter().all(|&b| m & b != 0),
                        _ => m & bits[0] != 0 && bits[1..].iter().all(|&b| m & b == 0),
                    })
                    .collect()
            }
            other => return Err(EngineError::all(format!("Illegal group style {other}"))),
        };
        Ok(chosen)
    }
}

/// Parse `N`, `N:M`, `*`, `*:M` or `N:*` into an inclusive range.
fn parse_range(word: &str) -> EngineResult<(i32, i32)> {
    let bad = || EngineError::all(format!("Invalid range {word} in group command"));
    let value = |s: &str, open: i32| -> EngineResult<i32> {
        if s == "*" {
            Ok(open)
        } else {
            s.parse::<i32>().map_err(|_| bad())
        }
    };
    match word.split_once(':') {
        None if word == "*" => Ok((i32::MIN, i32::MAX)),
        None => value(word, 0).map(|v| (v, v)),
        Some((lo, hi)) => Ok((value(lo, i32::MIN)?, value(hi, i32::MAX)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ParticleStore {
        let mut p = ParticleStore::default();
        p.set_ntypes(2);
        for k in 0..4 {
            let i = p.push(1 + (k % 2), [k as f64, 0.0, 0.0]);
            p.tags_mut()[i] = k + 1;
        }
        p.natoms = 4;
        p
    }

    #[test]
    fn all_exists_at_bit_one() {
        let g = Groups::default();
        assert_eq!(g.bitmask("all"), Some(1));
        assert_eq!(g.find("nope"), None);
    }

    #[test]
    fn type_and_id_groups() {
        let mut g = Groups::default();
        let mut p = store();
        let regions = IndexMap::new();
        g.command(&["odd", "type", "1"], &mut p, &regions).unwrap();
        g.command(&["tail", "id", "3:*"], &mut p, &regions).unwrap();
        let odd = g.bitmask("odd").unwrap();
        let tail = g.bitmask("tail").unwrap();
        let odd_members: Vec<bool> = p.masks().iter().map(|m| m & odd != 0).collect();
        assert_eq!(odd_members, vec![true, false, true, false]);
        let tail_members: Vec<bool> = p.masks().iter().map(|m| m & tail != 0).collect();
        assert_eq!(tail_members, vec![false, false, true, true]);

        g.command(&["both", "intersect", "odd", "tail"], &mut p, &regions).unwrap();
        let both = g.bitmask("both").unwrap();
        assert_eq!(p.masks().iter().filter(|m| *m & both != 0).count(), 1);

        g.command(&["rest", "subtract", "all", "odd"], &mut p, &regions).unwrap();
        let rest = g.bitmask("rest").unwrap();
        assert_eq!(p.masks().iter().filter(|m| *m & rest != 0).count(), 2);
    }

    #[test]
    fn region_group() {
        let mut g = Groups::default();
        let mut p = store();
        let mut regions = IndexMap::new();
        regions.insert(
            "left".to_string(),
            Region::parse("block", &["INF", "1.5", "INF", "INF", "INF", "INF"]).unwrap(),
        );
        g.command(&["lo", "region", "left"], &mut p, &regions).unwrap();
        let bit = g.bitmask("lo").unwrap();
        assert_eq!(p.masks().iter().filter(|m| *m & bit != 0).count(), 2);
    }

    #[test]
    fn delete_frees_slot_and_clears_bits() {
        let mut g = Groups::default();
        let mut p = store();
        let regions = IndexMap::new();
        g.command(&["a", "id", "1"], &mut p, &regions).unwrap();
        let bit = g.bitmask("a").unwrap();
        g.command(&["a", "delete"], &mut p, &regions).unwrap();
        assert!(g.find("a").is_none());
        assert!(p.masks().iter().all(|m| m & bit == 0));
        assert!(g.command(&["all", "delete"], &mut p, &regions).is_err());
    }

    #[test]
    fn group_table_fills_up() {
        let mut g = Groups::default();
        let mut p = store();
        let regions = IndexMap::new();
        for k in 1..MAX_GROUP {
            g.command(&[format!("g{k}").as_str(), "empty"], &mut p, &regions)
                .unwrap();
        }
        match g.command(&["overflow", "empty"], &mut p, &regions) {
            Err(e) => assert_eq!(e.message(), "Too many groups"),
            other => panic!("expected error, got {other:?}"),
        }
    }
}
