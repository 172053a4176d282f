//! Interpreter command table.
//!
//! Each command is a plain function over the engine. Lookup goes through
//! a static name → handler table built once.

use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use quark_core::{BigInt, EngineError, EngineResult};

use crate::config::Echo;
use crate::engine::Engine;
use crate::particles::MapStyle;
use crate::region::{number, Region};

type Handler = fn(&mut Engine, &[&str]) -> EngineResult<()>;

static COMMANDS: LazyLock<IndexMap<&'static str, Handler>> = LazyLock::new(|| {
    let table: [(&'static str, Handler); 23] = [
        ("units", units),
        ("atom_style", atom_style),
        ("atom_modify", atom_modify),
        ("boundary", boundary),
        ("processors", processors),
        ("region", region),
        ("create_box", create_box),
        ("mass", mass),
        ("timestep", timestep),
        ("reset_timestep", reset_timestep),
        ("variable", variable),
        ("group", group),
        ("compute", compute),
        ("uncompute", uncompute),
        ("fix", fix),
        ("unfix", unfix),
        ("thermo", thermo),
        ("run", run),
        ("print", print),
        ("echo", echo),
        ("include", include),
        ("log", log),
        ("next", next),
    ];
    IndexMap::from(table)
});

/// Whether `name` is an interpreter command.
pub fn is_command(name: &str) -> bool {
    COMMANDS.contains_key(name)
}

/// Run command `name` with `args`.
pub(crate) fn dispatch(engine: &mut Engine, name: &str, args: &[&str]) -> EngineResult<()> {
    let handler = COMMANDS
        .get(name)
        .ok_or_else(|| EngineError::all(format!("Unknown command: {name}")))?;
    handler(engine, args)
}

fn illegal(command: &str) -> EngineError {
    EngineError::all(format!("Illegal {command} command"))
}

fn before_box(engine: &Engine, command: &str) -> EngineResult<()> {
    if engine.domain.box_exist {
        return Err(EngineError::all(format!(
            "{command} command after simulation box is defined"
        )));
    }
    Ok(())
}

fn after_box(engine: &Engine, command: &str) -> EngineResult<()> {
    if !engine.domain.box_exist {
        return Err(EngineError::all(format!(
            "{command} command before simulation box is defined"
        )));
    }
    Ok(())
}

fn int<T: std::str::FromStr>(word: &str) -> EngineResult<T> {
    word.parse()
        .map_err(|_| EngineError::all(format!("Expected integer parameter instead of '{word}'")))
}

// ── Setup ──────────────────────────────────────────────────────────

fn units(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    let [style] = args else {
        return Err(illegal("units"));
    };
    before_box(engine, "Units")?;
    engine.update.set_units(style)
}

fn atom_style(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    before_box(engine, "Atom_style")?;
    engine.particles.q_flag = match args {
        ["atomic"] => 0,
        ["charge"] => 1,
        [other, ..] => return Err(EngineError::all(format!("Unknown atom style {other}"))),
        [] => return Err(illegal("atom_style")),
    };
    Ok(())
}

fn atom_modify(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(illegal("atom_modify"));
    }
    before_box(engine, "Atom_modify")?;
    for pair in args.chunks(2) {
        match (pair[0], pair[1]) {
            ("id", "yes") => engine.particles.tag_enable = true,
            ("id", "no") => engine.particles.tag_enable = false,
            ("map", "array" | "yes") => engine.particles.map_style = MapStyle::Array,
            ("map", "hash") => engine.particles.map_style = MapStyle::Hash,
            _ => return Err(illegal("atom_modify")),
        }
    }
    Ok(())
}

fn boundary(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    engine.domain.set_boundary(args)
}

fn processors(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    if args.len() != 3 {
        return Err(illegal("processors"));
    }
    before_box(engine, "Processors")?;
    let mut user = [None; 3];
    for (slot, word) in user.iter_mut().zip(args) {
        *slot = match *word {
            "*" => None,
            n => Some(int::<usize>(n).ok().filter(|&n| n > 0).ok_or_else(|| illegal("processors"))?),
        };
    }
    let fixed: usize = user.iter().flatten().product();
    if user.iter().all(Option::is_some) && fixed != engine.comm.size() {
        return Err(EngineError::all("Specified processors != physical processors"));
    }
    engine.processors = user;
    Ok(())
}

fn region(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    let [id, style, rest @ ..] = args else {
        return Err(illegal("region"));
    };
    if engine.regions.contains_key(*id) {
        return Err(EngineError::all(format!("Reuse of region ID {id}")));
    }
    let region = Region::parse(style, rest)?;
    engine.regions.insert(id.to_string(), region);
    Ok(())
}

fn create_box(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    let [ntypes, id] = args else {
        return Err(illegal("create_box"));
    };
    before_box(engine, "Create_box")?;
    let ntypes: usize = int(ntypes)?;
    if ntypes == 0 {
        return Err(illegal("create_box"));
    }
    let region = engine
        .regions
        .get(*id)
        .ok_or_else(|| EngineError::all(format!("Create_box region ID {id} does not exist")))?
        .clone();

    let domain = &mut engine.domain;
    match region {
        Region::Block { lo, hi } => {
            domain.triclinic = 0;
            domain.boxlo = lo;
            domain.boxhi = hi;
            domain.xy = 0.0;
            domain.xz = 0.0;
            domain.yz = 0.0;
        }
        Region::Prism { lo, hi, tilt } => {
            domain.triclinic = 1;
            domain.boxlo = lo;
            domain.boxhi = hi;
            [domain.xy, domain.xz, domain.yz] = tilt;
        }
    }
    domain
        .set_initial_box()
        .map_err(|_| EngineError::all("Create_box region does not support a bounding box"))?;
    domain.set_global_box();
    engine.rebuild_grid()?;
    engine.domain.box_exist = true;
    engine.particles.set_ntypes(ntypes);
    engine.particles.map_init();

    let d = &engine.domain;
    let kind = if d.triclinic == 0 { "orthogonal" } else { "triclinic" };
    let text = format!(
        "Created {kind} box = ({} {} {}) to ({} {} {})\n  {} by {} by {} MPI processor grid",
        d.boxlo[0], d.boxlo[1], d.boxlo[2], d.boxhi[0], d.boxhi[1], d.boxhi[2],
        engine.grid.dims[0], engine.grid.dims[1], engine.grid.dims[2],
    );
    engine.console.message(&text);
    Ok(())
}

fn mass(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    let [types, value] = args else {
        return Err(illegal("mass"));
    };
    after_box(engine, "Mass")?;
    let ntypes = engine.particles.ntypes;
    let (lo, hi) = match types.split_once('*') {
        None => {
            let t: usize = int(types)?;
            (t, t)
        }
        Some((a, b)) => (
            if a.is_empty() { 1 } else { int(a)? },
            if b.is_empty() { ntypes } else { int(b)? },
        ),
    };
    if lo < 1 || hi > ntypes || lo > hi {
        return Err(EngineError::all("Invalid type for mass set"));
    }
    let value = number(value)?;
    if value <= 0.0 {
        return Err(EngineError::all("Invalid mass value"));
    }
    for t in lo..=hi {
        engine.particles.mass[t] = value;
        engine.particles.mass_set[t] = true;
    }
    Ok(())
}

fn timestep(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    let [dt] = args else {
        return Err(illegal("timestep"));
    };
    engine.update.set_dt(number(dt)?)
}

fn reset_timestep(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    let [step] = args else {
        return Err(illegal("reset_timestep"));
    };
    engine.update.reset_timestep(int::<BigInt>(step)?)?;
    engine.computes.reset_invoked_all();
    Ok(())
}

// ── Registries ─────────────────────────────────────────────────────

fn variable(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    engine.variables.command(args)
}

fn group(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    after_box(engine, "Group")?;
    engine
        .groups
        .command(args, &mut engine.particles, &engine.regions)?;
    if let [name, style, ..] = args {
        if *style != "delete" {
            if let Some(bit) = engine.groups.bitmask(name) {
                let count = engine.groups.count(bit, &engine.particles, &*engine.comm);
                engine.console.message(&format!("{count} atoms in group {name}"));
            }
        }
    }
    Ok(())
}

fn compute(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    engine.add_compute(args)
}

fn uncompute(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    let [id] = args else {
        return Err(illegal("uncompute"));
    };
    engine.computes.remove(id)
}

fn fix(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    engine.add_fix(args)
}

fn unfix(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    let [id] = args else {
        return Err(illegal("unfix"));
    };
    engine.fixes.remove(id)
}

// ── Running and output ─────────────────────────────────────────────

fn thermo(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    let [every] = args else {
        return Err(illegal("thermo"));
    };
    let every: i64 = int(every)?;
    if every < 0 {
        return Err(illegal("thermo"));
    }
    engine.thermo.every = every;
    Ok(())
}

fn run(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    let [nsteps] = args else {
        return Err(illegal("run"));
    };
    let nsteps: BigInt = int(nsteps)?;
    if nsteps < 0 {
        return Err(EngineError::all("Invalid run command N value"));
    }
    engine.run(nsteps)
}

fn print(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    let (text, screen) = match args {
        [text] => (*text, true),
        [text, "screen", "yes"] => (*text, true),
        [text, "screen", "no"] => (*text, false),
        _ => return Err(illegal("print")),
    };
    let text = crate::input::substitute(text, |name| engine.evaluator().substitution(name))?;
    if screen {
        engine.console.message(&text);
    } else {
        tracing::debug!(target: "quark::print", "{text}");
    }
    Ok(())
}

fn echo(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    let [style] = args else {
        return Err(illegal("echo"));
    };
    let echo = Echo::parse(style).ok_or_else(|| illegal("echo"))?;
    engine.console.set_echo(echo);
    Ok(())
}

fn include(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    let [path] = args else {
        return Err(illegal("include"));
    };
    engine.execute_file(Path::new(path))
}

fn log(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    let path = match args {
        ["none"] => None,
        [path] => Some(Path::new(path)),
        _ => return Err(illegal("log")),
    };
    engine.console.reopen_log(path)
}

fn next(engine: &mut Engine, args: &[&str]) -> EngineResult<()> {
    if args.is_empty() {
        return Err(illegal("next"));
    }
    args.iter().try_for_each(|name| engine.variables.advance(name))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quark_comm::SerialComm;

    use super::*;
    use crate::config::EngineConfig;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default(), Arc::new(SerialComm::new())).unwrap()
    }

    fn boxed() -> Engine {
        let mut e = engine();
        for line in [
            "atom_modify map array",
            "region box block 0 10 0 10 0 10",
            "create_box 2 box",
        ] {
            e.execute(line).unwrap();
        }
        e
    }

    #[test]
    fn table_lists_every_command() {
        for name in ["units", "create_box", "run", "print", "include", "next"] {
            assert!(is_command(name), "{name}");
        }
        assert!(!is_command("pair_style"));
    }

    #[test]
    fn create_box_sets_geometry() {
        let e = boxed();
        assert!(e.domain.box_exist);
        assert_eq!(e.domain.boxhi, [10.0; 3]);
        assert_eq!(e.particles.ntypes, 2);
        assert_eq!(e.grid.dims, [1, 1, 1]);
        assert!(e.particles.has_map());
    }

    #[test]
    fn prism_box_is_triclinic() {
        let mut e = engine();
        e.execute("region p prism 0 4 0 4 0 4 1 0 0").unwrap();
        e.execute("create_box 1 p").unwrap();
        assert_eq!(e.domain.triclinic, 1);
        assert_eq!(e.domain.xy, 1.0);
    }

    #[test]
    fn setup_commands_after_box_fail() {
        let mut e = boxed();
        for line in ["units real", "atom_style charge", "atom_modify id no", "boundary p p f", "create_box 1 box"] {
            assert!(e.execute(line).is_err(), "{line}");
        }
    }

    #[test]
    fn mass_ranges() {
        let mut e = boxed();
        e.execute("mass * 2.0").unwrap();
        assert!(e.particles.all_masses_set());
        e.execute("mass 2 3.5").unwrap();
        assert_eq!(e.particles.mass[2], 3.5);
        assert!(e.execute("mass 3 1.0").is_err());
        assert!(e.execute("mass 1 -1.0").is_err());
    }

    #[test]
    fn mass_needs_a_box() {
        let mut e = engine();
        assert!(e.execute("mass 1 1.0").is_err());
    }

    #[test]
    fn reset_timestep_clears_compute_markers() {
        let mut e = boxed();
        e.execute("mass * 1.0").unwrap();
        e.thermo_keyword("temp").unwrap();
        let c = e.computes.get("thermo_temp").unwrap();
        assert_eq!(c.invoked(quark_core::Scope::Global, quark_core::Shape::Scalar), Some(0));
        e.execute("reset_timestep 100").unwrap();
        let c = e.computes.get("thermo_temp").unwrap();
        assert_eq!(c.invoked(quark_core::Scope::Global, quark_core::Shape::Scalar), None);
        assert_eq!(e.update.ntimestep, 100);
    }

    #[test]
    fn compute_ids_are_unique() {
        let mut e = boxed();
        e.execute("compute k all ke").unwrap();
        match e.execute("compute k all ke") {
            Err(err) => assert!(err.message().contains("Reuse of compute ID")),
            other => panic!("expected error, got {other:?}"),
        }
        e.execute("uncompute k").unwrap();
        e.execute("compute k all ke").unwrap();
        assert!(e.execute("compute q all nonsense").is_err());
    }

    #[test]
    fn fix_replacement_keeps_style() {
        let mut e = boxed();
        e.execute("fix f all addforce 1 0 0").unwrap();
        e.execute("fix f all addforce 2 0 0").unwrap();
        assert!(e.execute("fix f all nve").is_err());
        e.execute("unfix f").unwrap();
        assert!(e.execute("unfix f").is_err());
    }

    #[test]
    fn processors_must_match_group() {
        let mut e = engine();
        assert!(e.execute("processors 2 1 1").is_err());
        e.execute("processors * 1 1").unwrap();
        assert_eq!(e.processors, [None, Some(1), Some(1)]);
    }

    #[test]
    fn include_runs_a_file() {
        let dir = std::env::temp_dir().join(format!("quark-include-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("in.setup");
        std::fs::write(&path, "variable x string &\n  hello\nunits metal\n").unwrap();
        let mut e = engine();
        e.execute(&format!("include {}", path.display())).unwrap();
        assert_eq!(e.variables.text("x"), Some("hello"));
        assert_eq!(e.update.unit_style, "metal");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn next_advances_index_variables() {
        let mut e = engine();
        e.execute("variable t index a b").unwrap();
        e.execute("next t").unwrap();
        assert_eq!(e.variables.text("t"), Some("b"));
        e.execute("next t").unwrap();
        assert!(e.variables.style("t").is_none());
        assert!(e.execute("next t").is_err());
    }
}
