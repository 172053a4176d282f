//! The engine instance and its command interpreter.
//!
//! [`Engine`] owns every collaborator of one simulation: the process
//! group handle, timestep state, box geometry, particles, groups, the
//! compute/fix/variable registries, and console output. Fields are
//! public so the library layer can hand out references to them; the
//! [`system_view!`](crate::system_view) macro borrows the read-only
//! parts while a registry is borrowed mutably.
//!
//! # Ownership model
//!
//! `Engine` is [`Send`] but not [`Sync`]. One engine belongs to one rank;
//! every rank of a group drives its own engine through the same command
//! sequence.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use quark_core::{Communicator, EngineError, EngineResult};
use smallvec::SmallVec;

use crate::compute::{Compute, Computes};
use crate::config::EngineConfig;
use crate::decomposition::ProcGrid;
use crate::domain::Domain;
use crate::fix::{Fix, Fixes};
use crate::group::Groups;
use crate::input;
use crate::output::Console;
use crate::particles::ParticleStore;
use crate::region::Region;
use crate::style::{StyleArgs, StyleRegistry};
use crate::system_view;
use crate::thermo::{self, Thermo, THERMO_TEMP};
use crate::update::Update;
use crate::variable::{Evaluator, Variables};

/// Numeric version reported to drivers, as a `YYYYMMDD` date.
pub const VERSION: i32 = 20_261_001;

/// Deepest allowed nesting of `include` files.
const MAX_INCLUDE_DEPTH: usize = 16;

const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<Engine>();
    }
};

// ── Engine ─────────────────────────────────────────────────────────

/// One simulation instance on one rank.
pub struct Engine {
    /// Process group this instance runs on.
    pub comm: Arc<dyn Communicator>,
    /// Construction options.
    pub config: EngineConfig,
    /// Screen and log output.
    pub console: Console,
    /// Timestep state.
    pub update: Update,
    /// Box geometry.
    pub domain: Domain,
    /// Process grid over the box.
    pub grid: ProcGrid,
    /// Grid dimensions fixed by `processors`, per dimension.
    pub processors: [Option<usize>; 3],
    /// Locally owned particles.
    pub particles: ParticleStore,
    /// Named groups.
    pub groups: Groups,
    /// Named regions.
    pub regions: IndexMap<String, Region>,
    /// Derived-quantity objects.
    pub computes: Computes,
    /// Drivers.
    pub fixes: Fixes,
    /// Named variables.
    pub variables: Variables,
    /// Thermo output settings.
    pub thermo: Thermo,
    /// Compute and fix style constructors.
    pub styles: StyleRegistry,
    include_depth: usize,
}

impl Engine {
    /// Create an engine on `comm`.
    ///
    /// Opens the log file, defines the `-var` index variables, and
    /// creates the `thermo_temp` compute.
    pub fn new(config: EngineConfig, comm: Arc<dyn Communicator>) -> EngineResult<Self> {
        config
            .validate()
            .map_err(|e| EngineError::all(e.to_string()))?;
        let console = Console::new(&config, comm.rank())?;
        let mut engine = Self {
            comm,
            config,
            console,
            update: Update::default(),
            domain: Domain::default(),
            grid: ProcGrid::default(),
            processors: [None; 3],
            particles: ParticleStore::default(),
            groups: Groups::default(),
            regions: IndexMap::new(),
            computes: Computes::default(),
            fixes: Fixes::default(),
            variables: Variables::default(),
            thermo: Thermo::default(),
            styles: StyleRegistry::default(),
            include_depth: 0,
        };
        engine.console.message(&format!("Quark ({VERSION})"));
        tracing::info!(nprocs = engine.comm.size(), rank = engine.comm.rank(), "engine created");

        for (name, values) in engine.config.variables.clone() {
            engine.variables.define_index(&name, &values)?;
        }
        engine.add_compute(&[THERMO_TEMP, "all", "temp"])?;
        Ok(engine)
    }

    /// Parse `args` as command-line switches and create an engine.
    pub fn from_args<S: AsRef<str>>(args: &[S], comm: Arc<dyn Communicator>) -> EngineResult<Self> {
        let config = EngineConfig::from_args(args).map_err(|e| EngineError::all(e.to_string()))?;
        Self::new(config, comm)
    }

    // ── Interpreter ────────────────────────────────────────────────

    /// Execute one command line.
    ///
    /// Continuation markers are spliced first and any remaining line
    /// breaks act as whitespace. Returns the command name, or `None` for
    /// a blank or comment-only line.
    pub fn execute(&mut self, line: &str) -> EngineResult<Option<String>> {
        let spliced = input::splice(line);
        let text = input::strip_comment(&spliced).trim();
        if text.is_empty() {
            return Ok(None);
        }
        let text = input::substitute(text, |name| self.evaluator().substitution(name))?;
        self.console.echo(&text);

        let words = input::split_words(&text)?;
        let Some((command, rest)) = words.split_first() else {
            return Ok(None);
        };
        let args: SmallVec<[&str; 8]> = rest.iter().map(String::as_str).collect();
        tracing::debug!(command = command.as_str(), nargs = args.len(), "dispatch");
        crate::commands::dispatch(self, command, &args)?;
        Ok(Some(command.clone()))
    }

    /// Execute every line of the file at `path`, stopping at the first
    /// failure.
    pub fn execute_file(&mut self, path: &Path) -> EngineResult<()> {
        if self.include_depth >= MAX_INCLUDE_DEPTH {
            return Err(EngineError::all("Too many nested include files"));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::all(format!("Cannot open input script {}: {e}", path.display()))
        })?;
        self.include_depth += 1;
        let result = input::splice(&text)
            .lines()
            .try_for_each(|line| self.execute(line).map(|_| ()));
        self.include_depth -= 1;
        result
    }

    // ── State helpers ──────────────────────────────────────────────

    /// Prepare derived flags and every compute and fix for use.
    pub fn init(&mut self) -> EngineResult<()> {
        self.domain.init(self.fixes.changes_box());
        let sys = system_view!(self);
        self.computes.init_all(&sys)?;
        self.fixes.init_all(&sys)
    }

    /// Re-derive the process grid and this rank's sub-box from the
    /// current box.
    pub fn rebuild_grid(&mut self) -> EngineResult<()> {
        self.grid = ProcGrid::new(
            self.comm.size(),
            self.comm.rank(),
            self.domain.prd,
            self.processors,
        )?;
        self.domain.set_local_box(&self.grid);
        Ok(())
    }

    /// Formula evaluator over the current state.
    pub fn evaluator(&mut self) -> Evaluator<'_> {
        Evaluator::new(
            system_view!(self),
            &mut self.computes,
            &mut self.fixes,
            &self.variables,
        )
    }

    /// Evaluate the `equal`-style variable `name`. Collective.
    pub fn evaluate_equal(&mut self, name: &str) -> EngineResult<f64> {
        self.evaluator().equal(name)
    }

    /// Evaluate the `atom`-style variable `name` over the particles of
    /// group `group`. Collective.
    pub fn evaluate_atom(&mut self, name: &str, group: &str) -> EngineResult<Vec<f64>> {
        let bit = self.groups.require(group, "variable")?;
        self.evaluator().atom(name, bit)
    }

    /// Current value of thermo keyword `word`, or `None` if unknown.
    pub fn thermo_keyword(&mut self, word: &str) -> EngineResult<Option<f64>> {
        let sys = system_view!(self);
        thermo::evaluate(word, &sys, &mut self.computes)
    }

    /// Whether this rank is rank 0.
    pub fn is_root(&self) -> bool {
        self.comm.is_root()
    }

    // ── Registries ─────────────────────────────────────────────────

    /// `compute ID group style args...`.
    pub(crate) fn add_compute(&mut self, args: &[&str]) -> EngineResult<()> {
        let [id, group, style, rest @ ..] = args else {
            return Err(EngineError::all("Illegal compute command"));
        };
        if !crate::config::is_identifier(id) {
            return Err(EngineError::all(format!("Compute ID must be alphanumeric: {id}")));
        }
        if self.computes.get(id).is_some() {
            return Err(EngineError::all(format!("Reuse of compute ID '{id}'")));
        }
        let group_bit = self.groups.require(group, "compute")?;
        let style_args = StyleArgs {
            id: *id,
            group_bit,
            args: rest,
        };
        let sys = system_view!(self);
        let kernel = self.styles.create_compute(style, &style_args, &sys)?;
        let mut compute = Compute::new(id, group_bit, style, kernel);
        compute.init(&sys)?;
        self.computes.insert(compute)
    }

    /// `fix ID group style args...`.
    pub(crate) fn add_fix(&mut self, args: &[&str]) -> EngineResult<()> {
        let [id, group, style, rest @ ..] = args else {
            return Err(EngineError::all("Illegal fix command"));
        };
        if !crate::config::is_identifier(id) {
            return Err(EngineError::all(format!("Fix ID must be alphanumeric: {id}")));
        }
        let group_bit = self.groups.require(group, "fix")?;
        let style_args = StyleArgs {
            id: *id,
            group_bit,
            args: rest,
        };
        let sys = system_view!(self);
        let kernel = self.styles.create_fix(style, &style_args, &sys)?;
        self.fixes.insert(Fix::new(id, group_bit, style, kernel))
    }
}
